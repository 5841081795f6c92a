//! Rust client for the local crypto broker.
//!
//! The broker is a sidecar process that performs hashing and certificate signing
//! on behalf of applications. It serves gRPC on a Unix domain socket; this SDK
//! wraps that service with readiness verification, transparent retries, request
//! metadata and typed payloads.
//!
//! # Features
//!
//! - **Unix socket transport**: One multiplexed HTTP/2 channel per client, shared by clones
//! - **Readiness verification**: State-poll or canary-probe until the broker is usable
//! - **Resilient calls**: Exponential backoff retry for transient broker errors
//! - **Cancellation**: Every wait and call has a `*_with_token` variant
//! - **Certificate output**: Signed certificates as PEM or raw base64 DER
//!
//! # Quick Start
//!
//! ```no_run
//! use cryptobroker_sdk::{ClientConfig, CryptoBrokerClient, HashPayload, SignOptions, SignPayload};
//!
//! # async fn example() -> cryptobroker_sdk::Result<()> {
//! let config = ClientConfig::builder()
//!     .socket_path("/tmp/cryptobroker.sock")
//!     .build()?;
//! let client = CryptoBrokerClient::connect(config).await?;
//!
//! let digest = client
//!     .hash(HashPayload::builder().profile("Default").input(b"Hello world").build())
//!     .await?;
//!
//! let signed = client
//!     .sign_with_options(
//!         SignPayload::builder()
//!             .profile("Default")
//!             .csr(std::fs::read("leaf.csr").unwrap_or_default())
//!             .ca_private_key(std::fs::read("ca.key").unwrap_or_default())
//!             .ca_cert(std::fs::read("ca.crt").unwrap_or_default())
//!             .build(),
//!         SignOptions::base64(),
//!     )
//!     .await?;
//!
//! println!("{} {}", digest.hash_value, signed.signed_certificate);
//! client.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              CryptoBrokerClient (Public API)                │
//! │   .hash() │ .sign() │ .benchmark() │ .health() │ .close()   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   Request Facade                            │
//! │   Metadata generation │ Payload mapping │ PEM encoding      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   Resilience Layer                          │
//! │   Retry with backoff │ Probe loop (backon) │ Cancellation   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   Readiness Verifier                        │
//! │   State-poll │ Canary probe │ Readiness deadline            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   Transport Connector                       │
//! │   Unix socket dialer │ State tracking │ Tonic channel       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// gRPC calls return tonic::Status (176 bytes) - standard practice for gRPC error handling
#![allow(clippy::result_large_err)]

mod certificate;
mod client;
mod config;
mod connection;
mod error;
mod metadata;
pub mod mock;
mod payload;
mod readiness;
mod retry;

// Public API exports
pub use certificate::{CertificateEncoding, SignOptions};
pub use client::CryptoBrokerClient;
pub use config::{
    ClientConfig, ClientConfigBuilder, DEFAULT_SOCKET_FILE, ProbePolicy, ProbePolicyBuilder,
    ReadinessStrategy, RetryPolicy, RetryPolicyBuilder, SOCKET_PATH_ENV, default_socket_path,
};
pub use connection::ConnectionState;
pub use error::{ErrorKind, Result, SdkError};
pub use metadata::{
    BrokerMetadata, Clock, IdGenerator, RequestMetadata, SystemClock, TraceContext, UuidGenerator,
};
pub use payload::{
    BenchmarkPayload, BenchmarkPayloadBuilder, BenchmarkResult, FakeEndpointOutput,
    FakeEndpointPayload, FakeEndpointPayloadBuilder, HashOutput, HashPayload, HashPayloadBuilder,
    HealthStatus, SignOutput, SignPayload, SignPayloadBuilder, Validity,
};
// Cancellation tokens appear in every `*_with_token` signature
pub use tokio_util::sync::CancellationToken;
