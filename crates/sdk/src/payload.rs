//! Request payloads and response types for broker operations.
//!
//! Payloads are plain data built with `bon` builders. Metadata is optional on
//! every payload; the client fills it in from the configured clock and id
//! generator when it is absent.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use cryptobroker_proto::proto;
use serde::Deserialize;

use crate::{
    certificate::CertificateEncoding,
    error::{InvalidPayloadSnafu, Result},
    metadata::{BrokerMetadata, Clock, RequestMetadata},
};

// =============================================================================
// Hash
// =============================================================================

/// Input for [`CryptoBrokerClient::hash`](crate::CryptoBrokerClient::hash).
///
/// # Example
///
/// ```
/// # use cryptobroker_sdk::HashPayload;
/// let payload = HashPayload::builder().profile("Default").input(b"Hello world").build();
/// assert_eq!(payload.input, b"Hello world");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct HashPayload {
    /// Crypto profile selecting the hash algorithm.
    #[builder(into)]
    pub profile: String,
    /// Bytes to hash.
    #[builder(into)]
    pub input: Vec<u8>,
    /// Request metadata; generated when absent.
    pub metadata: Option<RequestMetadata>,
}

/// Digest returned by the broker, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashOutput {
    /// Hex-encoded digest.
    pub hash_value: String,
    /// Algorithm the broker selected for the profile.
    pub hash_algorithm: String,
    /// Metadata echoed by the broker.
    pub metadata: Option<BrokerMetadata>,
}

impl From<proto::HashResponse> for HashOutput {
    fn from(response: proto::HashResponse) -> Self {
        Self {
            hash_value: response.hash_value,
            hash_algorithm: response.hash_algorithm,
            metadata: response.metadata.map(BrokerMetadata::from),
        }
    }
}

// =============================================================================
// Sign
// =============================================================================

/// Certificate validity requested from the broker.
///
/// Unset bounds are left to the broker's profile defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Absolute bounds.
    Window {
        /// Start of validity.
        not_before: Option<DateTime<Utc>>,
        /// End of validity.
        not_after: Option<DateTime<Utc>>,
    },
    /// Bounds relative to the client clock at request time.
    Offsets {
        /// Offset of the start of validity from now.
        not_before: Option<TimeDelta>,
        /// Offset of the end of validity from now.
        not_after: Option<TimeDelta>,
    },
}

impl Validity {
    /// Validity from `now` for `duration`.
    #[must_use]
    pub fn valid_for(duration: TimeDelta) -> Self {
        Self::Offsets { not_before: Some(TimeDelta::zero()), not_after: Some(duration) }
    }

    /// Resolves both bounds to Unix seconds.
    pub(crate) fn resolve(self, clock: &dyn Clock) -> Result<(Option<u64>, Option<u64>)> {
        let (not_before, not_after) = match self {
            Self::Window { not_before, not_after } => (not_before, not_after),
            Self::Offsets { not_before, not_after } => {
                let now = clock.now();
                (
                    not_before.map(|offset| shift(now, offset, "not_before")).transpose()?,
                    not_after.map(|offset| shift(now, offset, "not_after")).transpose()?,
                )
            },
        };

        let not_before = not_before.map(|at| unix_seconds(at, "not_before")).transpose()?;
        let not_after = not_after.map(|at| unix_seconds(at, "not_after")).transpose()?;
        if let (Some(start), Some(end)) = (not_before, not_after) {
            if start > end {
                return InvalidPayloadSnafu {
                    message: format!("validity not_before ({start}) is after not_after ({end})"),
                }
                .fail();
            }
        }
        Ok((not_before, not_after))
    }
}

fn shift(now: DateTime<Utc>, offset: TimeDelta, bound: &str) -> Result<DateTime<Utc>> {
    match now.checked_add_signed(offset) {
        Some(at) => Ok(at),
        None => InvalidPayloadSnafu { message: format!("validity {bound} offset is out of range") }
            .fail(),
    }
}

fn unix_seconds(at: DateTime<Utc>, bound: &str) -> Result<u64> {
    match u64::try_from(at.timestamp()) {
        Ok(seconds) => Ok(seconds),
        Err(_) => InvalidPayloadSnafu {
            message: format!("validity {bound} ({at}) is before the Unix epoch"),
        }
        .fail(),
    }
}

/// Input for [`CryptoBrokerClient::sign`](crate::CryptoBrokerClient::sign).
///
/// `csr`, `ca_private_key` and `ca_cert` are PEM documents and must be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct SignPayload {
    /// Crypto profile selecting the signature algorithm.
    #[builder(into)]
    pub profile: String,
    /// Certificate signing request, PEM.
    #[builder(into)]
    pub csr: Vec<u8>,
    /// Private key of the signing CA, PEM.
    #[builder(into)]
    pub ca_private_key: Vec<u8>,
    /// Certificate of the signing CA, PEM.
    #[builder(into)]
    pub ca_cert: Vec<u8>,
    /// Requested validity.
    pub validity: Option<Validity>,
    /// Subject overriding the one in the CSR.
    #[builder(into)]
    pub subject: Option<String>,
    /// CRL distribution point URLs.
    #[builder(default)]
    pub crl_distribution_points: Vec<String>,
    /// Request metadata; generated when absent.
    pub metadata: Option<RequestMetadata>,
}

impl SignPayload {
    pub(crate) fn into_proto(
        self,
        metadata: RequestMetadata,
        clock: &dyn Clock,
    ) -> Result<proto::SignRequest> {
        let (valid_not_before, valid_not_after) = match self.validity {
            Some(validity) => validity.resolve(clock)?,
            None => (None, None),
        };

        Ok(proto::SignRequest {
            profile: self.profile,
            csr: pem_text(self.csr, "csr")?,
            ca_private_key: pem_text(self.ca_private_key, "ca_private_key")?,
            ca_cert: pem_text(self.ca_cert, "ca_cert")?,
            valid_not_before,
            valid_not_after,
            subject: self.subject,
            crl_distribution_points: self.crl_distribution_points,
            metadata: Some(metadata.into_proto()),
        })
    }
}

fn pem_text(bytes: Vec<u8>, field: &str) -> Result<String> {
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => InvalidPayloadSnafu {
            message: format!("{field} is not valid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
        }
        .fail(),
    }
}

/// Signed certificate in the requested encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutput {
    /// PEM block or base64 DER, per `encoding`.
    pub signed_certificate: String,
    /// Encoding applied to `signed_certificate`.
    pub encoding: CertificateEncoding,
    /// Metadata echoed by the broker.
    pub metadata: Option<BrokerMetadata>,
}

// =============================================================================
// Benchmark
// =============================================================================

/// Input for [`CryptoBrokerClient::benchmark`](crate::CryptoBrokerClient::benchmark).
#[derive(Debug, Clone, Default, PartialEq, Eq, bon::Builder)]
pub struct BenchmarkPayload {
    /// Request metadata; generated when absent.
    pub metadata: Option<RequestMetadata>,
}

/// Timing of one broker benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BenchmarkResult {
    /// Benchmark name.
    pub name: String,
    /// Average duration of one operation in nanoseconds.
    #[serde(rename = "avgTime")]
    pub avg_time_ns: i64,
}

/// Document embedded in the benchmark response.
#[derive(Debug, Deserialize)]
pub(crate) struct BenchmarkReport {
    pub(crate) results: Vec<BenchmarkResult>,
}

// =============================================================================
// Fake endpoint
// =============================================================================

/// Input for [`CryptoBrokerClient::fake_endpoint`](crate::CryptoBrokerClient::fake_endpoint).
#[derive(Debug, Clone, Default, PartialEq, Eq, bon::Builder)]
pub struct FakeEndpointPayload {
    /// Request metadata; generated when absent.
    pub metadata: Option<RequestMetadata>,
}

/// Reply to a no-op round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeEndpointOutput {
    /// Metadata echoed by the broker.
    pub metadata: Option<BrokerMetadata>,
}

impl From<proto::FakeEndpointResponse> for FakeEndpointOutput {
    fn from(response: proto::FakeEndpointResponse) -> Self {
        Self { metadata: response.metadata.map(Into::into) }
    }
}

// =============================================================================
// Health
// =============================================================================

/// Serving status reported by the broker's health service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    /// The broker is serving requests.
    Serving,
    /// The broker is up but not serving.
    NotServing,
    /// The status could not be determined.
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Serving => "SERVING",
            Self::NotServing => "NOT_SERVING",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}
