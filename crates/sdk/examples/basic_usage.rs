//! Basic usage example demonstrating hash, sign, benchmark and health calls.
//!
//! Run: `cargo run --example basic_usage -- --socket /tmp/cryptobroker.sock`
//!
//! This example shows:
//! - Client configuration from the environment or command line
//! - Checking broker health
//! - Hashing bytes with a crypto profile
//! - Signing a CSR when `--csr`, `--ca-key` and `--ca-cert` are given
//! - Error handling patterns

// Examples are allowed to use expect/unwrap for brevity
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::disallowed_methods)]

use cryptobroker_sdk::{
    BenchmarkPayload, ClientConfig, CryptoBrokerClient, ErrorKind, HashPayload, HealthStatus,
    Result, SignOptions, SignPayload, Validity,
};

fn arg(args: &[String], name: &str) -> Option<String> {
    args.iter().position(|a| a == name).and_then(|i| args.get(i + 1)).cloned()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    // -------------------------------------------------------------------------
    // 1. Create a client; CRYPTOBROKER_SOCKET_PATH applies unless --socket is given
    // -------------------------------------------------------------------------
    let config = match arg(&args, "--socket") {
        Some(socket) => ClientConfig::builder().socket_path(socket).build()?,
        None => ClientConfig::from_env()?,
    };
    println!("Connecting to crypto broker at {}", config.socket_path().display());

    let client = CryptoBrokerClient::connect(config).await?;

    // -------------------------------------------------------------------------
    // 2. Health
    // -------------------------------------------------------------------------
    match client.health().await {
        HealthStatus::Serving => println!("Broker is serving"),
        other => println!("Broker health: {other}"),
    }

    // -------------------------------------------------------------------------
    // 3. Hash
    // -------------------------------------------------------------------------
    let payload = HashPayload::builder().profile("Default").input(b"Hello world").build();
    match client.hash(payload).await {
        Ok(output) => println!("{}: {}", output.hash_algorithm, output.hash_value),
        Err(e) if e.kind() == ErrorKind::PermanentBroker => println!("Broker rejected hash: {e}"),
        Err(e) => return Err(e),
    }

    // -------------------------------------------------------------------------
    // 4. Sign, if PEM inputs were supplied
    // -------------------------------------------------------------------------
    if let (Some(csr), Some(key), Some(cert)) =
        (arg(&args, "--csr"), arg(&args, "--ca-key"), arg(&args, "--ca-cert"))
    {
        let payload = SignPayload::builder()
            .profile("Default")
            .csr(std::fs::read(csr).expect("read CSR"))
            .ca_private_key(std::fs::read(key).expect("read CA key"))
            .ca_cert(std::fs::read(cert).expect("read CA certificate"))
            .validity(Validity::valid_for(chrono::TimeDelta::days(365)))
            .build();
        let signed = client.sign_with_options(payload, SignOptions::pem()).await?;
        println!("{}", signed.signed_certificate);
    }

    // -------------------------------------------------------------------------
    // 5. Benchmark
    // -------------------------------------------------------------------------
    for result in client.benchmark(BenchmarkPayload::default()).await? {
        println!("{:<32} {:>12} ns/op", result.name, result.avg_time_ns);
    }

    client.close()?;
    Ok(())
}
