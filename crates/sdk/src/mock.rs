//! Mock crypto broker for SDK integration testing.
//!
//! Serves the `CryptoBroker` service and the standard gRPC health service on a
//! Unix domain socket, with controllable responses for testing the client
//! without a real broker.
//!
//! # Features
//!
//! - **Canned responses**: Configure hash, certificate and benchmark payloads
//! - **Failure injection**: Queue gRPC errors or add latency for resilience tests
//! - **Request capture**: Count requests and inspect the last metadata and sign request
//! - **Health control**: Flip the reported serving status
//!
//! # Example
//!
//! ```no_run
//! use cryptobroker_sdk::mock::MockBroker;
//! use cryptobroker_sdk::{ClientConfig, CryptoBrokerClient, HashPayload};
//!
//! #[tokio::test]
//! async fn test_hash() {
//!     let broker = MockBroker::start().await.unwrap();
//!     broker.set_hash_response("deadbeef", "SHA-256");
//!
//!     let config = ClientConfig::builder().socket_path(broker.socket_path()).build().unwrap();
//!     let client = CryptoBrokerClient::connect(config).await.unwrap();
//!
//!     let payload = HashPayload::builder().profile("Default").input(b"Hello world").build();
//!     let output = client.hash(payload).await.unwrap();
//!     assert_eq!(output.hash_value, "deadbeef");
//! }
//! ```

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use cryptobroker_proto::proto::{
    self,
    crypto_broker_server::{CryptoBroker, CryptoBrokerServer},
};
use parking_lot::{Mutex, RwLock};
use tokio::{net::UnixListener, sync::oneshot};
use tokio_stream::wrappers::UnixListenerStream;
use tonic::{Code, Request, Response, Status, transport::Server};
use tonic_health::server::HealthReporter;

use crate::{
    error::ConnectionSnafu,
    metadata::BrokerMetadata,
    payload::HealthStatus,
};

/// Base64 DER of a P-384 leaf certificate, as a broker would return it.
pub const SAMPLE_CERTIFICATE_B64: &str = "MIICaDCCAe6gAwIBAgIUHereBfzbYtrts/fQz5amVRJeNkwwCgYIKoZIzj0EAwQwgYYxCzAJBgNVBAYTAkRFMRAwDgYDVQQIDAdCYXZhcmlhMRowGAYDVQQKDBFUZXN0LU9yZ2FuaXphdGlvbjEdMBsGA1UECwwUVGVzdC1Pcmdhbml6YXRpb24tQ0ExKjAoBgNVBAMMIVRlc3QtT3JnYW5pemF0aW9uLUludGVybWVkaWF0ZS1DQTAeFw0yNTA5MTYxMTM1NTFaFw0yNjA5MTYxMjM1NTFaMEwxCzAJBgNVBAYTAkRFMQswCQYDVQQIEwJCQTEMMAoGA1UEChMDU0FQMQ8wDQYDVQQDEwZNeUNlcnQxETAPBgNVBAUTCDAxMjM0NTU2MHYwEAYHKoZIzj0CAQYFK4EEACIDYgAEgLWqYJmgsXLUJLta6oIOykuzGNz76VMZj+wcfb9+MZA5A/WSfPVk9/JigQOfF49JcOI1Wb+gIfq1TNAkK/xOMTjfpxXeYglrFW/e278Q3TbYvhEHI3kOgIUJDbhSvRn/o1YwVDAOBgNVHQ8BAf8EBAMCBaAwEwYDVR0lBAwwCgYIKwYBBQUHAwIwDAYDVR0TAQH/BAIwADAfBgNVHSMEGDAWgBT3KuJBMgQEcYrmI1TyGOb0P2/P3zAKBggqhkjOPQQDBANoADBlAjEAysok6BwRmNOrt4UeBpw2NF87xuoek/dF9lXOalpXtp+cXHjgigcWmguT48ve29CmAjBNir0Ws4SQBr9PwtCbILoLwMihfkqIjjib63+q30YpW6nghOlKv2iI1Yobd05HBH8=";

/// SHA-256 of `Hello world`, the default hash response.
pub const SAMPLE_HASH_VALUE: &str =
    "64ec88ca00b268e5ba1a35678a1b5316d212f4f366b2477232534a8aeca37f3c";

/// Algorithm reported with [`SAMPLE_HASH_VALUE`].
pub const SAMPLE_HASH_ALGORITHM: &str = "SHA-256";

/// Shared state for the mock broker.
#[derive(Debug)]
struct MockState {
    /// Hash response: (hash_value, hash_algorithm)
    hash_response: RwLock<(String, String)>,

    /// Base64 DER returned by Sign
    signed_certificate: RwLock<String>,

    /// JSON document returned by Benchmark
    benchmark_results: RwLock<String>,

    /// Errors returned by the next requests, in order
    injected_errors: Mutex<VecDeque<Code>>,

    /// Delay to inject for each request (milliseconds)
    delay_ms: AtomicU64,

    /// Hash requests received, including failed ones
    hash_count: AtomicUsize,

    /// Sign requests received, including failed ones
    sign_count: AtomicUsize,

    /// Benchmark requests received, including failed ones
    benchmark_count: AtomicUsize,

    /// FakeEndpoint requests received, including failed ones
    fake_endpoint_count: AtomicUsize,

    /// Metadata of the most recent request
    last_metadata: RwLock<Option<proto::Metadata>>,

    /// The most recent sign request
    last_sign_request: RwLock<Option<proto::SignRequest>>,
}

impl MockState {
    fn new() -> Self {
        Self {
            hash_response: RwLock::new((
                SAMPLE_HASH_VALUE.to_string(),
                SAMPLE_HASH_ALGORITHM.to_string(),
            )),
            signed_certificate: RwLock::new(SAMPLE_CERTIFICATE_B64.to_string()),
            benchmark_results: RwLock::new(r#"{"results":[]}"#.to_string()),
            injected_errors: Mutex::new(VecDeque::new()),
            delay_ms: AtomicU64::new(0),
            hash_count: AtomicUsize::new(0),
            sign_count: AtomicUsize::new(0),
            benchmark_count: AtomicUsize::new(0),
            fake_endpoint_count: AtomicUsize::new(0),
            last_metadata: RwLock::new(None),
            last_sign_request: RwLock::new(None),
        }
    }

    /// Records the request metadata, applies the configured delay and pops the
    /// next injected error.
    async fn check_injection(&self, metadata: Option<&proto::Metadata>) -> Result<(), Status> {
        *self.last_metadata.write() = metadata.cloned();

        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        match self.injected_errors.lock().pop_front() {
            Some(code) => Err(Status::new(code, "Injected error")),
            None => Ok(()),
        }
    }
}

/// Mock implementation of the crypto broker.
///
/// The server stops and the socket file is removed when the handle is dropped.
pub struct MockBroker {
    state: Arc<MockState>,
    health: HealthReporter,
    socket_path: PathBuf,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl std::fmt::Debug for MockBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBroker").field("socket_path", &self.socket_path).finish_non_exhaustive()
    }
}

impl MockBroker {
    /// Starts a mock broker on a fresh socket in the temp directory.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Connection` if the socket cannot be bound.
    pub async fn start() -> crate::Result<Self> {
        let name = format!("cryptobroker-mock-{}.sock", uuid::Uuid::new_v4().simple());
        Self::start_at(std::env::temp_dir().join(name)).await
    }

    /// Starts a mock broker listening on `socket_path`.
    ///
    /// A stale socket file at the path is replaced.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Connection` if the socket cannot be bound.
    pub async fn start_at(socket_path: impl AsRef<Path>) -> crate::Result<Self> {
        let socket_path = socket_path.as_ref().to_path_buf();
        match std::fs::remove_file(&socket_path) {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => {
                let path = socket_path.display();
                return ConnectionSnafu {
                    message: format!("Failed to remove stale socket {path}: {e}"),
                }
                .fail();
            },
        }

        let listener = UnixListener::bind(&socket_path).map_err(|e| {
            ConnectionSnafu { message: format!("Failed to bind {}: {e}", socket_path.display()) }
                .build()
        })?;

        let state = Arc::new(MockState::new());
        let broker_service = MockBrokerService { state: Arc::clone(&state) };
        let (health, health_service) = tonic_health::server::health_reporter();
        health.set_service_status("", tonic_health::ServingStatus::Serving).await;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let incoming = UnixListenerStream::new(listener);
        tokio::spawn(async move {
            let result = Server::builder()
                .add_service(health_service)
                .add_service(CryptoBrokerServer::new(broker_service))
                .serve_with_incoming_shutdown(incoming, async {
                    let _ = shutdown_rx.await;
                })
                .await;

            if let Err(e) = result {
                tracing::error!("Mock broker error: {}", e);
            }
        });

        Ok(Self { state, health, socket_path, shutdown_tx: Some(shutdown_tx) })
    }

    /// Returns the socket path the broker listens on.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sets the value returned by Hash.
    pub fn set_hash_response(&self, hash_value: &str, hash_algorithm: &str) {
        *self.state.hash_response.write() = (hash_value.to_string(), hash_algorithm.to_string());
    }

    /// Sets the base64 DER certificate returned by Sign.
    pub fn set_signed_certificate(&self, base64_der: &str) {
        *self.state.signed_certificate.write() = base64_der.to_string();
    }

    /// Sets the JSON document returned by Benchmark.
    pub fn set_benchmark_results(&self, json: &str) {
        *self.state.benchmark_results.write() = json.to_string();
    }

    /// Fails the next `count` requests with `UNAVAILABLE`.
    pub fn inject_unavailable(&self, count: usize) {
        self.inject_error(Code::Unavailable, count);
    }

    /// Fails the next `count` requests with `code`.
    pub fn inject_error(&self, code: Code, count: usize) {
        self.state.injected_errors.lock().extend(std::iter::repeat_n(code, count));
    }

    /// Delays every request by `millis`.
    pub fn inject_delay(&self, millis: u64) {
        self.state.delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Sets the status reported by the health service.
    pub async fn set_health(&self, status: HealthStatus) {
        let status = match status {
            HealthStatus::Serving => tonic_health::ServingStatus::Serving,
            HealthStatus::NotServing => tonic_health::ServingStatus::NotServing,
            HealthStatus::Unknown => tonic_health::ServingStatus::Unknown,
        };
        self.health.set_service_status("", status).await;
    }

    /// Returns the number of Hash requests received.
    pub fn hash_count(&self) -> usize {
        self.state.hash_count.load(Ordering::SeqCst)
    }

    /// Returns the number of Sign requests received.
    pub fn sign_count(&self) -> usize {
        self.state.sign_count.load(Ordering::SeqCst)
    }

    /// Returns the number of Benchmark requests received.
    pub fn benchmark_count(&self) -> usize {
        self.state.benchmark_count.load(Ordering::SeqCst)
    }

    /// Returns the number of FakeEndpoint requests received.
    pub fn fake_endpoint_count(&self) -> usize {
        self.state.fake_endpoint_count.load(Ordering::SeqCst)
    }

    /// Returns the metadata of the most recent request.
    pub fn last_metadata(&self) -> Option<BrokerMetadata> {
        self.state.last_metadata.read().clone().map(BrokerMetadata::from)
    }

    /// Returns the most recent sign request as received on the wire.
    pub fn last_sign_request(&self) -> Option<proto::SignRequest> {
        self.state.last_sign_request.read().clone()
    }

    /// Shuts down the server gracefully.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}

impl Drop for MockBroker {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Mock CryptoBroker Implementation
// =============================================================================

struct MockBrokerService {
    state: Arc<MockState>,
}

#[tonic::async_trait]
impl CryptoBroker for MockBrokerService {
    async fn hash(
        &self,
        request: Request<proto::HashRequest>,
    ) -> Result<Response<proto::HashResponse>, Status> {
        self.state.hash_count.fetch_add(1, Ordering::SeqCst);
        let req = request.into_inner();
        self.state.check_injection(req.metadata.as_ref()).await?;

        if req.profile.is_empty() {
            return Err(Status::invalid_argument("profile must not be empty"));
        }

        let (hash_value, hash_algorithm) = self.state.hash_response.read().clone();
        Ok(Response::new(proto::HashResponse {
            hash_value,
            hash_algorithm,
            metadata: req.metadata,
        }))
    }

    async fn sign(
        &self,
        request: Request<proto::SignRequest>,
    ) -> Result<Response<proto::SignResponse>, Status> {
        self.state.sign_count.fetch_add(1, Ordering::SeqCst);
        let req = request.into_inner();
        self.state.check_injection(req.metadata.as_ref()).await?;

        if req.profile.is_empty() {
            return Err(Status::invalid_argument("profile must not be empty"));
        }

        let metadata = req.metadata.clone();
        *self.state.last_sign_request.write() = Some(req);

        let signed_certificate = self.state.signed_certificate.read().clone();
        Ok(Response::new(proto::SignResponse { signed_certificate, metadata }))
    }

    async fn benchmark(
        &self,
        request: Request<proto::BenchmarkRequest>,
    ) -> Result<Response<proto::BenchmarkResponse>, Status> {
        self.state.benchmark_count.fetch_add(1, Ordering::SeqCst);
        let req = request.into_inner();
        self.state.check_injection(req.metadata.as_ref()).await?;

        let benchmark_results = self.state.benchmark_results.read().clone();
        Ok(Response::new(proto::BenchmarkResponse { benchmark_results, metadata: req.metadata }))
    }

    async fn fake_endpoint(
        &self,
        request: Request<proto::FakeEndpointRequest>,
    ) -> Result<Response<proto::FakeEndpointResponse>, Status> {
        self.state.fake_endpoint_count.fetch_add(1, Ordering::SeqCst);
        let req = request.into_inner();
        self.state.check_injection(req.metadata.as_ref()).await?;

        Ok(Response::new(proto::FakeEndpointResponse { metadata: req.metadata }))
    }
}
