//! Main `CryptoBrokerClient` implementation.
//!
//! Provides the high-level API for the crypto broker, orchestrating the Unix
//! socket connection, readiness verification, metadata generation and retry
//! logic.

use std::{future::Future, path::Path, sync::Arc};

use cryptobroker_proto::proto::{
    self, crypto_broker_client::CryptoBrokerClient as BrokerServiceClient,
};
use snafu::ResultExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tonic_health::pb::{
    HealthCheckRequest, health_check_response::ServingStatus, health_client::HealthClient,
};
use tracing::{debug, info, warn};

use crate::{
    certificate::{SignOptions, encode_certificate},
    config::{ClientConfig, ReadinessStrategy},
    connection::{BrokerConnection, ConnectionState},
    error::{
        BenchmarkDecodeSnafu, CancelledSnafu, ClosedSnafu, ReadinessTimeoutSnafu, Result, SdkError,
    },
    metadata::RequestMetadata,
    payload::{
        BenchmarkPayload, BenchmarkReport, BenchmarkResult, FakeEndpointOutput,
        FakeEndpointPayload, HashOutput, HashPayload, HealthStatus, SignOutput, SignPayload,
    },
    readiness::{probe_until_ok, wait_for_ready},
    retry::with_retry_cancellable,
};

/// Profile of the canary request issued by the probe-call readiness strategy.
const CANARY_PROFILE: &str = "Default";

/// Input of the canary request.
const CANARY_INPUT: &[u8] = b"Hello world";

/// Client for the local crypto broker.
///
/// Cheap to clone: clones share one HTTP/2 connection over the broker socket and
/// can be used from many tasks at once.
///
/// # Example
///
/// ```no_run
/// # use cryptobroker_sdk::{ClientConfig, CryptoBrokerClient, HashPayload};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CryptoBrokerClient::connect(ClientConfig::from_env()?).await?;
///
/// let payload = HashPayload::builder().profile("Default").input(b"Hello world").build();
/// let output = client.hash(payload).await?;
/// println!("{} ({})", output.hash_value, output.hash_algorithm);
///
/// client.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CryptoBrokerClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    config: ClientConfig,
    connection: BrokerConnection,
}

impl CryptoBrokerClient {
    /// Connects to the broker and waits until the connection is ready.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The connection does not become ready within `readiness_timeout`
    ///   (`ReadinessTimeout`)
    /// - Every canary probe fails under the probe-call strategy (`Unreachable`)
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        Self::connect_with_token(config, &CancellationToken::new()).await
    }

    /// Connects to the broker, aborting the readiness wait when `token` fires.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Cancelled` if the token is cancelled before the
    /// connection is ready, plus everything [`connect`](Self::connect) returns.
    pub async fn connect_with_token(
        config: ClientConfig,
        token: &CancellationToken,
    ) -> Result<Self> {
        config.validate()?;
        let connection = BrokerConnection::new(&config);

        if let Err(e) = verify_readiness(&config, &connection, token).await {
            connection.release();
            warn!(
                socket = %config.socket_path().display(),
                error = %e,
                "broker connection not ready"
            );
            return Err(e);
        }

        info!(socket = %config.socket_path().display(), "connected to crypto broker");
        Ok(Self { inner: Arc::new(ClientInner { config, connection }) })
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the broker socket path.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        self.inner.connection.socket_path()
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    // =========================================================================
    // Hash
    // =========================================================================

    /// Hashes `payload.input` with the algorithm of `payload.profile`.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Rpc` for broker errors such as an unknown profile,
    /// `SdkError::RetryExhausted` if the broker stays unavailable, and
    /// `SdkError::Closed` after [`close`](Self::close).
    pub async fn hash(&self, payload: HashPayload) -> Result<HashOutput> {
        self.hash_with_token(payload, &CancellationToken::new()).await
    }

    /// Like [`hash`](Self::hash) with a per-request cancellation token.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Cancelled` if the token is cancelled.
    pub async fn hash_with_token(
        &self,
        payload: HashPayload,
        token: &CancellationToken,
    ) -> Result<HashOutput> {
        self.check_open(token)?;

        let request = proto::HashRequest {
            profile: payload.profile,
            input: payload.input,
            metadata: Some(self.request_metadata(payload.metadata).into_proto()),
        };

        let response = self
            .call("hash", token, |mut client| {
                let request = request.clone();
                async move { client.hash(request).await }
            })
            .await?;

        Ok(HashOutput::from(response))
    }

    // =========================================================================
    // Sign
    // =========================================================================

    /// Signs a CSR with the configured default [`SignOptions`].
    ///
    /// # Errors
    ///
    /// Returns `SdkError::InvalidPayload` for non-UTF-8 PEM input or an
    /// unrepresentable validity, `SdkError::CertificateDecode` if the broker's
    /// certificate is not valid base64, and broker errors as for
    /// [`hash`](Self::hash).
    pub async fn sign(&self, payload: SignPayload) -> Result<SignOutput> {
        self.sign_with_token(payload, self.inner.config.sign_options(), &CancellationToken::new())
            .await
    }

    /// Signs a CSR with explicit options.
    ///
    /// # Errors
    ///
    /// Same as [`sign`](Self::sign).
    pub async fn sign_with_options(
        &self,
        payload: SignPayload,
        options: SignOptions,
    ) -> Result<SignOutput> {
        self.sign_with_token(payload, options, &CancellationToken::new()).await
    }

    /// Like [`sign_with_options`](Self::sign_with_options) with a per-request
    /// cancellation token.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Cancelled` if the token is cancelled.
    pub async fn sign_with_token(
        &self,
        mut payload: SignPayload,
        options: SignOptions,
        token: &CancellationToken,
    ) -> Result<SignOutput> {
        self.check_open(token)?;

        let metadata = self.request_metadata(payload.metadata.take());
        let request = payload.into_proto(metadata, self.inner.config.clock().as_ref())?;

        let response = self
            .call("sign", token, |mut client| {
                let request = request.clone();
                async move { client.sign(request).await }
            })
            .await?;

        let encoding = options.output_encoding;
        Ok(SignOutput {
            signed_certificate: encode_certificate(response.signed_certificate, encoding)?,
            encoding,
            metadata: response.metadata.map(Into::into),
        })
    }

    // =========================================================================
    // Benchmark
    // =========================================================================

    /// Runs the broker's built-in benchmarks.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::BenchmarkDecode` if the embedded results are not valid
    /// JSON, and broker errors as for [`hash`](Self::hash).
    pub async fn benchmark(&self, payload: BenchmarkPayload) -> Result<Vec<BenchmarkResult>> {
        self.benchmark_with_token(payload, &CancellationToken::new()).await
    }

    /// Like [`benchmark`](Self::benchmark) with a per-request cancellation token.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Cancelled` if the token is cancelled.
    pub async fn benchmark_with_token(
        &self,
        payload: BenchmarkPayload,
        token: &CancellationToken,
    ) -> Result<Vec<BenchmarkResult>> {
        self.check_open(token)?;

        let request = proto::BenchmarkRequest {
            metadata: Some(self.request_metadata(payload.metadata).into_proto()),
        };

        let response = self
            .call("benchmark", token, |mut client| {
                let request = request.clone();
                async move { client.benchmark(request).await }
            })
            .await?;

        let report: BenchmarkReport =
            serde_json::from_str(&response.benchmark_results).context(BenchmarkDecodeSnafu)?;
        Ok(report.results)
    }

    // =========================================================================
    // Fake endpoint
    // =========================================================================

    /// Makes a round trip through the broker that performs no work.
    ///
    /// The broker echoes the request metadata, including any trace context, which
    /// makes this useful for measuring transport latency.
    ///
    /// # Errors
    ///
    /// Returns broker errors as for [`hash`](Self::hash).
    pub async fn fake_endpoint(&self, payload: FakeEndpointPayload) -> Result<FakeEndpointOutput> {
        self.fake_endpoint_with_token(payload, &CancellationToken::new()).await
    }

    /// Like [`fake_endpoint`](Self::fake_endpoint) with a per-request cancellation
    /// token.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Cancelled` if the token is cancelled.
    pub async fn fake_endpoint_with_token(
        &self,
        payload: FakeEndpointPayload,
        token: &CancellationToken,
    ) -> Result<FakeEndpointOutput> {
        self.check_open(token)?;

        let request = proto::FakeEndpointRequest {
            metadata: Some(self.request_metadata(payload.metadata).into_proto()),
        };

        let response = self
            .call("fake_endpoint", token, |mut client| {
                let request = request.clone();
                async move { client.fake_endpoint(request).await }
            })
            .await?;

        Ok(FakeEndpointOutput::from(response))
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Queries the broker's standard gRPC health service.
    ///
    /// Never fails: transport errors, exhausted probes, unrecognised statuses and
    /// calls after [`close`](Self::close) all report [`HealthStatus::Unknown`].
    pub async fn health(&self) -> HealthStatus {
        self.health_with_token(&CancellationToken::new()).await
    }

    /// Like [`health`](Self::health) with a cancellation token. A cancelled check
    /// reports [`HealthStatus::Unknown`].
    pub async fn health_with_token(&self, token: &CancellationToken) -> HealthStatus {
        let connection = &self.inner.connection;
        let channel = match connection.channel() {
            Ok(channel) => channel,
            Err(e) => {
                debug!(error = %e, "health check without a usable connection");
                return HealthStatus::Unknown;
            },
        };

        let probe = probe_until_ok(self.inner.config.health_probe(), token, "health", || {
            let mut client = HealthClient::new(channel.clone());
            async move {
                let response = client.check(HealthCheckRequest { service: String::new() }).await?;
                Ok::<_, SdkError>(response.into_inner().status)
            }
        });

        let result = tokio::select! {
            biased;
            () = connection.closed().cancelled() => ClosedSnafu.fail(),
            result = probe => result,
        };

        match result {
            Ok(status) => {
                let status = health_status(status);
                if status != HealthStatus::Serving {
                    warn!(status = %status, "crypto broker reports degraded health");
                }
                status
            },
            Err(e) => {
                warn!(error = %e, "crypto broker health check failed");
                HealthStatus::Unknown
            },
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Closes the connection.
    ///
    /// Affects every clone. In-flight calls fail with `SdkError::Closed`; later
    /// calls fail the same way and [`health`](Self::health) reports
    /// [`HealthStatus::Unknown`].
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Closed` if the client is already closed and
    /// `SdkError::NotConnected` if no connection was ever established.
    pub fn close(&self) -> Result<()> {
        self.inner.connection.close()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check_open(&self, token: &CancellationToken) -> Result<()> {
        if self.inner.connection.is_closed() {
            return ClosedSnafu.fail();
        }
        if token.is_cancelled() {
            return CancelledSnafu.fail();
        }
        Ok(())
    }

    fn request_metadata(&self, supplied: Option<RequestMetadata>) -> RequestMetadata {
        supplied.unwrap_or_else(|| {
            RequestMetadata::generate(
                self.inner.config.clock().as_ref(),
                self.inner.config.id_generator().as_ref(),
            )
        })
    }

    /// Issues a unary broker call with retry, aborting with `Closed` if the
    /// client is closed mid-flight.
    async fn call<F, Fut, T>(&self, method: &str, token: &CancellationToken, rpc: F) -> Result<T>
    where
        F: Fn(BrokerServiceClient<Channel>) -> Fut,
        Fut: Future<Output = std::result::Result<tonic::Response<T>, tonic::Status>>,
    {
        let connection = &self.inner.connection;
        let attempts =
            with_retry_cancellable(self.inner.config.retry_policy(), token, method, || {
                let call =
                    connection.channel().map(|channel| rpc(BrokerServiceClient::new(channel)));
                async move { Ok::<_, SdkError>(call?.await?.into_inner()) }
            });

        tokio::select! {
            biased;
            () = connection.closed().cancelled() => ClosedSnafu.fail(),
            result = attempts => result,
        }
    }

    /// Creates a client whose connection was never established.
    #[cfg(test)]
    pub(crate) fn unconnected(config: ClientConfig) -> Self {
        let connection = BrokerConnection::new(&config);
        Self { inner: Arc::new(ClientInner { config, connection }) }
    }
}

/// Brings a fresh connection to ready using the configured strategy.
async fn verify_readiness(
    config: &ClientConfig,
    connection: &BrokerConnection,
    token: &CancellationToken,
) -> Result<()> {
    if token.is_cancelled() {
        return CancelledSnafu.fail();
    }

    let window = config.readiness_timeout();

    match config.readiness() {
        ReadinessStrategy::StatePoll { reconnect_backoff } => {
            wait_for_ready(connection, *reconnect_backoff, window, token).await
        },
        ReadinessStrategy::ProbeCall(policy) => {
            let deadline = Instant::now() + window;
            connection.attach_lazy();

            // Each canary is a separate broker call and carries its own metadata
            let probe = probe_until_ok(policy, token, "readiness canary", || {
                let metadata = RequestMetadata::generate(
                    config.clock().as_ref(),
                    config.id_generator().as_ref(),
                );
                let request = proto::HashRequest {
                    profile: CANARY_PROFILE.to_string(),
                    input: CANARY_INPUT.to_vec(),
                    metadata: Some(metadata.into_proto()),
                };
                async move {
                    let mut client = BrokerServiceClient::new(connection.channel()?);
                    client.hash(request).await?;
                    Ok::<_, SdkError>(())
                }
            });

            tokio::select! {
                biased;
                result = probe => result?,
                () = tokio::time::sleep_until(deadline) => {
                    return ReadinessTimeoutSnafu {
                        duration_ms: window.as_millis() as u64,
                        state: connection.state(),
                    }
                    .fail();
                }
            }

            connection.mark_ready();
            Ok(())
        },
    }
}

fn health_status(status: i32) -> HealthStatus {
    match ServingStatus::try_from(status) {
        Ok(ServingStatus::Serving) => HealthStatus::Serving,
        Ok(ServingStatus::NotServing) => HealthStatus::NotServing,
        _ => HealthStatus::Unknown,
    }
}
