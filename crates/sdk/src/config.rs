//! Client configuration with validation.
//!
//! [`ClientConfig`] is built with a validating builder and carries everything the
//! client needs at construction time: the broker socket path, timeouts, the
//! readiness strategy, retry policies, default sign options, and the clock and id
//! generator used for request metadata.

use std::{
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::{
    certificate::SignOptions,
    error::{ConfigSnafu, InvalidSocketPathSnafu, Result},
    metadata::{Clock, IdGenerator, SystemClock, UuidGenerator},
};

/// File name of the broker socket inside the temp directory.
pub const DEFAULT_SOCKET_FILE: &str = "cryptobroker.sock";

/// Environment variable overriding the broker socket path.
pub const SOCKET_PATH_ENV: &str = "CRYPTOBROKER_SOCKET_PATH";

/// Longest path that fits in `sockaddr_un.sun_path` with its NUL terminator.
const MAX_SOCKET_PATH_BYTES: usize = 107;

/// Default timeout for establishing the socket connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default timeout for a single request.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default window for the connection to become ready.
const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(60);

/// Default pause between connection attempts while waiting for readiness.
const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Returns the default broker socket path: `<temp dir>/cryptobroker.sock`.
#[must_use]
pub fn default_socket_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_SOCKET_FILE)
}

fn default_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

fn default_id_generator() -> Arc<dyn IdGenerator> {
    Arc::new(UuidGenerator)
}

/// Configuration for [`CryptoBrokerClient`](crate::CryptoBrokerClient).
///
/// # Validation Rules
///
/// - `socket_path` must be non-empty, free of NUL bytes and at most 107 bytes
/// - `connect_timeout`, `request_timeout` and `readiness_timeout` must be > 0
/// - `retry_policy` and the probe policies must pass their own validation
///
/// # Example
///
/// ```no_run
/// # use std::time::Duration;
/// # use cryptobroker_sdk::ClientConfig;
/// let config = ClientConfig::builder()
///     .socket_path("/run/cryptobroker/cryptobroker.sock")
///     .readiness_timeout(Duration::from_secs(10))
///     .build()
///     .expect("valid client config");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    socket_path: PathBuf,
    connect_timeout: Duration,
    request_timeout: Duration,
    readiness_timeout: Duration,
    readiness: ReadinessStrategy,
    retry_policy: RetryPolicy,
    health_probe: ProbePolicy,
    sign_options: SignOptions,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
}

#[bon::bon]
impl ClientConfig {
    /// Creates a new client configuration with validation.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::InvalidSocketPath`](crate::SdkError::InvalidSocketPath) for an
    /// unusable socket path and [`SdkError::Config`](crate::SdkError::Config) for any
    /// other out-of-range value.
    #[builder]
    pub fn new(
        #[builder(into, default = default_socket_path())] socket_path: PathBuf,
        #[builder(default = DEFAULT_CONNECT_TIMEOUT)] connect_timeout: Duration,
        #[builder(default = DEFAULT_REQUEST_TIMEOUT)] request_timeout: Duration,
        #[builder(default = DEFAULT_READINESS_TIMEOUT)] readiness_timeout: Duration,
        #[builder(default)] readiness: ReadinessStrategy,
        #[builder(default)] retry_policy: RetryPolicy,
        #[builder(default = ProbePolicy::health())] health_probe: ProbePolicy,
        #[builder(default)] sign_options: SignOptions,
        #[builder(default = default_clock())] clock: Arc<dyn Clock>,
        #[builder(default = default_id_generator())] id_generator: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        let config = Self {
            socket_path,
            connect_timeout,
            request_timeout,
            readiness_timeout,
            readiness,
            retry_policy,
            health_probe,
            sign_options,
            clock,
            id_generator,
        };
        config.validate()?;
        Ok(config)
    }
}

impl ClientConfig {
    /// Builds a configuration from the process environment.
    ///
    /// `CRYPTOBROKER_SOCKET_PATH` overrides the socket path; everything else uses
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the overridden socket path is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Builds a configuration using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the overridden socket path is invalid.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let socket_path = lookup(SOCKET_PATH_ENV)
            .filter(|value| !value.trim().is_empty())
            .map_or_else(default_socket_path, PathBuf::from);
        Self::builder().socket_path(socket_path).build()
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation found.
    pub fn validate(&self) -> Result<()> {
        validate_socket_path(&self.socket_path)?;
        for (name, value) in [
            ("connect_timeout", self.connect_timeout),
            ("request_timeout", self.request_timeout),
            ("readiness_timeout", self.readiness_timeout),
        ] {
            if value.is_zero() {
                return ConfigSnafu { message: format!("{name} must be > 0") }.fail();
            }
        }
        self.readiness.validate()?;
        self.retry_policy.validate()?;
        self.health_probe.validate()
    }

    /// Returns the broker socket path.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Returns the socket connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the window for the connection to become ready.
    #[must_use]
    pub fn readiness_timeout(&self) -> Duration {
        self.readiness_timeout
    }

    /// Returns the readiness strategy.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessStrategy {
        &self.readiness
    }

    /// Returns the transport retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the probe policy used by health checks.
    #[must_use]
    pub fn health_probe(&self) -> &ProbePolicy {
        &self.health_probe
    }

    /// Returns the sign options used by [`sign`](crate::CryptoBrokerClient::sign).
    #[must_use]
    pub fn sign_options(&self) -> SignOptions {
        self.sign_options
    }

    /// Returns the clock used for request metadata.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns the id generator used for request metadata.
    #[must_use]
    pub fn id_generator(&self) -> &Arc<dyn IdGenerator> {
        &self.id_generator
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            readiness: ReadinessStrategy::default(),
            retry_policy: RetryPolicy::default(),
            health_probe: ProbePolicy::health(),
            sign_options: SignOptions::default(),
            clock: default_clock(),
            id_generator: default_id_generator(),
        }
    }
}

fn validate_socket_path(path: &Path) -> Result<()> {
    let bytes = path.as_os_str().as_bytes();
    if bytes.is_empty() {
        return InvalidSocketPathSnafu { path, message: "path is empty" }.fail();
    }
    if bytes.contains(&0) {
        return InvalidSocketPathSnafu { path, message: "path contains a NUL byte" }.fail();
    }
    if bytes.len() > MAX_SOCKET_PATH_BYTES {
        return InvalidSocketPathSnafu {
            path,
            message: format!(
                "path is {} bytes, Unix sockets allow at most {MAX_SOCKET_PATH_BYTES}",
                bytes.len()
            ),
        }
        .fail();
    }
    Ok(())
}

/// How the client decides that a fresh connection is usable.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadinessStrategy {
    /// Trigger connection attempts and watch the connection state until it is
    /// ready, pausing `reconnect_backoff` after each failed attempt.
    StatePoll {
        /// Pause between failed connection attempts.
        reconnect_backoff: Duration,
    },
    /// Issue canary hash requests until one succeeds.
    ProbeCall(ProbePolicy),
}

impl Default for ReadinessStrategy {
    fn default() -> Self {
        Self::StatePoll { reconnect_backoff: DEFAULT_RECONNECT_BACKOFF }
    }
}

impl ReadinessStrategy {
    fn validate(&self) -> Result<()> {
        match self {
            Self::StatePoll { reconnect_backoff } => {
                // A zero backoff would redial a missing socket in a tight loop
                if reconnect_backoff.is_zero() {
                    return ConfigSnafu { message: "readiness.reconnect_backoff must be > 0" }
                        .fail();
                }
                Ok(())
            },
            Self::ProbeCall(policy) => {
                policy.validate()?;
                if policy.delay.is_zero() {
                    return ConfigSnafu { message: "readiness probe delay must be > 0" }.fail();
                }
                Ok(())
            },
        }
    }
}

/// Retry policy for transport-level retries of broker calls.
///
/// Delays grow as `initial_backoff * multiplier^(attempt-1)`, capped at
/// `max_backoff`, with ±`jitter` randomness.
#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    #[builder(default = 5)]
    pub max_attempts: u32,
    /// Delay before the first retry.
    #[builder(default = Duration::from_secs(1))]
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    #[builder(default = Duration::from_secs(10))]
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays.
    #[builder(default = 2.0)]
    pub multiplier: f64,
    /// Fraction of randomness applied to each delay, in `[0, 1]`.
    #[builder(default = 0.2)]
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RetryPolicy {
    /// Returns a policy that makes exactly one attempt.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::builder().max_attempts(1).build()
    }

    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return ConfigSnafu { message: "retry_policy.max_attempts must be >= 1" }.fail();
        }
        if self.multiplier.is_nan() || self.multiplier < 1.0 {
            return ConfigSnafu {
                message: format!("retry_policy.multiplier ({}) must be >= 1.0", self.multiplier),
            }
            .fail();
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return ConfigSnafu {
                message: format!("retry_policy.jitter ({}) must be within [0, 1]", self.jitter),
            }
            .fail();
        }
        if self.initial_backoff > self.max_backoff {
            return ConfigSnafu {
                message: format!(
                    "retry_policy.initial_backoff ({:?}) must not exceed max_backoff ({:?})",
                    self.initial_backoff, self.max_backoff
                ),
            }
            .fail();
        }
        Ok(())
    }
}

/// Bounded probe loop: fixed delay between attempts, each attempt time-boxed.
///
/// Used by the probe-call readiness strategy and by health checks.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct ProbePolicy {
    /// Total probes, including the first.
    #[builder(default = 60)]
    pub max_attempts: u32,
    /// Time box for a single probe.
    #[builder(default = Duration::from_secs(3))]
    pub attempt_timeout: Duration,
    /// Pause between probes.
    #[builder(default = Duration::from_secs(1))]
    pub delay: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ProbePolicy {
    /// Default policy for health checks: three quick probes.
    #[must_use]
    pub fn health() -> Self {
        Self::builder().max_attempts(3).build()
    }

    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return ConfigSnafu { message: "probe max_attempts must be >= 1" }.fail();
        }
        if self.attempt_timeout.is_zero() {
            return ConfigSnafu { message: "probe attempt_timeout must be > 0" }.fail();
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::{certificate::CertificateEncoding, error::SdkError};

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        config.validate().unwrap();

        assert_eq!(config.socket_path(), std::env::temp_dir().join("cryptobroker.sock"));
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.readiness_timeout(), Duration::from_secs(60));
        assert_eq!(
            config.readiness(),
            &ReadinessStrategy::StatePoll { reconnect_backoff: Duration::from_secs(1) }
        );
        assert_eq!(config.sign_options().output_encoding, CertificateEncoding::Pem);
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let built = ClientConfig::builder().build().unwrap();
        let default = ClientConfig::default();

        assert_eq!(built.socket_path(), default.socket_path());
        assert_eq!(built.request_timeout(), default.request_timeout());
        assert_eq!(built.retry_policy(), default.retry_policy());
        assert_eq!(built.health_probe(), default.health_probe());
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_secs(1));
        assert_eq!(policy.max_backoff, Duration::from_secs(10));
        assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_probe_policy() {
        let policy = ProbePolicy::default();
        assert_eq!(policy.max_attempts, 60);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(3));
        assert_eq!(policy.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_empty_socket_path_rejected() {
        let err = ClientConfig::builder().socket_path("").build().unwrap_err();
        assert!(matches!(err, SdkError::InvalidSocketPath { .. }), "got {err:?}");
    }

    #[test]
    fn test_overlong_socket_path_rejected() {
        let path = format!("/tmp/{}.sock", "a".repeat(120));
        let err = ClientConfig::builder().socket_path(path).build().unwrap_err();
        assert!(err.to_string().contains("at most 107"), "got {err}");
    }

    #[test]
    fn test_nul_in_socket_path_rejected() {
        let err = ClientConfig::builder().socket_path("/tmp/broker\0.sock").build().unwrap_err();
        assert!(matches!(err, SdkError::InvalidSocketPath { .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ClientConfig::builder().readiness_timeout(Duration::ZERO).build().unwrap_err();
        assert!(err.to_string().contains("readiness_timeout"));
    }

    #[test]
    fn test_invalid_retry_policy_rejected() {
        let policy = RetryPolicy::builder().max_attempts(0).build();
        assert!(ClientConfig::builder().retry_policy(policy).build().is_err());

        let policy = RetryPolicy::builder().multiplier(0.5).build();
        assert!(ClientConfig::builder().retry_policy(policy).build().is_err());

        let policy = RetryPolicy::builder().jitter(1.5).build();
        assert!(ClientConfig::builder().retry_policy(policy).build().is_err());

        let policy = RetryPolicy::builder()
            .initial_backoff(Duration::from_secs(20))
            .max_backoff(Duration::from_secs(10))
            .build();
        assert!(ClientConfig::builder().retry_policy(policy).build().is_err());
    }

    #[test]
    fn test_invalid_probe_strategy_rejected() {
        let probe = ProbePolicy::builder().max_attempts(0).build();
        let err = ClientConfig::builder()
            .readiness(ReadinessStrategy::ProbeCall(probe))
            .build()
            .unwrap_err();
        assert!(matches!(err, SdkError::Config { .. }));
    }

    #[test]
    fn test_zero_readiness_pause_rejected() {
        let err = ClientConfig::builder()
            .readiness(ReadinessStrategy::StatePoll { reconnect_backoff: Duration::ZERO })
            .build()
            .unwrap_err();
        assert!(matches!(err, SdkError::Config { .. }), "got {err:?}");
        assert!(err.to_string().contains("reconnect_backoff"), "got {err}");

        let probe = ProbePolicy::builder().delay(Duration::ZERO).build();
        let err = ClientConfig::builder()
            .readiness(ReadinessStrategy::ProbeCall(probe))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("probe delay"), "got {err}");

        // Health checks are bounded by their attempt count and may skip the pause
        let health = ProbePolicy::builder().max_attempts(2).delay(Duration::ZERO).build();
        assert!(ClientConfig::builder().health_probe(health).build().is_ok());
    }

    #[test]
    fn test_from_env_overrides_socket_path() {
        let config = ClientConfig::from_env_with(|key| {
            (key == SOCKET_PATH_ENV).then(|| "/run/broker/custom.sock".to_string())
        })
        .unwrap();
        assert_eq!(config.socket_path(), Path::new("/run/broker/custom.sock"));
    }

    #[test]
    fn test_from_env_falls_back_to_default() {
        let config = ClientConfig::from_env_with(|_| None).unwrap();
        assert_eq!(config.socket_path(), default_socket_path());

        let config = ClientConfig::from_env_with(|_| Some("  ".to_string())).unwrap();
        assert_eq!(config.socket_path(), default_socket_path());
    }
}
