//! Request metadata and the sources it is generated from.
//!
//! Every outbound request carries a [`RequestMetadata`] for correlation. Callers
//! may supply one (for example to propagate a distributed trace); otherwise the
//! client generates it from the configured [`Clock`] and [`IdGenerator`]. Both are
//! traits so tests can pin the generated values.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use cryptobroker_proto::proto;

/// Source of the current time for request metadata.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Source of unique request identifiers.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Returns a fresh identifier, unique per call.
    fn next_id(&self) -> String;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random version 4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// W3C trace context forwarded to the broker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceContext {
    /// Trace identifier.
    pub trace_id: String,
    /// Parent span identifier.
    pub span_id: String,
    /// Trace flags, e.g. `01` for sampled.
    pub trace_flags: String,
    /// Vendor-specific trace state.
    pub trace_state: String,
}

/// Correlation metadata attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    /// Unique request identifier.
    pub id: String,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// Optional distributed trace context.
    pub trace_context: Option<TraceContext>,
}

impl RequestMetadata {
    /// Creates metadata with the given id and timestamp and no trace context.
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self { id: id.into(), created_at, trace_context: None }
    }

    /// Generates metadata from a clock and id generator.
    pub fn generate(clock: &dyn Clock, ids: &dyn IdGenerator) -> Self {
        Self::new(ids.next_id(), clock.now())
    }

    /// Attaches a trace context.
    #[must_use]
    pub fn with_trace_context(mut self, trace_context: TraceContext) -> Self {
        self.trace_context = Some(trace_context);
        self
    }

    pub(crate) fn into_proto(self) -> proto::Metadata {
        proto::Metadata {
            id: self.id,
            created_at: format_timestamp(self.created_at),
            trace_context: self.trace_context.map(|tc| proto::TraceContext {
                trace_id: tc.trace_id,
                span_id: tc.span_id,
                trace_flags: tc.trace_flags,
                trace_state: tc.trace_state,
            }),
        }
    }
}

/// Formats a timestamp the way the broker expects: RFC 3339, UTC, whole seconds.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Metadata echoed by the broker, passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerMetadata {
    /// Request identifier as seen by the broker.
    pub id: String,
    /// Creation timestamp as reported by the broker.
    pub created_at: String,
    /// Trace context as reported by the broker.
    pub trace_context: Option<TraceContext>,
}

impl From<proto::Metadata> for BrokerMetadata {
    fn from(metadata: proto::Metadata) -> Self {
        Self {
            id: metadata.id,
            created_at: metadata.created_at,
            trace_context: metadata.trace_context.map(|tc| TraceContext {
                trace_id: tc.trace_id,
                span_id: tc.span_id,
                trace_flags: tc.trace_flags,
                trace_state: tc.trace_state,
            }),
        }
    }
}
