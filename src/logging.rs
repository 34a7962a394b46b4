//! Structured `task`/`audit`/`security` logging keyed by trace-id. The default
//! [`LogSink`] implementation fans events out through `tracing`: a global
//! subscriber installed once at process start, `trace_id` carried as a
//! structured field on every event, and the stream name carried in the event's
//! `target` so a downstream collector can split `task`/`audit`/ `security`
//! without parsing message text.

use crate::collaborators::LogSink;
use serde_json::Value;
use tracing::{event, Level};
use uuid::Uuid;

/// Installs the process-wide `tracing` subscriber. Call once from `main`.
///
/// Honors `RUST_LOG` via `EnvFilter`, defaulting to `info` when unset.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// `tracing`-backed [`LogSink`]. Stateless; safe to share behind an `Arc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn task(&self, trace_id: Uuid, action: &str, fields: Value) {
        event!(
            target: "agentflow_core::log::task",
            Level::INFO,
            trace_id = %trace_id,
            action,
            fields = %fields,
        );
    }

    fn audit(&self, trace_id: Uuid, action: &str, fields: Value) {
        event!(
            target: "agentflow_core::log::audit",
            Level::INFO,
            trace_id = %trace_id,
            action,
            fields = %fields,
        );
    }

    fn security(&self, trace_id: Uuid, action: &str, fields: Value) {
        event!(
            target: "agentflow_core::log::security",
            Level::WARN,
            trace_id = %trace_id,
            action,
            fields = %fields,
        );
    }
}
