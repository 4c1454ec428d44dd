//! Funnel analytics as a single narrow capability. Emission is
//! fire-and-forget: a sink must never block or fail a wizard transition.

use serde_json::Value;

pub trait AnalyticsSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

/// Default sink: structured log lines, picked up by whatever ships logs.
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn emit(&self, event: &str, payload: Value) {
        tracing::info!(event, %payload, "analytics");
    }
}
