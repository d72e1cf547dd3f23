//! Prometheus metrics for monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Metrics collector.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Tool calls
    pub tool_calls: AtomicU64,
    /// Tool calls that returned an error result
    pub tool_failures: AtomicU64,
    /// Requests sent to Microsoft Graph
    pub graph_requests: AtomicU64,
    /// Graph responses with a non-success status
    pub graph_errors: AtomicU64,
    /// Token requests sent to the identity platform
    pub token_acquisitions: AtomicU64,
}

impl Metrics {
    /// Create a new metrics collector.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Increment tool calls.
    pub fn inc_tool_calls(&self) {
        self.tool_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment failed tool calls.
    pub fn inc_tool_failures(&self) {
        self.tool_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment Graph requests.
    pub fn inc_graph_requests(&self) {
        self.graph_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment Graph errors.
    pub fn inc_graph_errors(&self) {
        self.graph_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment token acquisitions.
    pub fn inc_token_acquisitions(&self) {
        self.token_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tool_calls: self.tool_calls.load(Ordering::Relaxed),
            tool_failures: self.tool_failures.load(Ordering::Relaxed),
            graph_requests: self.graph_requests.load(Ordering::Relaxed),
            graph_errors: self.graph_errors.load(Ordering::Relaxed),
            token_acquisitions: self.token_acquisitions.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        format!(
            r#"# HELP entraid_mcp_tool_calls_total Tool calls
# TYPE entraid_mcp_tool_calls_total counter
entraid_mcp_tool_calls_total {}

# HELP entraid_mcp_tool_failures_total Tool calls returning an error result
# TYPE entraid_mcp_tool_failures_total counter
entraid_mcp_tool_failures_total {}

# HELP entraid_mcp_graph_requests_total Requests sent to Microsoft Graph
# TYPE entraid_mcp_graph_requests_total counter
entraid_mcp_graph_requests_total {}

# HELP entraid_mcp_graph_errors_total Microsoft Graph error responses
# TYPE entraid_mcp_graph_errors_total counter
entraid_mcp_graph_errors_total {}

# HELP entraid_mcp_token_acquisitions_total Access tokens requested
# TYPE entraid_mcp_token_acquisitions_total counter
entraid_mcp_token_acquisitions_total {}
"#,
            s.tool_calls, s.tool_failures, s.graph_requests, s.graph_errors, s.token_acquisitions
        )
    }
}

/// Metrics snapshot.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub tool_calls: u64,
    pub tool_failures: u64,
    pub graph_requests: u64,
    pub graph_errors: u64,
    pub token_acquisitions: u64,
}

/// Timer for measuring durations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.inc_tool_calls();
        metrics.inc_tool_calls();
        metrics.inc_tool_failures();
        metrics.inc_graph_requests();
        metrics.inc_token_acquisitions();

        let s = metrics.snapshot();
        assert_eq!(s.tool_calls, 2);
        assert_eq!(s.tool_failures, 1);
        assert_eq!(s.graph_requests, 1);
        assert_eq!(s.graph_errors, 0);
        assert_eq!(s.token_acquisitions, 1);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.inc_graph_errors();

        let text = metrics.to_prometheus();
        assert!(text.contains("# TYPE entraid_mcp_graph_errors_total counter"));
        assert!(text.contains("entraid_mcp_graph_errors_total 1"));
        assert!(text.contains("entraid_mcp_tool_calls_total 0"));
    }
}
