// Metrics hooks for the `matcher` crate.
//
// Callers install a global `ReportMetrics` implementation via
// [`set_report_metrics`]; every call to [`crate::generate_report`] then reports
// its latency, record count and warning count. This keeps instrumentation
// decoupled from any specific metrics backend.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

/// Metrics observer for report generation.
pub trait ReportMetrics: Send + Sync {
    /// Record the outcome of one report.
    ///
    /// `records` counts similarity records over all modalities; `warnings`
    /// counts everything the report had to skip.
    fn record_report(&self, artifact_id: &str, latency: Duration, records: usize, warnings: usize);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn ReportMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn ReportMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn ReportMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global report metrics recorder.
pub fn set_report_metrics(recorder: Option<Arc<dyn ReportMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
