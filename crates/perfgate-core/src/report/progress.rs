//! Progress reporting for a validation run. The orchestrator emits one event
//! per finished probe, in completion order; the CLI consumes them via a sink.

use std::sync::Arc;

/// One progress update: probes done so far, total, and the probe that just finished.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
    pub probe: String,
}

/// Sink for progress events. Called from the orchestrator task, never concurrently
/// for the same run.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

#[must_use]
pub fn format_progress_line(ev: &ProgressEvent) -> String {
    format!("Probe {}/{} done ({})", ev.done, ev.total, ev.probe)
}

/// Prints progress lines to stderr. `None` for single-probe runs.
pub fn stderr_progress_sink(total: usize) -> Option<ProgressSink> {
    if total <= 1 {
        return None;
    }
    Some(Arc::new(|ev: ProgressEvent| {
        eprintln!("{}", format_progress_line(&ev));
    }))
}
