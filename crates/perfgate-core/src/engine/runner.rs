use crate::errors::ProbeError;
use crate::model::{format_number, ActualValue, Classification, MetricSample, ProbeSpec};
use crate::probes::{Measurement, RegisteredProbe};
use crate::store::DataStore;
use crate::thresholds::classify;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Executes a single probe and turns whatever happens into a `MetricSample`.
///
/// Errors and timeouts become CRITICAL samples; a missing capability becomes
/// an informational PASSED sample. Nothing is propagated to the caller.
#[derive(Debug, Clone)]
pub struct ProbeRunner {
    timeout: Duration,
}

impl Default for ProbeRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl ProbeRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn run(&self, entry: &RegisteredProbe, store: &dyn DataStore) -> MetricSample {
        let name = entry.name();
        debug!(probe = name, store = store.name(), "probe started");

        let started = Instant::now();
        let result = match timeout(self.timeout, entry.probe.execute(store)).await {
            Ok(res) => res,
            Err(_) => Err(ProbeError::Timeout(
                self.timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            )),
        };
        let duration_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;

        let sample = match result {
            Ok(m) => measured_sample(name, &entry.spec, m, duration_ms),
            Err(e) => error_sample(name, &entry.spec, &e, duration_ms),
        };

        match sample.classification {
            Classification::Passed | Classification::Warning => info!(
                probe = name,
                status = %sample.classification,
                actual = %sample.actual_value,
                "probe finished"
            ),
            Classification::Failed | Classification::Critical => warn!(
                probe = name,
                status = %sample.classification,
                message = %sample.message,
                "probe finished"
            ),
        }
        sample
    }
}

fn with_unit(v: f64, spec: &ProbeSpec) -> String {
    format!("{}{}", format_number(v), spec.unit.suffix())
}

pub(crate) fn measured_sample(
    name: &str,
    spec: &ProbeSpec,
    m: Measurement,
    duration_ms: u64,
) -> MetricSample {
    if !m.value.is_finite() {
        return base_sample(
            name,
            spec,
            ActualValue::Unavailable,
            Classification::Critical,
            format!("{}: measurement unavailable", name),
            duration_ms,
        );
    }

    let classification = classify(m.value, spec);
    let cmp = if spec.higher_is_better { ">=" } else { "<=" };
    let mut message = format!(
        "{}: {} (expected {} {})",
        name,
        with_unit(m.value, spec),
        cmp,
        with_unit(spec.threshold, spec)
    );
    if let Some(note) = m.note {
        message.push_str("; ");
        message.push_str(&note);
    }
    base_sample(
        name,
        spec,
        ActualValue::Value(m.value),
        classification,
        message,
        duration_ms,
    )
}

/// Sample for a probe that produced no value.
pub fn error_sample(
    name: &str,
    spec: &ProbeSpec,
    err: &ProbeError,
    duration_ms: u64,
) -> MetricSample {
    match err {
        ProbeError::NotApplicable(detail) => {
            let mut s = base_sample(
                name,
                spec,
                ActualValue::NotApplicable,
                Classification::Passed,
                format!("{}: not applicable ({})", name, detail),
                duration_ms,
            );
            s.informational = true;
            s
        }
        ProbeError::Measurement(_) | ProbeError::Timeout(_) => base_sample(
            name,
            spec,
            ActualValue::Error,
            Classification::Critical,
            format!("{}: {}", name, err),
            duration_ms,
        ),
    }
}

fn base_sample(
    name: &str,
    spec: &ProbeSpec,
    actual_value: ActualValue,
    classification: Classification,
    message: String,
    duration_ms: u64,
) -> MetricSample {
    MetricSample {
        name: name.to_string(),
        actual_value,
        threshold: spec.threshold,
        warn_factor: spec.warn_factor,
        critical_factor: spec.critical_factor,
        higher_is_better: spec.higher_is_better,
        unit: spec.unit,
        classification,
        message,
        duration_ms,
        informational: false,
    }
}
