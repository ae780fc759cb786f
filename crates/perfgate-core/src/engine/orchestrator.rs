use crate::config::Config;
use crate::engine::cancel::CancellationToken;
use crate::engine::runner::{error_sample, ProbeRunner, DEFAULT_PROBE_TIMEOUT};
use crate::errors::{ConfigError, ProbeError};
use crate::model::{MetricSample, ProbeSpec};
use crate::probes::{Probe, RegisteredProbe};
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::report::ValidationReport;
use crate::store::DataStore;
use crate::thresholds::validate_spec;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

#[derive(Default)]
pub struct OrchestratorBuilder {
    probes: Vec<RegisteredProbe>,
    timeout: Option<Duration>,
    concurrency: Option<usize>,
}

impl OrchestratorBuilder {
    /// Registers a probe with its default thresholds.
    pub fn register(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probes.push(RegisteredProbe::new(probe));
        self
    }

    pub fn register_with_spec(mut self, probe: Arc<dyn Probe>, spec: ProbeSpec) -> Self {
        self.probes.push(RegisteredProbe::with_spec(probe, spec));
        self
    }

    pub fn register_all(mut self, probes: impl IntoIterator<Item = RegisteredProbe>) -> Self {
        self.probes.extend(probes);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = Some(n);
        self
    }

    pub fn build(self) -> Result<Orchestrator, ConfigError> {
        let mut seen = HashSet::new();
        for p in &self.probes {
            if !seen.insert(p.name().to_string()) {
                return Err(ConfigError::DuplicateProbe(p.name().to_string()));
            }
            validate_spec(p.name(), &p.spec)?;
        }

        let concurrency = self.concurrency.unwrap_or(1);
        if concurrency == 0 {
            return Err(ConfigError::InvalidSetting(
                "concurrency must be at least 1".into(),
            ));
        }
        let timeout = self.timeout.unwrap_or(DEFAULT_PROBE_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::InvalidSetting(
                "probe timeout must be greater than 0".into(),
            ));
        }

        Ok(Orchestrator {
            probes: self.probes,
            runner: ProbeRunner::new(timeout),
            concurrency,
        })
    }
}

/// Owns the probe registry and runs it, in registration order, into a report.
///
/// Holds no state between runs.
#[derive(Debug)]
pub struct Orchestrator {
    probes: Vec<RegisteredProbe>,
    runner: ProbeRunner,
    concurrency: usize,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// The default battery with the config's overrides and settings applied.
    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Self::builder()
            .register_all(cfg.resolve_probes()?)
            .timeout(cfg.settings.probe_timeout())
            .concurrency(cfg.settings.concurrency)
            .build()
    }

    pub fn probes(&self) -> &[RegisteredProbe] {
        &self.probes
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.runner.timeout()
    }

    pub async fn run_all(&self, store: Arc<dyn DataStore>) -> ValidationReport {
        self.run_with(store, &CancellationToken::new(), None).await
    }

    /// Runs every probe, at most `concurrency` at a time. Samples are
    /// reported in registration order regardless of completion order.
    ///
    /// The token is checked before each probe starts; once it is set, the
    /// remaining probes are listed as skipped and the partial report is
    /// returned.
    pub async fn run_with(
        &self,
        store: Arc<dyn DataStore>,
        cancel: &CancellationToken,
        progress: Option<ProgressSink>,
    ) -> ValidationReport {
        let total = self.probes.len();
        info!(
            store = store.name(),
            probes = total,
            concurrency = self.concurrency,
            "validation run started"
        );

        let sem = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();
        let mut done: Vec<(usize, MetricSample)> = Vec::with_capacity(total);
        let mut skipped = Vec::new();

        for (index, entry) in self.probes.iter().enumerate() {
            if cancel.is_cancelled() {
                skipped.push(entry.name().to_string());
                continue;
            }
            let permit = match sem.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    skipped.push(entry.name().to_string());
                    continue;
                }
            };
            // A slot may free up only after the token was set.
            if cancel.is_cancelled() {
                skipped.push(entry.name().to_string());
                continue;
            }

            let runner = self.runner.clone();
            let entry = entry.clone();
            let store = store.clone();
            join_set.spawn(async move {
                let _permit = permit;
                let name = entry.name().to_string();
                let spec = entry.spec;
                let task = tokio::spawn(async move { runner.run(&entry, store.as_ref()).await });
                let sample = match task.await {
                    Ok(s) => s,
                    Err(e) => panicked_sample(&name, &spec, e),
                };
                (index, sample)
            });

            while let Some(res) = join_set.try_join_next() {
                collect(res, &mut done, total, progress.as_ref());
            }
        }

        while let Some(res) = join_set.join_next().await {
            collect(res, &mut done, total, progress.as_ref());
        }

        done.sort_by_key(|(i, _)| *i);
        let mut report = ValidationReport::new(store.name());
        for (_, sample) in done {
            report.add(sample);
        }
        if !skipped.is_empty() {
            warn!(skipped = skipped.len(), "validation run cancelled");
            report.mark_skipped(skipped);
        }

        let totals = report.totals();
        info!(
            passed = totals.passed,
            failed = totals.failed,
            warnings = totals.warnings,
            critical = totals.critical,
            grade = %report.grade(),
            "validation run finished"
        );
        report
    }
}

fn panicked_sample(name: &str, spec: &ProbeSpec, e: JoinError) -> MetricSample {
    warn!(probe = name, error = %e, "probe task failed");
    error_sample(
        name,
        spec,
        &ProbeError::Measurement(format!("probe task failed: {}", e)),
        0,
    )
}

fn collect(
    res: Result<(usize, MetricSample), JoinError>,
    done: &mut Vec<(usize, MetricSample)>,
    total: usize,
    progress: Option<&ProgressSink>,
) {
    match res {
        Ok((index, sample)) => {
            let probe = sample.name.clone();
            done.push((index, sample));
            if let Some(sink) = progress {
                sink(ProgressEvent {
                    done: done.len(),
                    total,
                    probe,
                });
            }
        }
        // The outer task only awaits the inner one, so this is not expected.
        Err(e) => warn!(error = %e, "probe wrapper task failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classification, Unit};
    use crate::probes::Measurement;
    use crate::store::{ReplayStore, Snapshot};
    use async_trait::async_trait;

    struct Const {
        name: &'static str,
        value: f64,
    }

    #[async_trait]
    impl Probe for Const {
        fn name(&self) -> &str {
            self.name
        }

        fn default_spec(&self) -> ProbeSpec {
            ProbeSpec::at_most(10.0, Unit::Count)
        }

        async fn execute(&self, _store: &dyn DataStore) -> Result<Measurement, ProbeError> {
            Ok(Measurement::new(self.value))
        }
    }

    struct Panics;

    #[async_trait]
    impl Probe for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        fn default_spec(&self) -> ProbeSpec {
            ProbeSpec::at_most(10.0, Unit::Count)
        }

        async fn execute(&self, _store: &dyn DataStore) -> Result<Measurement, ProbeError> {
            panic!("probe bug");
        }
    }

    fn store() -> Arc<dyn DataStore> {
        Arc::new(ReplayStore::new(Snapshot::default()))
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Orchestrator::builder()
            .register(Arc::new(Const { name: "a", value: 1.0 }))
            .register(Arc::new(Const { name: "a", value: 2.0 }))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateProbe(ref n) if n == "a"));
    }

    #[test]
    fn rejects_invalid_spec() {
        let err = Orchestrator::builder()
            .register_with_spec(
                Arc::new(Const { name: "a", value: 1.0 }),
                ProbeSpec::at_most(-1.0, Unit::Count),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold { .. }));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let err = Orchestrator::builder().concurrency(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting(_)));
    }

    #[test]
    fn from_default_config_has_full_battery() {
        let o = Orchestrator::from_config(&Config::default()).unwrap();
        assert_eq!(o.probes().len(), 13);
        assert_eq!(o.concurrency(), 1);
        assert_eq!(o.timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn panicking_probe_becomes_critical() {
        let o = Orchestrator::builder()
            .register(Arc::new(Const { name: "before", value: 1.0 }))
            .register(Arc::new(Panics))
            .register(Arc::new(Const { name: "after", value: 1.0 }))
            .build()
            .unwrap();
        let report = o.run_all(store()).await;
        assert_eq!(report.total_tests(), 3);
        let s = report.sample("panics").unwrap();
        assert_eq!(s.classification, Classification::Critical);
        assert!(s.message.contains("probe task failed"));
        assert_eq!(report.samples()[2].name, "after");
    }

    #[tokio::test]
    async fn progress_reports_every_probe() {
        let o = Orchestrator::builder()
            .register(Arc::new(Const { name: "a", value: 1.0 }))
            .register(Arc::new(Const { name: "b", value: 1.0 }))
            .build()
            .unwrap();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink: ProgressSink = Arc::new(move |ev: ProgressEvent| {
            sink_seen.lock().unwrap().push((ev.done, ev.total));
        });
        o.run_with(store(), &CancellationToken::new(), Some(sink))
            .await;
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn cancelled_before_start_skips_everything() {
        let o = Orchestrator::builder()
            .register(Arc::new(Const { name: "a", value: 1.0 }))
            .build()
            .unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let report = o.run_with(store(), &token, None).await;
        assert_eq!(report.total_tests(), 0);
        assert!(report.is_cancelled());
        assert_eq!(report.skipped(), ["a".to_string()]);
    }
}
