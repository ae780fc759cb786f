pub mod console;
pub mod json;
pub mod junit;
pub mod progress;

use crate::model::{Classification, MetricSample};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse overall health label, worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Critical => "CRITICAL",
            Grade::Poor => "POOR",
            Grade::Fair => "FAIR",
            Grade::Good => "GOOD",
            Grade::Excellent => "EXCELLENT",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running counts. A CRITICAL sample counts as both `failed` and `critical`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub critical: usize,
}

impl Totals {
    fn record(&mut self, c: Classification) {
        match c {
            Classification::Passed => self.passed += 1,
            Classification::Warning => self.warnings += 1,
            Classification::Failed => self.failed += 1,
            Classification::Critical => {
                self.failed += 1;
                self.critical += 1;
            }
        }
    }
}

/// All samples from one orchestration run plus derived totals.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    timestamp: String,
    store: String,
    samples: Vec<MetricSample>,
    totals: Totals,
    skipped: Vec<String>,
}

impl ValidationReport {
    pub fn new(store: impl Into<String>) -> Self {
        Self::with_timestamp(store, chrono::Utc::now().to_rfc3339())
    }

    pub fn with_timestamp(store: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            store: store.into(),
            samples: Vec::new(),
            totals: Totals::default(),
            skipped: Vec::new(),
        }
    }

    pub fn add(&mut self, sample: MetricSample) {
        self.totals.record(sample.classification);
        self.samples.push(sample);
    }

    /// Records probes that never started because the run was cancelled.
    pub(crate) fn mark_skipped(&mut self, names: Vec<String>) {
        self.skipped = names;
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    pub fn sample(&self, name: &str) -> Option<&MetricSample> {
        self.samples.iter().find(|s| s.name == name)
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn total_tests(&self) -> usize {
        self.samples.len()
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn is_cancelled(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn success_rate(&self) -> u32 {
        let denom = self.totals.passed + self.totals.failed;
        if denom == 0 {
            return 0;
        }
        (self.totals.passed as f64 / denom as f64 * 100.0).round() as u32
    }

    pub fn grade(&self) -> Grade {
        if self.totals.critical > 0 {
            return Grade::Critical;
        }
        match self.success_rate() {
            r if r >= 90 => Grade::Excellent,
            r if r >= 80 => Grade::Good,
            r if r >= 70 => Grade::Fair,
            _ => Grade::Poor,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.totals.critical == 0 && self.totals.failed == 0
    }

    pub fn render(&self) -> String {
        console::render_text(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{ActualValue, Unit};

    pub(crate) fn sample(name: &str, c: Classification) -> MetricSample {
        MetricSample {
            name: name.to_string(),
            actual_value: ActualValue::Value(1.0),
            threshold: 1.0,
            warn_factor: 1.5,
            critical_factor: 2.0,
            higher_is_better: false,
            unit: Unit::Millis,
            classification: c,
            message: format!("{}: message", name),
            duration_ms: 1,
            informational: false,
        }
    }

    fn report_of(counts: &[(Classification, usize)]) -> ValidationReport {
        let mut r = ValidationReport::with_timestamp("test", "2026-01-01T00:00:00Z");
        let mut i = 0;
        for (c, n) in counts {
            for _ in 0..*n {
                r.add(sample(&format!("p{}", i), *c));
                i += 1;
            }
        }
        r
    }

    #[test]
    fn critical_counts_as_failure_too() {
        let r = report_of(&[(Classification::Critical, 1)]);
        assert_eq!(
            r.totals(),
            Totals {
                passed: 0,
                failed: 1,
                warnings: 0,
                critical: 1
            }
        );
    }

    #[test]
    fn ninety_percent_is_excellent() {
        let r = report_of(&[(Classification::Passed, 9), (Classification::Failed, 1)]);
        assert_eq!(r.success_rate(), 90);
        assert_eq!(r.grade(), Grade::Excellent);
        assert!(!r.is_healthy());
    }

    #[test]
    fn single_critical_forces_critical_grade() {
        let r = report_of(&[(Classification::Passed, 99), (Classification::Critical, 1)]);
        assert_eq!(r.success_rate(), 99);
        assert_eq!(r.grade(), Grade::Critical);
    }

    #[test]
    fn only_warnings_gives_zero_rate() {
        let r = report_of(&[(Classification::Warning, 4)]);
        assert_eq!(r.success_rate(), 0);
        assert_eq!(r.grade(), Grade::Poor);
        assert!(r.is_healthy());
    }

    #[test]
    fn grade_bands() {
        let good = report_of(&[(Classification::Passed, 8), (Classification::Failed, 2)]);
        assert_eq!(good.grade(), Grade::Good);
        let fair = report_of(&[(Classification::Passed, 7), (Classification::Failed, 3)]);
        assert_eq!(fair.grade(), Grade::Fair);
        let poor = report_of(&[(Classification::Passed, 6), (Classification::Failed, 4)]);
        assert_eq!(poor.grade(), Grade::Poor);
    }

    #[test]
    fn success_rate_rounds() {
        // 2 / 3 = 66.67
        let r = report_of(&[(Classification::Passed, 2), (Classification::Failed, 1)]);
        assert_eq!(r.success_rate(), 67);
    }

    #[test]
    fn empty_report() {
        let r = report_of(&[]);
        assert_eq!(r.total_tests(), 0);
        assert_eq!(r.success_rate(), 0);
        assert!(r.is_healthy());
        assert!(!r.is_cancelled());
    }
}
