//! Machine-readable report artifact.

use crate::model::{ActualValue, Classification, MetricSample};
use crate::report::{Grade, ValidationReport};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current schema version of the JSON artifact.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportArtifact {
    #[serde(default = "schema_version_default")]
    pub schema_version: u32,
    pub timestamp: String,
    #[serde(default)]
    pub store: String,
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub critical: usize,
    pub success_rate: u32,
    pub grade: Grade,
    pub healthy: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    pub tests: Vec<TestEntry>,
}

fn schema_version_default() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEntry {
    pub name: String,
    pub status: Classification,
    pub message: String,
    pub actual_value: ActualValue,
    pub threshold: f64,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub informational: bool,
}

impl From<&MetricSample> for TestEntry {
    fn from(s: &MetricSample) -> Self {
        Self {
            name: s.name.clone(),
            status: s.classification,
            message: s.message.clone(),
            actual_value: s.actual_value,
            threshold: s.threshold,
            duration_ms: s.duration_ms,
            informational: s.informational,
        }
    }
}

impl From<&ValidationReport> for ReportArtifact {
    fn from(r: &ValidationReport) -> Self {
        let t = r.totals();
        Self {
            schema_version: SCHEMA_VERSION,
            timestamp: r.timestamp().to_string(),
            store: r.store().to_string(),
            total_tests: r.total_tests(),
            passed: t.passed,
            failed: t.failed,
            warnings: t.warnings,
            critical: t.critical,
            success_rate: r.success_rate(),
            grade: r.grade(),
            healthy: r.is_healthy(),
            cancelled: r.is_cancelled(),
            skipped: r.skipped().to_vec(),
            tests: r.samples().iter().map(TestEntry::from).collect(),
        }
    }
}

pub fn to_json_string(report: &ValidationReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&ReportArtifact::from(report))?)
}

pub fn write_json(report: &ValidationReport, out: &Path) -> anyhow::Result<()> {
    let body = to_json_string(report)?;
    std::fs::write(out, body)
        .with_context(|| format!("failed to write report '{}'", out.display()))?;
    Ok(())
}

pub fn read_json(path: &Path) -> anyhow::Result<ReportArtifact> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse report '{}'", path.display()))
}
