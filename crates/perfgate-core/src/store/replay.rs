//! A `DataStore` that serves a recorded snapshot instead of talking to a server.
//!
//! Recorded calls are keyed by collection; filters and pipelines are not
//! matched. Any entry may carry `error` (the call fails with that message)
//! and `delay_ms` (the call sleeps first, useful for timeout checks).

use super::{DataStore, ExplainOutcome, ProfilerSummary, QueryOutcome, ServerMetrics};
use crate::errors::StoreError;
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedCall {
    pub result_count: u64,
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedExplain {
    pub used_index: bool,
    pub docs_examined: u64,
    pub docs_returned: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedMetrics {
    #[serde(flatten)]
    pub metrics: ServerMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedProfiler {
    #[serde(flatten)]
    pub summary: ProfilerSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

/// Snapshot file contents. Unknown top-level keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Snapshot {
    pub name: Option<String>,
    pub queries: BTreeMap<String, RecordedCall>,
    pub aggregates: BTreeMap<String, RecordedCall>,
    pub explain: BTreeMap<String, RecordedExplain>,
    pub server_metrics: Option<RecordedMetrics>,
    /// Absent means the profiler is off.
    pub profiler: Option<RecordedProfiler>,
}

impl Snapshot {
    pub fn with_query(mut self, collection: &str, duration_ms: f64, result_count: u64) -> Self {
        self.queries.insert(
            collection.to_string(),
            RecordedCall {
                result_count,
                duration_ms,
                ..Default::default()
            },
        );
        self
    }

    pub fn with_failing_query(mut self, collection: &str, error: &str) -> Self {
        self.queries.insert(
            collection.to_string(),
            RecordedCall {
                error: Some(error.to_string()),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_slow_query(mut self, collection: &str, delay_ms: u64) -> Self {
        self.queries.insert(
            collection.to_string(),
            RecordedCall {
                duration_ms: delay_ms as f64,
                delay_ms: Some(delay_ms),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_aggregate(mut self, collection: &str, duration_ms: f64, result_count: u64) -> Self {
        self.aggregates.insert(
            collection.to_string(),
            RecordedCall {
                result_count,
                duration_ms,
                ..Default::default()
            },
        );
        self
    }

    pub fn with_explain(
        mut self,
        collection: &str,
        used_index: bool,
        docs_examined: u64,
        docs_returned: u64,
    ) -> Self {
        self.explain.insert(
            collection.to_string(),
            RecordedExplain {
                used_index,
                docs_examined,
                docs_returned,
                ..Default::default()
            },
        );
        self
    }

    pub fn with_server_metrics(mut self, metrics: ServerMetrics) -> Self {
        self.server_metrics = Some(RecordedMetrics {
            metrics,
            ..Default::default()
        });
        self
    }

    pub fn with_profiler(mut self, slow_ops: u64, collection_scans: u64) -> Self {
        self.profiler = Some(RecordedProfiler {
            summary: ProfilerSummary {
                slow_ops,
                collection_scans,
            },
            ..Default::default()
        });
        self
    }

    pub fn with_failing_profiler(mut self, error: &str) -> Self {
        self.profiler = Some(RecordedProfiler {
            error: Some(error.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn with_slow_profiler(mut self, delay_ms: u64) -> Self {
        self.profiler = Some(RecordedProfiler {
            delay_ms: Some(delay_ms),
            ..Default::default()
        });
        self
    }
}

#[derive(Clone)]
pub struct ReplayStore {
    name: String,
    snapshot: Arc<Snapshot>,
}

impl ReplayStore {
    pub fn new(snapshot: Snapshot) -> Self {
        let name = snapshot
            .name
            .clone()
            .unwrap_or_else(|| "replay".to_string());
        Self {
            name,
            snapshot: Arc::new(snapshot),
        }
    }

    /// Loads a snapshot; `.json` files are read as JSON, anything else as YAML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot '{}'", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let snapshot: Snapshot = if is_json {
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse snapshot '{}'", path.display()))?
        } else {
            serde_yaml::from_str(&raw)
                .with_context(|| format!("failed to parse snapshot '{}'", path.display()))?
        };
        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

async fn replay<T>(error: Option<&String>, delay_ms: Option<u64>, value: T) -> Result<T, StoreError> {
    if let Some(ms) = delay_ms {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
    match error {
        Some(msg) => Err(StoreError::Command(msg.clone())),
        None => Ok(value),
    }
}

fn not_recorded(kind: &str, collection: &str) -> StoreError {
    StoreError::Command(format!(
        "no recorded {} for collection '{}'",
        kind, collection
    ))
}

#[async_trait]
impl DataStore for ReplayStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(
        &self,
        collection: &str,
        _filter: &serde_json::Value,
        _limit: Option<u64>,
    ) -> Result<QueryOutcome, StoreError> {
        let call = self
            .snapshot
            .queries
            .get(collection)
            .ok_or_else(|| not_recorded("query", collection))?;
        replay(
            call.error.as_ref(),
            call.delay_ms,
            QueryOutcome {
                result_count: call.result_count,
                duration_ms: call.duration_ms,
            },
        )
        .await
    }

    async fn aggregate(
        &self,
        collection: &str,
        _pipeline: &[serde_json::Value],
    ) -> Result<QueryOutcome, StoreError> {
        let call = self
            .snapshot
            .aggregates
            .get(collection)
            .ok_or_else(|| not_recorded("aggregate", collection))?;
        replay(
            call.error.as_ref(),
            call.delay_ms,
            QueryOutcome {
                result_count: call.result_count,
                duration_ms: call.duration_ms,
            },
        )
        .await
    }

    async fn server_metrics(&self) -> Result<ServerMetrics, StoreError> {
        let recorded = self
            .snapshot
            .server_metrics
            .as_ref()
            .ok_or_else(|| StoreError::Command("no recorded server metrics".into()))?;
        replay(
            recorded.error.as_ref(),
            recorded.delay_ms,
            recorded.metrics.clone(),
        )
        .await
    }

    async fn explain(
        &self,
        collection: &str,
        _filter: &serde_json::Value,
    ) -> Result<ExplainOutcome, StoreError> {
        let plan = self
            .snapshot
            .explain
            .get(collection)
            .ok_or_else(|| not_recorded("explain plan", collection))?;
        replay(
            plan.error.as_ref(),
            plan.delay_ms,
            ExplainOutcome {
                used_index: plan.used_index,
                docs_examined: plan.docs_examined,
                docs_returned: plan.docs_returned,
            },
        )
        .await
    }

    async fn profiler_summary(&self, _window: Duration) -> Result<ProfilerSummary, StoreError> {
        let recorded = self
            .snapshot
            .profiler
            .as_ref()
            .ok_or_else(|| StoreError::Unsupported("profiler disabled".into()))?;
        replay(recorded.error.as_ref(), recorded.delay_ms, recorded.summary).await
    }
}
