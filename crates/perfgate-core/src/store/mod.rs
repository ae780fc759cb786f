//! The external database, seen only through this trait.

pub mod replay;

use crate::errors::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use replay::{ReplayStore, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub result_count: u64,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExplainOutcome {
    pub used_index: bool,
    pub docs_examined: u64,
    pub docs_returned: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionStats {
    pub current: u64,
    pub available: u64,
    pub total_created: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpCounters {
    pub insert: u64,
    pub query: u64,
    pub update: u64,
    pub delete: u64,
    pub getmore: u64,
    pub command: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheStats {
    pub bytes_in_cache: u64,
    pub max_bytes: u64,
    pub pages_requested: u64,
    pub pages_read_into_cache: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStats {
    pub resident_mb: f64,
    pub virtual_mb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageStats {
    pub data_size_bytes: u64,
    pub index_size_bytes: u64,
    pub storage_size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplicaMember {
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub lag_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplicationStatus {
    pub set_name: String,
    #[serde(default)]
    pub members: Vec<ReplicaMember>,
}

impl ReplicationStatus {
    /// Largest lag among secondaries, `None` if there are none.
    pub fn max_secondary_lag(&self) -> Option<f64> {
        self.members
            .iter()
            .filter(|m| m.state.eq_ignore_ascii_case("SECONDARY"))
            .map(|m| m.lag_secs)
            .fold(None, |acc, lag| Some(acc.map_or(lag, |a: f64| a.max(lag))))
    }
}

/// Server-wide counters. Sections a deployment does not report are `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerMetrics {
    pub connections: Option<ConnectionStats>,
    pub opcounters: Option<OpCounters>,
    pub cache: Option<CacheStats>,
    pub memory: Option<MemoryStats>,
    pub storage: Option<StorageStats>,
    pub replication: Option<ReplicationStatus>,
}

/// Profiler counts over a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerSummary {
    pub slow_ops: u64,
    pub collection_scans: u64,
}

#[async_trait]
pub trait DataStore: Send + Sync {
    /// Label used in logs and reports.
    fn name(&self) -> &str;

    async fn query(
        &self,
        collection: &str,
        filter: &serde_json::Value,
        limit: Option<u64>,
    ) -> Result<QueryOutcome, StoreError>;

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[serde_json::Value],
    ) -> Result<QueryOutcome, StoreError>;

    async fn server_metrics(&self) -> Result<ServerMetrics, StoreError>;

    async fn explain(
        &self,
        collection: &str,
        filter: &serde_json::Value,
    ) -> Result<ExplainOutcome, StoreError>;

    /// Slow operations and collection scans recorded by the profiler.
    /// Stores without a profiler keep the default.
    async fn profiler_summary(&self, window: Duration) -> Result<ProfilerSummary, StoreError> {
        let _ = window;
        Err(StoreError::Unsupported("profiler not available".into()))
    }
}
