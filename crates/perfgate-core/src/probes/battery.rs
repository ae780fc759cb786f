//! The default probe battery and the probe types it is built from.

use super::{Measurement, Probe};
use crate::errors::ProbeError;
use crate::model::{ProbeSpec, Unit};
use crate::store::{DataStore, ServerMetrics};
use crate::thresholds::ratio;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BatteryOptions {
    /// Trailing window for profiler-based probes.
    pub slow_op_window: Duration,
}

impl Default for BatteryOptions {
    fn default() -> Self {
        Self {
            slow_op_window: Duration::from_secs(300),
        }
    }
}

/// The fixed battery, in execution order. Reports list probes in this order.
pub fn default_battery(opts: BatteryOptions) -> Vec<Arc<dyn Probe>> {
    vec![
        Arc::new(QueryLatency {
            name: "query.users_by_email".into(),
            description: "point lookup of a user by email".into(),
            collection: "users".into(),
            filter: json!({ "email": "student1@example.com" }),
            limit: Some(1),
            spec: ProbeSpec::at_most(50.0, Unit::Millis),
        }),
        Arc::new(QueryLatency {
            name: "query.courses_by_category".into(),
            description: "published courses in one category".into(),
            collection: "courses".into(),
            filter: json!({ "category": "Programming", "status": "published" }),
            limit: Some(20),
            spec: ProbeSpec::at_most(100.0, Unit::Millis),
        }),
        Arc::new(QueryLatency {
            name: "query.enrollments_by_student".into(),
            description: "enrollments of a single student".into(),
            collection: "enrollments".into(),
            filter: json!({ "user_id": "student-1" }),
            limit: Some(50),
            spec: ProbeSpec::at_most(100.0, Unit::Millis),
        }),
        Arc::new(AggregateLatency {
            name: "aggregate.course_ratings".into(),
            description: "top rated courses from reviews".into(),
            collection: "reviews".into(),
            pipeline: vec![
                json!({ "$group": { "_id": "$course_id", "avg": { "$avg": "$rating" }, "count": { "$sum": 1 } } }),
                json!({ "$sort": { "avg": -1 } }),
                json!({ "$limit": 10 }),
            ],
            spec: ProbeSpec::at_most(500.0, Unit::Millis),
        }),
        Arc::new(AggregateLatency {
            name: "aggregate.enrollment_stats".into(),
            description: "enrollments grouped by completion status".into(),
            collection: "enrollments".into(),
            pipeline: vec![
                json!({ "$group": { "_id": "$completion_status", "count": { "$sum": 1 } } }),
            ],
            spec: ProbeSpec::at_most(1000.0, Unit::Millis),
        }),
        Arc::new(IndexEfficiency {
            name: "index.courses_by_category".into(),
            collection: "courses".into(),
            filter: json!({ "category": "Programming", "status": "published" }),
            spec: ProbeSpec::at_most(1.0, Unit::Ratio).with_factors(2.0, 10.0),
        }),
        Arc::new(ServerCounter {
            name: "connections.utilization".into(),
            kind: CounterKind::ConnectionUtilization,
            spec: ProbeSpec::at_most(80.0, Unit::Percent).with_factors(1.1, 1.2),
        }),
        Arc::new(ServerCounter {
            name: "cache.hit_ratio".into(),
            kind: CounterKind::CacheHitRatio,
            spec: ProbeSpec::at_least(95.0, Unit::Percent).with_factors(1.05, 1.25),
        }),
        Arc::new(ServerCounter {
            name: "memory.resident_mb".into(),
            kind: CounterKind::ResidentMemory,
            spec: ProbeSpec::at_most(4096.0, Unit::Megabytes).with_factors(1.25, 1.5),
        }),
        Arc::new(ServerCounter {
            name: "storage.index_data_ratio".into(),
            kind: CounterKind::IndexDataRatio,
            spec: ProbeSpec::at_most(50.0, Unit::Percent),
        }),
        Arc::new(ProfilerCount {
            name: "profiler.slow_operations".into(),
            kind: ProfilerKind::SlowOperations,
            window: opts.slow_op_window,
            spec: ProbeSpec::at_most(10.0, Unit::Count).with_factors(2.0, 5.0),
        }),
        Arc::new(ProfilerCount {
            name: "profiler.collection_scans".into(),
            kind: ProfilerKind::CollectionScans,
            window: opts.slow_op_window,
            spec: ProbeSpec::at_most(5.0, Unit::Count).with_factors(2.0, 4.0),
        }),
        Arc::new(ServerCounter {
            name: "replication.lag_seconds".into(),
            kind: CounterKind::ReplicationLag,
            spec: ProbeSpec::at_most(10.0, Unit::Seconds).with_factors(3.0, 6.0),
        }),
    ]
}

/// Wall-clock latency of a find.
pub struct QueryLatency {
    pub name: String,
    pub description: String,
    pub collection: String,
    pub filter: serde_json::Value,
    pub limit: Option<u64>,
    pub spec: ProbeSpec,
}

#[async_trait]
impl Probe for QueryLatency {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn default_spec(&self) -> ProbeSpec {
        self.spec
    }

    async fn execute(&self, store: &dyn DataStore) -> Result<Measurement, ProbeError> {
        let out = store
            .query(&self.collection, &self.filter, self.limit)
            .await?;
        Ok(Measurement::new(out.duration_ms)
            .with_note(format!("{} docs from {}", out.result_count, self.collection)))
    }
}

/// Wall-clock latency of an aggregation pipeline.
pub struct AggregateLatency {
    pub name: String,
    pub description: String,
    pub collection: String,
    pub pipeline: Vec<serde_json::Value>,
    pub spec: ProbeSpec,
}

#[async_trait]
impl Probe for AggregateLatency {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn default_spec(&self) -> ProbeSpec {
        self.spec
    }

    async fn execute(&self, store: &dyn DataStore) -> Result<Measurement, ProbeError> {
        let out = store.aggregate(&self.collection, &self.pipeline).await?;
        Ok(Measurement::new(out.duration_ms).with_note(format!(
            "{} stages, {} results",
            self.pipeline.len(),
            out.result_count
        )))
    }
}

/// Documents examined per document returned, from the query plan.
pub struct IndexEfficiency {
    pub name: String,
    pub collection: String,
    pub filter: serde_json::Value,
    pub spec: ProbeSpec,
}

#[async_trait]
impl Probe for IndexEfficiency {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "docs examined per doc returned"
    }

    fn default_spec(&self) -> ProbeSpec {
        self.spec
    }

    async fn execute(&self, store: &dyn DataStore) -> Result<Measurement, ProbeError> {
        let plan = store.explain(&self.collection, &self.filter).await?;
        // Nothing returned: every examined document was wasted work.
        let value = if plan.docs_returned == 0 {
            plan.docs_examined as f64
        } else {
            plan.docs_examined as f64 / plan.docs_returned as f64
        };
        let stage = if plan.used_index { "IXSCAN" } else { "COLLSCAN" };
        Ok(Measurement::new(value).with_note(format!(
            "{}, {} examined / {} returned",
            stage, plan.docs_examined, plan.docs_returned
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    ConnectionUtilization,
    CacheHitRatio,
    ResidentMemory,
    IndexDataRatio,
    ReplicationLag,
}

/// A value derived from the server-wide metrics document.
pub struct ServerCounter {
    pub name: String,
    pub kind: CounterKind,
    pub spec: ProbeSpec,
}

impl ServerCounter {
    fn derive(&self, m: &ServerMetrics) -> Result<Measurement, ProbeError> {
        match self.kind {
            CounterKind::ConnectionUtilization => {
                let c = m
                    .connections
                    .ok_or_else(|| missing("connection statistics"))?;
                let pct = ratio(c.current as f64, (c.current + c.available) as f64) * 100.0;
                Ok(Measurement::new(pct)
                    .with_note(format!("{} in use, {} available", c.current, c.available)))
            }
            CounterKind::CacheHitRatio => {
                let c = m.cache.ok_or_else(|| missing("cache statistics"))?;
                let miss = ratio(c.pages_read_into_cache as f64, c.pages_requested as f64);
                Ok(Measurement::new((1.0 - miss) * 100.0).with_note(format!(
                    "{} of {} pages read from disk",
                    c.pages_read_into_cache, c.pages_requested
                )))
            }
            CounterKind::ResidentMemory => {
                let mem = m.memory.ok_or_else(|| missing("memory statistics"))?;
                Ok(Measurement::new(mem.resident_mb))
            }
            CounterKind::IndexDataRatio => {
                let s = m.storage.ok_or_else(|| missing("storage statistics"))?;
                let pct = ratio(s.index_size_bytes as f64, s.data_size_bytes as f64) * 100.0;
                Ok(Measurement::new(pct).with_note(format!(
                    "{} index bytes / {} data bytes",
                    s.index_size_bytes, s.data_size_bytes
                )))
            }
            CounterKind::ReplicationLag => {
                let rs = m.replication.as_ref().ok_or_else(|| {
                    ProbeError::NotApplicable("standalone deployment, no replication".into())
                })?;
                let lag = rs.max_secondary_lag().ok_or_else(|| {
                    ProbeError::NotApplicable(format!("replica set {} has no secondaries", rs.set_name))
                })?;
                Ok(Measurement::new(lag).with_note(format!("replica set {}", rs.set_name)))
            }
        }
    }
}

fn missing(what: &str) -> ProbeError {
    ProbeError::NotApplicable(format!("server reports no {}", what))
}

#[async_trait]
impl Probe for ServerCounter {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_spec(&self) -> ProbeSpec {
        self.spec
    }

    async fn execute(&self, store: &dyn DataStore) -> Result<Measurement, ProbeError> {
        let metrics = store.server_metrics().await?;
        self.derive(&metrics)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilerKind {
    SlowOperations,
    CollectionScans,
}

/// Profiler counts over the trailing window.
pub struct ProfilerCount {
    pub name: String,
    pub kind: ProfilerKind,
    pub window: Duration,
    pub spec: ProbeSpec,
}

#[async_trait]
impl Probe for ProfilerCount {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_spec(&self) -> ProbeSpec {
        self.spec
    }

    async fn execute(&self, store: &dyn DataStore) -> Result<Measurement, ProbeError> {
        let summary = store.profiler_summary(self.window).await?;
        let count = match self.kind {
            ProfilerKind::SlowOperations => summary.slow_ops,
            ProfilerKind::CollectionScans => summary.collection_scans,
        };
        Ok(Measurement::new(count as f64)
            .with_note(format!("last {}s", self.window.as_secs())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        CacheStats, ConnectionStats, ReplayStore, ReplicaMember, ReplicationStatus, Snapshot,
    };
    use crate::thresholds::validate_spec;
    use std::collections::HashSet;

    fn counter(kind: CounterKind) -> ServerCounter {
        ServerCounter {
            name: "t".into(),
            kind,
            spec: ProbeSpec::at_most(1.0, Unit::Count),
        }
    }

    #[test]
    fn battery_names_are_unique_and_specs_valid() {
        let battery = default_battery(BatteryOptions::default());
        let mut seen = HashSet::new();
        for p in &battery {
            assert!(seen.insert(p.name().to_string()), "duplicate {}", p.name());
            validate_spec(p.name(), &p.default_spec()).unwrap();
        }
        assert_eq!(battery.len(), 13);
        assert_eq!(battery[0].name(), "query.users_by_email");
        assert_eq!(battery[12].name(), "replication.lag_seconds");
    }

    #[test]
    fn connection_utilization_is_a_percentage() {
        let m = ServerMetrics {
            connections: Some(ConnectionStats {
                current: 20,
                available: 80,
                total_created: 500,
            }),
            ..Default::default()
        };
        let out = counter(CounterKind::ConnectionUtilization).derive(&m).unwrap();
        assert_eq!(out.value, 20.0);
    }

    #[test]
    fn cache_hit_ratio_without_requests_is_full() {
        let m = ServerMetrics {
            cache: Some(CacheStats::default()),
            ..Default::default()
        };
        let out = counter(CounterKind::CacheHitRatio).derive(&m).unwrap();
        assert_eq!(out.value, 100.0);
    }

    #[test]
    fn missing_section_is_not_applicable() {
        let err = counter(CounterKind::ResidentMemory)
            .derive(&ServerMetrics::default())
            .unwrap_err();
        assert!(matches!(err, ProbeError::NotApplicable(_)));
    }

    #[test]
    fn replication_lag_uses_worst_secondary() {
        let m = ServerMetrics {
            replication: Some(ReplicationStatus {
                set_name: "rs0".into(),
                members: vec![
                    ReplicaMember {
                        name: "a".into(),
                        state: "PRIMARY".into(),
                        lag_secs: 0.0,
                    },
                    ReplicaMember {
                        name: "b".into(),
                        state: "SECONDARY".into(),
                        lag_secs: 3.0,
                    },
                ],
            }),
            ..Default::default()
        };
        let out = counter(CounterKind::ReplicationLag).derive(&m).unwrap();
        assert_eq!(out.value, 3.0);
    }

    #[tokio::test]
    async fn collection_scan_reports_examined_docs() {
        let store = ReplayStore::new(Snapshot::default().with_explain("courses", false, 5000, 0));
        let probe = IndexEfficiency {
            name: "index.courses".into(),
            collection: "courses".into(),
            filter: json!({}),
            spec: ProbeSpec::at_most(1.0, Unit::Ratio),
        };
        let out = probe.execute(&store).await.unwrap();
        assert_eq!(out.value, 5000.0);
        assert!(out.note.unwrap().starts_with("COLLSCAN"));
    }

    #[tokio::test]
    async fn profiler_probe_not_applicable_when_profiler_off() {
        let store = ReplayStore::new(Snapshot::default());
        let probe = ProfilerCount {
            name: "profiler.slow".into(),
            kind: ProfilerKind::SlowOperations,
            window: Duration::from_secs(60),
            spec: ProbeSpec::at_most(10.0, Unit::Count),
        };
        let err = probe.execute(&store).await.unwrap_err();
        assert!(matches!(err, ProbeError::NotApplicable(_)));
    }
}
