pub mod baseline;
pub mod config;
pub mod engine;
pub mod errors;
pub mod model;
pub mod probes;
pub mod report;
pub mod store;
pub mod thresholds;

pub use engine::cancel::CancellationToken;
pub use engine::orchestrator::{Orchestrator, OrchestratorBuilder};
pub use engine::runner::ProbeRunner;
pub use errors::{ConfigError, ProbeError, StoreError};
pub use model::{ActualValue, Classification, MetricSample, ProbeSpec, Unit};
pub use probes::{Probe, RegisteredProbe};
pub use report::{Grade, Totals, ValidationReport};
pub use store::DataStore;
