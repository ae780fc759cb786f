pub mod battery;

use crate::errors::ProbeError;
use crate::model::ProbeSpec;
use crate::store::DataStore;
use async_trait::async_trait;
use std::sync::Arc;

pub use battery::{default_battery, BatteryOptions};

/// A measured value plus a short note for the report ("12 docs", "COLLSCAN").
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub note: Option<String>,
}

impl Measurement {
    pub fn new(value: f64) -> Self {
        Self { value, note: None }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// One named measurement against the data store.
///
/// Probes are read-only. A probe that needs a throwaway write must remove it
/// again inside `execute`.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Thresholds used when registration does not override them.
    fn default_spec(&self) -> ProbeSpec;

    async fn execute(&self, store: &dyn DataStore) -> Result<Measurement, ProbeError>;
}

/// A probe together with the thresholds it was registered with.
#[derive(Clone)]
pub struct RegisteredProbe {
    pub probe: Arc<dyn Probe>,
    pub spec: ProbeSpec,
}

impl RegisteredProbe {
    pub fn new(probe: Arc<dyn Probe>) -> Self {
        let spec = probe.default_spec();
        Self { probe, spec }
    }

    pub fn with_spec(probe: Arc<dyn Probe>, spec: ProbeSpec) -> Self {
        Self { probe, spec }
    }

    pub fn name(&self) -> &str {
        self.probe.name()
    }
}

impl std::fmt::Debug for RegisteredProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProbe")
            .field("name", &self.name())
            .field("spec", &self.spec)
            .finish()
    }
}
