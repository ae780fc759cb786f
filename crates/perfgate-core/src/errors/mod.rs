use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a `DataStore` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("command failed: {0}")]
    Command(String),
    /// The deployment does not offer the requested capability
    /// (e.g. replication status on a standalone server).
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Why a probe produced no classifiable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("measurement failed: {0}")]
    Measurement(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
    /// Expected data is absent; reported as an informational pass.
    #[error("not applicable: {0}")]
    NotApplicable(String),
}

impl From<StoreError> for ProbeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unsupported(detail) => ProbeError::NotApplicable(detail),
            other => ProbeError::Measurement(other.to_string()),
        }
    }
}

/// Invalid probe registration or configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("probe '{probe}': {reason}")]
    InvalidThreshold { probe: String, reason: String },
    #[error("duplicate probe name: {0}")]
    DuplicateProbe(String),
    #[error("unknown probe in overrides: {0}")]
    UnknownProbe(String),
    #[error("unsupported config version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn invalid_threshold(probe: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidThreshold {
            probe: probe.into(),
            reason: reason.into(),
        }
    }
}
