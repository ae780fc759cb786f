use crate::errors::ConfigError;
use crate::model::ProbeSpec;
use crate::probes::{default_battery, BatteryOptions, RegisteredProbe};
use crate::thresholds::validate_spec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Top-level `perfgate.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub settings: Settings,
    /// Per-probe overrides keyed by probe name.
    #[serde(default)]
    pub probes: BTreeMap<String, ProbeOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            settings: Settings::default(),
            probes: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub timeout_ms: u64,
    pub concurrency: usize,
    pub slow_op_window_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            concurrency: 1,
            slow_op_window_secs: 300,
        }
    }
}

impl Settings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn battery_options(&self) -> BatteryOptions {
        BatteryOptions {
            slow_op_window: Duration::from_secs(self.slow_op_window_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeOverride {
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub warn_factor: Option<f64>,
    #[serde(default)]
    pub critical_factor: Option<f64>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl ProbeOverride {
    pub fn apply(&self, base: ProbeSpec) -> ProbeSpec {
        ProbeSpec {
            threshold: self.threshold.unwrap_or(base.threshold),
            warn_factor: self.warn_factor.unwrap_or(base.warn_factor),
            critical_factor: self.critical_factor.unwrap_or(base.critical_factor),
            ..base
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw)
}

pub fn parse_config(raw: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, SAMPLE_CONFIG).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub const SAMPLE_CONFIG: &str = include_str!("../../../perfgate.yaml");

impl Config {
    /// Structural checks that do not depend on the probe battery.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: SUPPORTED_CONFIG_VERSION,
            });
        }
        if self.settings.concurrency == 0 {
            return Err(ConfigError::InvalidSetting(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.settings.timeout_ms == 0 {
            return Err(ConfigError::InvalidSetting(
                "timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Default battery with overrides applied and disabled probes removed,
    /// in battery order.
    pub fn resolve_probes(&self) -> Result<Vec<RegisteredProbe>, ConfigError> {
        let battery = default_battery(self.settings.battery_options());

        for name in self.probes.keys() {
            if !battery.iter().any(|p| p.name() == name) {
                return Err(ConfigError::UnknownProbe(name.clone()));
            }
        }

        let mut out = Vec::with_capacity(battery.len());
        for probe in battery {
            let base = probe.default_spec();
            let spec = match self.probes.get(probe.name()) {
                Some(ov) if !ov.enabled => continue,
                Some(ov) => ov.apply(base),
                None => base,
            };
            validate_spec(probe.name(), &spec)?;
            out.push(RegisteredProbe::with_spec(probe, spec));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_needs_version() {
        assert!(matches!(parse_config("{}"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config("version: 1\n").unwrap();
        assert_eq!(cfg.settings, Settings::default());
        assert_eq!(cfg.resolve_probes().unwrap().len(), 13);
    }

    #[test]
    fn rejects_other_versions() {
        let err = parse_config("version: 2\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedVersion {
                found: 2,
                supported: 1
            }
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = parse_config("version: 1\nsettings:\n  timeout: 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let err = parse_config("version: 1\nsettings:\n  concurrency: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting(_)));
    }

    #[test]
    fn overrides_apply_and_disable() {
        let yaml = r#"
version: 1
probes:
  query.users_by_email:
    threshold: 20
  replication.lag_seconds:
    enabled: false
"#;
        let cfg = parse_config(yaml).unwrap();
        let probes = cfg.resolve_probes().unwrap();
        assert_eq!(probes.len(), 12);
        assert!(probes.iter().all(|p| p.name() != "replication.lag_seconds"));

        let users = probes
            .iter()
            .find(|p| p.name() == "query.users_by_email")
            .unwrap();
        assert_eq!(users.spec.threshold, 20.0);
        assert_eq!(users.spec.warn_factor, 1.5);
    }

    #[test]
    fn unknown_probe_override_is_an_error() {
        let cfg = parse_config("version: 1\nprobes:\n  query.nope:\n    threshold: 1\n").unwrap();
        let err = cfg.resolve_probes().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProbe(ref n) if n == "query.nope"));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let yaml = "version: 1\nprobes:\n  cache.hit_ratio:\n    warn_factor: 3\n    critical_factor: 2\n";
        let cfg = parse_config(yaml).unwrap();
        assert!(matches!(
            cfg.resolve_probes(),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn sample_config_is_valid() {
        let cfg = parse_config(SAMPLE_CONFIG).unwrap();
        cfg.resolve_probes().unwrap();
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn sample_config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perfgate.yaml");
        write_sample_config(&path).unwrap();
        assert_eq!(load_config(&path).unwrap(), parse_config(SAMPLE_CONFIG).unwrap());
    }

    #[test]
    fn write_failure_is_reported_as_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("perfgate.yaml");
        let err = write_sample_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Write { .. }));
        assert!(err.to_string().starts_with("failed to write config"));
    }
}
