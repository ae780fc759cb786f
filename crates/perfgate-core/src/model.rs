use serde::{Deserialize, Serialize};
use std::fmt;

/// Default multiplier for the warning band (relative to the threshold).
pub const DEFAULT_WARN_FACTOR: f64 = 1.5;
/// Default multiplier for the critical band (relative to the threshold).
pub const DEFAULT_CRITICAL_FACTOR: f64 = 2.0;

/// Outcome of a single measurement, ordered by severity:
/// `Passed < Warning < Failed < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Passed,
    Warning,
    Failed,
    Critical,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Passed => "PASSED",
            Classification::Warning => "WARNING",
            Classification::Failed => "FAILED",
            Classification::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit a probe reports in; only used for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[default]
    Millis,
    Seconds,
    Percent,
    Megabytes,
    Count,
    Ratio,
}

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Millis => "ms",
            Unit::Seconds => "s",
            Unit::Percent => "%",
            Unit::Megabytes => "MB",
            Unit::Count => "",
            Unit::Ratio => "x",
        }
    }
}

/// Static threshold configuration of a probe, supplied at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeSpec {
    pub threshold: f64,
    pub warn_factor: f64,
    pub critical_factor: f64,
    #[serde(default)]
    pub higher_is_better: bool,
    #[serde(default)]
    pub unit: Unit,
}

impl ProbeSpec {
    /// Lower-is-better spec with the default warning/critical factors.
    pub fn at_most(threshold: f64, unit: Unit) -> Self {
        Self {
            threshold,
            warn_factor: DEFAULT_WARN_FACTOR,
            critical_factor: DEFAULT_CRITICAL_FACTOR,
            higher_is_better: false,
            unit,
        }
    }

    /// Higher-is-better spec with the default warning/critical factors.
    pub fn at_least(threshold: f64, unit: Unit) -> Self {
        Self {
            higher_is_better: true,
            ..Self::at_most(threshold, unit)
        }
    }

    pub fn with_factors(mut self, warn_factor: f64, critical_factor: f64) -> Self {
        self.warn_factor = warn_factor;
        self.critical_factor = critical_factor;
        self
    }
}

/// Measured value, or the reason there is none.
///
/// Serialized as a bare number, or as one of the sentinels
/// `"N/A"`, `"UNAVAILABLE"` and `"ERROR"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActualValue {
    Value(f64),
    NotApplicable,
    Unavailable,
    Error,
}

impl ActualValue {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            ActualValue::Value(v) => Some(v),
            _ => None,
        }
    }

    fn sentinel(self) -> Option<&'static str> {
        match self {
            ActualValue::Value(_) => None,
            ActualValue::NotApplicable => Some("N/A"),
            ActualValue::Unavailable => Some("UNAVAILABLE"),
            ActualValue::Error => Some("ERROR"),
        }
    }
}

impl Serialize for ActualValue {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match (self, self.sentinel()) {
            (ActualValue::Value(v), _) if v.is_finite() => s.serialize_f64(*v),
            (ActualValue::Value(_), _) => s.serialize_str("UNAVAILABLE"),
            (_, Some(tag)) => s.serialize_str(tag),
            (_, None) => s.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for ActualValue {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Tag(String),
        }

        match Repr::deserialize(d)? {
            Repr::Num(v) => Ok(ActualValue::Value(v)),
            Repr::Tag(t) => match t.as_str() {
                "N/A" => Ok(ActualValue::NotApplicable),
                "UNAVAILABLE" => Ok(ActualValue::Unavailable),
                "ERROR" => Ok(ActualValue::Error),
                other => Err(serde::de::Error::custom(format!(
                    "unknown actual value sentinel: {other}"
                ))),
            },
        }
    }
}

impl fmt::Display for ActualValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.sentinel()) {
            (ActualValue::Value(v), _) => f.write_str(&format_number(*v)),
            (_, Some(tag)) => f.write_str(tag),
            (_, None) => Ok(()),
        }
    }
}

/// Two decimals, trailing zeros dropped ("40", "12.5", "0.33").
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// One classified observation. Built by the runner, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub name: String,
    pub actual_value: ActualValue,
    pub threshold: f64,
    pub warn_factor: f64,
    pub critical_factor: f64,
    pub higher_is_better: bool,
    pub unit: Unit,
    pub classification: Classification,
    pub message: String,
    pub duration_ms: u64,
    /// True when the probe's capability was absent (reported as PASSED).
    #[serde(default)]
    pub informational: bool,
}
