//! Threshold evaluation: maps a measured value onto
//! PASSED / WARNING / FAILED / CRITICAL.
//!
//! Lower-is-better bands (`t` = threshold, `w` = warn factor, `c` = critical factor):
//!
//! ```text
//! actual <= t          PASSED
//! actual <= t * w      WARNING
//! actual <= t * c      FAILED
//! otherwise            CRITICAL
//! ```
//!
//! Higher-is-better divides instead of multiplying and flips the comparisons.
//! A value that is missing, NaN or infinite is always CRITICAL.

use crate::errors::ConfigError;
use crate::model::{Classification, ProbeSpec};

/// Band boundaries derived from a spec, in order PASSED, WARNING, FAILED.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub pass: f64,
    pub warn: f64,
    pub fail: f64,
}

pub fn bands(spec: &ProbeSpec) -> Bands {
    let t = spec.threshold;
    if spec.higher_is_better {
        Bands {
            pass: t,
            warn: scale_down(t, spec.warn_factor),
            fail: scale_down(t, spec.critical_factor),
        }
    } else {
        Bands {
            pass: t,
            warn: t * spec.warn_factor,
            fail: t * spec.critical_factor,
        }
    }
}

fn scale_down(t: f64, factor: f64) -> f64 {
    if factor > 0.0 {
        t / factor
    } else {
        0.0
    }
}

pub fn classify(actual: f64, spec: &ProbeSpec) -> Classification {
    if !actual.is_finite() {
        return Classification::Critical;
    }
    let b = bands(spec);
    if spec.higher_is_better {
        if actual >= b.pass {
            Classification::Passed
        } else if actual >= b.warn {
            Classification::Warning
        } else if actual >= b.fail {
            Classification::Failed
        } else {
            Classification::Critical
        }
    } else if actual <= b.pass {
        Classification::Passed
    } else if actual <= b.warn {
        Classification::Warning
    } else if actual <= b.fail {
        Classification::Failed
    } else {
        Classification::Critical
    }
}

/// `numerator / denominator`, defined as 0 when the denominator is 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Checks a spec at registration time.
pub fn validate_spec(probe: &str, spec: &ProbeSpec) -> Result<(), ConfigError> {
    if !spec.threshold.is_finite() {
        return Err(ConfigError::invalid_threshold(
            probe,
            "threshold must be a finite number",
        ));
    }
    if spec.threshold < 0.0 {
        return Err(ConfigError::invalid_threshold(
            probe,
            format!("negative threshold {}", spec.threshold),
        ));
    }
    if !spec.warn_factor.is_finite() || !spec.critical_factor.is_finite() {
        return Err(ConfigError::invalid_threshold(
            probe,
            "warn_factor and critical_factor must be finite",
        ));
    }
    if spec.warn_factor < 1.0 {
        return Err(ConfigError::invalid_threshold(
            probe,
            format!("warn_factor {} must be >= 1", spec.warn_factor),
        ));
    }
    if spec.warn_factor >= spec.critical_factor {
        return Err(ConfigError::invalid_threshold(
            probe,
            format!(
                "warn_factor {} must be below critical_factor {}",
                spec.warn_factor, spec.critical_factor
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Unit;

    fn latency(threshold: f64) -> ProbeSpec {
        ProbeSpec::at_most(threshold, Unit::Millis).with_factors(1.5, 2.0)
    }

    #[test]
    fn lower_is_better_bands() {
        let spec = latency(50.0);
        assert_eq!(classify(40.0, &spec), Classification::Passed);
        assert_eq!(classify(50.0, &spec), Classification::Passed);
        assert_eq!(classify(60.0, &spec), Classification::Warning);
        assert_eq!(classify(75.0, &spec), Classification::Warning);
        assert_eq!(classify(90.0, &spec), Classification::Failed);
        assert_eq!(classify(100.0, &spec), Classification::Failed);
        assert_eq!(classify(100.5, &spec), Classification::Critical);
    }

    #[test]
    fn higher_is_better_bands() {
        let spec = ProbeSpec::at_least(95.0, Unit::Percent).with_factors(1.05, 1.25);
        assert_eq!(classify(99.0, &spec), Classification::Passed);
        assert_eq!(classify(95.0, &spec), Classification::Passed);
        assert_eq!(classify(92.0, &spec), Classification::Warning);
        assert_eq!(classify(80.0, &spec), Classification::Failed);
        assert_eq!(classify(60.0, &spec), Classification::Critical);
    }

    #[test]
    fn zero_threshold_rejects_any_positive_value() {
        let spec = latency(0.0);
        assert_eq!(classify(0.0, &spec), Classification::Passed);
        assert_ne!(classify(0.001, &spec), Classification::Passed);
    }

    #[test]
    fn non_finite_is_critical() {
        let spec = latency(50.0);
        assert_eq!(classify(f64::NAN, &spec), Classification::Critical);
        assert_eq!(classify(f64::INFINITY, &spec), Classification::Critical);
        assert_eq!(classify(f64::NEG_INFINITY, &spec), Classification::Critical);
    }

    #[test]
    fn ratio_with_zero_denominator_is_zero() {
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(ratio(1.0, 4.0), 0.25);
    }

    #[test]
    fn validate_rejects_bad_specs() {
        assert!(validate_spec("p", &latency(50.0)).is_ok());
        assert!(validate_spec("p", &latency(-1.0)).is_err());
        assert!(validate_spec("p", &latency(f64::NAN)).is_err());
        assert!(validate_spec("p", &latency(50.0).with_factors(2.0, 1.5)).is_err());
        assert!(validate_spec("p", &latency(50.0).with_factors(2.0, 2.0)).is_err());
        assert!(validate_spec("p", &latency(50.0).with_factors(0.8, 2.0)).is_err());
    }

    #[test]
    fn classification_is_deterministic() {
        let spec = latency(50.0);
        let first: Vec<_> = (0..200).map(|v| classify(v as f64, &spec)).collect();
        let second: Vec<_> = (0..200).map(|v| classify(v as f64, &spec)).collect();
        assert_eq!(first, second);
    }
}
