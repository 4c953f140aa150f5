//! Accuracy leniency policy for weak GPS fixes.
//!
//! A phone reporting a 150 m accuracy circle may really be on site even when
//! its fix lands outside the fence. The policy decides how much of that
//! uncertainty is credited back. Crediting it trades false rejections for
//! false acceptances (a client can inflate its accuracy), so the whole thing
//! is a tunable value rather than constants inside the evaluator.

use serde::{Deserialize, Serialize};

use super::geo::GpsQuality;

/// Thresholds in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccuracyPolicy {
    /// Credit accuracy back at all. `false` gives a pure geometric check.
    pub lenient: bool,

    /// Accuracy above this is "poor" and eligible for leniency.
    pub poor_threshold_m: f64,

    /// Accuracy above this is "very poor". Reported, not treated differently.
    pub very_poor_threshold_m: f64,

    /// Upper bound on how much accuracy can be credited.
    pub max_buffer_m: f64,
}

impl AccuracyPolicy {
    /// Field-tuned defaults: 50 m poor, 100 m very poor, 200 m cap.
    pub const fn field_defaults() -> Self {
        Self {
            lenient: true,
            poor_threshold_m: 50.0,
            very_poor_threshold_m: 100.0,
            max_buffer_m: 200.0,
        }
    }

    /// No accuracy credit; only the fence geometry counts.
    pub const fn strict() -> Self {
        Self {
            lenient: false,
            ..Self::field_defaults()
        }
    }

    pub fn classify(&self, accuracy: Option<f64>) -> GpsQuality {
        match accuracy {
            None => GpsQuality::Unknown,
            Some(a) if a > self.very_poor_threshold_m => GpsQuality::VeryPoor,
            Some(a) if a > self.poor_threshold_m => GpsQuality::Poor,
            Some(_) => GpsQuality::Good,
        }
    }

    /// Meters to subtract from the measured distance, or `None` when the fix
    /// does not qualify.
    pub fn buffer_for(&self, accuracy: Option<f64>) -> Option<f64> {
        if !self.lenient {
            return None;
        }
        let accuracy = accuracy?;
        if accuracy > self.poor_threshold_m {
            Some(accuracy.min(self.max_buffer_m))
        } else {
            None
        }
    }

    /// Thresholds must be non-negative and ordered.
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            ("poor_threshold_m", self.poor_threshold_m),
            ("very_poor_threshold_m", self.very_poor_threshold_m),
            ("max_buffer_m", self.max_buffer_m),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a non-negative number, got {value}"));
            }
        }
        if self.very_poor_threshold_m < self.poor_threshold_m {
            return Err(format!(
                "very_poor_threshold_m ({}) must not be below poor_threshold_m ({})",
                self.very_poor_threshold_m, self.poor_threshold_m
            ));
        }
        Ok(())
    }
}

impl Default for AccuracyPolicy {
    fn default() -> Self {
        Self::field_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unknown(None, GpsQuality::Unknown)]
    #[case::good(Some(10.0), GpsQuality::Good)]
    #[case::poor_edge(Some(50.0), GpsQuality::Good)]
    #[case::poor(Some(75.0), GpsQuality::Poor)]
    #[case::very_poor_edge(Some(100.0), GpsQuality::Poor)]
    #[case::very_poor(Some(150.0), GpsQuality::VeryPoor)]
    fn classifies_accuracy(#[case] accuracy: Option<f64>, #[case] expected: GpsQuality) {
        assert_eq!(AccuracyPolicy::default().classify(accuracy), expected);
    }

    #[test]
    fn buffer_is_capped() {
        let policy = AccuracyPolicy::default();
        assert_eq!(policy.buffer_for(Some(30.0)), None);
        assert_eq!(policy.buffer_for(Some(80.0)), Some(80.0));
        assert_eq!(policy.buffer_for(Some(500.0)), Some(200.0));
        assert_eq!(policy.buffer_for(None), None);
    }

    #[test]
    fn strict_policy_never_buffers() {
        assert_eq!(AccuracyPolicy::strict().buffer_for(Some(500.0)), None);
    }

    #[test]
    fn validate_rejects_inverted_thresholds() {
        let policy = AccuracyPolicy {
            poor_threshold_m: 120.0,
            very_poor_threshold_m: 100.0,
            ..AccuracyPolicy::default()
        };
        assert!(policy.validate().is_err());
        assert!(AccuracyPolicy::default().validate().is_ok());
    }
}
