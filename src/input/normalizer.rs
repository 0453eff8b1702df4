use serde::{Serialize, Deserialize};

use crate::input::climate::ClimateInputs;
use crate::network::INPUT_SIZE;

/// Lower bound applied by `FloorClamped` to every feature.
pub const FEATURE_FLOOR: f64 = 0.1;

/// How raw climate readings are mapped to network features.
///
/// The two policies are not interchangeable: `LinearCentered` yields signed
/// features and can produce an all-zero vector (no warming, no precipitation
/// shift, 400 ppm), which zeroes every input-layer gradient. `FloorClamped`
/// keeps every feature at or above `FEATURE_FLOOR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPolicy {
    /// `temp/4`, `precip/30`, `(co2-400)/400`
    #[default]
    LinearCentered,
    /// `max(0.1, (temp+2)/6)`, `max(0.1, (precip+30)/60)`, `max(0.1, (co2-350)/450)`
    FloorClamped,
}

impl NormalizationPolicy {
    pub fn normalize(&self, raw: &ClimateInputs) -> [f64; INPUT_SIZE] {
        match self {
            NormalizationPolicy::LinearCentered => [
                raw.temperature_change / 4.0,
                raw.precipitation_change / 30.0,
                (raw.co2_level - 400.0) / 400.0,
            ],
            NormalizationPolicy::FloorClamped => [
                FEATURE_FLOOR.max((raw.temperature_change + 2.0) / 6.0),
                FEATURE_FLOOR.max((raw.precipitation_change + 30.0) / 60.0),
                FEATURE_FLOOR.max((raw.co2_level - 350.0) / 450.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_centered_reference_reading() {
        let x = NormalizationPolicy::LinearCentered.normalize(&ClimateInputs::new(1.5, -5.0, 420.0));
        assert!((x[0] - 0.375).abs() < 1e-3);
        assert!((x[1] + 0.1667).abs() < 1e-3);
        assert!((x[2] - 0.05).abs() < 1e-3);
    }

    #[test]
    fn linear_centered_baseline_is_all_zero() {
        let x = NormalizationPolicy::LinearCentered.normalize(&ClimateInputs::default());
        assert_eq!(x, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn floor_clamped_never_drops_below_floor() {
        let x = NormalizationPolicy::FloorClamped.normalize(&ClimateInputs::new(-5.0, -60.0, 100.0));
        assert_eq!(x, [FEATURE_FLOOR; 3]);
    }

    #[test]
    fn floor_clamped_passes_values_above_floor() {
        let x = NormalizationPolicy::FloorClamped.normalize(&ClimateInputs::new(4.0, 30.0, 800.0));
        assert_eq!(x, [1.0, 1.0, 1.0]);
    }
}
