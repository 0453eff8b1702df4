use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{EngineError, Result};
use crate::math::matrix::Matrix;
use crate::network::{HIDDEN_SIZE, INPUT_SIZE, OUTPUT_SIZE};

/// Default half-width of the uniform range used by random initialization.
pub const DEFAULT_INIT_HALF_RANGE: f64 = 0.2;

/// How a fresh `WeightSet` is produced at construction and on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// The canonical seed set returned by `WeightSet::fixed()`.
    #[default]
    Fixed,
    /// The smaller-magnitude set returned by `WeightSet::gentle()`.
    Gentle,
    /// Uniform samples from the configured half range.
    Random,
}

/// One immutable snapshot of the network's weights.
///
/// `input_to_hidden` is 3×4 (row = input unit, column = hidden unit) and
/// `hidden_to_output` is 4×1. Training never edits a snapshot; every update
/// builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightSet {
    input_to_hidden: Matrix,
    hidden_to_output: Matrix,
}

impl WeightSet {
    /// Validates shapes and finiteness before accepting the matrices.
    pub fn try_new(input_to_hidden: Matrix, hidden_to_output: Matrix) -> Result<WeightSet> {
        let weights = WeightSet { input_to_hidden, hidden_to_output };
        weights.validate()?;
        Ok(weights)
    }

    /// Convenience for callers holding nested rows (JSON bodies, tests).
    pub fn from_rows(input_to_hidden: Vec<Vec<f64>>, hidden_to_output: Vec<Vec<f64>>) -> Result<WeightSet> {
        WeightSet::try_new(
            Matrix::try_from_rows(input_to_hidden)?,
            Matrix::try_from_rows(hidden_to_output)?,
        )
    }

    /// Canonical seed weights used for reproducible runs.
    pub fn fixed() -> WeightSet {
        WeightSet {
            input_to_hidden: Matrix::from_data(vec![
                vec![0.5, -0.3, 0.4, 0.2],
                vec![0.3, 0.6, -0.2, 0.4],
                vec![-0.2, 0.4, 0.5, -0.3],
            ]),
            hidden_to_output: Matrix::from_data(vec![vec![0.4], vec![0.3], vec![-0.5], vec![0.2]]),
        }
    }

    /// Smaller-magnitude weights shown by the forward-only explorer.
    pub fn gentle() -> WeightSet {
        WeightSet {
            input_to_hidden: Matrix::from_data(vec![
                vec![0.1, 0.2, -0.1, 0.15],
                vec![-0.15, 0.25, 0.1, -0.2],
                vec![0.05, -0.1, -0.15, 0.3],
            ]),
            hidden_to_output: Matrix::from_data(vec![vec![0.4], vec![0.3], vec![-0.5], vec![0.2]]),
        }
    }

    /// Every weight drawn uniformly from `[-half_range, half_range)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, half_range: f64) -> WeightSet {
        WeightSet {
            input_to_hidden: Matrix::uniform(INPUT_SIZE, HIDDEN_SIZE, half_range, rng),
            hidden_to_output: Matrix::uniform(HIDDEN_SIZE, OUTPUT_SIZE, half_range, rng),
        }
    }

    pub fn from_init<R: Rng + ?Sized>(init: WeightInit, rng: &mut R, half_range: f64) -> WeightSet {
        match init {
            WeightInit::Fixed => WeightSet::fixed(),
            WeightInit::Gentle => WeightSet::gentle(),
            WeightInit::Random => WeightSet::random(rng, half_range),
        }
    }

    /// Rejects wrong shapes, ragged storage and non-finite entries.
    pub fn validate(&self) -> Result<()> {
        self.input_to_hidden.expect_shape("inputToHidden", (INPUT_SIZE, HIDDEN_SIZE))?;
        self.hidden_to_output.expect_shape("hiddenToOutput", (HIDDEN_SIZE, OUTPUT_SIZE))?;
        if !self.input_to_hidden.is_finite() || !self.hidden_to_output.is_finite() {
            return Err(EngineError::NonFiniteInput("weights"));
        }
        Ok(())
    }

    pub fn input_to_hidden(&self) -> &Matrix {
        &self.input_to_hidden
    }

    pub fn hidden_to_output(&self) -> &Matrix {
        &self.hidden_to_output
    }

    /// Element-wise `self - previous`, for before/after comparisons.
    pub fn delta(&self, previous: &WeightSet) -> Result<WeightSet> {
        previous.validate()?;
        self.validate()?;
        Ok(WeightSet {
            input_to_hidden: self.input_to_hidden.clone() - previous.input_to_hidden.clone(),
            hidden_to_output: self.hidden_to_output.clone() - previous.hidden_to_output.clone(),
        })
    }

    /// Built only by the optimizer, which has already checked gradient shapes.
    pub(crate) fn from_parts_unchecked(input_to_hidden: Matrix, hidden_to_output: Matrix) -> WeightSet {
        WeightSet { input_to_hidden, hidden_to_output }
    }
}

impl Default for WeightSet {
    fn default() -> Self {
        WeightSet::fixed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn canonical_sets_are_valid() {
        assert!(WeightSet::fixed().validate().is_ok());
        assert!(WeightSet::gentle().validate().is_ok());
    }

    #[test]
    fn random_init_is_seed_deterministic_and_bounded() {
        let a = WeightSet::random(&mut ChaCha12Rng::seed_from_u64(42), 0.2);
        let b = WeightSet::random(&mut ChaCha12Rng::seed_from_u64(42), 0.2);
        assert_eq!(a, b);
        assert!(a.validate().is_ok());
        let all = a.input_to_hidden().data.iter().chain(a.hidden_to_output().data.iter()).flatten();
        for w in all {
            assert!((-0.2..0.2).contains(w));
        }
    }

    #[test]
    fn from_rows_rejects_transposed_matrix() {
        let ith = WeightSet::fixed().input_to_hidden().transpose().data;
        let hto = WeightSet::fixed().hidden_to_output().data.clone();
        assert!(matches!(
            WeightSet::from_rows(ith, hto),
            Err(EngineError::ShapeMismatch { what: "inputToHidden", expected: (3, 4), found: (4, 3) })
        ));
    }

    #[test]
    fn validate_rejects_nan_weight() {
        let mut ith = WeightSet::fixed().input_to_hidden().clone();
        ith.data[2][1] = f64::NAN;
        let err = WeightSet::try_new(ith, WeightSet::fixed().hidden_to_output().clone());
        assert!(matches!(err, Err(EngineError::NonFiniteInput("weights"))));
    }

    #[test]
    fn delta_of_identical_snapshots_is_zero() {
        let w = WeightSet::fixed();
        let d = w.delta(&w).unwrap();
        assert!(d.input_to_hidden().data.iter().flatten().all(|x| *x == 0.0));
        assert!(d.hidden_to_output().data.iter().flatten().all(|x| *x == 0.0));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(WeightSet::fixed()).unwrap();
        assert!(json.get("inputToHidden").is_some());
        assert!(json.get("hiddenToOutput").is_some());
    }
}
