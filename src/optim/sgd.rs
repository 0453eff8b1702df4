use crate::error::{EngineError, Result};
use crate::network::backward::GradientResult;
use crate::network::weights::WeightSet;
use crate::network::{HIDDEN_SIZE, INPUT_SIZE, OUTPUT_SIZE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Result<Sgd> {
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(EngineError::InvalidLearningRate(learning_rate));
        }
        Ok(Sgd { learning_rate })
    }

    /// Builds the next snapshot, `w ← w − lr·∂L/∂w` for both matrices.
    ///
    /// Gradients whose shapes do not match the weights are rejected before
    /// any arithmetic runs; `weights` itself is never touched.
    pub fn step(&self, weights: &WeightSet, gradients: &GradientResult) -> Result<WeightSet> {
        weights.validate()?;
        gradients.input_to_hidden.expect_shape("inputToHidden gradient", (INPUT_SIZE, HIDDEN_SIZE))?;
        gradients.hidden_to_output.expect_shape("hiddenToOutput gradient", (HIDDEN_SIZE, OUTPUT_SIZE))?;
        if !gradients.input_to_hidden.is_finite() || !gradients.hidden_to_output.is_finite() {
            return Err(EngineError::NonFiniteInput("gradients"));
        }

        let lr = self.learning_rate;
        Ok(WeightSet::from_parts_unchecked(
            weights.input_to_hidden().clone() - gradients.input_to_hidden.map(|x| x * lr),
            weights.hidden_to_output().clone() - gradients.hidden_to_output.map(|x| x * lr),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;

    fn unit_gradients() -> GradientResult {
        GradientResult {
            output_error: 0.0,
            output_delta: 0.0,
            hidden_delta: [0.0; HIDDEN_SIZE],
            hidden_to_output: Matrix::from_data(vec![vec![1.0]; HIDDEN_SIZE]),
            input_to_hidden: Matrix::from_data(vec![vec![1.0; HIDDEN_SIZE]; INPUT_SIZE]),
            loss: 0.0,
        }
    }

    #[test]
    fn rejects_non_positive_learning_rate() {
        assert!(matches!(Sgd::new(0.0), Err(EngineError::InvalidLearningRate(_))));
        assert!(matches!(Sgd::new(-0.1), Err(EngineError::InvalidLearningRate(_))));
        assert!(matches!(Sgd::new(f64::INFINITY), Err(EngineError::InvalidLearningRate(_))));
    }

    #[test]
    fn step_subtracts_scaled_gradient_without_mutating_input() {
        let before = WeightSet::fixed();
        let after = Sgd::new(0.5).unwrap().step(&before, &unit_gradients()).unwrap();
        assert_eq!(before, WeightSet::fixed());
        assert_eq!(after.input_to_hidden().data[0][0], 0.0);
        assert_eq!(after.hidden_to_output().data[2][0], -1.0);
    }

    #[test]
    fn rejects_misshapen_gradient() {
        let mut g = unit_gradients();
        g.input_to_hidden = Matrix::zeros(4, 3);
        let err = Sgd::new(0.1).unwrap().step(&WeightSet::fixed(), &g);
        assert!(matches!(err, Err(EngineError::ShapeMismatch { what: "inputToHidden gradient", .. })));
    }

    #[test]
    fn rejects_nan_gradient() {
        let mut g = unit_gradients();
        g.hidden_to_output.data[1][0] = f64::NAN;
        let err = Sgd::new(0.1).unwrap().step(&WeightSet::fixed(), &g);
        assert!(matches!(err, Err(EngineError::NonFiniteInput("gradients"))));
    }
}
