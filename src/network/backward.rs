use serde::{Serialize, Deserialize};

use crate::error::{EngineError, Result};
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::network::forward::{ForwardResult, Wiring};
use crate::network::weights::WeightSet;
use crate::network::HIDDEN_SIZE;

/// Error signals and weight gradients for one example.
///
/// `hidden_to_output` and `input_to_hidden` have the same shapes as the
/// matching `WeightSet` matrices (4×1 and 3×4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientResult {
    /// prediction − target
    pub output_error: f64,
    pub output_delta: f64,
    pub hidden_delta: [f64; HIDDEN_SIZE],
    pub hidden_to_output: Matrix,
    pub input_to_hidden: Matrix,
    /// ½·error²
    pub loss: f64,
}

/// Target values are probabilities.
pub fn validate_target(target: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&target) {
        return Err(EngineError::InvalidTarget(target));
    }
    Ok(())
}

impl Wiring {
    /// Backpropagates the output error of `forward` through both layers.
    ///
    /// `forward` must come from this wiring and these weights; derivatives are
    /// evaluated at the stored pre-activations.
    pub fn backward(&self, weights: &WeightSet, forward: &ForwardResult, target: f64) -> Result<GradientResult> {
        weights.validate()?;
        validate_target(target)?;
        let all_finite = forward.inputs.iter()
            .chain(forward.hidden_pre.iter())
            .chain(forward.hidden.iter())
            .chain([forward.output_pre, forward.output].iter())
            .all(|x| x.is_finite());
        if !all_finite {
            return Err(EngineError::NonFiniteInput("forward result"));
        }

        let output_error = MseLoss::derivative(forward.output, target);
        let output_delta = output_error * self.output.derivative(forward.output_pre);
        let delta = Matrix::from_data(vec![vec![output_delta]]);

        // Propagate δ_out through the output weights to get ∂L/∂a_hidden.
        let hidden_error = delta.clone() * weights.hidden_to_output().transpose();
        let act_derivative = Matrix::row(&forward.hidden_pre).map(|x| self.hidden.derivative(x));
        let hidden_delta = hidden_error.hadamard(&act_derivative);

        let hidden_to_output = Matrix::row(&forward.hidden).transpose() * delta;
        let input_to_hidden = Matrix::row(&forward.inputs).transpose() * hidden_delta.clone();

        Ok(GradientResult {
            output_error,
            output_delta,
            hidden_delta: std::array::from_fn(|j| hidden_delta.data[0][j]),
            hidden_to_output,
            input_to_hidden,
            loss: MseLoss::loss(forward.output, target),
        })
    }
}

/// Backward pass with the default ReLU/Sigmoid wiring.
pub fn backward(weights: &WeightSet, forward: &ForwardResult, target: f64) -> Result<GradientResult> {
    Wiring::default().backward(weights, forward, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::forward::forward as forward_pass;
    use crate::network::INPUT_SIZE;

    const REFERENCE: [f64; INPUT_SIZE] = [0.375, -5.0 / 30.0, 0.05];

    fn loss_at(weights: &WeightSet, target: f64) -> f64 {
        let f = forward_pass(weights, &REFERENCE).unwrap();
        MseLoss::loss(f.output, target)
    }

    fn nudged(weights: &WeightSet, layer: usize, i: usize, j: usize, by: f64) -> WeightSet {
        let mut ith = weights.input_to_hidden().clone();
        let mut hto = weights.hidden_to_output().clone();
        if layer == 0 { ith.data[i][j] += by } else { hto.data[i][j] += by }
        WeightSet::try_new(ith, hto).unwrap()
    }

    #[test]
    fn sigmoid_delta_matches_output_form() {
        let w = WeightSet::fixed();
        let f = forward_pass(&w, &REFERENCE).unwrap();
        let g = backward(&w, &f, 0.8).unwrap();
        let expected = (f.output - 0.8) * f.output * (1.0 - f.output);
        assert!((g.output_delta - expected).abs() < 1e-15);
        assert!((g.loss - 0.5 * g.output_error * g.output_error).abs() < 1e-15);
    }

    #[test]
    fn inactive_hidden_units_get_no_gradient() {
        let w = WeightSet::fixed();
        let f = forward_pass(&w, &REFERENCE).unwrap();
        let g = backward(&w, &f, 0.8).unwrap();
        // Units 1 and 3 have negative pre-activations under ReLU.
        for j in [1, 3] {
            assert_eq!(g.hidden_delta[j], 0.0);
            assert_eq!(g.hidden_to_output.data[j][0], 0.0);
            for i in 0..INPUT_SIZE {
                assert_eq!(g.input_to_hidden.data[i][j], 0.0);
            }
        }
    }

    #[test]
    fn gradients_match_central_difference() {
        let w = WeightSet::fixed();
        let f = forward_pass(&w, &REFERENCE).unwrap();
        let g = backward(&w, &f, 0.8).unwrap();
        let h = 1e-6;

        for i in 0..INPUT_SIZE {
            for j in 0..HIDDEN_SIZE {
                let numeric = (loss_at(&nudged(&w, 0, i, j, h), 0.8)
                    - loss_at(&nudged(&w, 0, i, j, -h), 0.8)) / (2.0 * h);
                assert!((numeric - g.input_to_hidden.data[i][j]).abs() < 1e-6, "w_ih[{i}][{j}]");
            }
        }
        for j in 0..HIDDEN_SIZE {
            let numeric = (loss_at(&nudged(&w, 1, j, 0, h), 0.8)
                - loss_at(&nudged(&w, 1, j, 0, -h), 0.8)) / (2.0 * h);
            assert!((numeric - g.hidden_to_output.data[j][0]).abs() < 1e-6, "w_ho[{j}]");
        }
    }

    #[test]
    fn gradient_shapes_match_weights() {
        let w = WeightSet::fixed();
        let f = forward_pass(&w, &REFERENCE).unwrap();
        let g = backward(&w, &f, 0.3).unwrap();
        assert_eq!(g.input_to_hidden.shape(), w.input_to_hidden().shape());
        assert_eq!(g.hidden_to_output.shape(), w.hidden_to_output().shape());
    }

    #[test]
    fn rejects_target_outside_unit_interval() {
        let w = WeightSet::fixed();
        let f = forward_pass(&w, &REFERENCE).unwrap();
        assert!(matches!(backward(&w, &f, 1.5), Err(EngineError::InvalidTarget(_))));
        assert!(matches!(backward(&w, &f, f64::NAN), Err(EngineError::InvalidTarget(_))));
    }

    #[test]
    fn rejects_non_finite_forward_fields() {
        let w = WeightSet::fixed();
        let clean = forward_pass(&w, &REFERENCE).unwrap();

        let mut f = clean.clone();
        f.hidden[0] = f64::NAN;
        assert!(matches!(backward(&w, &f, 0.8), Err(EngineError::NonFiniteInput("forward result"))));

        let mut f = clean.clone();
        f.inputs[1] = f64::INFINITY;
        assert!(matches!(backward(&w, &f, 0.8), Err(EngineError::NonFiniteInput("forward result"))));

        let mut f = clean;
        f.hidden_pre[2] = f64::NEG_INFINITY;
        assert!(matches!(backward(&w, &f, 0.8), Err(EngineError::NonFiniteInput("forward result"))));
    }
}
