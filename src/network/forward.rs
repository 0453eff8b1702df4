use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{EngineError, Result};
use crate::math::matrix::Matrix;
use crate::network::weights::WeightSet;
use crate::network::{HIDDEN_SIZE, INPUT_SIZE};

/// Which catalog entries the hidden and output layers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wiring {
    pub hidden: ActivationFunction,
    pub output: ActivationFunction,
}

impl Default for Wiring {
    /// ReLU hidden layer, Sigmoid output.
    fn default() -> Self {
        Wiring { hidden: ActivationFunction::ReLU, output: ActivationFunction::Sigmoid }
    }
}

/// Everything one forward pass computed, layer by layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardResult {
    pub inputs: [f64; INPUT_SIZE],
    /// z = x·W (no bias terms in this model)
    pub hidden_pre: [f64; HIDDEN_SIZE],
    pub hidden: [f64; HIDDEN_SIZE],
    pub output_pre: f64,
    pub output: f64,
}

impl Wiring {
    /// Forward pass over a validated weight snapshot. Pure: reads `weights`
    /// and returns fresh values.
    pub fn forward(&self, weights: &WeightSet, inputs: &[f64; INPUT_SIZE]) -> Result<ForwardResult> {
        weights.validate()?;
        if inputs.iter().any(|x| !x.is_finite()) {
            return Err(EngineError::NonFiniteInput("normalized inputs"));
        }

        let z = Matrix::row(inputs) * weights.input_to_hidden().clone();
        let a = z.map(|x| self.hidden.function(x));

        let out_z = a.clone() * weights.hidden_to_output().clone();
        let output_pre = out_z.data[0][0];

        Ok(ForwardResult {
            inputs: *inputs,
            hidden_pre: std::array::from_fn(|j| z.data[0][j]),
            hidden: std::array::from_fn(|j| a.data[0][j]),
            output_pre,
            output: self.output.function(output_pre),
        })
    }
}

/// Forward pass with the default ReLU/Sigmoid wiring.
pub fn forward(weights: &WeightSet, inputs: &[f64; INPUT_SIZE]) -> Result<ForwardResult> {
    Wiring::default().forward(weights, inputs)
}
