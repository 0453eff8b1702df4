use serde::{Serialize, Deserialize};

use crate::error::{EngineError, Result};

/// Slope of Leaky ReLU on the negative side.
pub const LEAKY_SLOPE: f64 = 0.01;

/// Sigmoid output is clamped to these so it stays strictly inside (0, 1)
/// and its derivative stays positive even for saturated inputs.
pub const SIGMOID_MIN: f64 = f64::MIN_POSITIVE;
pub const SIGMOID_MAX: f64 = 1.0 - f64::EPSILON / 2.0;

/// Default plotting window for `ActivationFunction::sample`.
pub const DEFAULT_SAMPLE_RANGE: (f64, f64) = (-5.0, 5.0);
pub const DEFAULT_SAMPLE_POINTS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    #[serde(rename = "relu")]
    ReLU,
    Sigmoid,
    Tanh,
    #[serde(rename = "leaky_relu", alias = "leakyRelu")]
    LeakyReLU,
}

/// Display metadata for one catalog entry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ActivationDescriptor {
    pub function: ActivationFunction,
    pub key: &'static str,
    pub name: &'static str,
    pub formula: &'static str,
    pub derivative_formula: &'static str,
    pub description: &'static str,
    pub use_case: &'static str,
}

/// The full catalog, in display order.
pub const CATALOG: [ActivationDescriptor; 4] = [
    ActivationDescriptor {
        function: ActivationFunction::ReLU,
        key: "relu",
        name: "ReLU (Rectified Linear Unit)",
        formula: "f(x) = max(0, x)",
        derivative_formula: "f'(x) = 1 if x > 0, else 0",
        description: "Most common in hidden layers. Avoids the vanishing gradient problem for positive inputs.",
        use_case: "Hidden layers in deep networks",
    },
    ActivationDescriptor {
        function: ActivationFunction::Sigmoid,
        key: "sigmoid",
        name: "Sigmoid",
        formula: "f(x) = 1 / (1 + e^(-x))",
        derivative_formula: "f'(x) = f(x) * (1 - f(x))",
        description: "Outputs between 0 and 1. Good for binary classification outputs.",
        use_case: "Binary classification output",
    },
    ActivationDescriptor {
        function: ActivationFunction::Tanh,
        key: "tanh",
        name: "Tanh (Hyperbolic Tangent)",
        formula: "f(x) = (e^x - e^(-x)) / (e^x + e^(-x))",
        derivative_formula: "f'(x) = 1 - f(x)²",
        description: "Outputs between -1 and 1. Zero-centered, often better than sigmoid.",
        use_case: "Hidden layers when zero-centered outputs are desired",
    },
    ActivationDescriptor {
        function: ActivationFunction::LeakyReLU,
        key: "leaky_relu",
        name: "Leaky ReLU",
        formula: "f(x) = max(0.01x, x)",
        derivative_formula: "f'(x) = 1 if x > 0, else 0.01",
        description: "Like ReLU but lets a small gradient through for negative inputs. Prevents dead neurons.",
        use_case: "When ReLU causes dead neuron problems",
    },
];

impl ActivationFunction {
    /// Resolves a catalog entry by name. Case-insensitive; `-`, `_` and
    /// spaces are ignored so `leaky_relu`, `Leaky ReLU` and `leakyRelu` all match.
    pub fn from_name(name: &str) -> Result<ActivationFunction> {
        let wanted: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        CATALOG
            .iter()
            .find(|d| d.key.replace('_', "") == wanted)
            .map(|d| d.function)
            .ok_or_else(|| EngineError::UnknownActivation(name.to_owned()))
    }

    pub fn descriptor(&self) -> &'static ActivationDescriptor {
        match self {
            ActivationFunction::ReLU => &CATALOG[0],
            ActivationFunction::Sigmoid => &CATALOG[1],
            ActivationFunction::Tanh => &CATALOG[2],
            ActivationFunction::LeakyReLU => &CATALOG[3],
        }
    }

    /// Element-wise activation.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Sigmoid => (1.0 / (1.0 + (-x).exp())).clamp(SIGMOID_MIN, SIGMOID_MAX),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU => if x > 0.0 { x } else { LEAKY_SLOPE * x },
        }
    }

    /// Element-wise derivative, evaluated at the pre-activation `x`.
    ///
    /// At the ReLU kink (`x == 0`) this returns the left derivative, 0.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            },
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::LeakyReLU => if x > 0.0 { 1.0 } else { LEAKY_SLOPE },
        }
    }

    /// `(value, derivative)` at `x`.
    pub fn evaluate(&self, x: f64) -> (f64, f64) {
        (self.function(x), self.derivative(x))
    }

    /// Samples the curve at `points` evenly spaced positions across `range`
    /// (both ends included). Returns `(x, value, derivative)` triples.
    pub fn sample(&self, range: (f64, f64), points: usize) -> Vec<(f64, f64, f64)> {
        let (lo, hi) = range;
        match points {
            0 => Vec::new(),
            1 => vec![(lo, self.function(lo), self.derivative(lo))],
            n => (0..n)
                .map(|i| {
                    let x = lo + (hi - lo) * i as f64 / (n - 1) as f64;
                    (x, self.function(x), self.derivative(x))
                })
                .collect(),
        }
    }
}

/// Looks up `name` in the catalog and evaluates it at `x`.
pub fn evaluate_by_name(name: &str, x: f64) -> Result<(f64, f64)> {
    Ok(ActivationFunction::from_name(name)?.evaluate(x))
}
