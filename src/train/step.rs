use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::network::backward::GradientResult;
use crate::network::forward::{ForwardResult, Wiring};
use crate::network::weights::WeightSet;
use crate::network::INPUT_SIZE;
use crate::optim::sgd::Sgd;
use crate::train::history::TrainingHistoryEntry;

/// Everything one training iteration produced.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub forward: ForwardResult,
    pub gradients: GradientResult,
    pub entry: TrainingHistoryEntry,
}

impl StepOutcome {
    /// The post-update snapshot.
    pub fn weights(&self) -> &Arc<WeightSet> {
        &self.entry.weights
    }
}

/// One forward + backward + update cycle. Pure: `weights` is only read, and
/// the same arguments always produce the same outcome.
pub fn train_step(
    weights: &WeightSet,
    wiring: &Wiring,
    features: &[f64; INPUT_SIZE],
    target: f64,
    optimizer: &Sgd,
    iteration: usize,
) -> Result<StepOutcome> {
    let forward = wiring.forward(weights, features)?;
    let gradients = wiring.backward(weights, &forward, target)?;
    let updated = optimizer.step(weights, &gradients)?;

    let entry = TrainingHistoryEntry {
        iteration,
        loss: gradients.loss,
        prediction: forward.output,
        weights: Arc::new(updated),
    };

    Ok(StepOutcome { forward, gradients, entry })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: [f64; INPUT_SIZE] = [0.375, -5.0 / 30.0, 0.05];

    #[test]
    fn step_is_deterministic() {
        let sgd = Sgd::new(0.1).unwrap();
        let a = train_step(&WeightSet::fixed(), &Wiring::default(), &REFERENCE, 0.8, &sgd, 0).unwrap();
        let b = train_step(&WeightSet::fixed(), &Wiring::default(), &REFERENCE, 0.8, &sgd, 0).unwrap();
        assert_eq!(a.entry, b.entry);
        assert_eq!(a.gradients, b.gradients);
    }

    #[test]
    fn entry_records_pre_update_loss_and_post_update_weights() {
        let sgd = Sgd::new(0.3).unwrap();
        let w = WeightSet::fixed();
        let out = train_step(&w, &Wiring::default(), &REFERENCE, 0.8, &sgd, 7).unwrap();
        assert_eq!(out.entry.iteration, 7);
        assert_eq!(out.entry.prediction, out.forward.output);
        assert_eq!(out.entry.loss, out.gradients.loss);
        let expected = w.hidden_to_output().data[0][0] - 0.3 * out.gradients.hidden_to_output.data[0][0];
        assert_eq!(out.weights().hidden_to_output().data[0][0], expected);
    }

    #[test]
    fn all_zero_features_stall_input_weights() {
        let sgd = Sgd::new(0.5).unwrap();
        let w = WeightSet::fixed();
        let out = train_step(&w, &Wiring::default(), &[0.0; INPUT_SIZE], 0.8, &sgd, 0).unwrap();
        assert_eq!(out.weights().input_to_hidden(), w.input_to_hidden());
    }
}
