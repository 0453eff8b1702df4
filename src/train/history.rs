use std::sync::Arc;

use serde::{Serialize, Deserialize};

use crate::network::weights::WeightSet;

/// One completed training iteration.
///
/// `loss` and `prediction` come from the forward pass that produced this
/// iteration's gradients; `weights` is the snapshot after the update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistoryEntry {
    /// 0-based, strictly increasing across steps and runs until reset.
    pub iteration: usize,
    pub loss: f64,
    pub prediction: f64,
    pub weights: Arc<WeightSet>,
}
