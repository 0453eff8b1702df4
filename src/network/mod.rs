pub mod backward;
pub mod forward;
pub mod impact;
pub mod weights;

/// Fixed 3-4-1 topology.
pub const INPUT_SIZE: usize = 3;
pub const HIDDEN_SIZE: usize = 4;
pub const OUTPUT_SIZE: usize = 1;

pub use backward::{backward, GradientResult};
pub use forward::{forward, ForwardResult, Wiring};
pub use impact::ImpactLevel;
pub use weights::{WeightInit, WeightSet};
