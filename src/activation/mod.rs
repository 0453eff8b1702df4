pub mod activation;

pub use activation::{
    evaluate_by_name, ActivationDescriptor, ActivationFunction, CATALOG, DEFAULT_SAMPLE_POINTS,
    DEFAULT_SAMPLE_RANGE,
};
