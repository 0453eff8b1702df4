pub mod activation;
pub mod engine;
pub mod train;
pub mod train_sse;
