pub mod query;
pub mod sse;
