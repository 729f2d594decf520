//! Remote model-serving integration
//!
//! Wraps the gRPC inference protocol: model description lookup, cyclic
//! batch planning, and strictly sequential request submission.

pub mod client;
pub mod model;
pub mod request;

// Include generated protobuf code
pub mod proto {
    include!("../proto/inference.rs");
}

pub use client::ServingClient;
pub use model::{parse_model, ModelIo};
pub use request::{plan_infer_requests, BatchWindows};
