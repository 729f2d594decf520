//! Service layer module

pub mod pipeline;
pub mod registry;

pub use pipeline::{run_media_inference, InferenceRun};
pub use registry::{MemoryRegistry, PersonRecord, PersonRegistry};
