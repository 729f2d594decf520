//! Typed failures for the serving path.
//!
//! Every remote-call failure carries which operation failed and the
//! underlying transport or rpc error, so callers can branch on the kind
//! instead of checking a magic return value.

use thiserror::Error;

/// Errors raised while talking to the model serving endpoint.
#[derive(Debug, Error)]
pub enum ServingError {
    /// Client or channel construction failed.
    #[error("failed to create serving client for '{url}'")]
    Connection {
        url: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// The endpoint rejected the model metadata request.
    #[error("failed to retrieve metadata for model '{model}'")]
    MetadataFetch {
        model: String,
        #[source]
        source: tonic::Status,
    },

    /// The endpoint rejected the model config request.
    #[error("failed to retrieve config for model '{model}'")]
    ConfigFetch {
        model: String,
        #[source]
        source: tonic::Status,
    },

    /// Metadata/config were fetched but do not describe a usable model.
    #[error("model '{model}' is not usable: {reason}")]
    ModelDescription { model: String, reason: String },

    /// Samples could not be assembled into a batch tensor.
    #[error("failed to assemble batch: {reason}")]
    BatchAssembly { reason: String },

    /// A ModelInfer call failed; the whole run is aborted.
    #[error("inference request {request_id} failed")]
    Inference {
        request_id: String,
        #[source]
        source: tonic::Status,
    },
}
