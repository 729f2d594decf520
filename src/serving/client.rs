//! gRPC adapter for the model serving endpoint
//!
//! Connection setup, model description retrieval and the per-batch
//! inference call. No retries: a failed remote call surfaces as a typed
//! [`ServingError`] and, for inference, aborts the whole run.

use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use crate::error::ServingError;

use super::proto::grpc_inference_service_client::GrpcInferenceServiceClient;
use super::proto::{
    ModelConfig, ModelConfigRequest, ModelInferRequest, ModelInferResponse,
    ModelMetadataRequest, ModelMetadataResponse,
};

/// Client handle for one serving endpoint.
#[derive(Debug)]
pub struct ServingClient {
    inner: GrpcInferenceServiceClient<Channel>,
    verbose: bool,
}

impl ServingClient {
    /// Connect to a serving endpoint, e.g. `http://127.0.0.1:8001`.
    pub async fn connect(url: &str, verbose: bool) -> Result<Self, ServingError> {
        let endpoint =
            Endpoint::from_shared(url.to_string()).map_err(|source| ServingError::Connection {
                url: url.to_string(),
                source,
            })?;

        let channel = endpoint.connect().await.map_err(|source| ServingError::Connection {
            url: url.to_string(),
            source,
        })?;

        Ok(Self {
            inner: GrpcInferenceServiceClient::new(channel),
            verbose,
        })
    }

    /// Fetch input/output metadata for a model.
    pub async fn model_metadata(
        &mut self,
        model_name: &str,
        model_version: &str,
    ) -> Result<ModelMetadataResponse, ServingError> {
        let request = ModelMetadataRequest {
            name: model_name.to_string(),
            version: model_version.to_string(),
        };

        self.inner
            .model_metadata(request)
            .await
            .map(|response| response.into_inner())
            .map_err(|source| ServingError::MetadataFetch {
                model: model_name.to_string(),
                source,
            })
    }

    /// Fetch the serving configuration for a model.
    pub async fn model_config(
        &mut self,
        model_name: &str,
        model_version: &str,
    ) -> Result<ModelConfig, ServingError> {
        let request = ModelConfigRequest {
            name: model_name.to_string(),
            version: model_version.to_string(),
        };

        let response = self.inner.model_config(request).await.map_err(|source| {
            ServingError::ConfigFetch {
                model: model_name.to_string(),
                source,
            }
        })?;

        response
            .into_inner()
            .config
            .ok_or_else(|| ServingError::ModelDescription {
                model: model_name.to_string(),
                reason: "endpoint returned an empty model config".to_string(),
            })
    }

    /// Fetch metadata and config together; callers feed the pair to
    /// [`parse_model`](super::model::parse_model).
    pub async fn model_description(
        &mut self,
        model_name: &str,
        model_version: &str,
    ) -> Result<(ModelMetadataResponse, ModelConfig), ServingError> {
        let metadata = self.model_metadata(model_name, model_version).await?;
        let config = self.model_config(model_name, model_version).await?;
        Ok((metadata, config))
    }

    /// Send one inference request and wait for its response.
    pub async fn infer(
        &mut self,
        request: ModelInferRequest,
    ) -> Result<ModelInferResponse, ServingError> {
        let request_id = request.id.clone();
        if self.verbose {
            debug!(
                request_id = %request_id,
                model = %request.model_name,
                inputs = request.inputs.len(),
                "sending inference request"
            );
        }

        self.inner
            .model_infer(request)
            .await
            .map(|response| response.into_inner())
            .map_err(|source| ServingError::Inference { request_id, source })
    }

    /// Send planned requests strictly one after another, collecting
    /// responses in submission order.
    ///
    /// All-or-nothing: the first failure aborts the run and already
    /// collected responses are discarded.
    pub async fn collect_inference_responses(
        &mut self,
        requests: Vec<ModelInferRequest>,
    ) -> Result<Vec<ModelInferResponse>, ServingError> {
        let mut responses = Vec::with_capacity(requests.len());
        for request in requests {
            responses.push(self.infer(request).await?);
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_is_a_connection_error() {
        let err = ServingClient::connect("not a url", false).await.unwrap_err();
        assert!(matches!(err, ServingError::Connection { .. }));
    }
}
