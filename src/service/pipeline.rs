//! End-to-end media inference run
//!
//! Glues the media loader, batch planner and serving client together:
//! decode and preprocess the items, plan one request per batch, submit
//! them sequentially and hand the raw responses back to the caller.

use ndarray::ArrayD;

use crate::config::Config;
use crate::error::ServingError;
use crate::media::preprocess::chw_transform;
use crate::media::{extract_from_media, ExtractedMedia, MediaItem};
use crate::serving::proto::ModelInferResponse;
use crate::serving::{parse_model, plan_infer_requests, ServingClient};

/// Outcome of one media inference run: raw responses in submission order
/// plus the loader's parallel sequences for downstream result handling.
pub struct InferenceRun {
    pub responses: Vec<ModelInferResponse>,
    pub media: ExtractedMedia,
}

/// Run the full pipeline for a list of media items.
///
/// The model description is fetched once and reused for every batch.
/// Items that fail to decode or preprocess are skipped by the loader;
/// a failed inference call aborts the whole run.
pub async fn run_media_inference(
    client: &mut ServingClient,
    config: &Config,
    items: &[MediaItem],
    extra_inputs: &[ArrayD<f32>],
) -> Result<InferenceRun, ServingError> {
    let (metadata, model_config) = client
        .model_description(&config.serving.model_name, &config.serving.model_version)
        .await?;
    let io = parse_model(&metadata, &model_config)?;

    let transform = chw_transform(config.media.resize_width, config.media.resize_height);
    let media = extract_from_media(&config.media, transform, items);

    let requests = plan_infer_requests(&media.tensors, extra_inputs, &io, &config.serving)?;
    let responses = client.collect_inference_responses(requests).await?;

    Ok(InferenceRun { responses, media })
}
