//! Model description parsing
//!
//! Collapses fetched metadata and config into the descriptor reused by
//! every batch of a run.

use crate::error::ServingError;

use super::proto::{ModelConfig, ModelMetadataResponse};

/// Input/output description of a served model.
///
/// The name, datatype and format lists are parallel; the first input is
/// always the image tensor.
#[derive(Debug, Clone)]
pub struct ModelIo {
    pub max_batch_size: i32,
    pub input_names: Vec<String>,
    pub input_datatypes: Vec<String>,
    pub input_formats: Vec<i32>,
    pub output_names: Vec<String>,
    /// Image input dims after the batch dimension (e.g. `[3, 640, 640]`).
    pub image_dims: [i64; 3],
}

/// Build a [`ModelIo`] from the endpoint's metadata and config.
pub fn parse_model(
    metadata: &ModelMetadataResponse,
    config: &ModelConfig,
) -> Result<ModelIo, ServingError> {
    if metadata.inputs.is_empty() {
        return Err(ServingError::ModelDescription {
            model: metadata.name.clone(),
            reason: "model reports no inputs".to_string(),
        });
    }

    if config.input.len() < metadata.inputs.len() {
        return Err(ServingError::ModelDescription {
            model: metadata.name.clone(),
            reason: format!(
                "config lists {} input(s) but metadata lists {}",
                config.input.len(),
                metadata.inputs.len()
            ),
        });
    }

    let image_input = &metadata.inputs[0];
    if image_input.shape.len() < 4 {
        return Err(ServingError::ModelDescription {
            model: metadata.name.clone(),
            reason: format!(
                "image input '{}' has rank {}, expected at least 4",
                image_input.name,
                image_input.shape.len()
            ),
        });
    }

    let mut input_names = Vec::with_capacity(metadata.inputs.len());
    let mut input_datatypes = Vec::with_capacity(metadata.inputs.len());
    let mut input_formats = Vec::with_capacity(metadata.inputs.len());
    for (meta_input, config_input) in metadata.inputs.iter().zip(&config.input) {
        input_names.push(meta_input.name.clone());
        input_datatypes.push(meta_input.datatype.clone());
        input_formats.push(config_input.format);
    }

    let output_names = metadata.outputs.iter().map(|o| o.name.clone()).collect();
    let image_dims = [
        image_input.shape[1],
        image_input.shape[2],
        image_input.shape[3],
    ];

    Ok(ModelIo {
        max_batch_size: config.max_batch_size,
        input_names,
        input_datatypes,
        input_formats,
        output_names,
        image_dims,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serving::proto::model_config::{ModelInput, ModelOutput, TensorFormat};
    use crate::serving::proto::model_metadata_response::TensorMetadata;

    fn metadata() -> ModelMetadataResponse {
        ModelMetadataResponse {
            name: "face_detect".to_string(),
            versions: vec!["1".to_string()],
            platform: "onnxruntime_onnx".to_string(),
            inputs: vec![TensorMetadata {
                name: "input0".to_string(),
                datatype: "FP32".to_string(),
                shape: vec![-1, 3, 640, 640],
            }],
            outputs: vec![TensorMetadata {
                name: "output0".to_string(),
                datatype: "FP32".to_string(),
                shape: vec![-1, 100, 6],
            }],
        }
    }

    fn config() -> ModelConfig {
        ModelConfig {
            name: "face_detect".to_string(),
            platform: "onnxruntime_onnx".to_string(),
            max_batch_size: 8,
            input: vec![ModelInput {
                name: "input0".to_string(),
                format: TensorFormat::FormatNchw as i32,
                dims: vec![3, 640, 640],
            }],
            output: vec![ModelOutput {
                name: "output0".to_string(),
                dims: vec![100, 6],
            }],
        }
    }

    #[test]
    fn parses_parallel_lists() {
        let io = parse_model(&metadata(), &config()).unwrap();
        assert_eq!(io.max_batch_size, 8);
        assert_eq!(io.input_names, vec!["input0"]);
        assert_eq!(io.input_datatypes, vec!["FP32"]);
        assert_eq!(io.input_formats, vec![TensorFormat::FormatNchw as i32]);
        assert_eq!(io.output_names, vec!["output0"]);
        assert_eq!(io.image_dims, [3, 640, 640]);
    }

    #[test]
    fn rejects_model_without_inputs() {
        let mut meta = metadata();
        meta.inputs.clear();
        let err = parse_model(&meta, &config()).unwrap_err();
        assert!(matches!(err, ServingError::ModelDescription { .. }));
    }

    #[test]
    fn rejects_low_rank_image_input() {
        let mut meta = metadata();
        meta.inputs[0].shape = vec![3, 640];
        let err = parse_model(&meta, &config()).unwrap_err();
        assert!(matches!(err, ServingError::ModelDescription { .. }));
    }

    #[test]
    fn rejects_config_with_fewer_inputs_than_metadata() {
        let mut cfg = config();
        cfg.input.clear();
        let err = parse_model(&metadata(), &cfg).unwrap_err();
        assert!(matches!(err, ServingError::ModelDescription { .. }));
    }
}
