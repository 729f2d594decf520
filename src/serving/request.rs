//! Batch request planning
//!
//! Groups preprocessed samples into fixed-size batches by cycling over
//! the input list, then builds one inference request per batch.

use std::collections::HashMap;

use ndarray::{ArrayD, ArrayViewD, Axis};

use crate::config::ServingConfig;
use crate::error::ServingError;

use super::model::ModelIo;
use super::proto::infer_parameter::ParameterChoice;
use super::proto::model_infer_request::{InferInputTensor, InferRequestedOutputTensor};
use super::proto::{InferParameter, InferTensorContents, ModelInferRequest};

enum CycleState {
    Collecting,
    Done,
}

/// Fixed-size windows over a sample list, wrapping around at the end.
///
/// Emission stops once one full cyclic pass completes: the window in
/// flight when the cursor wraps to zero still fills to full size (padding
/// with items from the start of the list) and is the last one yielded.
pub struct BatchWindows<'a> {
    samples: &'a [ArrayD<f32>],
    batch_size: usize,
    cursor: usize,
    state: CycleState,
}

impl<'a> BatchWindows<'a> {
    pub fn new(samples: &'a [ArrayD<f32>], batch_size: usize) -> Self {
        let state = if samples.is_empty() || batch_size == 0 {
            CycleState::Done
        } else {
            CycleState::Collecting
        };
        Self {
            samples,
            batch_size,
            cursor: 0,
            state,
        }
    }
}

impl<'a> Iterator for BatchWindows<'a> {
    type Item = Vec<&'a ArrayD<f32>>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, CycleState::Done) {
            return None;
        }

        let mut window = Vec::with_capacity(self.batch_size);
        for _ in 0..self.batch_size {
            window.push(&self.samples[self.cursor]);
            self.cursor = (self.cursor + 1) % self.samples.len();
            if self.cursor == 0 {
                self.state = CycleState::Done;
            }
        }
        Some(window)
    }
}

/// Turn one window into the request's primary input tensor.
///
/// With a positive max batch size the samples are stacked along a new
/// leading axis. A max batch size of zero means the model rejects
/// batching: only the window's first sample is sent, expanded with a
/// singleton leading dimension.
pub fn assemble_batch(
    window: &[&ArrayD<f32>],
    max_batch_size: i32,
) -> Result<ArrayD<f32>, ServingError> {
    let first = window.first().ok_or_else(|| ServingError::BatchAssembly {
        reason: "empty batch window".to_string(),
    })?;

    if max_batch_size > 0 {
        let views: Vec<ArrayViewD<'_, f32>> = window.iter().map(|sample| sample.view()).collect();
        ndarray::stack(Axis(0), &views).map_err(|err| ServingError::BatchAssembly {
            reason: err.to_string(),
        })
    } else {
        Ok((*first).clone().insert_axis(Axis(0)))
    }
}

/// Everything needed to turn tensors into one inference request.
pub struct RequestSpec<'a> {
    pub model_name: &'a str,
    pub model_version: &'a str,
    pub input_names: &'a [String],
    pub input_datatypes: &'a [String],
    pub output_names: &'a [String],
    pub class_count: i64,
}

/// Build a single inference request from parallel input tensors.
pub fn build_infer_request(
    input_data: &[&ArrayD<f32>],
    spec: &RequestSpec<'_>,
    request_id: String,
) -> ModelInferRequest {
    let inputs = spec
        .input_names
        .iter()
        .zip(spec.input_datatypes)
        .zip(input_data)
        .map(|((name, datatype), data)| InferInputTensor {
            name: name.clone(),
            datatype: datatype.clone(),
            shape: data.shape().iter().map(|&dim| dim as i64).collect(),
            parameters: HashMap::new(),
            contents: Some(InferTensorContents {
                fp32_contents: data.iter().copied().collect(),
                ..Default::default()
            }),
        })
        .collect();

    let outputs = spec
        .output_names
        .iter()
        .map(|name| {
            let mut parameters = HashMap::new();
            if spec.class_count > 0 {
                parameters.insert(
                    "classification".to_string(),
                    InferParameter {
                        parameter_choice: Some(ParameterChoice::Int64Param(spec.class_count)),
                    },
                );
            }
            InferRequestedOutputTensor {
                name: name.clone(),
                parameters,
            }
        })
        .collect();

    ModelInferRequest {
        model_name: spec.model_name.to_string(),
        model_version: spec.model_version.to_string(),
        id: request_id,
        parameters: HashMap::new(),
        inputs,
        outputs,
    }
}

/// Plan the full request sequence for one run.
///
/// The first sequence is the primary image tensors; `extra_inputs` are
/// auxiliary tensors repeated identically in every request. Request ids
/// are the 1-based batch index as a string.
pub fn plan_infer_requests(
    samples: &[ArrayD<f32>],
    extra_inputs: &[ArrayD<f32>],
    io: &ModelIo,
    serving: &ServingConfig,
) -> Result<Vec<ModelInferRequest>, ServingError> {
    let spec = RequestSpec {
        model_name: &serving.model_name,
        model_version: &serving.model_version,
        input_names: &io.input_names,
        input_datatypes: &io.input_datatypes,
        output_names: &io.output_names,
        class_count: serving.class_count,
    };

    let mut requests = Vec::new();
    for (index, window) in BatchWindows::new(samples, serving.batch_size).enumerate() {
        let batched = assemble_batch(&window, io.max_batch_size)?;

        let mut input_data: Vec<&ArrayD<f32>> = Vec::with_capacity(1 + extra_inputs.len());
        input_data.push(&batched);
        input_data.extend(extra_inputs.iter());

        requests.push(build_infer_request(&input_data, &spec, (index + 1).to_string()));
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn sample(value: f32) -> ArrayD<f32> {
        ArrayD::from_elem(IxDyn(&[3, 2, 2]), value)
    }

    fn samples(count: usize) -> Vec<ArrayD<f32>> {
        (0..count).map(|i| sample(i as f32)).collect()
    }

    fn first_value(tensor: &ArrayD<f32>) -> f32 {
        *tensor.iter().next().unwrap()
    }

    fn model_io(max_batch_size: i32) -> ModelIo {
        ModelIo {
            max_batch_size,
            input_names: vec!["input0".to_string()],
            input_datatypes: vec!["FP32".to_string()],
            input_formats: vec![2],
            output_names: vec!["output0".to_string()],
            image_dims: [3, 2, 2],
        }
    }

    fn serving_config(batch_size: usize, class_count: i64) -> ServingConfig {
        ServingConfig {
            url: "http://127.0.0.1:8001".to_string(),
            verbose: false,
            model_name: "face_detect".to_string(),
            model_version: "1".to_string(),
            batch_size,
            class_count,
        }
    }

    #[test]
    fn windows_cover_exact_multiple_once_in_order() {
        let samples = samples(6);
        let windows: Vec<_> = BatchWindows::new(&samples, 2).collect();
        assert_eq!(windows.len(), 3);

        let seen: Vec<f32> = windows
            .iter()
            .flat_map(|w| w.iter().map(|s| first_value(s)))
            .collect();
        assert_eq!(seen, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn final_window_wraps_to_front() {
        let samples = samples(5);
        let windows: Vec<_> = BatchWindows::new(&samples, 2).collect();
        assert_eq!(windows.len(), 3);

        let last: Vec<f32> = windows[2].iter().map(|s| first_value(s)).collect();
        assert_eq!(last, vec![4.0, 0.0]);
    }

    #[test]
    fn short_input_fills_one_window_with_wraparound() {
        let samples = samples(3);
        let windows: Vec<_> = BatchWindows::new(&samples, 4).collect();
        assert_eq!(windows.len(), 1);

        let only: Vec<f32> = windows[0].iter().map(|s| first_value(s)).collect();
        assert_eq!(only, vec![0.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn empty_input_emits_nothing() {
        let samples: Vec<ArrayD<f32>> = Vec::new();
        assert_eq!(BatchWindows::new(&samples, 4).count(), 0);
    }

    #[test]
    fn request_ids_count_up_from_one() {
        let samples = samples(5);
        let requests =
            plan_infer_requests(&samples, &[], &model_io(8), &serving_config(2, 0)).unwrap();

        let ids: Vec<&str> = requests.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn stacked_batches_grow_a_leading_dimension() {
        let samples = samples(4);
        let requests =
            plan_infer_requests(&samples, &[], &model_io(8), &serving_config(2, 0)).unwrap();

        for request in &requests {
            assert_eq!(request.inputs[0].shape, vec![2, 3, 2, 2]);
            let contents = request.inputs[0].contents.as_ref().unwrap();
            assert_eq!(contents.fp32_contents.len(), 2 * 3 * 2 * 2);
        }
    }

    #[test]
    fn zero_max_batch_size_sends_one_sample_per_request() {
        let samples = samples(3);
        let requests =
            plan_infer_requests(&samples, &[], &model_io(0), &serving_config(2, 0)).unwrap();

        // the cursor still advances by batch_size, so two windows cover the cycle
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!(request.inputs[0].shape, vec![1, 3, 2, 2]);
            let contents = request.inputs[0].contents.as_ref().unwrap();
            assert_eq!(contents.fp32_contents.len(), 3 * 2 * 2);
        }
    }

    #[test]
    fn auxiliary_inputs_repeat_in_every_request() {
        let samples = samples(4);
        let extra = vec![ArrayD::from_elem(IxDyn(&[4]), 7.5f32)];

        let mut io = model_io(8);
        io.input_names.push("aux0".to_string());
        io.input_datatypes.push("FP32".to_string());
        io.input_formats.push(0);

        let requests =
            plan_infer_requests(&samples, &extra, &io, &serving_config(2, 0)).unwrap();
        assert_eq!(requests.len(), 2);

        for request in &requests {
            assert_eq!(request.inputs.len(), 2);
            assert_eq!(request.inputs[1].name, "aux0");
            assert_eq!(request.inputs[1].shape, vec![4]);
            let contents = request.inputs[1].contents.as_ref().unwrap();
            assert_eq!(contents.fp32_contents, vec![7.5; 4]);
        }
    }

    #[test]
    fn class_count_sets_classification_parameter() {
        let samples = samples(2);
        let requests =
            plan_infer_requests(&samples, &[], &model_io(8), &serving_config(2, 7)).unwrap();

        let parameters = &requests[0].outputs[0].parameters;
        assert_eq!(
            parameters.get("classification"),
            Some(&InferParameter {
                parameter_choice: Some(ParameterChoice::Int64Param(7)),
            })
        );
    }

    #[test]
    fn without_class_count_outputs_carry_no_parameters() {
        let samples = samples(2);
        let requests =
            plan_infer_requests(&samples, &[], &model_io(8), &serving_config(2, 0)).unwrap();
        assert!(requests[0].outputs[0].parameters.is_empty());
    }

    #[test]
    fn mismatched_sample_shapes_fail_batch_assembly() {
        let samples = vec![sample(0.0), ArrayD::from_elem(IxDyn(&[3, 4, 4]), 1.0f32)];
        let err =
            plan_infer_requests(&samples, &[], &model_io(8), &serving_config(2, 0)).unwrap_err();
        assert!(matches!(err, ServingError::BatchAssembly { .. }));
    }
}
