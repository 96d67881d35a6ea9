use ndarray::{Array4, ArrayD};
use ort::inputs;
use ort::session::SessionOutputs;
use ort::value::Tensor;
use std::path::Path;

use crate::object_detection::ort_inference_session::OrtInferenceSession;

/// An ONNX YOLOv4 detector.
///
/// Owns the runtime session plus the graph's input and output names. The
/// output order is the declared graph order, which decoding relies on:
/// scale order for the full graph, the box/score pair for the quantized
/// graph.
pub struct Yolov4Model {
    ort_session: OrtInferenceSession,
    input_name: String,
    output_names: Vec<String>,
}

impl Yolov4Model {
    pub fn new(model_path: &Path) -> ort::Result<Self> {
        let ort_session = OrtInferenceSession::new(model_path)?;
        let input_name = ort_session.session.inputs[0].name.clone();
        let output_names = ort_session
            .session
            .outputs
            .iter()
            .map(|output| output.name.clone())
            .collect();
        Ok(Yolov4Model {
            ort_session,
            input_name,
            output_names,
        })
    }

    /// Run one preprocessed `[1, S, S, 3]` tensor through the network and
    /// return the raw outputs in graph order. No post-processing happens
    /// here; the decoder interprets the tensors.
    pub fn run(&self, input: &Array4<f32>) -> ort::Result<Vec<ArrayD<f32>>> {
        let outputs: SessionOutputs = self
            .ort_session
            .session
            .run(inputs![self.input_name.as_str() => Tensor::from_array(input.view())?]?)?;
        self.output_names
            .iter()
            .map(|name| Ok(outputs[name.as_str()].try_extract_tensor::<f32>()?.to_owned()))
            .collect()
    }
}
