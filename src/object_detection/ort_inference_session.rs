use ort::session::Session;
use std::path::Path;

/// An onnxruntime inference session.
pub struct OrtInferenceSession {
    pub(crate) session: Session,
}

impl OrtInferenceSession {
    pub fn new(model_path: &Path) -> ort::Result<Self> {
        let session = Session::builder()?.commit_from_file(model_path)?;
        Ok(Self { session })
    }
}
