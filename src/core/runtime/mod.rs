//! # Runtime Module
//!
//! ONNX Runtime session creation shared by the detector and the encoder.

use crate::error::ModelError;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;

/// Threads ONNX Runtime may use inside a single operator
const INTRA_THREADS: usize = 4;

/// Open an ONNX model file as an inference session.
///
/// A path that does not point at a file is reported as
/// [`ModelError::NotFound`] before the runtime is touched.
pub fn load_session(model_path: &Path) -> Result<Session, ModelError> {
    if !model_path.is_file() {
        return Err(ModelError::NotFound {
            path: model_path.to_path_buf(),
        });
    }

    let load_failed = |e: ort::Error| ModelError::LoadFailed {
        path: model_path.to_path_buf(),
        reason: e.to_string(),
    };

    let session = Session::builder()
        .map_err(load_failed)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(load_failed)?
        .with_intra_threads(INTRA_THREADS)
        .map_err(load_failed)?
        .commit_from_file(model_path)
        .map_err(load_failed)?;

    tracing::debug!(
        model = %model_path.display(),
        inputs = ?session.inputs.iter().map(|i| &i.name).collect::<Vec<_>>(),
        outputs = ?session.outputs.iter().map(|o| &o.name).collect::<Vec<_>>(),
        "loaded ONNX model"
    );

    Ok(session)
}

/// Name of the model's first input
pub fn first_input_name(session: &Session, model_path: &Path) -> Result<String, ModelError> {
    session
        .inputs
        .first()
        .map(|input| input.name.clone())
        .ok_or_else(|| ModelError::InvalidSignature {
            path: model_path.to_path_buf(),
            reason: "model declares no inputs".to_string(),
        })
}
