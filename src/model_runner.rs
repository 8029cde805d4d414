//! Wraps the opaque Silero VAD ONNX session, threading the recurrent hidden
//! state strictly in stream order.

use ndarray::{Array, Array3};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputs};
use ort::value::Tensor;
use std::path::Path;

use crate::error::{Result, VadError};
use crate::framer::FRAME_SIZE;

/// Recurrent hidden-state shape the bundled Silero graph expects. (The
/// model's published export has carried this shape in both `[2, 1, 128]`
/// and `[1, 2, 128]` orderings across versions; this runner matches
/// whichever the artifact at `model_path` actually requires — see
/// DESIGN.md for the resolution of this open question.)
const HIDDEN_SHAPE: [usize; 3] = [2, 1, 128];

/// Owns the ONNX session and the hidden state exclusively; the state is
/// replaced by move on every `infer` call, never aliased.
pub struct ModelRunner {
    session: Session,
    hidden: Array3<f32>,
    sample_rate: Array<i64, ndarray::Ix1>,
}

impl ModelRunner {
    pub fn load(model_path: impl AsRef<Path>, sample_rate: u32) -> Result<Self> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(VadError::ModelUnavailable(format!(
                "model file not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.with_inter_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| VadError::ModelUnavailable(e.to_string()))?;

        Ok(Self {
            session,
            hidden: Array3::<f32>::zeros(HIDDEN_SHAPE),
            sample_rate: Array::from_shape_vec([1], vec![sample_rate as i64])
                .expect("fixed-length shape always valid"),
        })
    }

    /// Reset the hidden state to zero (called once at pipeline start; never
    /// mid-stream).
    pub fn reset(&mut self) {
        self.hidden = Array3::<f32>::zeros(HIDDEN_SHAPE);
    }

    /// Run one inference call: normalize the frame, feed it alongside the
    /// current hidden state and sample rate, and retain the returned hidden
    /// state for the next call.
    pub fn infer(&mut self, frame: &[i16; FRAME_SIZE]) -> Result<f32> {
        let mut normalized = Array::zeros((1, FRAME_SIZE));
        for (i, &sample) in frame.iter().enumerate() {
            normalized[[0, i]] = sample as f32 / 32768.0;
        }

        let frame_tensor = Tensor::from_array(normalized)
            .map_err(|e| VadError::InferenceFailed(e.to_string()))?;
        let state_tensor = Tensor::from_array(std::mem::take(&mut self.hidden))
            .map_err(|e| VadError::InferenceFailed(e.to_string()))?;
        let rate_tensor = Tensor::from_array(self.sample_rate.clone())
            .map_err(|e| VadError::InferenceFailed(e.to_string()))?;

        let inputs = ort::inputs![frame_tensor, state_tensor, rate_tensor];
        let outputs = self
            .session
            .run(SessionInputs::ValueSlice::<3>(&inputs))
            .map_err(|e| VadError::InferenceFailed(e.to_string()))?;

        self.hidden = outputs["stateN"]
            .try_extract_array::<f32>()
            .map_err(|e| VadError::InferenceFailed(e.to_string()))?
            .into_dimensionality::<ndarray::Ix3>()
            .map_err(|e| VadError::InferenceFailed(e.to_string()))?
            .to_owned();

        let output = outputs["output"]
            .try_extract_tensor::<f32>()
            .map_err(|e| VadError::InferenceFailed(e.to_string()))?;

        output
            .1
            .first()
            .copied()
            .ok_or_else(|| VadError::InferenceFailed("model returned no output".to_string()))
    }
}
