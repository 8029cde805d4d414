//! Configuration for the VAD streaming service.
//!
//! Options are a closed, typed set (see [`VadOptions`]), loaded from an
//! optional TOML file, then overridden by environment variables, then by
//! explicit runtime updates via `VadController::update`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sample rate required by the bundled model. No resampling is performed;
/// `VadOptions::rate` exists only so the wire contract can name it.
pub const SAMPLE_RATE: u32 = 16000;

/// Full, closed configuration for a VAD run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VadOptions {
    /// Sample rate in Hz. Must be 16000; anything else is rejected at `start()`.
    pub rate: u32,
    /// Directory where WAV segments are written.
    pub out_dir: PathBuf,
    /// Filesystem path to the Silero ONNX model artifact.
    pub model_path: PathBuf,
    /// Smoothed-probability threshold to arm speech start.
    pub speech_threshold: f32,
    /// Smoothed-probability threshold to arm speech end. Must stay below `speech_threshold`.
    pub silence_threshold: f32,
    /// Consecutive frames above `speech_threshold` required to confirm start.
    pub required_speech_frames: u32,
    /// Consecutive frames below `silence_threshold` required to confirm end.
    pub required_silence_frames: u32,
    /// Argv of the external recorder process. Must stream little-endian
    /// signed 16-bit mono PCM at `rate` Hz on stdout, no container header.
    pub recorder_command: Vec<String>,
}

impl Default for VadOptions {
    fn default() -> Self {
        Self {
            rate: SAMPLE_RATE,
            out_dir: PathBuf::from("segments"),
            model_path: PathBuf::from("models/silero_vad.onnx"),
            speech_threshold: 0.35,
            silence_threshold: 0.05,
            required_speech_frames: 2,
            required_silence_frames: 20,
            recorder_command: vec![
                "arecord".to_string(),
                "-q".to_string(),
                "-f".to_string(),
                "S16_LE".to_string(),
                "-c".to_string(),
                "1".to_string(),
                "-r".to_string(),
                "16000".to_string(),
                "-t".to_string(),
                "raw".to_string(),
            ],
        }
    }
}

impl VadOptions {
    /// Apply a partial update, mutating only the fields that are `Some`.
    pub fn apply(&mut self, update: VadOptionsUpdate) {
        if let Some(rate) = update.rate {
            self.rate = rate;
        }
        if let Some(out_dir) = update.out_dir {
            self.out_dir = PathBuf::from(out_dir);
        }
        if let Some(model_path) = update.model_path {
            self.model_path = PathBuf::from(model_path);
        }
        if let Some(v) = update.speech_threshold {
            self.speech_threshold = v;
        }
        if let Some(v) = update.silence_threshold {
            self.silence_threshold = v;
        }
        if let Some(v) = update.required_speech_frames {
            self.required_speech_frames = v;
        }
        if let Some(v) = update.required_silence_frames {
            self.required_silence_frames = v;
        }
        if let Some(v) = update.recorder_command {
            self.recorder_command = v;
        }
    }
}

/// Partial configuration delta. Every field nullable; only present fields
/// are merged by [`VadOptions::apply`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VadOptionsUpdate {
    pub rate: Option<u32>,
    pub out_dir: Option<String>,
    pub model_path: Option<String>,
    pub speech_threshold: Option<f32>,
    pub silence_threshold: Option<f32>,
    pub required_speech_frames: Option<u32>,
    pub required_silence_frames: Option<u32>,
    pub recorder_command: Option<Vec<String>>,
}

/// Settings for the HTTP control-plane server itself (not part of the
/// recognized `VadOptions` set exposed over `/api/v1/vad/options`).
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 5173 }
    }
}

impl ServerSettings {
    /// Read `PORT` from the environment, falling back to the default.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| Self::default().port);
        Self { port }
    }
}

/// Load `VadOptions` from an optional TOML file named by `VAD_CONFIG`,
/// returning defaults if the variable is unset or the file can't be read.
pub fn read_vad_options() -> VadOptions {
    let Ok(path) = std::env::var("VAD_CONFIG") else {
        return VadOptions::default();
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Failed to parse config at '{}': {}", path, e);
                VadOptions::default()
            }
        },
        Err(e) => {
            eprintln!("Failed to read config at '{}': {}", path, e);
            VadOptions::default()
        }
    }
}
