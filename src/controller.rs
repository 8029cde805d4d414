//! Owns the VAD pipeline's lifecycle: child process handle, pipeline task,
//! and the status the control surface polls. Serializes `start`/`stop`.

use parking_lot::{Mutex as SyncMutex, RwLock};
use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::process::{Child, Command};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::config::{VadOptions, VadOptionsUpdate, SAMPLE_RATE};
use crate::error::{Result, VadError};
use crate::pipeline;

/// Status/counters shared between the pipeline task and control-plane
/// requests. Integer fields are atomics; the path needs a lock because it's
/// an owned `PathBuf`, not a word-sized value.
pub struct ControllerShared {
    pub running: AtomicBool,
    pub segments_saved: AtomicU64,
    pub last_segment_path: SyncMutex<Option<PathBuf>>,
    pub abort: AtomicBool,
}

impl Default for ControllerShared {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(false),
            segments_saved: AtomicU64::new(0),
            last_segment_path: SyncMutex::new(None),
            abort: AtomicBool::new(false),
        }
    }
}

/// Snapshot of runtime status returned by `status()` and embedded in
/// start/stop HTTP responses.
#[derive(Debug, Clone, Serialize)]
pub struct VadStatus {
    pub running: bool,
    pub segments_saved: u64,
    pub last_segment_path: Option<String>,
}

/// Held only across the awaits that spawning/joining the pipeline require;
/// the hot-path status fields above stay lock-free atomics so `status()`
/// never contends with `start`/`stop`.
#[derive(Default)]
struct Lifecycle {
    child: Option<Child>,
    pipeline_handle: Option<JoinHandle<()>>,
}

/// Checks the spec.md §3 configuration invariants that aren't enforced by
/// `VadOptions`'s type alone: the sample rate (no resampling is performed)
/// and `silence_threshold < speech_threshold` (otherwise the hysteresis
/// machine's dual thresholds are inverted).
fn validate_options(options: &VadOptions) -> Result<()> {
    if options.rate != SAMPLE_RATE {
        return Err(VadError::ModelUnavailable(format!(
            "unsupported sample rate {} (only {} is supported; no resampling is performed)",
            options.rate, SAMPLE_RATE
        )));
    }

    if options.silence_threshold >= options.speech_threshold {
        return Err(VadError::ModelUnavailable(format!(
            "silence_threshold ({}) must be below speech_threshold ({})",
            options.silence_threshold, options.speech_threshold
        )));
    }

    Ok(())
}

pub struct VadController {
    shared: Arc<ControllerShared>,
    options: RwLock<VadOptions>,
    lifecycle: AsyncMutex<Lifecycle>,
}

impl VadController {
    pub fn new(options: VadOptions) -> Self {
        Self {
            shared: Arc::new(ControllerShared::default()),
            options: RwLock::new(options),
            lifecycle: AsyncMutex::new(Lifecycle::default()),
        }
    }

    pub fn status(&self) -> VadStatus {
        VadStatus {
            running: self.shared.running.load(Ordering::Acquire),
            segments_saved: self.shared.segments_saved.load(Ordering::Acquire),
            last_segment_path: self
                .shared
                .last_segment_path
                .lock()
                .as_ref()
                .map(|p| p.display().to_string()),
        }
    }

    pub fn options_snapshot(&self) -> VadOptions {
        self.options.read().clone()
    }

    /// Merge a partial update into the current config. Rejected while
    /// running. The merged result is validated before it is committed, so a
    /// rejected update never leaves the live config half-applied.
    pub fn update(&self, update: VadOptionsUpdate) -> Result<()> {
        if self.shared.running.load(Ordering::Acquire) {
            return Err(VadError::BusyRunning);
        }

        let mut merged = self.options.read().clone();
        merged.apply(update);
        validate_options(&merged)?;

        *self.options.write() = merged;
        Ok(())
    }

    /// Start the pipeline: ensure `out_dir` exists, load the model,
    /// spawn the recorder child process, and launch the pipeline task.
    pub async fn start(&self, update: Option<VadOptionsUpdate>) -> Result<VadStatus> {
        let mut lifecycle = self.lifecycle.lock().await;

        if self.shared.running.load(Ordering::Acquire) {
            return Err(VadError::AlreadyRunning);
        }

        if let Some(update) = update {
            self.options.write().apply(update);
        }

        let options = self.options.read().clone();
        validate_options(&options)?;

        std::fs::create_dir_all(&options.out_dir)?;

        // Load eagerly, before anything is spawned: a missing or invalid
        // model must surface to this caller, not silently inside the
        // pipeline task after `running` has already gone true.
        let mut model = crate::model_runner::ModelRunner::load(&options.model_path, options.rate)?;
        model.reset();

        let Some((program, args)) = options.recorder_command.split_first() else {
            return Err(VadError::MicUnavailable(
                "recorder_command is empty".to_string(),
            ));
        };

        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VadError::MicUnavailable(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VadError::MicUnavailable("recorder produced no stdout handle".to_string()))?;

        self.shared.abort.store(false, Ordering::Release);
        self.shared.running.store(true, Ordering::Release);

        let shared = self.shared.clone();
        let handle = tokio::spawn(pipeline::run(shared, options, stdout, model));

        lifecycle.child = Some(child);
        lifecycle.pipeline_handle = Some(handle);

        drop(lifecycle);
        Ok(self.status())
    }

    /// Cooperative, idempotent cancellation: ask the pipeline to stop,
    /// terminate the child process, and await the pipeline's final flush.
    /// Never fails.
    pub async fn stop(&self) -> VadStatus {
        let mut lifecycle = self.lifecycle.lock().await;

        if !self.shared.running.load(Ordering::Acquire) {
            return self.status();
        }

        self.shared.abort.store(true, Ordering::Release);

        if let Some(mut child) = lifecycle.child.take() {
            let _ = child.start_kill();
        }

        if let Some(handle) = lifecycle.pipeline_handle.take() {
            let _ = handle.await;
        }

        // The pipeline task already publishes `running = false` on every
        // exit path; this is a defensive idempotence backstop.
        self.shared.running.store(false, Ordering::Release);

        drop(lifecycle);
        self.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_idle_before_any_start() {
        let controller = VadController::new(VadOptions::default());
        let status = controller.status();
        assert!(!status.running);
        assert_eq!(status.segments_saved, 0);
        assert!(status.last_segment_path.is_none());
    }

    #[test]
    fn update_merges_into_snapshot_when_idle() {
        let controller = VadController::new(VadOptions::default());
        controller
            .update(VadOptionsUpdate {
                speech_threshold: Some(0.6),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(controller.options_snapshot().speech_threshold, 0.6);
    }

    #[test]
    fn update_rejects_inverted_thresholds_without_mutating_config() {
        let controller = VadController::new(VadOptions::default());
        let original = controller.options_snapshot();

        let result = controller.update(VadOptionsUpdate {
            speech_threshold: Some(0.1),
            silence_threshold: Some(0.2),
            ..Default::default()
        });

        assert!(matches!(result, Err(VadError::ModelUnavailable(_))));
        assert_eq!(controller.options_snapshot(), original);
    }

    #[test]
    fn update_rejects_equal_thresholds() {
        let controller = VadController::new(VadOptions::default());
        let result = controller.update(VadOptionsUpdate {
            speech_threshold: Some(0.3),
            silence_threshold: Some(0.3),
            ..Default::default()
        });

        assert!(matches!(result, Err(VadError::ModelUnavailable(_))));
    }

    #[tokio::test]
    async fn start_with_inverted_thresholds_is_rejected_before_anything_spawns() {
        let controller = VadController::new(VadOptions::default());
        let result = controller
            .start(Some(VadOptionsUpdate {
                speech_threshold: Some(0.1),
                silence_threshold: Some(0.2),
                ..Default::default()
            }))
            .await;

        assert!(matches!(result, Err(VadError::ModelUnavailable(_))));
        assert!(!controller.status().running);
    }

    #[tokio::test]
    async fn start_with_unsupported_rate_is_rejected_before_anything_spawns() {
        let controller = VadController::new(VadOptions::default());
        let result = controller
            .start(Some(VadOptionsUpdate {
                rate: Some(8000),
                ..Default::default()
            }))
            .await;

        assert!(matches!(result, Err(VadError::ModelUnavailable(_))));
        assert!(!controller.status().running);
    }

    #[tokio::test]
    async fn start_with_missing_model_file_is_rejected() {
        let controller = VadController::new(VadOptions {
            model_path: PathBuf::from("/nonexistent/path/to/model.onnx"),
            ..Default::default()
        });
        let result = controller.start(None).await;

        assert!(matches!(result, Err(VadError::ModelUnavailable(_))));
        assert!(!controller.status().running);
    }

    #[tokio::test]
    async fn stop_when_not_running_is_a_noop() {
        let controller = VadController::new(VadOptions::default());
        let status = controller.stop().await;
        assert!(!status.running);
    }
}
