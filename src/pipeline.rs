//! The single cooperative pipeline task: bytes from the recorder child
//! process -> framer -> model runner -> smoother -> hysteresis -> segment
//! recorder -> filesystem. Runs entirely in stream order on one task.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::process::ChildStdout;

use crate::config::VadOptions;
use crate::controller::ControllerShared;
use crate::framer::{PcmFramer, FRAME_SIZE};
use crate::hysteresis::{HysteresisMachine, VadEdge};
use crate::model_runner::ModelRunner;
use crate::segment::SegmentRecorder;
use crate::smoother::ProbSmoother;

/// Samples queued beyond this multiple of the frame size trigger a
/// (rate-limited) backpressure warning, per spec: samples are never
/// dropped, but sustained growth indicates inference is falling behind
/// real time.
const QUEUE_WARN_MULTIPLE: usize = 32;

/// Run the pipeline to completion: read child stdout until EOF, an error,
/// or `shared.abort`, then perform exactly one final flush attempt and mark
/// the controller `!running`.
///
/// `model` is already loaded by the caller: a failed load must be reported
/// to `start()`'s caller before the child process is spawned, not discovered
/// here after `running` has already flipped true.
pub async fn run(
    shared: Arc<ControllerShared>,
    options: VadOptions,
    mut stdout: ChildStdout,
    mut model: ModelRunner,
) {
    let mut framer = PcmFramer::new();
    let mut smoother = ProbSmoother::new();
    let mut hysteresis = HysteresisMachine::new(&options);
    let mut recorder = SegmentRecorder::new(options.out_dir.clone(), options.rate);

    let mut read_buf = vec![0u8; 4096];
    let mut frames = Vec::new();
    let mut warned_backpressure = false;

    'outer: loop {
        if shared.abort.load(Ordering::Relaxed) {
            break;
        }

        let n = match stdout.read(&mut read_buf).await {
            Ok(0) => break, // EOF: child exited
            Ok(n) => n,
            Err(e) => {
                eprintln!("vad pipeline: error reading recorder stdout: {}", e);
                break;
            }
        };

        frames.clear();
        framer.push(&read_buf[..n], &mut frames);

        for frame in frames.drain(..) {
            match model.infer(&frame) {
                Ok(raw_prob) => {
                    process_frame(&mut smoother, &mut hysteresis, &mut recorder, &shared, &frame, raw_prob);
                }
                Err(e) => {
                    eprintln!("vad pipeline: inference failed, stopping: {}", e);
                    break 'outer;
                }
            }
        }

        let (should_log, next_warned) =
            backpressure_warning_transition(framer.queued_samples(), warned_backpressure);
        warned_backpressure = next_warned;
        if should_log {
            eprintln!(
                "vad pipeline: sample queue has grown past {} frames; inference may be falling behind real time",
                QUEUE_WARN_MULTIPLE
            );
        }
    }

    if let Err(e) = flush(&mut recorder, &shared) {
        eprintln!("vad pipeline: final flush failed: {}", e);
    }

    shared.running.store(false, Ordering::Release);
}

/// Decides whether the backpressure warning should fire this pass, given
/// the queue depth just observed and whether the warning is already active.
/// Returns `(should_log, next_warned_state)`. Pulled out of `run`'s loop as
/// a pure function so the rate-limiting logic (log once on the rising edge,
/// stay quiet while still over threshold, reset once the queue recovers)
/// is unit-testable without a live child process or model.
fn backpressure_warning_transition(queued_samples: usize, already_warned: bool) -> (bool, bool) {
    if queued_samples > QUEUE_WARN_MULTIPLE * FRAME_SIZE {
        (!already_warned, true)
    } else {
        (false, false)
    }
}

fn process_frame(
    smoother: &mut ProbSmoother,
    hysteresis: &mut HysteresisMachine,
    recorder: &mut SegmentRecorder,
    shared: &Arc<ControllerShared>,
    frame: &[i16; FRAME_SIZE],
    raw_prob: f32,
) {
    let smoothed = smoother.push(raw_prob);

    let was_recording = hysteresis.is_recording();
    if was_recording {
        recorder.append_frame(frame);
    }

    match hysteresis.observe(smoothed) {
        VadEdge::SpeechStart => {
            recorder.begin_segment();
            recorder.append_frame(frame);
        }
        VadEdge::SpeechEnd => {
            if let Err(e) = flush(recorder, shared) {
                eprintln!("vad pipeline: failed to write segment: {}", e);
            }
        }
        VadEdge::None => {}
    }
}

/// Flush the recorder if it is currently recording, publishing the result
/// to the shared status. A no-op if nothing is in progress.
fn flush(recorder: &mut SegmentRecorder, shared: &Arc<ControllerShared>) -> crate::error::Result<()> {
    if let Some(saved) = recorder.end_segment()? {
        shared.segments_saved.fetch_add(1, Ordering::Release);
        *shared.last_segment_path.lock() = Some(saved.path);
    }
    Ok(())
}
