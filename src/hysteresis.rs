//! Dual-threshold hysteresis state machine debouncing speech boundaries.

use crate::config::VadOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Recording,
}

/// Edge event emitted by [`HysteresisMachine::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadEdge {
    /// No state transition this frame.
    None,
    /// Speech confirmed to have started; the Segment Recorder should begin
    /// buffering (including the current frame).
    SpeechStart,
    /// Speech confirmed to have ended; the Segment Recorder should flush
    /// (the current frame was already appended before this edge fires).
    SpeechEnd,
}

/// Consumes smoothed probabilities frame-by-frame and emits speech-start /
/// speech-end edges using the thresholds and consecutive-frame counters in
/// [`VadOptions`]. Pure synchronous logic; no I/O, no suspension.
#[derive(Debug)]
pub struct HysteresisMachine {
    state: State,
    speech_run: u32,
    silence_run: u32,
    speech_threshold: f32,
    silence_threshold: f32,
    required_speech_frames: u32,
    required_silence_frames: u32,
}

impl HysteresisMachine {
    pub fn new(options: &VadOptions) -> Self {
        Self {
            state: State::Idle,
            speech_run: 0,
            silence_run: 0,
            speech_threshold: options.speech_threshold,
            silence_threshold: options.silence_threshold,
            required_speech_frames: options.required_speech_frames,
            required_silence_frames: options.required_silence_frames,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state == State::Recording
    }

    /// Observe one smoothed probability and return the edge, if any.
    ///
    /// Callers are responsible for appending the current frame to the
    /// Segment Recorder themselves whenever `is_recording()` is true for
    /// this frame (i.e. on `SpeechStart` and every frame afterwards up to
    /// and including the frame that yields `SpeechEnd`).
    pub fn observe(&mut self, smoothed: f32) -> VadEdge {
        match self.state {
            State::Idle => {
                if smoothed > self.speech_threshold {
                    self.speech_run += 1;
                    if self.speech_run >= self.required_speech_frames {
                        self.state = State::Recording;
                        self.speech_run = 0;
                        self.silence_run = 0;
                        return VadEdge::SpeechStart;
                    }
                } else {
                    self.speech_run = 0;
                }
                VadEdge::None
            }
            State::Recording => {
                if smoothed < self.silence_threshold {
                    self.silence_run += 1;
                    if self.silence_run >= self.required_silence_frames {
                        self.state = State::Idle;
                        self.silence_run = 0;
                        return VadEdge::SpeechEnd;
                    }
                } else {
                    self.silence_run = 0;
                }
                VadEdge::None
            }
        }
    }
}
