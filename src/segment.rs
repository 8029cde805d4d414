//! Accumulates frames from speech-start to speech-end and flushes them as a
//! WAV file.

use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::Result;
use crate::framer::FRAME_SIZE;
use crate::wav::write_wav_atomic;

/// A completed segment write, reported back to the controller.
#[derive(Debug, Clone)]
pub struct SavedSegment {
    pub path: PathBuf,
    pub sample_count: usize,
}

/// Owns the per-segment frame buffer and the per-pipeline segment counter.
/// Exclusively owns its buffers; callers must not retain references to
/// appended frames.
pub struct SegmentRecorder {
    out_dir: PathBuf,
    sample_rate: u32,
    next_index: u64,
    buffer: Option<Vec<i16>>,
    started_at: Option<Instant>,
}

impl SegmentRecorder {
    pub fn new(out_dir: PathBuf, sample_rate: u32) -> Self {
        Self {
            out_dir,
            sample_rate,
            next_index: 1,
            buffer: None,
            started_at: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.buffer.is_some()
    }

    /// Begin accumulating a new segment. No-op if already recording.
    pub fn begin_segment(&mut self) {
        if self.buffer.is_some() {
            return;
        }
        self.buffer = Some(Vec::new());
        self.started_at = Some(Instant::now());
    }

    /// Copy a frame's samples into the active buffer. No-op if not recording.
    pub fn append_frame(&mut self, frame: &[i16; FRAME_SIZE]) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.extend_from_slice(frame);
        }
    }

    /// Concatenate accumulated frames, encode as WAV, write to
    /// `{out_dir}/segment_{timestamp}_{N}.wav`, and discard the buffer.
    /// No-op (returns `Ok(None)`) if not recording.
    pub fn end_segment(&mut self) -> Result<Option<SavedSegment>> {
        let Some(buffer) = self.buffer.take() else {
            return Ok(None);
        };
        self.started_at = None;

        if buffer.is_empty() {
            // Asserted impossible by the framing contract (a segment always
            // contains at least the frame that triggered speech-start).
            return Ok(None);
        }

        std::fs::create_dir_all(&self.out_dir)?;

        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let index = self.next_index;
        self.next_index += 1;

        let filename = format!("segment_{}_{}.wav", timestamp, index);
        let path: PathBuf = Path::new(&self.out_dir).join(filename);

        write_wav_atomic(&path, &buffer, self.sample_rate)?;

        Ok(Some(SavedSegment {
            path,
            sample_count: buffer.len(),
        }))
    }
}
