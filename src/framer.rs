//! Byte-accurate framing of a PCM byte stream into fixed-length analysis frames.

use std::collections::VecDeque;

/// Samples per analysis frame (~32ms at 16kHz).
pub const FRAME_SIZE: usize = 512;

/// Accumulates arbitrary-size byte chunks and emits exact `FRAME_SIZE`-sample
/// frames of little-endian signed 16-bit PCM, carrying at most one odd
/// trailing byte across chunk boundaries.
#[derive(Debug, Default)]
pub struct PcmFramer {
    leftover: Option<u8>,
    sample_queue: VecDeque<i16>,
}

impl PcmFramer {
    pub fn new() -> Self {
        Self {
            leftover: None,
            sample_queue: VecDeque::new(),
        }
    }

    /// Feed a chunk of raw bytes, draining completed frames into `out`.
    ///
    /// An empty chunk is valid and yields no frames. A final partial frame at
    /// end-of-stream is never emitted — callers simply stop feeding bytes.
    pub fn push(&mut self, chunk: &[u8], out: &mut Vec<[i16; FRAME_SIZE]>) {
        let mut bytes: Vec<u8> = Vec::with_capacity(chunk.len() + 1);
        if let Some(b) = self.leftover.take() {
            bytes.push(b);
        }
        bytes.extend_from_slice(chunk);

        let even_len = bytes.len() - (bytes.len() % 2);
        if bytes.len() > even_len {
            self.leftover = Some(bytes[even_len]);
        }

        for pair in bytes[..even_len].chunks_exact(2) {
            self.sample_queue.push_back(i16::from_le_bytes([pair[0], pair[1]]));
        }

        while self.sample_queue.len() >= FRAME_SIZE {
            let mut frame = [0i16; FRAME_SIZE];
            for slot in frame.iter_mut() {
                *slot = self.sample_queue.pop_front().expect("checked len above");
            }
            out.push(frame);
        }
    }

    /// Number of samples buffered and not yet formed into a frame.
    pub fn queued_samples(&self) -> usize {
        self.sample_queue.len()
    }

    /// Whether an odd trailing byte is currently carried.
    pub fn has_leftover_byte(&self) -> bool {
        self.leftover.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn empty_chunk_yields_no_frames() {
        let mut framer = PcmFramer::new();
        let mut out = Vec::new();
        framer.push(&[], &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn framing_completeness_for_exact_multiple() {
        let samples: Vec<i16> = (0..FRAME_SIZE as i16 * 3).collect();
        let bytes = le_bytes(&samples);

        let mut framer = PcmFramer::new();
        let mut out = Vec::new();
        framer.push(&bytes, &mut out);

        assert_eq!(out.len(), 3);
        assert_eq!(framer.queued_samples(), 0);
        for (i, frame) in out.iter().enumerate() {
            let expected_start = (i * FRAME_SIZE) as i16;
            assert_eq!(frame[0], expected_start);
            assert_eq!(frame[FRAME_SIZE - 1], expected_start + FRAME_SIZE as i16 - 1);
        }
    }

    #[test]
    fn trailing_partial_frame_is_discarded() {
        let samples: Vec<i16> = (0..(FRAME_SIZE as i16 + 10)).collect();
        let bytes = le_bytes(&samples);

        let mut framer = PcmFramer::new();
        let mut out = Vec::new();
        framer.push(&bytes, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(framer.queued_samples(), 10);
    }

    #[test]
    fn odd_byte_is_carried_across_chunks() {
        let samples: Vec<i16> = (0..FRAME_SIZE as i16).collect();
        let mut bytes = le_bytes(&samples);
        bytes.push(0xAB); // trailing odd byte, paired by the next chunk

        let mut framer = PcmFramer::new();
        let mut out = Vec::new();
        framer.push(&bytes, &mut out);
        assert_eq!(out.len(), 1);
        assert!(framer.has_leftover_byte());

        // Pair the leftover byte with one more to complete a sample, plus
        // enough more samples for a second frame.
        let more_samples: Vec<i16> = (0..FRAME_SIZE as i16).collect();
        let mut more_bytes = vec![0xCD];
        more_bytes.extend(le_bytes(&more_samples));

        framer.push(&more_bytes, &mut out);
        assert_eq!(out.len(), 2);
        assert!(!framer.has_leftover_byte());
        assert_eq!(framer.queued_samples(), 0);
    }

    #[test]
    fn split_equals_concatenated() {
        let samples: Vec<i16> = (0..(FRAME_SIZE as i16 * 2 + 5)).collect();
        let bytes = le_bytes(&samples);

        for split in [0usize, 1, 3, bytes.len() / 2, bytes.len() - 1, bytes.len()] {
            let mut framer_whole = PcmFramer::new();
            let mut out_whole = Vec::new();
            framer_whole.push(&bytes, &mut out_whole);

            let mut framer_split = PcmFramer::new();
            let mut out_split = Vec::new();
            framer_split.push(&bytes[..split], &mut out_split);
            framer_split.push(&bytes[split..], &mut out_split);

            assert_eq!(out_whole, out_split, "mismatch at split {}", split);
        }
    }

    #[test]
    fn split_chunks_1023_then_1_byte() {
        // 1023 bytes = 511 samples + 1 leftover byte. Feeding one more byte
        // pairs the leftover into sample 512, completing exactly one frame,
        // with nothing left queued.
        let samples: Vec<i16> = (0..511).collect();
        let mut first_chunk = le_bytes(&samples);
        first_chunk.push(0x11); // odd trailing byte -> 1023 bytes total
        assert_eq!(first_chunk.len(), 1023);

        let mut framer = PcmFramer::new();
        let mut out = Vec::new();
        framer.push(&first_chunk, &mut out);
        assert!(out.is_empty());
        assert_eq!(framer.queued_samples(), 511);
        assert!(framer.has_leftover_byte());

        framer.push(&[0x22], &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(framer.queued_samples(), 0);
        assert!(!framer.has_leftover_byte());
    }
}
