//! Canonical 44-byte-header PCM WAV encoding.
//!
//! Built on `hound`, the same crate the original app uses for its debug
//! audio dumps (see `audio_processor.rs::save_audio_to_wav`), but writing
//! into an in-memory buffer so the encoder is a pure function and the
//! durable file write can be made atomic by the caller.

use std::io::Cursor;
use std::path::Path;

use crate::error::{Result, VadError};

/// Encode signed 16-bit samples as a complete WAV byte sequence (44-byte
/// header + payload).
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).expect("in-memory WAV writer never fails to open");
        for &sample in samples {
            writer
                .write_sample(sample)
                .expect("writing to an in-memory buffer never fails");
        }
        writer.finalize().expect("finalizing an in-memory buffer never fails");
    }
    cursor.into_inner()
}

/// Write `samples` as a WAV file at `path`, atomically: encode, write to a
/// sibling temp file, then rename over the destination.
pub fn write_wav_atomic(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let bytes = encode_wav(samples, sample_rate);

    let tmp_path = match path.file_name() {
        Some(name) => path.with_file_name(format!(".{}.tmp", name.to_string_lossy())),
        None => return Err(VadError::IoFailed(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "segment path has no file name",
        ))),
    };

    std::fs::write(&tmp_path, &bytes)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_constants_are_correct() {
        let bytes = encode_wav(&[1, -1, 2, -2], 16000);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u16::from_le_bytes([bytes[20], bytes[21]]), 1); // PCM
        assert_eq!(u16::from_le_bytes([bytes[34], bytes[35]]), 16); // bits/sample
    }

    #[test]
    fn header_and_total_lengths_match_sample_count() {
        let samples: Vec<i16> = (0..1000).map(|i| i as i16).collect();
        let bytes = encode_wav(&samples, 16000);

        let data_size = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);
        assert_eq!(data_size as usize, samples.len() * 2);
        assert_eq!(bytes.len(), 44 + samples.len() * 2);
    }

    #[test]
    fn round_trips_through_hound_reader() {
        let samples: Vec<i16> = vec![0, 1, -1, i16::MAX, i16::MIN, 42, -42];
        let bytes = encode_wav(&samples, 16000);

        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn atomic_write_creates_final_file_without_leaving_temp(
    ) {
        let dir = std::env::temp_dir().join(format!("vad-streamer-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("segment_test.wav");

        write_wav_atomic(&path, &[1, 2, 3, 4], 16000).unwrap();

        assert!(path.exists());
        let tmp_path = dir.join(".segment_test.wav.tmp");
        assert!(!tmp_path.exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
