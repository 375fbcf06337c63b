//! In-memory 16-bit PCM WAV encoding.
//!
//! The exporter produces a downloadable byte blob, not a file on disk, so
//! the hound writer runs over a cursor. Output layout: RIFF header,
//! `fmt ` chunk (PCM, 2 channels, 16 bits), `data` chunk of interleaved
//! little-endian samples.

use std::io::Cursor;

use crate::error::EngineError;

/// A finished export: WAV bytes plus their MIME type.
#[derive(Debug, Clone)]
pub struct WavBlob {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl WavBlob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode planar stereo f32 to a 16-bit PCM WAV blob.
pub fn encode_stereo_wav(
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
) -> Result<WavBlob, EngineError> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| EngineError::RenderFailed {
                cause: format!("wav header: {e}"),
            })?;

        let frames = left.len().min(right.len());
        for i in 0..frames {
            for sample in [left[i], right[i]] {
                let clamped = sample.clamp(-1.0, 1.0);
                let scaled = (clamped * 32_767.0) as i16;
                writer
                    .write_sample(scaled)
                    .map_err(|e| EngineError::RenderFailed {
                        cause: format!("wav sample: {e}"),
                    })?;
            }
        }
        writer.finalize().map_err(|e| EngineError::RenderFailed {
            cause: format!("wav finalize: {e}"),
        })?;
    }

    Ok(WavBlob {
        bytes: cursor.into_inner(),
        mime_type: "audio/wav",
    })
}

/// Decode a WAV blob back to planar f32 (used by tests and the re-import
/// path of the spatial studio).
pub fn decode_wav_blob(blob: &WavBlob) -> Result<(Vec<Vec<f32>>, u32), EngineError> {
    let reader = hound::WavReader::new(Cursor::new(&blob.bytes)).map_err(|e| {
        EngineError::DecodeFailed {
            url: "<blob>".to_string(),
            cause: e.to_string(),
        }
    })?;
    let spec = reader.spec();
    let channel_count = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = reader
        .into_samples::<i16>()
        .map(|s| s.map(|v| v as f32 / 32_768.0))
        .collect::<Result<_, _>>()
        .map_err(|e| EngineError::DecodeFailed {
            url: "<blob>".to_string(),
            cause: e.to_string(),
        })?;

    let mut channels = vec![Vec::with_capacity(interleaved.len() / channel_count); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }
    Ok((channels, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_identifies_riff_wave_pcm() {
        let blob = encode_stereo_wav(&[0.0; 100], &[0.0; 100], 48_000).unwrap();
        assert_eq!(&blob.bytes[0..4], b"RIFF");
        assert_eq!(&blob.bytes[8..12], b"WAVE");
        assert_eq!(blob.mime_type, "audio/wav");

        // fmt chunk: PCM=1, channels=2, 16 bits per sample
        assert_eq!(&blob.bytes[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes([blob.bytes[20], blob.bytes[21]]), 1);
        assert_eq!(u16::from_le_bytes([blob.bytes[22], blob.bytes[23]]), 2);
        assert_eq!(u16::from_le_bytes([blob.bytes[34], blob.bytes[35]]), 16);
    }

    #[test]
    fn roundtrip_preserves_samples_within_quantization() {
        let left: Vec<f32> = (0..1000).map(|i| ((i as f32) * 0.013).sin() * 0.8).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();

        let blob = encode_stereo_wav(&left, &right, 44_100).unwrap();
        let (channels, sample_rate) = decode_wav_blob(&blob).unwrap();

        assert_eq!(sample_rate, 44_100);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].len(), 1000);

        let epsilon = 1.0 / 32_768.0 * 2.0; // one LSB either way
        for (a, b) in left.iter().zip(&channels[0]) {
            assert!((a - b).abs() <= epsilon, "{a} vs {b}");
        }
        for (a, b) in right.iter().zip(&channels[1]) {
            assert!((a - b).abs() <= epsilon);
        }
    }

    #[test]
    fn out_of_range_samples_are_clamped_not_wrapped() {
        let blob = encode_stereo_wav(&[2.0, -2.0], &[0.0, 0.0], 48_000).unwrap();
        let (channels, _) = decode_wav_blob(&blob).unwrap();
        assert!(channels[0][0] > 0.99, "over-range clamps to full scale");
        assert!(channels[0][1] < -0.99);
    }

    #[test]
    fn data_length_matches_frames() {
        let blob = encode_stereo_wav(&[0.1; 500], &[0.1; 500], 48_000).unwrap();
        // 44-byte canonical header + 500 frames * 2 ch * 2 bytes
        assert_eq!(blob.len(), 44 + 500 * 4);
    }

    #[test]
    fn encoding_is_deterministic() {
        let left: Vec<f32> = (0..256).map(|i| (i as f32 * 0.1).sin()).collect();
        let a = encode_stereo_wav(&left, &left, 48_000).unwrap();
        let b = encode_stereo_wav(&left, &left, 48_000).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }
}
