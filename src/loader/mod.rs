/*
Sample Loading
==============

Fetches audio files, decodes them to planar f32, and caches the result by
URL so that every widget referencing the same sample shares one decoded
copy. Decoded buffers are immutable and handed out as `Arc`s; "destroying"
one means evicting its cache entry — live sources holding an Arc keep
playing unaffected.

Accepted formats are WAV (hound: 16/24-bit int and 32-bit float) and MP3
(minimp3), capped at 50 MB. Other extensions fail with UnsupportedFile
before any bytes are read.

Failure policy: a failed load leaves no cache entry, so the next call for
the same URL retries from scratch.
*/

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use crate::error::EngineError;

/// Largest file the loader will touch, in bytes.
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// An immutable decoded audio file: planar f32 samples plus provenance.
#[derive(Debug, Clone)]
pub struct DecodedBuffer {
    url: String,
    sample_rate: u32,
    /// One Vec per channel, all the same length.
    channels: Vec<Vec<f32>>,
}

impl DecodedBuffer {
    pub fn new(url: impl Into<String>, sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        debug_assert!(!channels.is_empty());
        debug_assert!(channels.windows(2).all(|w| w[0].len() == w[1].len()));
        Self {
            url: url.into(),
            sample_rate,
            channels,
        }
    }

    /// Convenience constructor for synthesized test material.
    pub fn from_mono(url: impl Into<String>, sample_rate: u32, samples: Vec<f32>) -> Self {
        Self::new(url, sample_rate, vec![samples])
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index.min(self.channels.len() - 1)]
    }

    pub fn duration_seconds(&self) -> f32 {
        self.frame_count() as f32 / self.sample_rate as f32
    }

    /// Frame value mixed down to mono.
    #[inline]
    pub fn mono_frame(&self, frame: usize) -> f32 {
        let mut acc = 0.0;
        for channel in &self.channels {
            acc += channel.get(frame).copied().unwrap_or(0.0);
        }
        acc / self.channels.len() as f32
    }
}

/// Process-wide sample cache.
pub struct SampleLoader {
    cache: Mutex<HashMap<String, Arc<DecodedBuffer>>>,
}

static GLOBAL_LOADER: OnceLock<SampleLoader> = OnceLock::new();

impl SampleLoader {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide loader shared by every widget.
    pub fn global() -> &'static SampleLoader {
        GLOBAL_LOADER.get_or_init(SampleLoader::new)
    }

    /// Load and decode `url`, deduplicating by cache.
    ///
    /// Suspends the caller for the fetch + decode. On failure the cache is
    /// left without an entry so a later call retries.
    pub fn load(&self, url: &str) -> Result<Arc<DecodedBuffer>, EngineError> {
        if let Some(hit) = self.get(url) {
            return Ok(hit);
        }

        let buffer = Arc::new(decode_file(url)?);
        tracing::debug!(
            url,
            frames = buffer.frame_count(),
            channels = buffer.channel_count(),
            "sample decoded"
        );

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        Ok(cache.entry(url.to_string()).or_insert(buffer).clone())
    }

    /// Load several URLs; fails on the first failure (callers decide their
    /// own fallback policy, e.g. the drum sequencer's synth voices).
    pub fn preload(&self, urls: &[&str]) -> Result<Vec<Arc<DecodedBuffer>>, EngineError> {
        urls.iter().map(|url| self.load(url)).collect()
    }

    /// Cache lookup without loading.
    pub fn get(&self, url: &str) -> Option<Arc<DecodedBuffer>> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(url).cloned()
    }

    /// Insert an already-decoded buffer (file drop, synthesized material).
    pub fn insert(&self, buffer: DecodedBuffer) -> Arc<DecodedBuffer> {
        let buffer = Arc::new(buffer);
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(buffer.url().to_string(), buffer.clone());
        buffer
    }

    /// Explicitly drop a cache entry. Live references stay valid.
    pub fn evict(&self, url: &str) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.remove(url);
    }
}

impl Default for SampleLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// File-type gate shared by the loader and the file-drop UI.
pub fn is_supported_extension(url: &str) -> bool {
    matches!(
        Path::new(url)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("wav") | Some("mp3")
    )
}

fn decode_file(url: &str) -> Result<DecodedBuffer, EngineError> {
    if !is_supported_extension(url) {
        return Err(EngineError::UnsupportedFile {
            url: url.to_string(),
        });
    }

    let metadata = std::fs::metadata(url).map_err(|e| EngineError::LoadFailed {
        url: url.to_string(),
        cause: e.to_string(),
    })?;
    if metadata.len() > MAX_FILE_BYTES {
        return Err(EngineError::UnsupportedFile {
            url: url.to_string(),
        });
    }

    let bytes = std::fs::read(url).map_err(|e| EngineError::LoadFailed {
        url: url.to_string(),
        cause: e.to_string(),
    })?;

    let ext = Path::new(url)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("wav") => decode_wav(url, &bytes),
        Some("mp3") => decode_mp3(url, &bytes),
        _ => Err(EngineError::UnsupportedFile {
            url: url.to_string(),
        }),
    }
}

fn decode_wav(url: &str, bytes: &[u8]) -> Result<DecodedBuffer, EngineError> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| {
        EngineError::DecodeFailed {
            url: url.to_string(),
            cause: e.to_string(),
        }
    })?;
    let spec = reader.spec();
    let channel_count = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| EngineError::DecodeFailed {
                url: url.to_string(),
                cause: e.to_string(),
            })?,
        (hound::SampleFormat::Int, bits) => {
            let scale = 1.0 / (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| EngineError::DecodeFailed {
                    url: url.to_string(),
                    cause: e.to_string(),
                })?
        }
        (format, bits) => {
            return Err(EngineError::DecodeFailed {
                url: url.to_string(),
                cause: format!("unhandled wav format {format:?}/{bits}"),
            })
        }
    };

    Ok(deinterleave(url, spec.sample_rate, channel_count, &interleaved))
}

fn decode_mp3(url: &str, bytes: &[u8]) -> Result<DecodedBuffer, EngineError> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut interleaved: Vec<f32> = Vec::new();
    let mut sample_rate = 0u32;
    let mut channel_count = 0usize;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                sample_rate = frame.sample_rate as u32;
                channel_count = frame.channels;
                interleaved.extend(frame.data.iter().map(|&s| s as f32 / 32_768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => {
                return Err(EngineError::DecodeFailed {
                    url: url.to_string(),
                    cause: e.to_string(),
                })
            }
        }
    }

    if interleaved.is_empty() || channel_count == 0 {
        return Err(EngineError::DecodeFailed {
            url: url.to_string(),
            cause: "mp3 contained no audio frames".to_string(),
        });
    }

    Ok(deinterleave(url, sample_rate, channel_count, &interleaved))
}

fn deinterleave(
    url: &str,
    sample_rate: u32,
    channel_count: usize,
    interleaved: &[f32],
) -> DecodedBuffer {
    let frames = interleaved.len() / channel_count;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }
    DecodedBuffer::new(url, sample_rate, channels)
}
