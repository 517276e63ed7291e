//! C1 — Sample Buffer: the canonical mono `f32` PCM container.

use crate::error::{BeatParserError, Result};

/// A finite, non-empty sequence of `f32` samples in `[-1.0, 1.0]` at a known
/// sample rate. This is the canonical mono signal everything downstream of
/// C2 operates on.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Build a buffer, enforcing the invariants in §3: non-empty and every
    /// sample finite. Does not clamp to `[-1.0, 1.0]` — that range is a
    /// normalization target enforced by C2, not an ingestion invariant.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(BeatParserError::invalid_input("sample buffer is empty"));
        }
        if sample_rate == 0 {
            return Err(BeatParserError::invalid_input("sample rate must be positive"));
        }
        if !samples.iter().all(|s| s.is_finite()) {
            return Err(BeatParserError::invalid_input("sample buffer contains non-finite values"));
        }
        Ok(Self { samples, sample_rate })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Require at least `frame_size` samples, as demanded before spectral
    /// processing begins (§3).
    pub fn require_min_length(&self, frame_size: usize) -> Result<()> {
        if self.samples.len() < frame_size {
            return Err(BeatParserError::invalid_input(format!(
                "audio too short: {} samples, need at least {frame_size}",
                self.samples.len()
            )));
        }
        Ok(())
    }

    /// An immutable, hop-aligned window into the buffer. Never outlives the
    /// buffer it borrows from (enforced by the lifetime on `&'a self`).
    pub fn frame(&self, offset: usize, frame_size: usize) -> Option<&[f32]> {
        self.samples.get(offset..offset + frame_size)
    }

    /// Number of complete hop-aligned frames of size `frame_size` at hop
    /// `hop_size`.
    pub fn frame_count(&self, frame_size: usize, hop_size: usize) -> usize {
        if self.samples.len() < frame_size || hop_size == 0 {
            return 0;
        }
        (self.samples.len() - frame_size) / hop_size + 1
    }
}
