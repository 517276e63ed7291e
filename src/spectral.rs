//! C3 — Spectral Front-End: framing, windowing, STFT magnitude, spectral
//! flux, and spectral centroid (§4.2).

use rayon::prelude::*;
use realfft::RealFftPlanner;

use crate::buffer::SampleBuffer;
use crate::error::{BeatParserError, Result};

#[derive(Debug, Clone, Copy)]
pub struct SpectralConfig {
    pub frame_size: usize,
    pub hop_size: usize,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self { frame_size: 2048, hop_size: 512 }
    }
}

impl SpectralConfig {
    pub fn validate(&self) -> Result<()> {
        if self.frame_size == 0 || !self.frame_size.is_power_of_two() {
            return Err(BeatParserError::configuration("frame_size must be a power of two"));
        }
        if self.hop_size == 0 || self.hop_size > self.frame_size {
            return Err(BeatParserError::configuration("hop_size must be in (0, frame_size]"));
        }
        Ok(())
    }
}

/// One analysis frame's output: magnitude spectrum (length
/// `frame_size/2 + 1`, non-negative), spectral flux against the previous
/// frame, and spectral centroid in Hz.
#[derive(Debug, Clone)]
pub struct SpectralFrame {
    pub time: f64,
    pub magnitude: Vec<f32>,
    pub flux: f32,
    pub centroid: f32,
}

/// The full spectrogram for one parse: an eagerly computed, indexable
/// sequence of `SpectralFrame`s (§4.2 permits this in place of a lazy
/// iterator at this scale, since everything is owned and released by the
/// orchestrator per parse regardless).
pub struct Spectrogram {
    pub frames: Vec<SpectralFrame>,
}

/// Compute the symmetric Hann window of the given size.
fn hann_window(size: usize) -> Vec<f32> {
    if size <= 1 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos()))
        .collect()
}

/// Run the STFT over `buffer`, producing one `SpectralFrame` per hop-aligned
/// window. `frame_size` must be a power of two (required by `realfft`'s
/// real-to-complex planner, and by §4.2).
pub fn analyze(buffer: &SampleBuffer, config: &SpectralConfig) -> Result<Spectrogram> {
    config.validate()?;
    buffer.require_min_length(config.frame_size)?;

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(config.frame_size);

    let window = hann_window(config.frame_size);
    let samples = buffer.samples();
    let sample_rate = buffer.sample_rate();
    let n_frames = buffer.frame_count(config.frame_size, config.hop_size);

    // Each frame's window + FFT + magnitude + centroid is independent of its
    // neighbors, so this is computed data-parallel across frames (one input/
    // output buffer pair per task); only the flux pass below needs the
    // frames in order.
    let bin_hz = sample_rate as f32 / config.frame_size as f32;
    let computed: Vec<(f64, Vec<f32>, f32)> = (0..n_frames)
        .into_par_iter()
        .map(|k| -> Result<(f64, Vec<f32>, f32)> {
            let offset = k * config.hop_size;
            let window_samples = samples
                .get(offset..offset + config.frame_size)
                .ok_or_else(|| BeatParserError::processing("frame index out of bounds"))?;

            let mut input = fft.make_input_vec();
            let mut output = fft.make_output_vec();
            for (i, (&sample, &w)) in window_samples.iter().zip(window.iter()).enumerate() {
                input[i] = sample * w;
            }

            fft.process(&mut input, &mut output)
                .map_err(|_| BeatParserError::processing("FFT processing failed"))?;

            let magnitude: Vec<f32> = output.iter().map(|c| c.norm()).collect();

            let total_magnitude: f32 = magnitude.iter().sum();
            let centroid = if total_magnitude > 0.0 {
                let weighted: f32 = magnitude.iter().enumerate().map(|(b, &m)| b as f32 * bin_hz * m).sum();
                weighted / total_magnitude
            } else {
                0.0
            };

            let time = offset as f64 / sample_rate as f64;
            Ok((time, magnitude, centroid))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut frames = Vec::with_capacity(n_frames);
    let mut previous_magnitude = vec![0.0f32; config.frame_size / 2 + 1];
    for (time, magnitude, centroid) in computed {
        let flux: f32 = magnitude
            .iter()
            .zip(previous_magnitude.iter())
            .map(|(&curr, &prev)| (curr - prev).max(0.0))
            .sum();
        previous_magnitude = magnitude.clone();
        frames.push(SpectralFrame { time, magnitude, flux, centroid });
    }

    Ok(Spectrogram { frames })
}
