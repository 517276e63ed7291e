//! C2 — Audio Preprocessor: format coercion, down-mix, resample, DC removal,
//! peak normalization, and the ingestion validation gate (§4.1).

use crate::buffer::SampleBuffer;
use crate::error::{BeatParserError, Result};
use crate::io::AudioSource;

/// Below this peak amplitude, a source is considered "quiet": normalization
/// is skipped (scaling near-silence up to full scale would mostly amplify
/// noise) and the fact is recorded in `ParseMetadata::quiet`.
pub const DEFAULT_QUIET_FLOOR: f32 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct PreprocessConfig {
    pub target_sample_rate: u32,
    pub quiet_floor: f32,
    pub frame_size: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 44_100,
            quiet_floor: DEFAULT_QUIET_FLOOR,
            frame_size: 2048,
        }
    }
}

/// Result of preprocessing: the canonical mono buffer plus whether the
/// source was quiet enough that normalization was skipped.
pub struct Preprocessed {
    pub buffer: SampleBuffer,
    pub quiet: bool,
}

/// Run C2 over a decoded `AudioSource`, producing the canonical mono
/// `SampleBuffer` consumed by C3 onward.
pub fn preprocess(source: &AudioSource, config: &PreprocessConfig) -> Result<Preprocessed> {
    if source.samples.is_empty() {
        return Err(BeatParserError::invalid_input("decoded audio is empty"));
    }
    if !source.samples.iter().all(|s| s.is_finite()) {
        return Err(BeatParserError::invalid_input("decoded audio contains non-finite samples"));
    }

    let mono = downmix(&source.samples, source.channels);
    let resampled = resample_linear(&mono, source.sample_rate, config.target_sample_rate);

    if resampled.len() < config.frame_size {
        return Err(BeatParserError::invalid_input(format!(
            "audio too short after resampling: {} samples, need at least {}",
            resampled.len(),
            config.frame_size
        )));
    }

    let dc_removed = remove_dc_offset(resampled);
    let peak = dc_removed.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));

    let (normalized, quiet) = if peak < config.quiet_floor {
        (dc_removed, true)
    } else {
        (normalize_peak(dc_removed, peak), false)
    };

    let buffer = SampleBuffer::new(normalized, config.target_sample_rate)?;
    Ok(Preprocessed { buffer, quiet })
}

/// Down-mix an interleaved multi-channel buffer to mono by channel average.
/// A single-channel source is returned unchanged (no copy beyond the owned
/// `Vec` the caller already has, mirroring the teacher's `mono_samples`
/// fast path).
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks(channels)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect()
}

/// Linear-interpolation resampler to `target_rate`. See `SPEC_FULL.md` §9
/// Open Question (c) for why this stays linear rather than polyphase.
fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = ((samples.len() as f64) * ratio).round() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;

        let a = samples[idx.min(samples.len() - 1)];
        let b = samples[(idx + 1).min(samples.len() - 1)];
        out.push(a + (b - a) * frac);
    }

    out
}

fn remove_dc_offset(samples: Vec<f32>) -> Vec<f32> {
    if samples.is_empty() {
        return samples;
    }
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    samples.into_iter().map(|s| s - mean).collect()
}

fn normalize_peak(samples: Vec<f32>, peak: f32) -> Vec<f32> {
    if peak <= 0.0 {
        return samples;
    }
    samples.into_iter().map(|s| (s / peak).clamp(-1.0, 1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::AudioFormat;

    fn source(samples: Vec<f32>, sample_rate: u32, channels: u16) -> AudioSource {
        AudioSource {
            samples,
            sample_rate,
            channels,
            format: AudioFormat { extension: "wav".into(), bit_depth: Some(16), compression: None },
        }
    }

    #[test]
    fn downmix_averages_interleaved_channels() {
        let mono = downmix(&[1.0, 3.0, 2.0, 4.0], 2);
        assert_eq!(mono, vec![2.0, 3.0]);
    }

    #[test]
    fn downmix_is_noop_for_mono() {
        let mono = downmix(&[1.0, 2.0, 3.0], 1);
        assert_eq!(mono, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn resample_identity_when_rates_match() {
        let out = resample_linear(&[1.0, 2.0, 3.0], 44100, 44100);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn resample_upsamples_to_target_length() {
        let out = resample_linear(&vec![0.0; 1000], 22050, 44100);
        assert!((out.len() as i64 - 2000).abs() <= 2);
    }

    #[test]
    fn normalization_scales_peak_to_one() {
        let samples = vec![0.2, -0.4, 0.1];
        let peak = samples.iter().fold(0.0f32, |a, &x| a.max(x.abs()));
        let normalized = normalize_peak(samples, peak);
        let new_peak = normalized.iter().fold(0.0f32, |a, &x| a.max(x.abs()));
        assert!((new_peak - 1.0).abs() < 1e-6);
    }

    #[test]
    fn quiet_source_is_left_unscaled_and_flagged() {
        let config = PreprocessConfig { frame_size: 4, ..Default::default() };
        let quiet_samples: Vec<f32> = vec![0.001; 8192];
        let src = source(quiet_samples, 44100, 1);
        let result = preprocess(&src, &config).unwrap();
        assert!(result.quiet);
    }

    #[test]
    fn non_finite_input_is_invalid() {
        let config = PreprocessConfig::default();
        let src = source(vec![0.0, f32::NAN, 0.0], 44100, 1);
        assert!(preprocess(&src, &config).is_err());
    }

    #[test]
    fn too_short_after_resample_is_invalid() {
        let config = PreprocessConfig { frame_size: 2048, ..Default::default() };
        let src = source(vec![0.1; 10], 44100, 1);
        assert!(preprocess(&src, &config).is_err());
    }

    #[test]
    fn empty_input_is_invalid() {
        let config = PreprocessConfig::default();
        let src = source(vec![], 44100, 1);
        assert!(preprocess(&src, &config).is_err());
    }
}
