//! C4 — Onset Detector: adaptive-threshold peak picking over spectral flux
//! (§4.3).

/// Median of a window of flux values. Used instead of the mean for the
/// adaptive threshold's baseline since it resists the occasional very loud
/// frame skewing the local statistics the way a mean would.
fn median(window: &[f32]) -> f32 {
    let mut sorted = window.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

use crate::spectral::Spectrogram;
use crate::types::OnsetEvent;

#[derive(Debug, Clone, Copy)]
pub struct OnsetConfig {
    /// Half-width (in frames, each side) of the local-statistics window used
    /// to compute the adaptive threshold.
    pub window_frames: usize,
    /// Half-width (in frames) of the local-maximum test.
    pub peak_radius_frames: usize,
    /// Additive constant added to the adaptive threshold.
    pub delta: f32,
    /// Multiplicative factor (a.k.a. beat sensitivity) applied to
    /// `local_max - local_mean` above the local mean.
    pub lambda: f32,
    /// Minimum time between two onsets, in milliseconds.
    pub min_onset_gap_ms: f32,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        Self {
            window_frames: 5,
            peak_radius_frames: 3,
            delta: 1e-6,
            lambda: 0.7,
            min_onset_gap_ms: 50.0,
        }
    }
}

/// Detect onsets from the spectral flux sequence in `spectrogram`.
///
/// Mirrors the teacher's two-pass approach: an adaptive local-threshold pass
/// first, falling back to a simple global-threshold pass when the adaptive
/// pass finds nothing (silence, or audio whose flux never clears its own
/// local statistics by enough margin).
pub fn detect(spectrogram: &Spectrogram, config: &OnsetConfig) -> Vec<OnsetEvent> {
    let flux: Vec<f32> = spectrogram.frames.iter().map(|f| f.flux).collect();
    if flux.is_empty() {
        return Vec::new();
    }

    let max_flux = flux.iter().fold(0.0f32, |a, &x| a.max(x));
    if max_flux <= 0.0 {
        return Vec::new();
    }

    let mut onsets = adaptive_pass(spectrogram, &flux, max_flux, config);
    if onsets.is_empty() {
        onsets = fallback_pass(spectrogram, &flux, max_flux, config);
    }
    onsets
}

fn adaptive_pass(
    spectrogram: &Spectrogram,
    flux: &[f32],
    max_flux: f32,
    config: &OnsetConfig,
) -> Vec<OnsetEvent> {
    let mut onsets = Vec::new();
    let mut last_onset_time: Option<f64> = None;
    let min_gap = config.min_onset_gap_ms as f64 / 1000.0;

    for (i, &value) in flux.iter().enumerate() {
        let stat_start = i.saturating_sub(config.window_frames);
        let stat_end = (i + config.window_frames + 1).min(flux.len());
        let window = &flux[stat_start..stat_end];

        let local_median = median(window);
        let local_max = window.iter().fold(0.0f32, |a, &x| a.max(x));
        let threshold = local_median + config.lambda * (local_max - local_median) + config.delta;

        let peak_start = i.saturating_sub(config.peak_radius_frames);
        let peak_end = (i + config.peak_radius_frames + 1).min(flux.len());
        let is_local_max = flux[peak_start..peak_end]
            .iter()
            .enumerate()
            .all(|(j, &v)| v < value || (peak_start + j == i));

        if value > threshold && is_local_max {
            let time = spectrogram.frames[i].time;
            if last_onset_time.map_or(true, |last| time - last >= min_gap) {
                let strength = ((value - threshold) / max_flux).clamp(0.0, 1.0);
                onsets.push(OnsetEvent { time, strength });
                last_onset_time = Some(time);
            }
        }
    }

    onsets
}

fn fallback_pass(
    spectrogram: &Spectrogram,
    flux: &[f32],
    max_flux: f32,
    config: &OnsetConfig,
) -> Vec<OnsetEvent> {
    let mean_flux = flux.iter().sum::<f32>() / flux.len() as f32;
    let threshold = mean_flux * (2.0 + config.lambda);
    let min_gap = config.min_onset_gap_ms as f64 / 1000.0;

    let mut onsets = Vec::new();
    let mut last_onset_time: Option<f64> = None;

    for (i, &value) in flux.iter().enumerate() {
        if value > threshold {
            let time = spectrogram.frames[i].time;
            if last_onset_time.map_or(true, |last| time - last >= min_gap) {
                let strength = ((value - threshold) / max_flux).clamp(0.0, 1.0);
                onsets.push(OnsetEvent { time, strength });
                last_onset_time = Some(time);
            }
        }
    }

    onsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::SpectralFrame;

    fn spectrogram_from_flux(flux: Vec<f32>) -> Spectrogram {
        let frames = flux
            .into_iter()
            .enumerate()
            .map(|(i, f)| SpectralFrame {
                time: i as f64 * 0.01,
                magnitude: vec![],
                flux: f,
                centroid: 0.0,
            })
            .collect();
        Spectrogram { frames }
    }

    #[test]
    fn silence_produces_no_onsets() {
        let spectrogram = spectrogram_from_flux(vec![0.0; 50]);
        let onsets = detect(&spectrogram, &OnsetConfig::default());
        assert!(onsets.is_empty());
    }

    #[test]
    fn isolated_spike_is_detected() {
        let mut flux = vec![0.01; 40];
        flux[20] = 5.0;
        let spectrogram = spectrogram_from_flux(flux);
        let onsets = detect(&spectrogram, &OnsetConfig::default());
        assert_eq!(onsets.len(), 1);
        assert!((onsets[0].time - 0.20).abs() < 1e-9);
        assert!(onsets[0].strength > 0.0);
    }

    #[test]
    fn onsets_respect_minimum_gap() {
        let mut flux = vec![0.01; 60];
        flux[10] = 5.0;
        flux[11] = 4.9; // immediately adjacent spike, should be suppressed by the gap
        let spectrogram = spectrogram_from_flux(flux);
        let mut config = OnsetConfig::default();
        config.min_onset_gap_ms = 1000.0; // frames are 10ms apart here
        let onsets = detect(&spectrogram, &config);
        assert_eq!(onsets.len(), 1);
    }

    #[test]
    fn strengths_are_bounded() {
        let mut flux = vec![0.01; 60];
        for i in (5..55).step_by(10) {
            flux[i] = 3.0;
        }
        let spectrogram = spectrogram_from_flux(flux);
        let onsets = detect(&spectrogram, &OnsetConfig::default());
        assert!(onsets.iter().all(|o| (0.0..=1.0).contains(&o.strength)));
    }
}
