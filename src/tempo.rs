//! C5 — Tempo Estimator: autocorrelation of the onset-strength envelope
//! across a BPM range (§4.4).
//!
//! Grounded on the reference tempo detector's spectral-flux-peak approach,
//! generalized from "average inter-peak interval" to a full autocorrelation
//! over the envelope (closer to the spec's §4.4 wording) while keeping its
//! "sweet spot" octave-bias idea for breaking ambiguity toward musically
//! common tempos.

use crate::types::{OnsetEvent, Tempo};

#[derive(Debug, Clone, Copy)]
pub struct TempoConfig {
    pub min_bpm: f32,
    pub max_bpm: f32,
    /// BPM the autocorrelation weighting is biased toward, to break octave
    /// ambiguity (e.g. 128 BPM vs. 64 BPM techno both producing a strong
    /// peak at double/half the true tempo).
    pub sweet_spot_bpm: f32,
    /// Minimum autocorrelation peak value for a tempo to be reported at all;
    /// below this, `estimate` returns `None` (§4.4: "downstream components
    /// must tolerate absent tempo").
    pub tempo_floor: f32,
    /// Envelope sampling resolution in seconds (the hop duration of the
    /// onset envelope feeding this estimator).
    pub envelope_resolution_secs: f64,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            min_bpm: 60.0,
            max_bpm: 200.0,
            sweet_spot_bpm: 120.0,
            tempo_floor: 0.05,
            envelope_resolution_secs: 0.01,
        }
    }
}

/// Build a fixed-resolution onset-strength envelope from sparse onset
/// events, suitable for autocorrelation.
fn build_envelope(onsets: &[OnsetEvent], resolution: f64) -> Vec<f32> {
    if onsets.is_empty() {
        return Vec::new();
    }
    let duration = onsets.iter().map(|o| o.time).fold(0.0, f64::max);
    let len = (duration / resolution).ceil() as usize + 1;
    let mut envelope = vec![0.0f32; len.max(1)];

    for onset in onsets {
        let idx = (onset.time / resolution).round() as usize;
        if let Some(slot) = envelope.get_mut(idx.min(envelope.len() - 1)) {
            *slot = slot.max(onset.strength);
        }
    }

    envelope
}

fn autocorrelation_at_lag(envelope: &[f32], lag: usize) -> f32 {
    if lag == 0 || lag >= envelope.len() {
        return 0.0;
    }
    let n = envelope.len() - lag;
    if n == 0 {
        return 0.0;
    }
    envelope[..n]
        .iter()
        .zip(&envelope[lag..])
        .map(|(&a, &b)| a * b)
        .sum::<f32>()
        / n as f32
}

/// Estimate global tempo from the onset envelope. Returns `None` when the
/// envelope is empty or the best peak is below `tempo_floor`.
pub fn estimate(onsets: &[OnsetEvent], config: &TempoConfig) -> Option<Tempo> {
    if onsets.len() < 2 {
        return None;
    }

    let envelope = build_envelope(onsets, config.envelope_resolution_secs);
    if envelope.len() < 2 {
        return None;
    }

    let min_lag = ((60.0 / config.max_bpm as f64) / config.envelope_resolution_secs).floor() as usize;
    let max_lag = ((60.0 / config.min_bpm as f64) / config.envelope_resolution_secs).ceil() as usize;
    let min_lag = min_lag.max(1);
    let max_lag = max_lag.min(envelope.len().saturating_sub(1));

    if min_lag > max_lag {
        return None;
    }

    let mut scored: Vec<(usize, f32)> = (min_lag..=max_lag)
        .map(|lag| {
            let raw = autocorrelation_at_lag(&envelope, lag);
            let bpm = 60.0 / (lag as f64 * config.envelope_resolution_secs);
            let distance = (bpm as f32 - config.sweet_spot_bpm).abs();
            // Gentle bias toward the sweet spot, without letting it dominate
            // a genuinely much stronger peak elsewhere.
            let bias = 1.0 / (1.0 + distance / 60.0);
            (lag, raw * (0.7 + 0.3 * bias))
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let (best_lag, best_score) = scored[0];
    if best_score <= 0.0 {
        return None;
    }

    let top_k = scored.iter().take(5.min(scored.len())).map(|(_, s)| *s).collect::<Vec<_>>();
    let mean_top_k = top_k.iter().sum::<f32>() / top_k.len() as f32;

    let confidence = if mean_top_k > 0.0 {
        (best_score / mean_top_k).clamp(0.0, 1.0)
    } else {
        0.0
    };

    if confidence < config.tempo_floor {
        return None;
    }

    let bpm = (60.0 / (best_lag as f64 * config.envelope_resolution_secs)) as f32;
    if bpm < config.min_bpm || bpm > config.max_bpm {
        return None;
    }

    Some(Tempo { bpm, confidence, time_signature: None })
}
