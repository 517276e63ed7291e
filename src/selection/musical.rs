//! Musical strategy (§4.6): scores candidates against the tempo grid and
//! attaches downbeat/beat/offbeat/syncopated classification.
//!
//! Requires a tempo; callers must reject the strategy upstream when tempo is
//! absent (§9 Open Question (a): this implementation treats `Musical`
//! without a tempo as a hard error rather than a silent fallback, since a
//! caller who explicitly asked for grid-aware selection should be told the
//! grid doesn't exist).

use crate::error::{BeatParserError, Result};
use crate::types::{BeatCandidate, BeatKind, MusicalInfo, Tempo, TimeSignature};

#[derive(Debug, Clone, Copy)]
pub struct MusicalWeights {
    pub strength: f32,
    pub grid_fit: f32,
    pub downbeat_bonus: f32,
}

impl Default for MusicalWeights {
    fn default() -> Self {
        Self { strength: 0.5, grid_fit: 0.3, downbeat_bonus: 0.2 }
    }
}

/// Fraction of a half-beat's timing deviation beyond which a matched beat is
/// classified `Syncopated` rather than by its raw grid position. Chosen so
/// that a beat sitting comfortably near its grid slot keeps its metric role,
/// while one dragged a quarter of a beat or more off-grid reads as
/// syncopation instead.
const SYNCOPATION_FRACTION: f32 = 0.25;

pub fn select(
    candidates: &[BeatCandidate],
    target_count: usize,
    tempo: Option<&Tempo>,
    weights: &MusicalWeights,
) -> Result<Vec<BeatCandidate>> {
    let tempo = tempo.ok_or_else(|| {
        BeatParserError::configuration("the musical selection strategy requires a detected tempo")
    })?;
    if tempo.bpm <= 0.0 {
        return Err(BeatParserError::configuration("the musical selection strategy requires a positive tempo"));
    }
    if target_count == 0 || candidates.is_empty() {
        return Ok(Vec::new());
    }

    let time_signature = tempo.time_signature.filter(TimeSignature::is_coherent).unwrap_or_default();
    let beat_duration = 60.0 / tempo.bpm as f64;
    let half_beat = beat_duration / 2.0;

    let mut scored: Vec<(f32, BeatCandidate)> = candidates
        .iter()
        .map(|candidate| {
            let grid_index = (candidate.time / beat_duration).round().max(0.0) as u32;
            let grid_time = grid_index as f64 * beat_duration;
            let deviation = (candidate.time - grid_time).abs();
            let grid_fit = (1.0 - (deviation.min(half_beat) / half_beat) as f32).clamp(0.0, 1.0);

            let beat_in_measure = grid_index % time_signature.numerator as u32;
            let is_downbeat = beat_in_measure == 0;
            let downbeat_bonus = if is_downbeat { 1.0 } else { 0.0 };

            let score = weights.strength * candidate.strength
                + weights.grid_fit * grid_fit
                + weights.downbeat_bonus * downbeat_bonus;

            let deviation_ms = ((candidate.time - grid_time) * 1000.0) as f32;
            let syncopated = deviation > half_beat * SYNCOPATION_FRACTION as f64;

            let kind = if syncopated {
                BeatKind::Syncopated
            } else if is_downbeat {
                BeatKind::Downbeat
            } else if time_signature.numerator >= 2 && beat_in_measure == time_signature.numerator as u32 / 2 {
                BeatKind::Offbeat
            } else {
                BeatKind::Beat
            };

            let mut annotated = candidate.clone();
            annotated.grid_index = Some(grid_index);
            annotated.deviation_ms = Some(deviation_ms);
            annotated.musical = Some(MusicalInfo {
                expected_time: grid_time,
                timing_deviation_ms: deviation_ms,
                beat_number: beat_in_measure,
                measure_number: grid_index / time_signature.numerator as u32,
                kind,
            });

            (score, annotated)
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap().then_with(|| a.1.time.partial_cmp(&b.1.time).unwrap()));

    let mut picked: Vec<BeatCandidate> = scored.into_iter().take(target_count).map(|(_, c)| c).collect();
    picked.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap());
    Ok(picked)
}
