//! C7 — Beat Selector: picks up to `target_count` beats from the candidates
//! produced by C6, under one of four strategies, and reports a quality score
//! for the selection it made (§4.6).
//!
//! This module does not invoke the synthetic generator (C8); it returns
//! whatever it can select, possibly fewer than `target_count`, and leaves
//! topping up the result to the pipeline orchestrator (C9).

mod adaptive;
mod energy;
mod musical;
pub mod quality;
mod regular;

use serde::{Deserialize, Serialize};

use crate::error::{BeatParserError, Result};
use crate::types::{BeatCandidate, QualityReport, Tempo};

pub use adaptive::AdaptiveWeights;
pub use musical::MusicalWeights;

/// One of the four selection strategies named in §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Energy,
    Regular,
    Musical,
    Adaptive,
}

/// Relative weights for the `Adaptive` strategy (and the fallback behind
/// `Musical`'s grid-fit term). Each weight must lie in `[0, 1]` and the three
/// must sum to 1.0 within a small tolerance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectionWeights {
    pub energy: f32,
    pub regularity: f32,
    pub musical: f32,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self { energy: 0.4, regularity: 0.3, musical: 0.3 }
    }
}

impl SelectionWeights {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("energy", self.energy), ("regularity", self.regularity), ("musical", self.musical)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BeatParserError::configuration(format!("{name} weight must be within [0, 1], got {value}")));
            }
        }
        let sum = self.energy + self.regularity + self.musical;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(BeatParserError::configuration(format!(
                "selection weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

pub struct SelectionInput<'a> {
    pub candidates: &'a [BeatCandidate],
    pub target_count: usize,
    pub strategy: Strategy,
    pub tempo: Option<&'a Tempo>,
    pub duration: f64,
    pub weights: SelectionWeights,
    pub min_spacing_ms: f32,
}

/// Select up to `target_count` beats from `input.candidates` and compute the
/// quality report for that selection.
pub fn select(input: &SelectionInput) -> Result<(Vec<BeatCandidate>, QualityReport)> {
    input.weights.validate()?;

    let finite: Vec<BeatCandidate> = input.candidates.iter().filter(|c| c.is_finite()).cloned().collect();
    let deduped = dedupe_by_time(finite);

    if deduped.is_empty() || input.target_count == 0 {
        return Ok((Vec::new(), quality::compute(&[], input.duration)));
    }

    let min_spacing = (input.min_spacing_ms as f64 / 1000.0).max(0.0);

    let mut raw = match input.strategy {
        Strategy::Energy => energy::select(&deduped, input.target_count),
        Strategy::Regular => regular::select(&deduped, input.target_count, input.duration),
        Strategy::Musical => musical::select(
            &deduped,
            input.target_count,
            input.tempo,
            &MusicalWeights::default(),
        )?,
        Strategy::Adaptive => adaptive::select(
            &deduped,
            input.target_count,
            input.tempo,
            &AdaptiveWeights {
                energy: input.weights.energy,
                regularity: input.weights.regularity,
                musical: input.weights.musical,
            },
            min_spacing,
        ),
    };

    raw = enforce_minimum_spacing(raw, min_spacing);
    raw.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap());

    let report = quality::compute(&raw, input.duration);
    Ok((raw, report))
}

/// Collapse candidates that share an identical timestamp, keeping the one
/// with the highest strength (ties broken by earlier insertion order, which
/// keeps the result deterministic across repeated calls on the same input).
fn dedupe_by_time(mut candidates: Vec<BeatCandidate>) -> Vec<BeatCandidate> {
    candidates.sort_by(|a, b| {
        a.time
            .partial_cmp(&b.time)
            .unwrap()
            .then_with(|| b.strength.partial_cmp(&a.strength).unwrap())
    });

    let mut deduped: Vec<BeatCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match deduped.last() {
            Some(last) if (last.time - candidate.time).abs() < 1e-9 => {}
            _ => deduped.push(candidate),
        }
    }
    deduped
}

/// Universal post-selection guard: when two selected beats fall closer than
/// `min_spacing` seconds apart, drop the lower-strength one. Repeats until no
/// violation remains, since dropping one beat can pull its neighbors close to
/// a beat it was previously shielding.
fn enforce_minimum_spacing(mut beats: Vec<BeatCandidate>, min_spacing: f64) -> Vec<BeatCandidate> {
    if min_spacing <= 0.0 || beats.len() < 2 {
        return beats;
    }
    beats.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap());

    loop {
        let violation = beats
            .windows(2)
            .position(|w| w[1].time - w[0].time < min_spacing);

        let Some(i) = violation else { break };
        if beats[i].strength <= beats[i + 1].strength {
            beats.remove(i);
        } else {
            beats.remove(i + 1);
        }
    }

    beats
}
