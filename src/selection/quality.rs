//! Quality Report computation (§4.6): coverage, diversity, spacing and their
//! mean.

use crate::types::{BeatCandidate, QualityReport};

pub fn compute(chosen: &[BeatCandidate], duration: f64) -> QualityReport {
    if chosen.is_empty() {
        return QualityReport::ZERO;
    }

    let coverage = compute_coverage(chosen, duration);
    let diversity = compute_diversity(chosen);
    let spacing = compute_spacing(chosen);

    QualityReport::from_components(coverage, diversity, spacing)
}

fn compute_coverage(chosen: &[BeatCandidate], duration: f64) -> f32 {
    if chosen.len() < 2 || duration <= 0.0 {
        return 0.0;
    }
    let first = chosen.first().unwrap().time;
    let last = chosen.last().unwrap().time;
    (((last - first) / duration) as f32).clamp(0.0, 1.0)
}

fn compute_diversity(chosen: &[BeatCandidate]) -> f32 {
    if chosen.len() < 2 {
        return 0.0;
    }
    let strengths: Vec<f32> = chosen.iter().map(|b| b.strength).collect();
    let mean = strengths.iter().sum::<f32>() / strengths.len() as f32;
    let variance = strengths.iter().map(|&s| (s - mean).powi(2)).sum::<f32>() / strengths.len() as f32;
    (variance.sqrt() / 0.5).clamp(0.0, 1.0)
}

fn compute_spacing(chosen: &[BeatCandidate]) -> f32 {
    if chosen.len() == 1 {
        return 1.0;
    }
    let intervals: Vec<f64> = chosen.windows(2).map(|w| w[1].time - w[0].time).collect();
    if intervals.iter().all(|&i| i <= 1e-9) {
        return 0.0;
    }
    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = intervals.iter().map(|&i| (i - mean).powi(2)).sum::<f64>() / intervals.len() as f64;
    let cv = variance.sqrt() / mean;
    (1.0 - cv as f32).clamp(0.0, 1.0)
}
