//! Adaptive strategy (§4.6): blends energy, regularity and (when available)
//! musical grid fit into a single score, then greedily picks the top `N`
//! under the minimum-spacing guard.

use crate::types::{BeatCandidate, Tempo};

#[derive(Debug, Clone, Copy)]
pub struct AdaptiveWeights {
    pub energy: f32,
    pub regularity: f32,
    pub musical: f32,
}

impl Default for AdaptiveWeights {
    fn default() -> Self {
        Self { energy: 0.4, regularity: 0.3, musical: 0.3 }
    }
}

/// Rank-based energy score: the strongest candidate gets 1.0, the weakest
/// gets 0.0, ties share the same percentile.
fn energy_scores(candidates: &[BeatCandidate]) -> Vec<f32> {
    let n = candidates.len();
    if n <= 1 {
        return vec![1.0; n];
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| candidates[a].strength.partial_cmp(&candidates[b].strength).unwrap());

    let mut scores = vec![0.0f32; n];
    for (rank, &idx) in order.iter().enumerate() {
        scores[idx] = rank as f32 / (n - 1) as f32;
    }
    scores
}

/// How evenly a candidate's neighboring gaps match the mean gap across the
/// whole candidate set: 1.0 for a perfectly even local spacing, decaying
/// toward 0.0 as the local gaps diverge from the mean.
fn regularity_scores(candidates: &[BeatCandidate]) -> Vec<f32> {
    let n = candidates.len();
    if n <= 1 {
        return vec![1.0; n];
    }
    let gaps: Vec<f64> = candidates.windows(2).map(|w| w[1].time - w[0].time).collect();
    let mean_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;

    (0..n)
        .map(|i| {
            let local_gap = if i == 0 {
                gaps[0]
            } else if i == n - 1 {
                gaps[n - 2]
            } else {
                (gaps[i - 1] + gaps[i]) / 2.0
            };
            if mean_gap <= 0.0 {
                return 1.0;
            }
            let deviation = ((local_gap - mean_gap).abs() / mean_gap) as f32;
            (1.0 - deviation).clamp(0.0, 1.0)
        })
        .collect()
}

fn musical_scores(candidates: &[BeatCandidate], tempo: Option<&Tempo>) -> Vec<f32> {
    let tempo = match tempo {
        Some(t) if t.bpm > 0.0 => t,
        _ => return vec![0.0; candidates.len()],
    };
    let beat_duration = 60.0 / tempo.bpm as f64;
    let half_beat = beat_duration / 2.0;

    candidates
        .iter()
        .map(|c| {
            let grid_index = (c.time / beat_duration).round().max(0.0);
            let grid_time = grid_index * beat_duration;
            let deviation = (c.time - grid_time).abs();
            (1.0 - (deviation.min(half_beat) / half_beat) as f32).clamp(0.0, 1.0)
        })
        .collect()
}

pub fn select(
    candidates: &[BeatCandidate],
    target_count: usize,
    tempo: Option<&Tempo>,
    weights: &AdaptiveWeights,
    min_spacing: f64,
) -> Vec<BeatCandidate> {
    if target_count == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let energy = energy_scores(candidates);
    let regularity = regularity_scores(candidates);
    let musical = musical_scores(candidates, tempo);

    let mut scored: Vec<(f32, usize)> = (0..candidates.len())
        .map(|i| {
            let score = weights.energy * energy[i] + weights.regularity * regularity[i] + weights.musical * musical[i];
            (score, i)
        })
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap().then_with(|| a.1.cmp(&b.1)));

    let mut picked: Vec<BeatCandidate> = Vec::with_capacity(target_count);
    for (_, idx) in scored {
        if picked.len() >= target_count {
            break;
        }
        let candidate = &candidates[idx];
        let far_enough = picked.iter().all(|p: &BeatCandidate| (p.time - candidate.time).abs() >= min_spacing);
        if far_enough {
            picked.push(candidate.clone());
        }
    }

    picked.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap());
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;

    fn beat(time: f64, strength: f32) -> BeatCandidate {
        BeatCandidate::new(time, strength, 0.5, Origin::Detected)
    }

    #[test]
    fn respects_target_count() {
        let candidates: Vec<BeatCandidate> = (0..10).map(|i| beat(i as f64, 0.5)).collect();
        let picked = select(&candidates, 4, None, &AdaptiveWeights::default(), 0.0);
        assert_eq!(picked.len(), 4);
    }

    #[test]
    fn enforces_minimum_spacing() {
        let candidates = vec![beat(0.0, 0.9), beat(0.05, 0.9), beat(5.0, 0.9)];
        let picked = select(&candidates, 3, None, &AdaptiveWeights::default(), 1.0);
        for w in picked.windows(2) {
            assert!(w[1].time - w[0].time >= 1.0);
        }
    }

    #[test]
    fn result_is_sorted_by_time() {
        let candidates = vec![beat(3.0, 0.7), beat(0.0, 0.9), beat(1.5, 0.2)];
        let picked = select(&candidates, 3, None, &AdaptiveWeights::default(), 0.0);
        assert!(picked.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn empty_candidates_yield_empty_selection() {
        assert!(select(&[], 5, None, &AdaptiveWeights::default(), 0.0).is_empty());
    }
}
