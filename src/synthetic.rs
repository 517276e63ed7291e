//! C8 — Synthetic Beat Generator: tops up a selection that came up short of
//! `target_count` by interpolating additional beats, preferring the tempo
//! grid when one exists and falling back to even spacing otherwise (§4.7).

use crate::types::{BeatCandidate, Origin, Tempo};

/// Bounds within which a tempo is considered usable for grid placement; a
/// tempo outside this band (implausibly slow or fast) is treated the same as
/// no tempo at all.
const MIN_USABLE_BPM: f32 = 0.0;
const MAX_USABLE_BPM: f32 = 600.0;

/// Extend `detected` with synthetic beats up to `target_count`, preserving
/// every detected beat and keeping the result in increasing time order.
/// Never places a synthetic beat within `min_spacing` (seconds) of any
/// detected or already-placed synthetic beat; if the grid runs out of
/// eligible slots, the result may come up short of `target_count`.
pub fn fill(
    detected: &[BeatCandidate],
    target_count: usize,
    tempo: Option<&Tempo>,
    duration: f64,
    min_spacing: f64,
) -> Vec<BeatCandidate> {
    if detected.is_empty() || detected.len() >= target_count || target_count == 0 || duration <= 0.0 {
        return detected.to_vec();
    }

    let needed = target_count - detected.len();
    let (mean_strength, mean_confidence) = mean_strength_confidence(detected);
    let synthetic_strength = mean_strength * 0.9;
    let synthetic_confidence = mean_confidence * 0.6;

    let candidate_times = match tempo {
        Some(t) if t.bpm > MIN_USABLE_BPM && t.bpm <= MAX_USABLE_BPM => grid_times(t.bpm, duration),
        _ => uniform_times(target_count, duration),
    };

    let mut existing: Vec<f64> = detected.iter().map(|b| b.time).collect();
    existing.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let inserted = farthest_point_insertion(&candidate_times, &existing, needed, min_spacing.max(0.0));

    let mut result = detected.to_vec();
    for time in inserted {
        let mut synthetic = BeatCandidate::new(time, synthetic_strength, synthetic_confidence, Origin::Synthetic);
        synthetic.interpolated = true;
        result.push(synthetic);
    }
    result.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap());
    result.truncate(target_count.max(detected.len()));
    result
}

fn mean_strength_confidence(detected: &[BeatCandidate]) -> (f32, f32) {
    if detected.is_empty() {
        return (0.5, 0.5);
    }
    let n = detected.len() as f32;
    let strength = detected.iter().map(|b| b.strength).sum::<f32>() / n;
    let confidence = detected.iter().map(|b| b.confidence).sum::<f32>() / n;
    (strength, confidence)
}

fn grid_times(bpm: f32, duration: f64) -> Vec<f64> {
    let beat_duration = 60.0 / bpm as f64;
    let mut times = Vec::new();
    let mut t = 0.0;
    while t <= duration {
        times.push(t);
        t += beat_duration;
    }
    times
}

fn uniform_times(target_count: usize, duration: f64) -> Vec<f64> {
    (0..target_count.max(1))
        .map(|i| (i as f64 + 0.5) * duration / target_count.max(1) as f64)
        .collect()
}

/// Greedily pick up to `needed` times from `candidates`, each time choosing
/// the one farthest (in time) from every point already chosen or already
/// present in `existing`. This spreads synthetic beats out rather than
/// clustering them around whichever grid slot happens to come first. A slot
/// closer than `min_spacing` to its nearest neighbor is ineligible; once no
/// eligible slot remains, insertion stops short of `needed` rather than
/// violating spacing.
fn farthest_point_insertion(candidates: &[f64], existing: &[f64], needed: usize, min_spacing: f64) -> Vec<f64> {
    if candidates.is_empty() || needed == 0 {
        return Vec::new();
    }

    let mut chosen: Vec<f64> = Vec::with_capacity(needed);
    let mut available: Vec<f64> = candidates.to_vec();

    for _ in 0..needed {
        let best = available
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let distance = existing
                    .iter()
                    .chain(chosen.iter())
                    .map(|&e| (t - e).abs())
                    .fold(f64::MAX, f64::min);
                (i, distance)
            })
            .filter(|&(_, distance)| distance >= min_spacing)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

        let Some((best_idx, _)) = best else { break };
        chosen.push(available.remove(best_idx));
    }

    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;

    fn beat(time: f64, strength: f32) -> BeatCandidate {
        BeatCandidate::new(time, strength, 0.8, Origin::Detected)
    }

    #[test]
    fn does_nothing_when_already_at_target() {
        let detected = vec![beat(1.0, 0.5), beat(2.0, 0.5)];
        let result = fill(&detected, 2, None, 10.0, 0.0);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|b| b.origin == Origin::Detected));
    }

    #[test]
    fn nothing_detected_yields_an_empty_result() {
        let result = fill(&[], 10, None, 10.0, 0.0);
        assert!(result.is_empty());
    }

    #[test]
    fn tops_up_with_synthetic_beats_using_tempo_grid() {
        let detected = vec![beat(0.5, 0.8)];
        let tempo = Tempo { bpm: 120.0, confidence: 0.9, time_signature: None };
        let result = fill(&detected, 4, Some(&tempo), 4.0, 0.0);
        assert_eq!(result.len(), 4);
        assert_eq!(result.iter().filter(|b| b.origin == Origin::Detected).count(), 1);
        assert_eq!(result.iter().filter(|b| b.origin == Origin::Synthetic).count(), 3);
        assert!(result.iter().filter(|b| b.origin == Origin::Synthetic).all(|b| b.interpolated));
        assert!(result.iter().filter(|b| b.origin == Origin::Detected).all(|b| !b.interpolated));
    }

    #[test]
    fn falls_back_to_uniform_spacing_without_tempo() {
        let detected = vec![beat(0.0, 0.6)];
        let result = fill(&detected, 3, None, 9.0, 0.0);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn preserves_all_detected_beats() {
        let detected = vec![beat(0.1, 0.9), beat(4.9, 0.9)];
        let tempo = Tempo { bpm: 100.0, confidence: 0.9, time_signature: None };
        let result = fill(&detected, 5, Some(&tempo), 5.0, 0.0);
        assert!(result.iter().any(|b| (b.time - 0.1).abs() < 1e-9));
        assert!(result.iter().any(|b| (b.time - 4.9).abs() < 1e-9));
    }

    #[test]
    fn result_is_in_increasing_time_order() {
        let detected = vec![beat(3.0, 0.5), beat(0.5, 0.5)];
        let tempo = Tempo { bpm: 90.0, confidence: 0.9, time_signature: None };
        let result = fill(&detected, 6, Some(&tempo), 6.0, 0.0);
        assert!(result.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn never_exceeds_target_count() {
        let detected = vec![beat(1.0, 0.5)];
        let result = fill(&detected, 3, None, 2.0, 0.0);
        assert!(result.len() <= 3);
    }

    #[test]
    fn implausible_tempo_falls_back_to_uniform() {
        let detected = vec![beat(0.0, 0.5)];
        let tempo = Tempo { bpm: 900.0, confidence: 0.9, time_signature: None };
        let result = fill(&detected, 3, Some(&tempo), 6.0, 0.0);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn min_spacing_can_leave_the_result_short_of_target() {
        // Every grid slot in this short, dense grid falls within 500ms of the
        // detected beat, so none are eligible and the result stays short.
        let detected = vec![beat(0.0, 0.5)];
        let tempo = Tempo { bpm: 600.0, confidence: 0.9, time_signature: None };
        let result = fill(&detected, 2, Some(&tempo), 0.25, 0.5);
        assert_eq!(result.len(), 1);
        assert!(result.iter().all(|b| b.origin == Origin::Detected));
    }

    #[test]
    fn synthetic_beats_respect_minimum_spacing_from_detected() {
        let detected = vec![beat(0.0, 0.9), beat(10.0, 0.9)];
        let tempo = Tempo { bpm: 600.0, confidence: 0.9, time_signature: None };
        let result = fill(&detected, 12, Some(&tempo), 10.0, 0.5);
        let mut times: Vec<f64> = result.iter().map(|b| b.time).collect();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!(times.windows(2).all(|w| w[1] - w[0] + 1e-9 >= 0.5));
    }
}
