//! C6 — Beat Tracker: fuses onsets with the tempo grid via dynamic
//! programming to produce beat candidates (§4.5).

use crate::types::{BeatCandidate, Origin, OnsetEvent, Tempo};

#[derive(Debug, Clone, Copy)]
pub struct BeatTrackerConfig {
    /// Weight on onset strength in the fused confidence score.
    pub strength_weight: f32,
    /// Weight on timing regularity in the fused confidence score.
    /// `strength_weight + timing_weight` should be 1.0.
    pub timing_weight: f32,
}

impl Default for BeatTrackerConfig {
    fn default() -> Self {
        Self { strength_weight: 0.6, timing_weight: 0.4 }
    }
}

/// Track beats from onsets. When `tempo` is present, runs the DP alignment
/// described in §4.5; otherwise degrades to pure onset passthrough with
/// `confidence = strength`.
pub fn track(onsets: &[OnsetEvent], tempo: Option<&Tempo>, config: &BeatTrackerConfig) -> Vec<BeatCandidate> {
    match tempo {
        Some(tempo) if tempo.bpm > 0.0 => track_with_tempo(onsets, tempo, config),
        _ => passthrough(onsets),
    }
}

fn passthrough(onsets: &[OnsetEvent]) -> Vec<BeatCandidate> {
    onsets
        .iter()
        .map(|o| BeatCandidate::new(o.time, o.strength, o.strength, Origin::Detected))
        .collect()
}

/// Dynamic-programming alignment: `cost[i]` is the best cumulative score
/// ending with onset `i` chosen as a beat, where the transition from a
/// previous chosen onset `j` is penalized by squared deviation from the
/// ideal inter-beat interval and rewarded by the onset's own strength.
fn track_with_tempo(onsets: &[OnsetEvent], tempo: &Tempo, config: &BeatTrackerConfig) -> Vec<BeatCandidate> {
    if onsets.is_empty() {
        return Vec::new();
    }
    if onsets.len() == 1 {
        let o = onsets[0];
        let mut candidate = BeatCandidate::new(o.time, o.strength, o.strength, Origin::Detected);
        candidate.grid_index = Some(0);
        candidate.deviation_ms = Some(0.0);
        return vec![candidate];
    }

    let ideal_interval = 60.0 / tempo.bpm as f64;
    let n = onsets.len();

    // score[i] = best cumulative score of a beat path ending at onset i.
    // back[i] = the previous onset index in that optimal path, or None if i
    // starts the path.
    let mut score = vec![0.0f64; n];
    let mut back: Vec<Option<usize>> = vec![None; n];

    for i in 0..n {
        score[i] = onsets[i].strength as f64;
        for j in 0..i {
            let interval = onsets[i].time - onsets[j].time;
            if interval <= 0.0 {
                continue;
            }
            let deviation = interval - ideal_interval;
            let transition_cost = (deviation / ideal_interval).powi(2);
            let candidate_score = score[j] + onsets[i].strength as f64 - transition_cost;
            if candidate_score > score[i] {
                score[i] = candidate_score;
                back[i] = Some(j);
            }
        }
    }

    let end = (0..n).max_by(|&a, &b| score[a].partial_cmp(&score[b]).unwrap()).unwrap();

    let mut path = Vec::new();
    let mut cursor = Some(end);
    while let Some(i) = cursor {
        path.push(i);
        cursor = back[i];
    }
    path.reverse();

    let half_beat = ideal_interval / 2.0;
    let mut previous_time: Option<f64> = None;

    path.into_iter()
        .map(|idx| {
            let onset = onsets[idx];

            let normalized_deviation = match previous_time {
                Some(prev) => {
                    let interval_deviation = (onset.time - prev - ideal_interval).abs();
                    (interval_deviation / half_beat).min(1.0)
                }
                None => 0.0,
            };
            previous_time = Some(onset.time);

            let confidence = (config.strength_weight * onset.strength
                + config.timing_weight * (1.0 - normalized_deviation as f32))
                .clamp(0.0, 1.0);

            let grid_index = (onset.time / ideal_interval).round() as u32;
            let grid_time = grid_index as f64 * ideal_interval;
            let deviation_ms = ((onset.time - grid_time) * 1000.0) as f32;

            let mut candidate = BeatCandidate::new(onset.time, onset.strength, confidence, Origin::Detected);
            candidate.grid_index = Some(grid_index);
            candidate.deviation_ms = Some(deviation_ms);
            candidate
        })
        .collect()
}
