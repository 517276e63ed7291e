//! Regular strategy (§4.6): nearest candidate to each of `N` evenly-spaced
//! targets across the clip duration, skipping a target if nothing falls
//! within tolerance.

use crate::types::BeatCandidate;

pub fn select(candidates: &[BeatCandidate], target_count: usize, duration: f64) -> Vec<BeatCandidate> {
    if target_count == 0 || candidates.is_empty() || duration <= 0.0 {
        return Vec::new();
    }

    let tolerance = duration / (2.0 * target_count as f64);
    let mut used = vec![false; candidates.len()];
    let mut picked = Vec::with_capacity(target_count);

    for i in 0..target_count {
        let ideal_time = (i as f64 + 0.5) * duration / target_count as f64;

        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            if used[idx] {
                continue;
            }
            let distance = (candidate.time - ideal_time).abs();
            if distance > tolerance {
                continue;
            }
            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((idx, distance));
            }
        }

        if let Some((idx, _)) = best {
            used[idx] = true;
            picked.push(candidates[idx].clone());
        }
    }

    picked.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap());
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;

    fn beat(time: f64) -> BeatCandidate {
        BeatCandidate::new(time, 0.5, 0.5, Origin::Detected)
    }

    #[test]
    fn picks_one_candidate_near_each_target() {
        let candidates: Vec<BeatCandidate> = (0..10).map(|i| beat(i as f64)).collect();
        let picked = select(&candidates, 5, 10.0);
        assert_eq!(picked.len(), 5);
    }

    #[test]
    fn skips_targets_with_nothing_in_tolerance() {
        let candidates = vec![beat(0.1), beat(9.9)];
        let picked = select(&candidates, 5, 10.0);
        assert!(picked.len() <= 2);
    }

    #[test]
    fn never_reuses_a_candidate() {
        let candidates = vec![beat(5.0)];
        let picked = select(&candidates, 3, 10.0);
        assert_eq!(picked.len(), 1);
    }

    #[test]
    fn empty_inputs_yield_empty_output() {
        assert!(select(&[], 5, 10.0).is_empty());
        let candidates = vec![beat(1.0)];
        assert!(select(&candidates, 0, 10.0).is_empty());
        assert!(select(&candidates, 5, 0.0).is_empty());
    }

    #[test]
    fn result_is_sorted_by_time() {
        let candidates: Vec<BeatCandidate> = vec![beat(8.0), beat(1.0), beat(5.0), beat(2.0)];
        let picked = select(&candidates, 4, 10.0);
        assert!(picked.windows(2).all(|w| w[0].time <= w[1].time));
    }
}
