//! Energy strategy (§4.6): rank by strength, take top-N, re-sort by time.

use crate::types::BeatCandidate;

pub fn select(candidates: &[BeatCandidate], target_count: usize) -> Vec<BeatCandidate> {
    let mut ranked: Vec<&BeatCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap()
            .then_with(|| b.confidence.partial_cmp(&a.confidence).unwrap())
            .then_with(|| a.time.partial_cmp(&b.time).unwrap())
    });

    let mut picked: Vec<BeatCandidate> = ranked.into_iter().take(target_count).cloned().collect();
    picked.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap());
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;

    fn beat(time: f64, strength: f32, confidence: f32) -> BeatCandidate {
        BeatCandidate::new(time, strength, confidence, Origin::Detected)
    }

    #[test]
    fn picks_the_strongest_candidates() {
        let candidates = vec![
            beat(0.0, 0.2, 0.5),
            beat(1.0, 0.9, 0.5),
            beat(2.0, 0.4, 0.5),
            beat(3.0, 0.8, 0.5),
        ];
        let picked = select(&candidates, 2);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].time, 1.0);
        assert_eq!(picked[1].time, 3.0);
    }

    #[test]
    fn result_is_sorted_by_time() {
        let candidates = vec![beat(5.0, 0.9, 0.5), beat(1.0, 0.9, 0.5), beat(3.0, 0.9, 0.5)];
        let picked = select(&candidates, 3);
        assert!(picked.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn ties_break_on_confidence_then_earlier_time() {
        let candidates = vec![beat(2.0, 0.5, 0.9), beat(1.0, 0.5, 0.9), beat(3.0, 0.5, 0.1)];
        let picked = select(&candidates, 2);
        let times: Vec<f64> = picked.iter().map(|b| b.time).collect();
        assert!(times.contains(&1.0) && times.contains(&2.0));
    }

    #[test]
    fn requesting_more_than_available_returns_all() {
        let candidates = vec![beat(0.0, 0.5, 0.5), beat(1.0, 0.6, 0.5)];
        let picked = select(&candidates, 10);
        assert_eq!(picked.len(), 2);
    }
}
