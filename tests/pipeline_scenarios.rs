//! End-to-end scenarios against the public API: silence, click tracks at a
//! known tempo, invalid input, streaming/buffer equivalence, determinism,
//! and the synthetic-fill/selection-idempotence guarantees (§8).

use beat_parser_core::config::Config;
use beat_parser_core::error::BeatParserError;
use beat_parser_core::options::{ParseOptions, SelectionMethod};
use beat_parser_core::pipeline::BeatParser;
use beat_parser_core::selection::{self, SelectionInput, SelectionWeights, Strategy};
use beat_parser_core::types::{BeatCandidate, Origin};

/// A decaying-spike click track at `bpm`, `n_beats` long, at `sample_rate`.
fn click_track(bpm: f32, n_beats: usize, sample_rate: u32) -> Vec<f32> {
    let interval_samples = (60.0 / bpm * sample_rate as f32) as usize;
    let mut samples = vec![0.0f32; interval_samples * n_beats];
    for i in (0..samples.len()).step_by(interval_samples) {
        for k in 0..200.min(samples.len() - i) {
            samples[i + k] = (1.0 - k as f32 / 200.0) * 0.9;
        }
    }
    samples
}

#[tokio::test]
async fn silence_yields_no_tempo_and_no_beats() {
    let parser = BeatParser::new(Config::default()).unwrap();
    let samples = vec![0.0f32; 44_100 * 5];
    let options = ParseOptions { target_picture_count: 6, ..ParseOptions::default() };

    let result = parser
        .parse_stream(vec![samples].into_iter(), 44_100, &options, None)
        .await
        .unwrap();

    assert!(result.tempo.is_none());
    assert!(result.beats.is_empty(), "silence has nothing to preserve or interpolate from");
    assert_eq!(result.quality.overall, 0.0);
}

#[tokio::test]
async fn click_track_tempo_is_detected_within_tolerance() {
    let parser = BeatParser::new(Config::default()).unwrap();
    let sample_rate = 44_100;
    let samples = click_track(120.0, 16, sample_rate);
    let options = ParseOptions { target_picture_count: 8, ..ParseOptions::default() };

    let result = parser
        .parse_stream(vec![samples].into_iter(), sample_rate, &options, None)
        .await
        .unwrap();

    let tempo = result.tempo.expect("a steady click track should yield a tempo estimate");
    assert!((tempo.bpm - 120.0).abs() < 6.0, "got {} bpm", tempo.bpm);
    assert!(!result.beats.is_empty());
}

#[tokio::test]
async fn non_finite_samples_are_rejected_as_invalid_input() {
    let parser = BeatParser::new(Config::default()).unwrap();
    let mut samples = vec![0.0f32; 8192];
    samples[10] = f32::NAN;

    let result = parser
        .parse_stream(vec![samples].into_iter(), 44_100, &ParseOptions::default(), None)
        .await;

    assert!(matches!(result, Err(BeatParserError::InvalidInput { .. })));
}

#[tokio::test]
async fn an_empty_stream_is_rejected_as_invalid_input() {
    let parser = BeatParser::new(Config::default()).unwrap();
    let chunks: Vec<Vec<f32>> = vec![];

    let result = parser
        .parse_stream(chunks.into_iter(), 44_100, &ParseOptions::default(), None)
        .await;

    assert!(matches!(result, Err(BeatParserError::InvalidInput { .. })));
}

#[tokio::test]
async fn chunking_does_not_change_the_result() {
    let sample_rate = 44_100;
    let samples = click_track(100.0, 12, sample_rate);
    let options = ParseOptions { target_picture_count: 6, ..ParseOptions::default() };

    let whole = BeatParser::new(Config::default())
        .unwrap()
        .parse_stream(vec![samples.clone()].into_iter(), sample_rate, &options, None)
        .await
        .unwrap();

    let chunked = samples.chunks(4096).map(|c| c.to_vec()).collect::<Vec<_>>();
    let piecemeal = BeatParser::new(Config::default())
        .unwrap()
        .parse_stream(chunked.into_iter(), sample_rate, &options, None)
        .await
        .unwrap();

    assert_eq!(whole.beats.len(), piecemeal.beats.len());
    for (a, b) in whole.beats.iter().zip(piecemeal.beats.iter()) {
        assert!((a.time - b.time).abs() < 1e-9);
        assert_eq!(a.origin, b.origin);
    }
    assert_eq!(whole.tempo.map(|t| t.bpm), piecemeal.tempo.map(|t| t.bpm));
}

#[tokio::test]
async fn parsing_the_same_audio_twice_is_deterministic() {
    let sample_rate = 44_100;
    let options = ParseOptions { target_picture_count: 5, selection_method: SelectionMethod::Adaptive, ..ParseOptions::default() };

    let first = BeatParser::new(Config::default())
        .unwrap()
        .parse_stream(vec![click_track(128.0, 10, sample_rate)].into_iter(), sample_rate, &options, None)
        .await
        .unwrap();
    let second = BeatParser::new(Config::default())
        .unwrap()
        .parse_stream(vec![click_track(128.0, 10, sample_rate)].into_iter(), sample_rate, &options, None)
        .await
        .unwrap();

    assert_eq!(first.beats.len(), second.beats.len());
    for (a, b) in first.beats.iter().zip(second.beats.iter()) {
        assert!((a.time - b.time).abs() < 1e-9);
        assert!((a.strength - b.strength).abs() < 1e-9);
    }
    assert_eq!(first.quality, second.quality);
}

#[tokio::test]
async fn a_short_detected_set_is_topped_up_with_synthetic_beats() {
    let parser = BeatParser::new(Config::default()).unwrap();
    let sample_rate = 44_100;
    // Trailing silence stretches the tempo grid out so there are comfortably
    // more than 40 well-spaced slots left over for the synthetic fill, well
    // clear of the default 100ms min_spacing.
    let mut samples = click_track(90.0, 4, sample_rate);
    samples.extend(vec![0.0f32; sample_rate as usize * 40]);
    let options = ParseOptions {
        target_picture_count: 40,
        selection_method: SelectionMethod::Energy,
        ..ParseOptions::default()
    };

    let result = parser
        .parse_stream(vec![samples].into_iter(), sample_rate, &options, None)
        .await
        .unwrap();

    assert_eq!(result.beats.len(), 40);
    assert!(result.beats.iter().any(|b| b.origin == Origin::Detected));
    assert!(result.beats.iter().any(|b| b.origin == Origin::Synthetic));
    assert!(result.beats.iter().filter(|b| b.origin == Origin::Synthetic).all(|b| b.interpolated));
}

#[test]
fn selecting_an_already_settled_set_is_idempotent() {
    let candidates: Vec<BeatCandidate> = (0..6)
        .map(|i| BeatCandidate::new(i as f64 * 0.5, 0.6 + i as f32 * 0.01, 0.8, Origin::Detected))
        .collect();

    let input = SelectionInput {
        candidates: &candidates,
        target_count: 6,
        strategy: Strategy::Energy,
        tempo: None,
        duration: 3.0,
        weights: SelectionWeights::default(),
        min_spacing_ms: 100.0,
    };
    let (first, _) = selection::select(&input).unwrap();

    let second_input = SelectionInput { candidates: &first, ..input };
    let (second, _) = selection::select(&second_input).unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert!((a.time - b.time).abs() < 1e-9);
        assert_eq!(a.strength, b.strength);
    }
}
