//! Minimal example exercising the public API directly: parse a file with
//! default options and print what came back.

use std::env;

use beat_parser_core::config::Config;
use beat_parser_core::options::ParseOptions;
use beat_parser_core::pipeline::BeatParser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args().nth(1).ok_or("usage: analyze_file <audio-file>")?;

    let parser = BeatParser::new(Config::default())?;
    let result = parser.parse_file(&path, &ParseOptions::default(), None).await?;

    println!("beats selected: {}", result.beats.len());
    match result.tempo {
        Some(tempo) => println!("tempo: {:.1} BPM (confidence {:.2})", tempo.bpm, tempo.confidence),
        None => println!("tempo: not detected"),
    }
    println!(
        "quality: coverage={:.2} diversity={:.2} spacing={:.2} overall={:.2}",
        result.quality.coverage, result.quality.diversity, result.quality.spacing, result.quality.overall
    );

    for beat in &result.beats {
        println!("  {:.3}s strength={:.2} origin={:?}", beat.time, beat.strength, beat.origin);
    }

    Ok(())
}
