use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};

use beat_parser_core::config::Config;
use beat_parser_core::options::{ParseOptions, SelectionMethod};
use beat_parser_core::pipeline::BeatParser;

#[derive(Parser)]
#[command(
    name = "beat-parser",
    version,
    about = "Detect and select beats from an audio track",
    long_about = "Runs the onset/tempo/beat-tracking pipeline over an audio file and selects a representative subset of beats."
)]
struct Cli {
    /// Audio file path (WAV, MP3, FLAC, OGG, M4A, AAC)
    #[arg(short, long)]
    audio: PathBuf,

    /// Number of beats to select
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,

    /// Selection strategy: uniform, adaptive, energy, regular, musical
    #[arg(short, long, default_value = "adaptive")]
    strategy: String,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit the full result as JSON instead of a human-readable summary
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_strategy(raw: &str) -> anyhow::Result<SelectionMethod> {
    match raw.to_lowercase().as_str() {
        "uniform" => Ok(SelectionMethod::Uniform),
        "adaptive" => Ok(SelectionMethod::Adaptive),
        "energy" => Ok(SelectionMethod::Energy),
        "regular" => Ok(SelectionMethod::Regular),
        "musical" => Ok(SelectionMethod::Musical),
        other => Err(anyhow::anyhow!("unknown selection strategy: {other}")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            let status = err
                .downcast_ref::<beat_parser_core::BeatParserError>()
                .map(|e| e.exit_status())
                .unwrap_or(3);
            ExitCode::from(status as u8)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("beat-parser v{}", env!("CARGO_PKG_VERSION"));
    info!("audio: {:?}", cli.audio);

    let config = match &cli.config {
        Some(path) => {
            info!("loading configuration from {:?}", path);
            Config::from_file(path)?
        }
        None => Config::default(),
    };

    let selection_method = parse_strategy(&cli.strategy)?;
    let options = ParseOptions {
        target_picture_count: cli.count,
        selection_method,
        ..ParseOptions::default()
    };

    let parser = BeatParser::new(config)?;
    let result = parser.parse_file(&cli.audio, &options, None).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        info!(
            "detected {} beats, tempo: {}, quality: {:.2}",
            result.beats.len(),
            result
                .tempo
                .map(|t| format!("{:.1} BPM ({:.2} confidence)", t.bpm, t.confidence))
                .unwrap_or_else(|| "unknown".to_string()),
            result.quality.overall
        );
        for beat in &result.beats {
            println!("{:.3}s  strength={:.2}  confidence={:.2}  origin={:?}", beat.time, beat.strength, beat.confidence, beat.origin);
        }
    }

    Ok(())
}
