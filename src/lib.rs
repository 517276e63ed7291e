//! # beat-parser-core
//!
//! A hybrid onset/tempo/beat-tracking engine with a strategy-driven beat
//! selector, for picking a representative set of beats out of an audio
//! track (for example, to drive cut points in a downstream video
//! compositor).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beat_parser_core::{config::Config, options::ParseOptions, pipeline::BeatParser};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let parser = BeatParser::new(Config::default())?;
//! let result = parser.parse_file("song.wav", &ParseOptions::default(), None).await?;
//! println!("{} beats, tempo: {:?}", result.beats.len(), result.tempo);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Audio flows through a fixed pipeline of single-purpose stages:
//!
//! - [`buffer`] — the canonical sample container (C1)
//! - [`io`] — file/byte decoding into [`io::AudioSource`] (ambient)
//! - [`preprocess`] — down-mix, resample, DC removal, normalization (C2)
//! - [`spectral`] — STFT, spectral flux, spectral centroid (C3)
//! - [`onset`] — adaptive-threshold onset detection (C4)
//! - [`tempo`] — autocorrelation-based tempo estimation (C5)
//! - [`beat_tracker`] — dynamic-programming beat alignment (C6)
//! - [`selection`] — strategy-driven beat selection and quality scoring (C7)
//! - [`synthetic`] — tops up a short selection onto the tempo grid (C8)
//! - [`pipeline`] — lifecycle, plugin hooks, and orchestration (C9)
//!
//! [`config`] holds parser-wide settings; [`options`] holds per-call
//! settings; [`plugins`] and [`progress`] are the extension points.

pub mod beat_tracker;
pub mod buffer;
pub mod config;
pub mod error;
pub mod io;
pub mod onset;
pub mod options;
pub mod pipeline;
pub mod plugins;
pub mod preprocess;
pub mod progress;
pub mod selection;
pub mod spectral;
pub mod synthetic;
pub mod tempo;
pub mod types;

pub use crate::{
    config::Config,
    error::{BeatParserError, Result},
    options::ParseOptions,
    pipeline::BeatParser,
    types::{BeatCandidate, ParseResult, Tempo},
};
