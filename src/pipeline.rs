//! C9 — Pipeline Orchestrator: owns the parser's lifecycle, wires C2 through
//! C8 together, runs plugin hooks, and enforces cancellation/timeout (§5).

use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::beat_tracker::{self, BeatTrackerConfig};
use crate::buffer::SampleBuffer;
use crate::config::Config;
use crate::error::{BeatParserError, Result};
use crate::io::{self, AudioSource};
use crate::onset::{self, OnsetConfig};
use crate::options::ParseOptions;
use crate::plugins::{Plugin, PluginRegistry};
use crate::preprocess::{self, PreprocessConfig};
use crate::progress::CancellationToken;
use crate::selection::{self, SelectionInput};
use crate::spectral::{self, SpectralConfig};
use crate::synthetic;
use crate::tempo::{self, TempoConfig};
use crate::types::{ParseMetadata, ParseResult};

/// Monotonic lifecycle, mirroring the teacher's init-once-then-run shape:
/// configuration and plugins may only be mutated while `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Uninitialized,
    Initialized,
    Finalized,
}

/// The beat parser. Owns configuration, registered plugins, and lifecycle
/// state; `parse_file`/`parse_buffer`/`parse_stream` are the entry points.
pub struct BeatParser {
    config: Config,
    plugins: PluginRegistry,
    state: Mutex<LifecycleState>,
}

impl BeatParser {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, plugins: PluginRegistry::new(), state: Mutex::new(LifecycleState::Uninitialized) })
    }

    /// Enter the `Initialized` state. Idempotent: calling this more than
    /// once is a no-op rather than an error, since a caller composing
    /// several setup steps shouldn't need to track whether it already ran.
    pub fn initialize(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if *state == LifecycleState::Uninitialized {
            *state = LifecycleState::Initialized;
        }
        Ok(())
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) -> Result<()> {
        self.guard_mutation()?;
        self.plugins.register(plugin);
        Ok(())
    }

    pub fn set_config(&mut self, config: Config) -> Result<()> {
        self.guard_mutation()?;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    fn guard_mutation(&self) -> Result<()> {
        let state = self.state.lock().unwrap();
        match *state {
            LifecycleState::Uninitialized => Ok(()),
            _ => Err(BeatParserError::lifecycle("configuration and plugins can only be changed before initialize()")),
        }
    }

    fn finalize(&self) {
        let mut state = self.state.lock().unwrap();
        *state = LifecycleState::Finalized;
    }

    /// Parse a file on disk.
    pub async fn parse_file<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ParseOptions,
        cancellation: Option<&CancellationToken>,
    ) -> Result<ParseResult> {
        self.initialize()?;
        options.validate()?;

        let path = path.as_ref().to_path_buf();
        let source = tokio::task::spawn_blocking(move || io::load_file(&path))
            .await
            .map_err(|e| BeatParserError::processing(format!("parse task panicked: {e}")))??;

        self.run_pipeline(source, options, cancellation).await
    }

    /// Parse raw bytes already held in memory, with an optional filename
    /// hint used for format sniffing.
    pub async fn parse_buffer(
        &self,
        bytes: Vec<u8>,
        options: &ParseOptions,
        cancellation: Option<&CancellationToken>,
    ) -> Result<ParseResult> {
        self.initialize()?;
        options.validate()?;

        let extension = options
            .filename
            .as_ref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_string)
            .ok_or_else(|| BeatParserError::invalid_input("parse_buffer requires options.filename to carry a recognizable extension"))?;

        let source = tokio::task::spawn_blocking(move || io::load_buffer(bytes, &extension))
            .await
            .map_err(|e| BeatParserError::processing(format!("parse task panicked: {e}")))??;

        self.run_pipeline(source, options, cancellation).await
    }

    /// Parse a stream of interleaved `f32` samples, pulled in fixed-size
    /// chunks to bound memory use regardless of total track length (§5's
    /// streaming-vs-buffer equivalence requirement: the result matches
    /// `parse_buffer` on the same decoded audio, modulo floating-point order
    /// of summation at chunk boundaries).
    pub async fn parse_stream(
        &self,
        mut chunks: impl Iterator<Item = Vec<f32>>,
        sample_rate: u32,
        options: &ParseOptions,
        cancellation: Option<&CancellationToken>,
    ) -> Result<ParseResult> {
        self.initialize()?;
        options.validate()?;

        let mut samples = Vec::new();
        while let Some(chunk) = chunks.next() {
            if cancellation.is_some_and(CancellationToken::is_cancelled) {
                return Err(BeatParserError::Cancelled);
            }
            samples.extend(chunk);
        }

        let source = AudioSource {
            samples,
            sample_rate,
            channels: 1,
            format: io::AudioFormat { extension: "stream".to_string(), bit_depth: None, compression: None },
        };

        self.run_pipeline(source, options, cancellation).await
    }

    /// Run the same pipeline with a wall-clock timeout; a timeout behaves
    /// identically to cancellation (§5, §6).
    pub async fn parse_file_with_timeout<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ParseOptions,
        timeout: Duration,
    ) -> Result<ParseResult> {
        let token = CancellationToken::new();
        let timer_token = token.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            timer_token.cancel();
        });

        let result = self.parse_file(path, options, Some(&token)).await;
        timer.abort();
        result
    }

    async fn run_pipeline(
        &self,
        source: AudioSource,
        options: &ParseOptions,
        cancellation: Option<&CancellationToken>,
    ) -> Result<ParseResult> {
        let start = Instant::now();

        for plugin in self.plugins.iter() {
            plugin.before_parse().map_err(|e| wrap_plugin_error(plugin.as_ref(), e))?;
        }

        check_cancelled(cancellation)?;

        let config = self.config.clone();

        let preprocess_config = PreprocessConfig {
            target_sample_rate: config.sample_rate,
            frame_size: config.frame_size,
            ..PreprocessConfig::default()
        };
        let preprocessed = preprocess::preprocess(&source, &preprocess_config)?;
        let mut buffer: SampleBuffer = preprocessed.buffer;

        for plugin in self.plugins.iter() {
            buffer = plugin.transform_samples(buffer).map_err(|e| wrap_plugin_error(plugin.as_ref(), e))?;
        }

        check_cancelled(cancellation)?;

        let spectral_config = SpectralConfig { frame_size: config.frame_size, hop_size: config.hop_size };
        let spectrogram = spectral::analyze(&buffer, &spectral_config)?;

        check_cancelled(cancellation)?;

        let onsets = onset::detect(&spectrogram, &OnsetConfig::default());

        check_cancelled(cancellation)?;

        let tempo_config = TempoConfig { min_bpm: config.min_tempo, max_bpm: config.max_tempo, ..TempoConfig::default() };
        let detected_tempo = tempo::estimate(&onsets, &tempo_config);

        check_cancelled(cancellation)?;

        let mut beats = beat_tracker::track(&onsets, detected_tempo.as_ref(), &BeatTrackerConfig::default());
        let min_confidence = options.min_confidence.max(config.confidence_threshold);
        beats.retain(|b| b.confidence >= min_confidence);

        for plugin in self.plugins.iter() {
            beats = plugin.transform_beats(beats).map_err(|e| wrap_plugin_error(plugin.as_ref(), e))?;
        }

        check_cancelled(cancellation)?;

        let duration = buffer.duration_seconds();
        let selection_input = SelectionInput {
            candidates: &beats,
            target_count: options.target_picture_count,
            strategy: options.selection_method.into_strategy(),
            tempo: detected_tempo.as_ref(),
            duration,
            weights: options.selection_weights(),
            min_spacing_ms: options.min_spacing_ms,
        };
        let (mut selected, mut quality) = selection::select(&selection_input)?;

        if !selected.is_empty() && selected.len() < options.target_picture_count {
            let min_spacing = (options.min_spacing_ms as f64 / 1000.0).max(0.0);
            selected = synthetic::fill(&selected, options.target_picture_count, detected_tempo.as_ref(), duration, min_spacing);
            quality = selection::quality::compute(&selected, duration);
        }

        let metadata = ParseMetadata {
            processing_time_ms: start.elapsed().as_millis() as u64,
            sample_count: buffer.len(),
            sample_rate: buffer.sample_rate(),
            strategy: format!("{:?}", options.selection_method),
            total_candidates: beats.len().max(selected.len()),
            quiet: preprocessed.quiet,
        };

        let result = ParseResult { beats: selected, tempo: detected_tempo, quality, metadata };

        let mut result = result;
        for plugin in self.plugins.iter() {
            result = plugin.after_parse(result).map_err(|e| wrap_plugin_error(plugin.as_ref(), e))?;
        }

        self.finalize();
        Ok(result)
    }
}

fn check_cancelled(cancellation: Option<&CancellationToken>) -> Result<()> {
    if cancellation.is_some_and(CancellationToken::is_cancelled) {
        return Err(BeatParserError::Cancelled);
    }
    Ok(())
}

fn wrap_plugin_error(plugin: &dyn Plugin, err: BeatParserError) -> BeatParserError {
    match err {
        BeatParserError::PluginError { .. } => err,
        other => BeatParserError::plugin(plugin.name(), other.to_string()),
    }
}
