//! Per-call options, as distinct from the parser-wide `Config`: the things a
//! caller typically varies from one `parse_*` call to the next (§3, §5).

use serde::{Deserialize, Serialize};

use crate::error::{BeatParserError, Result};
use crate::selection::{SelectionWeights, Strategy};

/// Public-facing selection method name. `Uniform` is the boundary-facing
/// rename of the internal `Regular` strategy (§9 Open Question d): callers
/// ask for "uniform" spacing in their own vocabulary, the selector thinks in
/// terms of its internal `Strategy` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    Uniform,
    Adaptive,
    Energy,
    Regular,
    Musical,
}

impl SelectionMethod {
    pub fn into_strategy(self) -> Strategy {
        match self {
            SelectionMethod::Uniform | SelectionMethod::Regular => Strategy::Regular,
            SelectionMethod::Adaptive => Strategy::Adaptive,
            SelectionMethod::Energy => Strategy::Energy,
            SelectionMethod::Musical => Strategy::Musical,
        }
    }
}

/// Options governing a single `parse_file`/`parse_buffer`/`parse_stream`
/// call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOptions {
    /// How many beats the selector should try to return.
    pub target_picture_count: usize,

    pub selection_method: SelectionMethod,

    /// Candidates below this confidence are dropped before selection.
    pub min_confidence: f32,

    /// Original filename, used only for format sniffing on `parse_buffer`
    /// when the caller has no path to rely on.
    pub filename: Option<String>,

    pub energy_weight: f32,
    pub regularity_weight: f32,
    pub musical_weight: f32,

    /// Minimum spacing enforced between any two selected beats, in
    /// milliseconds.
    pub min_spacing_ms: f32,

    pub include_metadata: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            target_picture_count: 10,
            selection_method: SelectionMethod::Adaptive,
            min_confidence: 0.0,
            filename: None,
            energy_weight: 0.4,
            regularity_weight: 0.3,
            musical_weight: 0.3,
            min_spacing_ms: 100.0,
            include_metadata: true,
        }
    }
}

impl ParseOptions {
    pub fn selection_weights(&self) -> SelectionWeights {
        SelectionWeights {
            energy: self.energy_weight,
            regularity: self.regularity_weight,
            musical: self.musical_weight,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_picture_count == 0 {
            return Err(BeatParserError::configuration("target_picture_count must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(BeatParserError::configuration("min_confidence must be within [0, 1]"));
        }
        if self.min_spacing_ms < 0.0 {
            return Err(BeatParserError::configuration("min_spacing_ms must not be negative"));
        }
        self.selection_weights().validate()?;
        Ok(())
    }
}

/// Options for `parse_stream`: how input is chunked and how progress is
/// reported while streaming (§5).
#[derive(Clone)]
pub struct StreamingOptions {
    /// Size of each chunk pulled from the stream, in samples.
    pub chunk_size_samples: usize,

    /// Overlap between consecutive chunks, in samples, so that onsets and
    /// spectral frames straddling a chunk boundary are not missed.
    pub overlap_samples: usize,

    pub progress: Option<std::sync::Arc<dyn crate::progress::ProgressSink>>,
}

impl std::fmt::Debug for StreamingOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingOptions")
            .field("chunk_size_samples", &self.chunk_size_samples)
            .field("overlap_samples", &self.overlap_samples)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Default for StreamingOptions {
    fn default() -> Self {
        Self { chunk_size_samples: 44100 * 10, overlap_samples: 4096, progress: None }
    }
}

impl StreamingOptions {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size_samples == 0 {
            return Err(BeatParserError::configuration("chunk_size_samples must be positive"));
        }
        if self.overlap_samples >= self.chunk_size_samples {
            return Err(BeatParserError::configuration("overlap_samples must be smaller than chunk_size_samples"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(ParseOptions::default().validate().is_ok());
    }

    #[test]
    fn zero_target_count_is_rejected() {
        let mut options = ParseOptions::default();
        options.target_picture_count = 0;
        assert!(options.validate().is_err());
    }

    #[test]
    fn uniform_maps_to_the_regular_strategy() {
        assert_eq!(SelectionMethod::Uniform.into_strategy(), Strategy::Regular);
        assert_eq!(SelectionMethod::Regular.into_strategy(), Strategy::Regular);
    }

    #[test]
    fn default_streaming_options_are_valid() {
        assert!(StreamingOptions::default().validate().is_ok());
    }

    #[test]
    fn overlap_at_least_chunk_size_is_rejected() {
        let mut options = StreamingOptions::default();
        options.overlap_samples = options.chunk_size_samples;
        assert!(options.validate().is_err());
    }
}
