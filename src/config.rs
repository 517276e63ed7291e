//! Parser-level configuration: the knobs that shape C2 through C6, loaded
//! from (and saved to) TOML the same way the original configuration layer
//! did, just re-scoped to the audio pipeline alone.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BeatParserError, Result};

/// Top-level configuration for a `BeatParser`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sample rate the pipeline resamples to before analysis (Hz).
    pub sample_rate: u32,

    /// STFT frame size, in samples. Must be a power of two.
    pub frame_size: usize,

    /// STFT hop size, in samples. Must be positive and no larger than
    /// `frame_size`.
    pub hop_size: usize,

    /// Lower bound of the tempo search range (BPM).
    pub min_tempo: f32,

    /// Upper bound of the tempo search range (BPM).
    pub max_tempo: f32,

    /// Minimum confidence a beat candidate needs to be considered during
    /// selection.
    pub confidence_threshold: f32,

    /// Whether `ParseResult::metadata` is populated with detail beyond the
    /// bare minimum (timing and sample counts are always present).
    pub include_metadata: bool,

    /// Whether per-beat confidence scores are retained in the output, or
    /// dropped to save payload size on constrained callers.
    pub include_confidence_scores: bool,

    /// Whether the pipeline runs a second, finer-grained analysis pass over
    /// regions where the first pass found few onsets. Costs roughly double
    /// the processing time.
    pub multi_pass_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            frame_size: 2048,
            hop_size: 512,
            min_tempo: 60.0,
            max_tempo: 200.0,
            confidence_threshold: 0.3,
            include_metadata: true,
            include_confidence_scores: true,
            multi_pass_enabled: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BeatParserError::configuration(format!("cannot read {}: {e}", path.display())))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| BeatParserError::configuration(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BeatParserError::configuration(format!("cannot serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(BeatParserError::configuration("sample_rate must be positive"));
        }
        if self.frame_size == 0 || !self.frame_size.is_power_of_two() {
            return Err(BeatParserError::configuration("frame_size must be a power of two"));
        }
        if self.hop_size == 0 || self.hop_size > self.frame_size {
            return Err(BeatParserError::configuration("hop_size must be positive and no larger than frame_size"));
        }
        if self.min_tempo >= self.max_tempo {
            return Err(BeatParserError::configuration(format!(
                "min_tempo ({}) must be less than max_tempo ({})",
                self.min_tempo, self.max_tempo
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(BeatParserError::configuration("confidence_threshold must be within [0, 1]"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.toml");

        let original = Config::default();
        original.save_to_file(&file_path).unwrap();
        let loaded = Config::from_file(&file_path).unwrap();

        assert_eq!(original.sample_rate, loaded.sample_rate);
        assert_eq!(original.frame_size, loaded.frame_size);
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let mut config = Config::default();
        config.sample_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_power_of_two_frame_size() {
        let mut config = Config::default();
        config.frame_size = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_hop_size_larger_than_frame_size() {
        let mut config = Config::default();
        config.hop_size = config.frame_size + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_tempo_range() {
        let mut config = Config::default();
        config.min_tempo = 150.0;
        config.max_tempo = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_confidence_threshold() {
        let mut config = Config::default();
        config.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}
