//! Shared data model: the types that flow between C1–C9 and out to callers.
//!
//! See `SPEC_FULL.md` §3 for the authoritative definitions; this module is
//! the Rust encoding of that data model.

use serde::{Deserialize, Serialize};

/// Where a beat candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Produced by the onset/beat-tracking pipeline (C4–C6).
    Detected,
    /// Interpolated onto the tempo grid by the synthetic generator (C8).
    Synthetic,
}

/// Musical role of a beat within a measure, attached by the `Musical`
/// selection strategy (and left `None` by the others).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatKind {
    Downbeat,
    Beat,
    Offbeat,
    Syncopated,
}

/// A single onset event produced by C4: a local rise in spectral energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnsetEvent {
    pub time: f64,
    pub strength: f32,
}

/// The single tempo estimate for a parse (C5 produces at most one).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    pub bpm: f32,
    pub confidence: f32,
    pub time_signature: Option<TimeSignature>,
}

/// Beats-per-measure / beat-note-value pair. Used opportunistically by the
/// `Musical` strategy's downbeat bonus; never required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { numerator: 4, denominator: 4 }
    }
}

impl TimeSignature {
    /// A time signature is only used for the downbeat bonus when it is
    /// "coherent": a non-zero numerator no larger than 32 (§9 Open Question b).
    pub fn is_coherent(&self) -> bool {
        self.numerator > 0 && self.numerator <= 32
    }
}

/// Musical metadata attached by the `Musical` strategy to a selected beat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MusicalInfo {
    pub expected_time: f64,
    pub timing_deviation_ms: f32,
    pub beat_number: u32,
    pub measure_number: u32,
    pub kind: BeatKind,
}

/// A candidate beat: the unit produced by the tracker, consumed by
/// selection, and returned (a subset of) to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatCandidate {
    pub time: f64,
    pub strength: f32,
    pub confidence: f32,
    pub origin: Origin,
    /// Index into the tempo grid `k` such that `time ≈ k·60/bpm`, when a
    /// tempo grid exists.
    pub grid_index: Option<u32>,
    /// Deviation from the ideal grid position, in milliseconds.
    pub deviation_ms: Option<f32>,
    pub musical: Option<MusicalInfo>,
    /// Set alongside `origin == Synthetic` on every beat C8 adds, whether
    /// grid-placed or uniform fallback; kept as its own field since callers
    /// serialize it independently of `origin`.
    pub interpolated: bool,
}

impl BeatCandidate {
    pub fn new(time: f64, strength: f32, confidence: f32, origin: Origin) -> Self {
        Self {
            time,
            strength,
            confidence,
            origin,
            grid_index: None,
            deviation_ms: None,
            musical: None,
            interpolated: false,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.time.is_finite() && self.strength.is_finite() && self.confidence.is_finite()
    }
}

/// The three [0,1] quality sub-scores plus their mean, defined in §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub coverage: f32,
    pub diversity: f32,
    pub spacing: f32,
    pub overall: f32,
}

impl QualityReport {
    pub const ZERO: Self = Self { coverage: 0.0, diversity: 0.0, spacing: 0.0, overall: 0.0 };

    pub fn from_components(coverage: f32, diversity: f32, spacing: f32) -> Self {
        Self {
            coverage,
            diversity,
            spacing,
            overall: (coverage + diversity + spacing) / 3.0,
        }
    }
}

/// Informational metadata attached to a `ParseResult` (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseMetadata {
    pub processing_time_ms: u64,
    pub sample_count: usize,
    pub sample_rate: u32,
    pub strategy: String,
    pub total_candidates: usize,
    /// Set by C2 when the source peak amplitude was below `quiet_floor` and
    /// therefore left unscaled.
    pub quiet: bool,
}

/// The top-level output of a single `parse_*` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub beats: Vec<BeatCandidate>,
    pub tempo: Option<Tempo>,
    pub quality: QualityReport,
    pub metadata: ParseMetadata,
}
