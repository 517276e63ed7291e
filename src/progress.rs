//! Progress reporting and cancellation for long-running parses (§5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A pipeline stage, reported alongside progress counters so a caller can
/// show something more useful than a bare percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preprocessing,
    SpectralAnalysis,
    OnsetDetection,
    TempoEstimation,
    BeatTracking,
    Selection,
    SyntheticGeneration,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Preprocessing => "preprocessing",
            Stage::SpectralAnalysis => "spectral analysis",
            Stage::OnsetDetection => "onset detection",
            Stage::TempoEstimation => "tempo estimation",
            Stage::BeatTracking => "beat tracking",
            Stage::Selection => "selection",
            Stage::SyntheticGeneration => "synthetic generation",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    pub current: u64,
    pub total: u64,
    pub stage: Stage,
}

impl ProgressEvent {
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f32 / self.total as f32 * 100.0).clamp(0.0, 100.0)
        }
    }
}

/// Receives progress updates during a streaming or long-running parse.
/// Implementors must be cheap to call; they run on the hot path between
/// pipeline stages.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: ProgressEvent);
}

/// A `ProgressSink` that discards every event. Used as the default when a
/// caller doesn't supply one.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_progress(&self, _event: ProgressEvent) {}
}

/// Cheaply cloneable cooperative cancellation flag, checked at stage
/// boundaries. A timeout is implemented by flipping the same flag from a
/// timer task, so `BeatParserError::Cancelled` is the single error both
/// paths produce.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)) }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
