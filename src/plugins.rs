//! Plugin hooks invoked at fixed points in the pipeline (§5): before parsing
//! begins, after samples are loaded, after beats are tracked, and after the
//! parse finishes. Every hook has a no-op default so a plugin only needs to
//! override the stages it cares about.

use crate::buffer::SampleBuffer;
use crate::error::Result;
use crate::types::{BeatCandidate, ParseResult};

/// A pipeline plugin. Hooks run in the order listed below; any hook
/// returning `Err` aborts the parse with `BeatParserError::PluginError`
/// carrying this plugin's `name()`.
pub trait Plugin: Send + Sync {
    /// Unique name used to identify this plugin in error messages.
    fn name(&self) -> &str;

    /// Called once before any audio is read.
    fn before_parse(&self) -> Result<()> {
        Ok(())
    }

    /// Called after preprocessing, with the chance to rewrite the sample
    /// buffer in place before spectral analysis begins.
    fn transform_samples(&self, buffer: SampleBuffer) -> Result<SampleBuffer> {
        Ok(buffer)
    }

    /// Called after beat tracking (and before selection), with the chance to
    /// rewrite the candidate list.
    fn transform_beats(&self, beats: Vec<BeatCandidate>) -> Result<Vec<BeatCandidate>> {
        Ok(beats)
    }

    /// Called once the `ParseResult` is assembled, with the chance to
    /// inspect or adjust it before it's returned to the caller.
    fn after_parse(&self, result: ParseResult) -> Result<ParseResult> {
        Ok(result)
    }
}

/// An ordered collection of plugins, invoked in registration order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self { plugins: Vec::new() }
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Box<dyn Plugin>> {
        self.plugins.iter()
    }
}
