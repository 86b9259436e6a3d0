//! The seam between the engine and whatever actually produces sound.

use std::path::Path;
use std::time::Duration;

use crate::error::TransportError;

/// One opened audio resource.
///
/// A freshly opened transport is paused at position zero.
pub trait Transport {
    fn play(&mut self);
    fn pause(&mut self);
    /// Jump to `position`, keeping the current play/pause state.
    fn seek(&mut self, position: Duration) -> Result<(), TransportError>;
    fn position(&self) -> Duration;
    /// Total length, once the transport knows it.
    fn duration(&self) -> Option<Duration>;
    /// True once playback ran off the end of the resource.
    fn is_finished(&self) -> bool;
    /// Release the resource. Called exactly once, before the transport is dropped.
    fn stop(&mut self);
}

/// Opens locations into transports.
///
/// Backends live on the audio thread, so neither they nor their transports need to be `Send`.
pub trait TransportBackend {
    type Transport: Transport;

    fn open(&mut self, location: &Path) -> Result<Self::Transport, TransportError>;
}
