//! Playback: a single-transport engine running on its own audio thread.
//!
//! `PlaybackEngine` is the caller-facing handle. Transports come from a
//! `TransportBackend`; `RodioBackend` plays through the default output device.

mod player;
mod sink;
mod thread;
mod transport;
mod types;

pub use player::PlaybackEngine;
pub use sink::{RodioBackend, RodioTransport};
pub use transport::{Transport, TransportBackend};
pub use types::{PlaybackEvent, PlaybackInfo, PlaybackState};

#[cfg(test)]
pub(crate) mod testing;
