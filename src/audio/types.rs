//! Playback-related small types and handles.
//!
//! This module defines the engine state, the commands sent to the audio
//! thread, the notifications it publishes and the shared snapshot handle.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::error::TransportError;

/// The state of the playback engine.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// No transport is open.
    #[default]
    Idle,
    Playing,
    /// A transport is open but suspended; its position is kept.
    Paused,
}

#[derive(Debug)]
pub(super) enum EngineCmd {
    /// Replace the current transport with one for `location`, starting at `start_secs`.
    Play {
        location: PathBuf,
        start_secs: f64,
        reply: Sender<Result<(), TransportError>>,
    },
    /// Suspend playback; replies whether the state changed.
    Pause { reply: Sender<bool> },
    /// Continue a paused transport; replies whether the state changed.
    Resume { reply: Sender<bool> },
    /// Close the transport; replies with the final position if one was open.
    Stop {
        at: Option<f64>,
        reply: Sender<Option<f64>>,
    },
    /// Move within the open transport; replies with the clamped position.
    Seek {
        secs: f64,
        reply: Sender<Option<f64>>,
    },
    /// Register a listener for [`PlaybackEvent`]s.
    Subscribe(Sender<PlaybackEvent>),
    /// Close the transport and end the audio thread.
    Quit,
}

/// Notifications published by the engine, in the order things happened.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Started {
        location: PathBuf,
        position_secs: f64,
        duration_secs: Option<f64>,
    },
    /// Periodic position report while playing.
    Tick {
        location: PathBuf,
        position_secs: f64,
    },
    /// The transport reported its duration after playback started.
    DurationKnown {
        location: PathBuf,
        duration_secs: f64,
    },
    Seeked {
        location: PathBuf,
        position_secs: f64,
    },
    Paused {
        location: PathBuf,
        position_secs: f64,
    },
    Resumed {
        location: PathBuf,
        position_secs: f64,
    },
    /// The transport was closed on request, or replaced by a new `play`.
    Stopped {
        location: PathBuf,
        position_secs: f64,
    },
    /// The transport reached the end of the track on its own.
    Finished { location: PathBuf },
}

impl PlaybackEvent {
    pub fn location(&self) -> &PathBuf {
        match self {
            Self::Started { location, .. }
            | Self::Tick { location, .. }
            | Self::DurationKnown { location, .. }
            | Self::Seeked { location, .. }
            | Self::Paused { location, .. }
            | Self::Resumed { location, .. }
            | Self::Stopped { location, .. }
            | Self::Finished { location } => location,
        }
    }
}

/// Runtime playback information shared with callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackInfo {
    pub state: PlaybackState,
    /// Location of the open transport, if any.
    pub location: Option<PathBuf>,
    /// Last reported position (seconds).
    pub position_secs: f64,
    pub duration_secs: Option<f64>,
}

pub(super) type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
