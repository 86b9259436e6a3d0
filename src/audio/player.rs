use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::warn;

use crate::config::PlaybackSettings;
use crate::error::TransportError;

use super::sink::RodioBackend;
use super::thread::{Cadence, spawn_audio_thread};
use super::transport::TransportBackend;
use super::types::{EngineCmd, PlaybackEvent, PlaybackHandle, PlaybackInfo, PlaybackState};

/// Handle to the audio thread that owns the active transport.
///
/// Every control call is acknowledged by the audio thread before it returns,
/// so its effect is visible to the next call and to `position()`.
pub struct PlaybackEngine {
    tx: Sender<EngineCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackEngine {
    /// Start an engine that plays through the default audio output.
    pub fn new(settings: &PlaybackSettings) -> Result<Self, TransportError> {
        Self::with_backend(RodioBackend::new, settings)
    }

    /// Start an engine whose transports come from the backend built by `make_backend`.
    ///
    /// The backend is constructed on the audio thread.
    pub fn with_backend<B, F>(
        make_backend: F,
        settings: &PlaybackSettings,
    ) -> Result<Self, TransportError>
    where
        B: TransportBackend + 'static,
        F: FnOnce() -> B + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let playback_info: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let cadence = Cadence {
            tick: settings.tick_interval(),
            finish_poll: settings.finish_poll(),
        };
        let audio_handle = spawn_audio_thread(make_backend, rx, playback_info.clone(), cadence)
            .map_err(|e| TransportError::Output(format!("cannot start audio thread: {e}")))?;

        Ok(Self {
            tx,
            playback: playback_info,
            join: Mutex::new(Some(audio_handle)),
        })
    }

    /// Close any open transport and start playing `location` from `start_secs`.
    ///
    /// On error the engine is idle.
    pub fn play(&self, location: impl AsRef<Path>, start_secs: f64) -> Result<(), TransportError> {
        let location = location.as_ref().to_path_buf();
        self.request(|reply| EngineCmd::Play {
            location,
            start_secs,
            reply,
        })
        .unwrap_or(Err(TransportError::EngineGone))
    }

    /// Pause if playing. Returns whether anything changed.
    pub fn pause(&self) -> bool {
        self.request(|reply| EngineCmd::Pause { reply }).unwrap_or(false)
    }

    /// Resume if paused. Returns whether anything changed.
    pub fn resume(&self) -> bool {
        self.request(|reply| EngineCmd::Resume { reply }).unwrap_or(false)
    }

    /// Close the open transport, recording `at` (or the current position) as
    /// the final position. Returns that position, or `None` when idle.
    pub fn stop(&self, at: Option<f64>) -> Option<f64> {
        self.request(|reply| EngineCmd::Stop { at, reply }).flatten()
    }

    /// Seek within the open transport. Returns the clamped position, or
    /// `None` when idle.
    pub fn seek(&self, secs: f64) -> Option<f64> {
        self.request(|reply| EngineCmd::Seek { secs, reply }).flatten()
    }

    /// Receive every [`PlaybackEvent`] published from now on.
    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = mpsc::channel();
        if self.tx.send(EngineCmd::Subscribe(tx)).is_err() {
            warn!("subscribe on a stopped playback engine");
        }
        rx
    }

    pub fn snapshot(&self) -> PlaybackInfo {
        self.playback
            .lock()
            .map(|info| info.clone())
            .unwrap_or_default()
    }

    pub fn state(&self) -> PlaybackState {
        self.snapshot().state
    }

    /// Last reported position in seconds (0 when idle).
    pub fn position(&self) -> f64 {
        self.snapshot().position_secs
    }

    pub fn duration(&self) -> Option<f64> {
        self.snapshot().duration_secs
    }

    pub fn location(&self) -> Option<PathBuf> {
        self.snapshot().location
    }

    /// Close the transport and wait for the audio thread to exit.
    pub fn shutdown(&self) {
        let _ = self.tx.send(EngineCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }

    fn request<R>(&self, make: impl FnOnce(Sender<R>) -> EngineCmd) -> Option<R> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx.send(make(reply_tx)).ok()?;
        reply_rx.recv().ok()
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
