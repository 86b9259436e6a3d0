//! The `App` coordinator.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio::{PlaybackEngine, PlaybackEvent, PlaybackState};
use crate::config::PlaybackSettings;
use crate::error::PlayError;
use crate::library::{BlobStore, LibraryStore, Track, TrackChange, TrackId};

/// Owns the library and the engine for one session.
///
/// The engine only knows locations; `App` remembers which track is open and
/// writes its position back as ticks, pauses and stops arrive.
pub struct App<S: BlobStore> {
    library: LibraryStore<S>,
    engine: PlaybackEngine,
    events: Receiver<PlaybackEvent>,
    settings: PlaybackSettings,
    now_playing: Option<TrackId>,
}

impl<S: BlobStore> App<S> {
    pub fn new(library: LibraryStore<S>, engine: PlaybackEngine, settings: PlaybackSettings) -> Self {
        let events = engine.subscribe();
        Self {
            library,
            engine,
            events,
            settings,
            now_playing: None,
        }
    }

    pub fn library(&self) -> &LibraryStore<S> {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut LibraryStore<S> {
        &mut self.library
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    /// The track the engine currently has open.
    pub fn now_playing(&self) -> Option<&Track> {
        self.now_playing.and_then(|id| self.library.track(id))
    }

    /// Play the track with `id`, starting from its saved position unless
    /// `resume_from_saved_position` is off.
    ///
    /// A track already open is stopped first and keeps its position.
    pub fn play_track(&mut self, id: TrackId) -> Result<(), PlayError> {
        let track = self.library.track(id).ok_or(PlayError::UnknownTrack(id))?;
        let location = track.location().to_path_buf();
        let start_secs = if self.settings.resume_from_saved_position {
            track.position_secs()
        } else {
            0.0
        };

        self.stop();

        self.engine.play(&location, start_secs)?;
        info!(track = %id, path = %location.display(), start_secs, "now playing");
        self.now_playing = Some(id);
        Ok(())
    }

    /// Pause and record the position. Returns whether anything changed.
    pub fn pause(&mut self) -> bool {
        if !self.engine.pause() {
            return false;
        }
        self.save_position(self.engine.position());
        true
    }

    pub fn resume(&mut self) -> bool {
        self.engine.resume()
    }

    /// Stop playback and record the final position.
    pub fn stop(&mut self) -> Option<f64> {
        let final_secs = self.engine.stop(None)?;
        // Everything up to the Stopped notification belongs to this track.
        self.pump_events();
        self.save_position(final_secs);
        self.now_playing = None;
        Some(final_secs)
    }

    /// Seek the open track and record where it landed.
    pub fn seek(&mut self, secs: f64) -> Option<f64> {
        let position = self.engine.seek(secs)?;
        self.save_position(position);
        Some(position)
    }

    /// Apply every engine notification received so far and return them.
    pub fn pump_events(&mut self) -> Vec<PlaybackEvent> {
        let events: Vec<PlaybackEvent> = self.events.try_iter().collect();
        for event in &events {
            self.apply(event);
        }
        events
    }

    /// Like [`pump_events`](Self::pump_events), but waits up to `timeout`
    /// for the first notification.
    pub fn wait_events(&mut self, timeout: Duration) -> Vec<PlaybackEvent> {
        let first = match self.events.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => return Vec::new(),
            Err(RecvTimeoutError::Disconnected) => {
                warn!("playback engine stopped publishing");
                self.now_playing = None;
                return Vec::new();
            }
        };
        self.apply(&first);
        let mut events = vec![first];
        events.extend(self.pump_events());
        events
    }

    fn apply(&mut self, event: &PlaybackEvent) {
        // Notifications about a transport we already moved away from.
        let Some(current) = self.now_playing() else {
            return;
        };
        if current.location() != event.location() {
            return;
        }

        match event {
            PlaybackEvent::Tick { position_secs, .. }
            | PlaybackEvent::Seeked { position_secs, .. }
            | PlaybackEvent::Paused { position_secs, .. } => self.save_position(*position_secs),
            PlaybackEvent::Stopped { position_secs, .. } => {
                self.save_position(*position_secs);
                self.now_playing = None;
            }
            PlaybackEvent::Finished { .. } => self.finish(),
            PlaybackEvent::Started { .. }
            | PlaybackEvent::Resumed { .. }
            | PlaybackEvent::DurationKnown { .. } => {}
        }
    }

    fn finish(&mut self) {
        let Some(id) = self.now_playing.take() else {
            return;
        };
        self.library.update(id, TrackChange::Position(0.0));
        debug!(track = %id, "track finished");

        if !self.settings.auto_advance {
            return;
        }
        let Some(next) = self.library.next_in_folder(id).map(Track::id) else {
            return;
        };
        // The engine is idle after a natural end, so nothing else is open.
        if self.engine.state() == PlaybackState::Idle {
            if let Err(e) = self.play_track(next) {
                warn!(track = %next, "cannot advance: {e}");
            }
        }
    }

    fn save_position(&mut self, secs: f64) {
        if let Some(id) = self.now_playing {
            self.library.update(id, TrackChange::Position(secs));
        }
    }
}
