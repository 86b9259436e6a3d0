use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::library::clamp_position;

use super::transport::{Transport, TransportBackend};
use super::types::{EngineCmd, PlaybackEvent, PlaybackHandle, PlaybackInfo, PlaybackState};

#[derive(Debug, Copy, Clone)]
pub(super) struct Cadence {
    /// Interval between position ticks while playing.
    pub tick: Duration,
    /// How often a playing transport is checked for natural completion.
    pub finish_poll: Duration,
}

pub(super) fn spawn_audio_thread<B, F>(
    make_backend: F,
    rx: Receiver<EngineCmd>,
    playback_info: PlaybackHandle,
    cadence: Cadence,
) -> io::Result<JoinHandle<()>>
where
    B: TransportBackend + 'static,
    F: FnOnce() -> B + Send + 'static,
{
    thread::Builder::new()
        .name("audio".into())
        .spawn(move || {
            let backend = make_backend();
            AudioLoop::new(backend, playback_info, cadence).run(rx);
        })
}

struct Active<T> {
    location: PathBuf,
    transport: T,
}

/// State owned by the audio thread. Commands and ticks are handled on this
/// one thread, so a tick is always computed after any control call that
/// preceded it.
struct AudioLoop<B: TransportBackend> {
    backend: B,
    active: Option<Active<B::Transport>>,
    state: PlaybackState,
    playback_info: PlaybackHandle,
    listeners: Vec<Sender<PlaybackEvent>>,
    cadence: Cadence,
    /// Deadline of the next tick; `None` whenever not playing.
    next_tick: Option<Instant>,
    duration_reported: bool,
}

impl<B: TransportBackend> AudioLoop<B> {
    fn new(backend: B, playback_info: PlaybackHandle, cadence: Cadence) -> Self {
        Self {
            backend,
            active: None,
            state: PlaybackState::Idle,
            playback_info,
            listeners: Vec::new(),
            cadence,
            next_tick: None,
            duration_reported: false,
        }
    }

    fn run(mut self, rx: Receiver<EngineCmd>) {
        loop {
            let received = match self.wake_in() {
                Some(timeout) => rx.recv_timeout(timeout),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(EngineCmd::Quit) | Err(RecvTimeoutError::Disconnected) => {
                    self.release(true);
                    break;
                }
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => {}
            }

            self.poll();
        }
        debug!("audio thread exiting");
    }

    /// How long to wait for a command before polling the transport again.
    fn wake_in(&self) -> Option<Duration> {
        let next_tick = self.next_tick?;
        let until_tick = next_tick.saturating_duration_since(Instant::now());
        Some(until_tick.min(self.cadence.finish_poll))
    }

    fn handle(&mut self, cmd: EngineCmd) {
        match cmd {
            EngineCmd::Play {
                location,
                start_secs,
                reply,
            } => {
                let _ = reply.send(self.play(location, start_secs));
            }
            EngineCmd::Pause { reply } => {
                let _ = reply.send(self.pause());
            }
            EngineCmd::Resume { reply } => {
                let _ = reply.send(self.resume());
            }
            EngineCmd::Stop { at, reply } => {
                let _ = reply.send(self.stop(at));
            }
            EngineCmd::Seek { secs, reply } => {
                let _ = reply.send(self.seek(secs));
            }
            EngineCmd::Subscribe(tx) => self.listeners.push(tx),
            EngineCmd::Quit => {}
        }
    }

    fn play(&mut self, location: PathBuf, start_secs: f64) -> Result<(), TransportError> {
        // The previous transport is fully released before the next one is opened.
        self.release(true);

        let mut transport = match self.backend.open(&location) {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %location.display(), "cannot start playback: {e}");
                return Err(e);
            }
        };

        let duration_secs = transport.duration().map(|d| d.as_secs_f64());
        let mut position_secs = clamp_position(start_secs, duration_secs);
        if position_secs > 0.0 {
            if let Err(e) = transport.seek(Duration::from_secs_f64(position_secs)) {
                warn!(path = %location.display(), "cannot seek to start position: {e}");
                position_secs = transport.position().as_secs_f64();
            }
        }
        transport.play();

        info!(path = %location.display(), position_secs, "playback started");

        self.active = Some(Active {
            location: location.clone(),
            transport,
        });
        self.state = PlaybackState::Playing;
        self.next_tick = Some(Instant::now() + self.cadence.tick);
        self.duration_reported = duration_secs.is_some();
        self.publish(position_secs, duration_secs);
        self.emit(PlaybackEvent::Started {
            location,
            position_secs,
            duration_secs,
        });
        Ok(())
    }

    fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        active.transport.pause();
        let position_secs = current_position(&active.transport);
        let location = active.location.clone();

        self.state = PlaybackState::Paused;
        self.next_tick = None;
        self.publish_position(position_secs);
        self.emit(PlaybackEvent::Paused {
            location,
            position_secs,
        });
        true
    }

    fn resume(&mut self) -> bool {
        if self.state != PlaybackState::Paused {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        active.transport.play();
        let position_secs = current_position(&active.transport);
        let location = active.location.clone();

        self.state = PlaybackState::Playing;
        self.next_tick = Some(Instant::now() + self.cadence.tick);
        self.publish_position(position_secs);
        self.emit(PlaybackEvent::Resumed {
            location,
            position_secs,
        });
        true
    }

    fn stop(&mut self, at: Option<f64>) -> Option<f64> {
        let active = self.active.as_ref()?;
        let duration_secs = active.transport.duration().map(|d| d.as_secs_f64());
        let final_secs = match at {
            Some(secs) => clamp_position(secs, duration_secs),
            None => current_position(&active.transport),
        };
        self.release_at(final_secs, true);
        Some(final_secs)
    }

    fn seek(&mut self, secs: f64) -> Option<f64> {
        let active = self.active.as_mut()?;
        let duration_secs = active.transport.duration().map(|d| d.as_secs_f64());
        let target = clamp_position(secs, duration_secs);

        let position_secs = match active.transport.seek(Duration::from_secs_f64(target)) {
            Ok(()) => target,
            Err(e) => {
                warn!(path = %active.location.display(), "seek failed: {e}");
                current_position(&active.transport)
            }
        };
        let location = active.location.clone();

        self.publish_position(position_secs);
        self.emit(PlaybackEvent::Seeked {
            location,
            position_secs,
        });
        Some(position_secs)
    }

    /// Detect natural completion, late durations and due ticks.
    fn poll(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(active) = self.active.as_ref() else {
            return;
        };

        if active.transport.is_finished() {
            let location = active.location.clone();
            info!(path = %location.display(), "playback finished");
            self.release(false);
            self.emit(PlaybackEvent::Finished { location });
            return;
        }

        if !self.duration_reported {
            if let Some(d) = active.transport.duration() {
                let duration_secs = d.as_secs_f64();
                let location = active.location.clone();
                self.duration_reported = true;
                if let Ok(mut info) = self.playback_info.lock() {
                    info.duration_secs = Some(duration_secs);
                }
                self.emit(PlaybackEvent::DurationKnown {
                    location,
                    duration_secs,
                });
            }
        }

        let now = Instant::now();
        let Some(due) = self.next_tick.filter(|due| *due <= now) else {
            return;
        };
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let position_secs = current_position(&active.transport);
        let location = active.location.clone();

        let next = due + self.cadence.tick;
        self.next_tick = Some(if next <= now {
            now + self.cadence.tick
        } else {
            next
        });
        self.publish_position(position_secs);
        self.emit(PlaybackEvent::Tick {
            location,
            position_secs,
        });
    }

    /// Close the open transport (if any) at its current position and go idle.
    fn release(&mut self, announce: bool) {
        let Some(active) = self.active.as_ref() else {
            self.go_idle();
            return;
        };
        let position_secs = current_position(&active.transport);
        self.release_at(position_secs, announce);
    }

    fn release_at(&mut self, position_secs: f64, announce: bool) {
        if let Some(mut active) = self.active.take() {
            active.transport.stop();
            debug!(path = %active.location.display(), position_secs, "transport released");
            if announce {
                self.emit(PlaybackEvent::Stopped {
                    location: active.location,
                    position_secs,
                });
            }
        }
        self.go_idle();
    }

    fn go_idle(&mut self) {
        self.state = PlaybackState::Idle;
        self.next_tick = None;
        self.duration_reported = false;
        if let Ok(mut info) = self.playback_info.lock() {
            *info = PlaybackInfo::default();
        }
    }

    fn publish(&self, position_secs: f64, duration_secs: Option<f64>) {
        if let Ok(mut info) = self.playback_info.lock() {
            info.state = self.state;
            info.location = self.active.as_ref().map(|a| a.location.clone());
            info.position_secs = position_secs;
            info.duration_secs = duration_secs;
        }
    }

    fn publish_position(&self, position_secs: f64) {
        if let Ok(mut info) = self.playback_info.lock() {
            info.state = self.state;
            info.position_secs = position_secs;
        }
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

fn current_position<T: Transport>(transport: &T) -> f64 {
    let duration_secs = transport.duration().map(|d| d.as_secs_f64());
    clamp_position(transport.position().as_secs_f64(), duration_secs)
}
