//! Scripted in-memory transports for engine and coordinator tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::TransportError;

use super::transport::{Transport, TransportBackend};

#[derive(Debug, Default)]
pub(crate) struct FakeTrack {
    pub position: Duration,
    pub duration: Option<Duration>,
    pub playing: bool,
    pub finished: bool,
    pub stopped: bool,
}

pub(crate) type Shared = Arc<Mutex<FakeTrack>>;

/// Scripted backend: only locations registered in `library` open, and every
/// opened transport stays inspectable through `opened`.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    library: HashMap<PathBuf, Option<Duration>>,
    opened: Arc<Mutex<Vec<(PathBuf, Shared)>>>,
}

impl FakeBackend {
    pub(crate) fn with(mut self, location: &str, duration_secs: Option<u64>) -> Self {
        self.library
            .insert(PathBuf::from(location), duration_secs.map(Duration::from_secs));
        self
    }

    pub(crate) fn opened(&self) -> Vec<(PathBuf, Shared)> {
        self.opened.lock().unwrap().clone()
    }

    pub(crate) fn live(&self) -> Vec<PathBuf> {
        self.opened()
            .into_iter()
            .filter(|(_, t)| !t.lock().unwrap().stopped)
            .map(|(p, _)| p)
            .collect()
    }

    pub(crate) fn track(&self, location: &str) -> Shared {
        self.opened()
            .into_iter()
            .rev()
            .find(|(p, _)| p == Path::new(location))
            .map(|(_, t)| t)
            .unwrap()
    }
}

pub(crate) struct FakeTransport(Shared);

impl Transport for FakeTransport {
    fn play(&mut self) {
        self.0.lock().unwrap().playing = true;
    }

    fn pause(&mut self) {
        self.0.lock().unwrap().playing = false;
    }

    fn seek(&mut self, position: Duration) -> Result<(), TransportError> {
        self.0.lock().unwrap().position = position;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.0.lock().unwrap().position
    }

    fn duration(&self) -> Option<Duration> {
        self.0.lock().unwrap().duration
    }

    fn is_finished(&self) -> bool {
        self.0.lock().unwrap().finished
    }

    fn stop(&mut self) {
        let mut t = self.0.lock().unwrap();
        t.playing = false;
        t.stopped = true;
    }
}

impl TransportBackend for FakeBackend {
    type Transport = FakeTransport;

    fn open(&mut self, location: &Path) -> Result<FakeTransport, TransportError> {
        let duration = *self
            .library
            .get(location)
            .ok_or_else(|| TransportError::NotFound(location.to_path_buf()))?;
        let shared = Arc::new(Mutex::new(FakeTrack {
            duration,
            ..FakeTrack::default()
        }));
        self.opened
            .lock()
            .unwrap()
            .push((location.to_path_buf(), shared.clone()));
        Ok(FakeTransport(shared))
    }
}
