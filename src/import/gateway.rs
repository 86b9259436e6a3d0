use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::Accessor;
use tracing::{debug, warn};

use crate::config::ImportSettings;
use crate::error::ImportError;
use crate::library::Track;

use super::scan::{is_audio_file, scan};

/// Metadata known about a file at import time. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_secs: Option<f64>,
}

impl TrackMetadata {
    /// Build metadata from `artist` / `album` / `duration` key-value pairs.
    ///
    /// Keys are case-insensitive; unknown keys, blank values and unparsable
    /// durations are ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut meta = Self::default();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim().to_ascii_lowercase().as_str() {
                "artist" => meta.artist = Some(value.to_string()),
                "album" => meta.album = Some(value.to_string()),
                "duration" => {
                    meta.duration_secs = value
                        .parse::<f64>()
                        .ok()
                        .filter(|d| d.is_finite() && *d > 0.0)
                }
                _ => {}
            }
        }
        meta
    }

    /// Fill fields missing from `self` with those of `other`.
    pub fn or(self, other: TrackMetadata) -> Self {
        Self {
            artist: self.artist.or(other.artist),
            album: self.album.or(other.album),
            duration_secs: self.duration_secs.or(other.duration_secs),
        }
    }
}

/// Read tags and duration from `path`. Anything unreadable stays `None`.
pub fn probe(path: &Path) -> TrackMetadata {
    let mut meta = TrackMetadata::default();

    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            debug!(path = %path.display(), "no readable tags: {e}");
            return meta;
        }
    };

    let duration = tagged.properties().duration();
    if !duration.is_zero() {
        meta.duration_secs = Some(duration.as_secs_f64());
    }

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        meta.artist = tag
            .artist()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        meta.album = tag
            .album()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
    }

    meta
}

/// [`probe`] on a helper thread, giving up after `timeout`.
///
/// A probe that does not finish in time yields empty metadata; the helper
/// thread is left to finish on its own.
pub fn probe_with_timeout(path: &Path, timeout: Duration) -> TrackMetadata {
    let (tx, rx) = mpsc::channel();
    let owned = path.to_path_buf();
    let spawned = thread::Builder::new()
        .name("metadata-probe".into())
        .spawn(move || {
            let _ = tx.send(probe(&owned));
        });

    if let Err(e) = spawned {
        warn!("cannot spawn metadata probe, probing inline: {e}");
        return probe(path);
    }

    match rx.recv_timeout(timeout) {
        Ok(meta) => meta,
        Err(_) => {
            warn!(path = %path.display(), ?timeout, "metadata probe timed out");
            TrackMetadata::default()
        }
    }
}

/// Turns resolved file locations into new library tracks.
#[derive(Debug, Clone, Default)]
pub struct ImportGateway {
    settings: ImportSettings,
}

impl ImportGateway {
    pub fn new(settings: ImportSettings) -> Self {
        Self { settings }
    }

    /// Build a track with a fresh id for an already resolved `location`.
    pub fn import(&self, location: impl Into<PathBuf>, metadata: TrackMetadata) -> Track {
        Track::new(location, metadata.duration_secs)
            .with_artist(metadata.artist)
            .with_album(metadata.album)
    }

    /// Import one file, reading its tags. Metadata supplied by the caller in
    /// `known` takes precedence over what is read from the file.
    pub fn import_path(&self, path: &Path, known: TrackMetadata) -> Result<Track, ImportError> {
        if !path.is_file() {
            return Err(ImportError::NotFound(path.to_path_buf()));
        }
        if !is_audio_file(path, &self.settings) {
            return Err(ImportError::NotAudio(path.to_path_buf()));
        }

        let location = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let probed = probe_with_timeout(&location, self.settings.metadata_timeout());
        Ok(self.import(location, known.or(probed)))
    }

    /// Import every audio file found under `dir`.
    pub fn import_dir(&self, dir: &Path) -> Vec<Track> {
        scan(dir, &self.settings)
            .into_iter()
            .filter_map(|path| match self.import_path(&path, TrackMetadata::default()) {
                Ok(track) => Some(track),
                Err(e) => {
                    warn!("skipping {}: {e}", path.display());
                    None
                }
            })
            .collect()
    }
}
