use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Unique identifier of an imported track.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(Uuid);

/// Unique identifier of a folder.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FolderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for FolderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One imported audio file with its metadata and saved playback position.
///
/// `id`, `location`, `display_name` and `duration_secs` are fixed at creation;
/// everything else changes through [`TrackChange`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    id: TrackId,
    location: PathBuf,
    display_name: String,
    #[serde(default)]
    pub(super) artist: Option<String>,
    #[serde(default)]
    pub(super) album: Option<String>,
    #[serde(default, deserialize_with = "valid_duration")]
    duration_secs: Option<f64>,
    #[serde(default)]
    pub(super) position_secs: f64,
    #[serde(default)]
    pub(super) folder_id: Option<FolderId>,
}

impl Track {
    /// Create a track for `location` with a fresh id and a name taken from
    /// the last path component.
    pub fn new(location: impl Into<PathBuf>, duration_secs: Option<f64>) -> Self {
        let location = location.into();
        let display_name = display_name_for(&location);
        Self {
            id: TrackId::new(),
            location,
            display_name,
            artist: None,
            album: None,
            duration_secs: duration_secs.filter(is_valid_duration),
            position_secs: 0.0,
            folder_id: None,
        }
    }

    pub fn with_artist(mut self, artist: Option<String>) -> Self {
        self.artist = non_blank(artist);
        self
    }

    pub fn with_album(mut self, album: Option<String>) -> Self {
        self.album = non_blank(album);
        self
    }

    pub fn in_folder(mut self, folder: Option<FolderId>) -> Self {
        self.folder_id = folder;
        self
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn artist(&self) -> Option<&str> {
        self.artist.as_deref()
    }

    pub fn album(&self) -> Option<&str> {
        self.album.as_deref()
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }

    pub fn position_secs(&self) -> f64 {
        self.position_secs
    }

    pub fn folder_id(&self) -> Option<FolderId> {
        self.folder_id
    }

    /// Clamp `secs` into the playable range of this track.
    pub fn clamp_position(&self, secs: f64) -> f64 {
        clamp_position(secs, self.duration_secs)
    }

    pub(super) fn apply(&mut self, change: TrackChange) {
        match change {
            TrackChange::Artist(v) => self.artist = non_blank(v),
            TrackChange::Album(v) => self.album = non_blank(v),
            TrackChange::Position(secs) => self.position_secs = self.clamp_position(secs),
            TrackChange::Folder(f) => self.folder_id = f,
        }
    }
}

/// A change to one of a track's mutable fields.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackChange {
    Artist(Option<String>),
    Album(Option<String>),
    /// Saved playback position, clamped to `[0, duration]`.
    Position(f64),
    /// `None` unfiles the track.
    Folder(Option<FolderId>),
}

/// A flat, named grouping of tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    id: FolderId,
    pub(super) name: String,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: FolderId::new(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> FolderId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Upper bound for any position handed to a transport (about 136 years).
pub const MAX_POSITION_SECS: f64 = u32::MAX as f64;

/// Clamp a position to `[0, duration]`, or `[0, MAX_POSITION_SECS]` when the
/// duration is unknown.
///
/// NaN and negative input map to 0, as does infinity without a duration.
pub fn clamp_position(secs: f64, duration: Option<f64>) -> f64 {
    if secs.is_nan() || secs <= 0.0 {
        return 0.0;
    }
    if secs.is_infinite() && duration.is_none() {
        return 0.0;
    }
    let upper = duration
        .filter(is_valid_duration)
        .unwrap_or(MAX_POSITION_SECS)
        .min(MAX_POSITION_SECS);
    secs.min(upper)
}

fn is_valid_duration(d: &f64) -> bool {
    d.is_finite() && *d >= 0.0
}

/// Stored durations get the same filtering as those passed to [`Track::new`].
fn valid_duration<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<f64>::deserialize(de)?.filter(is_valid_duration))
}

fn display_name_for(location: &Path) -> String {
    location
        .file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| location.display().to_string())
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
