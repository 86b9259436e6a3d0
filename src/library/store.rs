use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::error::StorageError;

use super::model::{Folder, FolderId, Track, TrackChange, TrackId};
use super::storage::BlobStore;

/// Storage key of the track collection.
pub const TRACKS_KEY: &str = "tracks";
/// Storage key of the folder collection.
pub const FOLDERS_KEY: &str = "folders";

/// Change notifications published by [`LibraryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    TrackAdded(TrackId),
    TrackRemoved(TrackId),
    /// Every track was removed at once.
    Cleared,
    TrackUpdated(TrackId),
    FolderAdded(FolderId),
    FolderRemoved(FolderId),
    FolderRenamed(FolderId),
}

/// A store shared between threads; every mutation holds the lock across
/// its read-modify-persist sequence.
pub type SharedLibrary<S> = Arc<Mutex<LibraryStore<S>>>;

/// Owns the imported tracks and folders and writes them back to `S` after
/// every mutation.
pub struct LibraryStore<S> {
    storage: S,
    tracks: Vec<Track>,
    folders: Vec<Folder>,
    listeners: Vec<Sender<LibraryEvent>>,
}

impl<S: BlobStore> LibraryStore<S> {
    /// Load both collections from `storage`.
    ///
    /// Missing, unreadable or malformed collections start out empty.
    pub fn load(storage: S) -> Self {
        let tracks: Vec<Track> = read_collection(&storage, TRACKS_KEY);
        let mut folders: Vec<Folder> = read_collection(&storage, FOLDERS_KEY);

        // Older writes may carry duplicate ids; the first occurrence wins.
        let mut seen = std::collections::HashSet::new();
        folders.retain(|f| seen.insert(f.id()));
        let mut seen = std::collections::HashSet::new();
        let mut tracks: Vec<Track> = tracks.into_iter().filter(|t| seen.insert(t.id())).collect();
        // Hand-edited files may carry positions outside the track's range.
        for track in &mut tracks {
            track.position_secs = track.clamp_position(track.position_secs);
        }

        debug!(
            tracks = tracks.len(),
            folders = folders.len(),
            "library loaded"
        );

        Self {
            storage,
            tracks,
            folders,
            listeners: Vec::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_shared(self) -> SharedLibrary<S> {
        Arc::new(Mutex::new(self))
    }

    /// Receive a [`LibraryEvent`] for every subsequent mutation.
    pub fn subscribe(&mut self) -> Receiver<LibraryEvent> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    /// All tracks in insertion order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// All folders in insertion order.
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id() == id)
    }

    /// Append `track`. Returns `false` (and stores nothing) if its id is already present.
    pub fn add(&mut self, track: Track) -> bool {
        let id = track.id();
        if self.track(id).is_some() {
            warn!(%id, "track id already in library; ignoring add");
            return false;
        }
        self.tracks.push(track);
        self.persist_tracks();
        self.emit(LibraryEvent::TrackAdded(id));
        true
    }

    /// Remove the track with `id`, if present.
    pub fn remove(&mut self, id: TrackId) -> Option<Track> {
        let index = self.tracks.iter().position(|t| t.id() == id)?;
        let removed = self.tracks.remove(index);
        self.persist_tracks();
        self.emit(LibraryEvent::TrackRemoved(id));
        Some(removed)
    }

    /// Remove every track, leaving folders in place. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.tracks.len();
        self.tracks.clear();
        self.persist_tracks();
        self.emit(LibraryEvent::Cleared);
        removed
    }

    /// Apply `change` to the track with `id` and return the updated record.
    ///
    /// Returns `None` without touching storage when no such track exists.
    pub fn update(&mut self, id: TrackId, change: TrackChange) -> Option<&Track> {
        let index = self.tracks.iter().position(|t| t.id() == id)?;
        self.tracks[index].apply(change);
        self.persist_tracks();
        self.emit(LibraryEvent::TrackUpdated(id));
        self.tracks.get(index)
    }

    pub fn add_folder(&mut self, name: impl Into<String>) -> FolderId {
        let folder = Folder::new(name);
        let id = folder.id();
        self.folders.push(folder);
        self.persist_folders();
        self.emit(LibraryEvent::FolderAdded(id));
        id
    }

    /// Remove the folder with `id`.
    ///
    /// Tracks filed under it are left in place; their folder reference no
    /// longer resolves, so [`tracks_in`](Self::tracks_in) lists them as unfiled.
    pub fn remove_folder(&mut self, id: FolderId) -> Option<Folder> {
        let index = self.folders.iter().position(|f| f.id() == id)?;
        let removed = self.folders.remove(index);
        self.persist_folders();
        self.emit(LibraryEvent::FolderRemoved(id));
        Some(removed)
    }

    pub fn rename_folder(&mut self, id: FolderId, name: impl Into<String>) -> bool {
        let Some(folder) = self.folders.iter_mut().find(|f| f.id() == id) else {
            return false;
        };
        folder.name = name.into();
        self.persist_folders();
        self.emit(LibraryEvent::FolderRenamed(id));
        true
    }

    /// The folder a track is listed under: its folder id if that folder
    /// still exists, otherwise `None` (unfiled).
    pub fn effective_folder(&self, track: &Track) -> Option<FolderId> {
        track.folder_id().filter(|f| self.folder(*f).is_some())
    }

    /// Tracks listed under `folder` (`None` = unfiled), in insertion order.
    pub fn tracks_in(&self, folder: Option<FolderId>) -> impl Iterator<Item = &Track> + '_ {
        self.tracks
            .iter()
            .filter(move |t| self.effective_folder(t) == folder)
    }

    /// The track after `id` in its folder's listing, if any.
    pub fn next_in_folder(&self, id: TrackId) -> Option<&Track> {
        let current = self.track(id)?;
        let folder = self.effective_folder(current);
        self.tracks_in(folder).skip_while(|t| t.id() != id).nth(1)
    }

    /// Find a track by full or unambiguous id prefix, falling back to an
    /// exact display-name match.
    pub fn find_track(&self, key: &str) -> Option<&Track> {
        let key = key.trim();
        unique_by_prefix(self.tracks.iter(), key, |t| t.id().to_string())
            .or_else(|| self.tracks.iter().find(|t| t.display_name() == key))
    }

    /// Find a folder by full or unambiguous id prefix, falling back to an
    /// exact (case-insensitive) name match.
    pub fn find_folder(&self, key: &str) -> Option<&Folder> {
        let key = key.trim();
        unique_by_prefix(self.folders.iter(), key, |f| f.id().to_string()).or_else(|| {
            self.folders
                .iter()
                .find(|f| f.name().eq_ignore_ascii_case(key))
        })
    }

    fn persist_tracks(&self) {
        if let Err(e) = write_collection(&self.storage, TRACKS_KEY, &self.tracks) {
            error!(key = TRACKS_KEY, "failed to persist library: {e}");
        }
    }

    fn persist_folders(&self) {
        if let Err(e) = write_collection(&self.storage, FOLDERS_KEY, &self.folders) {
            error!(key = FOLDERS_KEY, "failed to persist library: {e}");
        }
    }

    fn emit(&mut self, event: LibraryEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

fn read_collection<S: BlobStore, T: DeserializeOwned>(storage: &S, key: &str) -> Vec<T> {
    let bytes = match storage.read(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(key, "cannot read stored collection, starting empty: {e}");
            return Vec::new();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(items) => items,
        Err(e) => {
            warn!(key, "malformed stored collection, starting empty: {e}");
            Vec::new()
        }
    }
}

fn write_collection<S: BlobStore, T: Serialize>(
    storage: &S,
    key: &str,
    items: &[T],
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(items)?;
    storage.write(key, &bytes)?;
    Ok(())
}

fn unique_by_prefix<'a, T>(
    items: impl Iterator<Item = &'a T>,
    key: &str,
    id_of: impl Fn(&T) -> String,
) -> Option<&'a T> {
    if key.is_empty() {
        return None;
    }
    let key = key.to_ascii_lowercase();
    let mut matches = items.filter(|item| id_of(*item).starts_with(&key));
    let first = matches.next()?;
    match matches.next() {
        Some(_) => None,
        None => Some(first),
    }
}
