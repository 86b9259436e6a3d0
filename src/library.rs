//! The audio library: imported tracks, flat folders and their persistence.

mod display;
mod model;
pub mod storage;
mod store;

pub use display::{format_duration, format_optional_duration, track_label};
pub use model::{Folder, FolderId, Track, TrackChange, TrackId, MAX_POSITION_SECS, clamp_position};
pub use storage::{BlobStore, FileStore, MemoryStore};
pub use store::{FOLDERS_KEY, LibraryEvent, LibraryStore, SharedLibrary, TRACKS_KEY};
