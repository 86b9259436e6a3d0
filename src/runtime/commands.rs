//! Library commands that need no audio output.

use std::io::Write;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::import::{ImportGateway, TrackMetadata};
use crate::library::{
    BlobStore, FolderId, LibraryStore, Track, TrackChange, TrackId, format_duration,
    format_optional_duration, track_label,
};

use super::cli::{FolderCommand, TagField};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Marks "no folder" / "clear the value" on the command line.
const NONE_ARG: &str = "-";

pub fn import<S: BlobStore>(
    library: &mut LibraryStore<S>,
    gateway: &ImportGateway,
    paths: &[PathBuf],
    folder: Option<&str>,
    known: TrackMetadata,
    out: &mut impl Write,
) -> CmdResult {
    let folder_id = match folder {
        Some(key) => Some(folder_or_create(library, key, out)?),
        None => None,
    };

    let mut imported = 0usize;
    for path in paths {
        let tracks = if path.is_dir() {
            gateway.import_dir(path)
        } else {
            match gateway.import_path(path, known.clone()) {
                Ok(track) => vec![track],
                Err(e) => {
                    warn!("skipping {}: {e}", path.display());
                    writeln!(out, "skipped {}: {e}", path.display())?;
                    continue;
                }
            }
        };

        for track in tracks {
            let track = if path.is_dir() {
                with_known(track, &known)
            } else {
                track
            };
            writeln!(out, "{}  {}", short_id(track.id()), track_label(&track))?;
            library.add(track.in_folder(folder_id));
            imported += 1;
        }
    }

    info!(imported, "import finished");
    writeln!(out, "imported {imported} track(s)")?;
    Ok(())
}

/// Caller-supplied tags also apply to every file of an imported directory.
fn with_known(track: Track, known: &TrackMetadata) -> Track {
    let artist = known.artist.clone().or_else(|| track.artist().map(String::from));
    let album = known.album.clone().or_else(|| track.album().map(String::from));
    track.with_artist(artist).with_album(album)
}

pub fn list<S: BlobStore>(
    library: &LibraryStore<S>,
    folder: Option<&str>,
    out: &mut impl Write,
) -> CmdResult {
    let tracks: Vec<&Track> = match folder {
        None => library.tracks().iter().collect(),
        Some(key) => library.tracks_in(folder_arg(library, key)?).collect(),
    };

    for track in tracks {
        let folder_name = library
            .effective_folder(track)
            .and_then(|f| library.folder(f))
            .map(|f| f.name())
            .unwrap_or("");
        writeln!(
            out,
            "{}  {}  {}/{}  {}",
            short_id(track.id()),
            track_label(track),
            format_duration(track.position_secs()),
            format_optional_duration(track.duration_secs()),
            folder_name,
        )?;
    }
    Ok(())
}

pub fn folders<S: BlobStore>(library: &LibraryStore<S>, out: &mut impl Write) -> CmdResult {
    for folder in library.folders() {
        let count = library.tracks_in(Some(folder.id())).count();
        writeln!(out, "{}  {}  ({count})", short_id(folder.id()), folder.name())?;
    }
    let unfiled = library.tracks_in(None).count();
    writeln!(out, "unfiled  ({unfiled})")?;
    Ok(())
}

pub fn folder<S: BlobStore>(
    library: &mut LibraryStore<S>,
    cmd: FolderCommand,
    out: &mut impl Write,
) -> CmdResult {
    match cmd {
        FolderCommand::Add { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err("folder name must not be empty".into());
            }
            let id = library.add_folder(name);
            writeln!(out, "{}  {name}", short_id(id))?;
        }
        FolderCommand::Rm { folder } => {
            let id = find_folder(library, &folder)?;
            if let Some(removed) = library.remove_folder(id) {
                writeln!(out, "removed folder {}", removed.name())?;
            }
        }
        FolderCommand::Rename { folder, name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err("folder name must not be empty".into());
            }
            let id = find_folder(library, &folder)?;
            library.rename_folder(id, name);
            writeln!(out, "renamed to {name}")?;
        }
    }
    Ok(())
}

pub fn file<S: BlobStore>(
    library: &mut LibraryStore<S>,
    track: &str,
    folder: &str,
    out: &mut impl Write,
) -> CmdResult {
    let id = find_track(library, track)?;
    let folder_id = folder_arg(library, folder)?;
    if let Some(track) = library.update(id, TrackChange::Folder(folder_id)) {
        writeln!(out, "{}", track_label(track))?;
    }
    Ok(())
}

pub fn remove<S: BlobStore>(
    library: &mut LibraryStore<S>,
    track: &str,
    out: &mut impl Write,
) -> CmdResult {
    let id = find_track(library, track)?;
    if let Some(removed) = library.remove(id) {
        writeln!(out, "removed {}", track_label(&removed))?;
    }
    Ok(())
}

pub fn clear<S: BlobStore>(
    library: &mut LibraryStore<S>,
    confirmed: bool,
    out: &mut impl Write,
) -> CmdResult {
    if !confirmed {
        return Err("refusing to remove every track without --yes".into());
    }
    let removed = library.clear();
    info!(removed, "library cleared");
    writeln!(out, "removed {removed} track(s)")?;
    Ok(())
}

pub fn tag<S: BlobStore>(
    library: &mut LibraryStore<S>,
    track: &str,
    field: TagField,
    value: &str,
    out: &mut impl Write,
) -> CmdResult {
    let id = find_track(library, track)?;
    let value = match value.trim() {
        NONE_ARG | "" => None,
        v => Some(v.to_string()),
    };
    let change = match field {
        TagField::Artist => TrackChange::Artist(value),
        TagField::Album => TrackChange::Album(value),
    };
    if let Some(track) = library.update(id, change) {
        writeln!(out, "{}", track_label(track))?;
    }
    Ok(())
}

pub fn find_track<S: BlobStore>(library: &LibraryStore<S>, key: &str) -> Result<TrackId, String> {
    library
        .find_track(key)
        .map(Track::id)
        .ok_or_else(|| format!("no track matching '{key}'"))
}

fn find_folder<S: BlobStore>(library: &LibraryStore<S>, key: &str) -> Result<FolderId, String> {
    library
        .find_folder(key)
        .map(|f| f.id())
        .ok_or_else(|| format!("no folder matching '{key}'"))
}

/// `-` means unfiled; anything else must name an existing folder.
fn folder_arg<S: BlobStore>(
    library: &LibraryStore<S>,
    key: &str,
) -> Result<Option<FolderId>, String> {
    if key.trim() == NONE_ARG {
        return Ok(None);
    }
    find_folder(library, key).map(Some)
}

fn folder_or_create<S: BlobStore>(
    library: &mut LibraryStore<S>,
    key: &str,
    out: &mut impl Write,
) -> Result<FolderId, Box<dyn std::error::Error>> {
    if let Some(folder) = library.find_folder(key) {
        return Ok(folder.id());
    }
    let name = key.trim();
    if name.is_empty() {
        return Err("folder name must not be empty".into());
    }
    let id = library.add_folder(name);
    writeln!(out, "created folder {name}")?;
    Ok(id)
}

/// First 8 characters of an id, enough to address it on the command line.
pub fn short_id(id: impl std::fmt::Display) -> String {
    id.to_string().chars().take(8).collect()
}
