//! Error types shared across the library and playback modules.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to open or drive an audio transport.
///
/// Reported once to the caller of `PlaybackEngine::play`; the engine is left idle.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The location does not exist.
    #[error("no such file: {}", .0.display())]
    NotFound(PathBuf),

    /// The location exists but could not be read.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was readable but not decodable.
    #[error("unsupported audio in {}: {reason}", path.display())]
    Unsupported { path: PathBuf, reason: String },

    /// No audio output could be opened.
    #[error("audio output unavailable: {0}")]
    Output(String),

    /// The audio thread is no longer running.
    #[error("playback engine has shut down")]
    EngineGone,
}

/// Failure to persist a library collection.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode collection: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure to import a file into the library.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("no such file: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not an audio file: {}", .0.display())]
    NotAudio(PathBuf),
}

/// Failure of an `App` playback request.
#[derive(Error, Debug)]
pub enum PlayError {
    #[error("no track with id {0}")]
    UnknownTrack(crate::library::TrackId),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
