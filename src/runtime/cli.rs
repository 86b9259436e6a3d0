use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for audiofolio
#[derive(Parser, Debug)]
#[command(name = "audiofolio")]
#[command(about = "Folder-aware audio library with resumable playback")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import audio files, or every audio file under a directory
    Import {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// File the imported tracks under this folder (created if missing)
        #[arg(short, long)]
        folder: Option<String>,
        /// Artist to record instead of the tagged one
        #[arg(long)]
        artist: Option<String>,
        /// Album to record instead of the tagged one
        #[arg(long)]
        album: Option<String>,
    },
    /// List tracks, optionally only those in a folder (`-` for unfiled)
    List { folder: Option<String> },
    /// List folders with their track counts
    Folders,
    /// Manage folders
    #[command(subcommand)]
    Folder(FolderCommand),
    /// Move a track into a folder, or out of every folder with `-`
    File { track: String, folder: String },
    /// Remove a track from the library (the file is left alone)
    Rm { track: String },
    /// Remove every track from the library (folders are kept)
    Clear {
        /// Confirm removing everything
        #[arg(long)]
        yes: bool,
    },
    /// Set or clear (`-`) a track's artist or album
    Tag {
        track: String,
        field: TagField,
        value: String,
    },
    /// Play a track from its saved position until it ends
    Play {
        track: String,
        /// Start here (seconds) instead of the saved position
        #[arg(long)]
        from: Option<f64>,
    },
    /// Print the effective settings as TOML
    Config,
}

#[derive(Subcommand, Debug)]
pub enum FolderCommand {
    Add { name: String },
    Rm { folder: String },
    Rename { folder: String, name: String },
}

#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum TagField {
    Artist,
    Album,
}
