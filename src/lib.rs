//! audiofolio: a folder-aware audio library with resumable playback.
//!
//! - [`library`]: tracks, folders and their persisted store.
//! - [`import`]: turning files on disk into tracks.
//! - [`audio`]: the single-transport playback engine.
//! - [`app`]: the coordinator that keeps saved positions current.

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod import;
pub mod library;
pub mod runtime;
