//! Application module: ties the library to the playback engine.
//!
//! `App` lives in `app::model`; it starts tracks from their saved position
//! and folds engine notifications back into the library.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
