//! Import: turning files on disk into library tracks.

mod gateway;
mod scan;

pub use gateway::{ImportGateway, TrackMetadata, probe, probe_with_timeout};
pub use scan::scan;
