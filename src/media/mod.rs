//! Media decoding and preprocessing

pub mod loader;
pub mod preprocess;

pub use loader::{extract_from_media, ExtractedMedia, MediaItem};
