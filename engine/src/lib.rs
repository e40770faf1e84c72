//! Cuelens Engine Library
//!
//! Synchronized multi-track timed-text overlay engine.
//! Given time-bounded subtitle cues carrying parallel token tracks
//! (original, translation, transliteration), this library locates the
//! active cue, maps rendered tokens into visual rows, navigates and
//! reconciles a token selection against playback, mirrors selections across
//! aligned tracks, and coordinates dictionary lookups.
//!
//! Rendering, the playback clock, and the dictionary backend stay with the
//! host; the engine only consumes their events and snapshots.

pub mod core;

pub use crate::core::session::{OverlayFrame, OverlaySession};
