//! Cue System Module
//!
//! Provides the timed cue model and active-cue lookup:
//! - Cue data models (Cue, TokenTrack, CueList)
//! - Cue Locator (hinted binary search over sorted cues)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Cue System                                │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  models.rs     - Data structures (Cue, TokenTrack, CueList)     │
//! │  locator.rs    - Active cue lookup + cached hint cursor         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use cuelens_lib::core::cues::{locate, Cue, CueList, TokenTrack};
//! use cuelens_lib::core::TrackKind;
//!
//! let list = CueList::from_cues(vec![
//!     Cue::create(0.0, 2.0).with_track(TrackKind::Translation, TokenTrack::from_text("Hello")),
//!     Cue::create(2.0, 5.0).with_track(TrackKind::Translation, TokenTrack::from_text("World")),
//! ]);
//!
//! assert_eq!(locate(&list.cues, 2.0, Some(0)), Some(1));
//! ```

mod locator;
mod models;

pub use locator::{locate, CueCursor};
pub use models::{Cue, CueList, TokenTrack};
