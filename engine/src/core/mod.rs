//! Cuelens Core Engine
//!
//! Core overlay engine module.
//! Handles cue lookup, token layout, navigation, selection, and lookups.

pub mod cues;
pub mod layout;
pub mod lookup;
pub mod navigation;
pub mod selection;
pub mod session;
pub mod settings;
pub mod shadow;
pub mod source;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
