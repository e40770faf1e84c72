//! Cuelens Core Type Definitions
//!
//! Defines fundamental types used throughout the engine.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Cue unique identifier (ULID)
pub type CueId = String;

/// Lookup request counter (monotonic per coordinator)
pub type LookupCounter = u64;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Position of a token within its track
pub type TokenIndex = usize;

// =============================================================================
// Track Kinds
// =============================================================================

/// One of the parallel renderings of a cue's utterance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackKind {
    /// Source-language text
    Original,
    /// Translated text
    Translation,
    /// Romanized / phonetic rendering
    Transliteration,
}

impl TrackKind {
    /// Fixed render order, top to bottom
    pub const RENDER_ORDER: [TrackKind; 3] = [
        TrackKind::Original,
        TrackKind::Translation,
        TrackKind::Transliteration,
    ];

    /// Position of this track in [`TrackKind::RENDER_ORDER`]
    pub fn render_position(self) -> usize {
        match self {
            TrackKind::Original => 0,
            TrackKind::Translation => 1,
            TrackKind::Transliteration => 2,
        }
    }

    /// Variant label sent to the dictionary collaborator
    pub fn lookup_variant(self) -> &'static str {
        match self {
            TrackKind::Original => "original",
            TrackKind::Translation => "translation",
            TrackKind::Transliteration => "translit",
        }
    }

    /// Returns the display name
    pub fn as_str(self) -> &'static str {
        match self {
            TrackKind::Original => "original",
            TrackKind::Translation => "translation",
            TrackKind::Transliteration => "transliteration",
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Direction
// =============================================================================

/// Navigation step direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Left / up
    Backward,
    /// Right / down
    Forward,
}

impl Direction {
    /// Signed unit step (-1 or +1)
    pub fn step(self) -> isize {
        match self {
            Direction::Backward => -1,
            Direction::Forward => 1,
        }
    }
}

// =============================================================================
// Selection
// =============================================================================

/// A single selected token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Track holding the token
    pub track: TrackKind,
    /// Token position within the track
    pub index: TokenIndex,
}

impl Selection {
    /// Creates a new selection
    pub fn new(track: TrackKind, index: TokenIndex) -> Self {
        Self { track, index }
    }
}

// =============================================================================
// Track Visibility
// =============================================================================

/// Per-track visibility flags supplied by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackVisibility {
    pub original: bool,
    pub translation: bool,
    pub transliteration: bool,
}

impl Default for TrackVisibility {
    fn default() -> Self {
        Self {
            original: true,
            translation: true,
            transliteration: true,
        }
    }
}

impl TrackVisibility {
    /// Creates visibility flags for every track
    pub fn new(original: bool, translation: bool, transliteration: bool) -> Self {
        Self {
            original,
            translation,
            transliteration,
        }
    }

    /// Returns whether the given track is shown
    pub fn is_visible(&self, track: TrackKind) -> bool {
        match track {
            TrackKind::Original => self.original,
            TrackKind::Translation => self.translation,
            TrackKind::Transliteration => self.transliteration,
        }
    }

    /// Sets the flag for a single track
    pub fn set(&mut self, track: TrackKind, visible: bool) {
        match track {
            TrackKind::Original => self.original = visible,
            TrackKind::Translation => self.translation = visible,
            TrackKind::Transliteration => self.transliteration = visible,
        }
    }

    /// Visible tracks in render order
    pub fn visible_tracks(&self) -> Vec<TrackKind> {
        TrackKind::RENDER_ORDER
            .into_iter()
            .filter(|track| self.is_visible(*track))
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
