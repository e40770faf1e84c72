//! Token geometry as reported by the renderer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{TokenIndex, TrackKind};

/// Position of one rendered token, relative to its track container
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGeometry {
    /// Track the token belongs to
    #[serde(alias = "trackKey")]
    pub track: TrackKind,
    /// Token position within the track
    pub token_index: TokenIndex,
    /// Top edge
    pub top: f64,
    /// Left edge
    pub left: f64,
}

impl TokenGeometry {
    pub fn new(track: TrackKind, token_index: TokenIndex, top: f64, left: f64) -> Self {
        Self {
            track,
            token_index,
            top,
            left,
        }
    }

    /// Returns true when both coordinates are usable
    pub fn is_measured(&self) -> bool {
        self.top.is_finite() && self.left.is_finite()
    }
}

/// Geometry of all currently rendered tokens, grouped by track
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometrySnapshot {
    tracks: BTreeMap<TrackKind, Vec<TokenGeometry>>,
}

impl GeometrySnapshot {
    /// Groups a flat list of measurements by track
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = TokenGeometry>,
    {
        let mut tracks: BTreeMap<TrackKind, Vec<TokenGeometry>> = BTreeMap::new();
        for token in tokens {
            tracks.entry(token.track).or_default().push(token);
        }
        Self { tracks }
    }

    /// Measurements of one track (empty when nothing is rendered)
    pub fn track(&self, track: TrackKind) -> &[TokenGeometry] {
        self.tracks.get(&track).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tracks with at least one measurement
    pub fn tracks(&self) -> impl Iterator<Item = TrackKind> + '_ {
        self.tracks.keys().copied()
    }

    /// Returns true if no token was measured
    pub fn is_empty(&self) -> bool {
        self.tracks.values().all(Vec::is_empty)
    }
}
