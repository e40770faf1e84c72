//! Line Mapper
//!
//! Groups a track's rendered tokens into visual rows.
//!
//! Measured `top` values jitter by fractions of a unit between tokens that
//! sit on the same line, so rows are formed by clustering tops within a
//! tolerance rather than by exact equality. Rows are ordered top to bottom,
//! tokens within a row left to right.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::{GeometrySnapshot, TokenGeometry};
use crate::core::{TokenIndex, TrackKind};

/// Tops closer than this (in layout units) share a row
pub const DEFAULT_ROW_TOLERANCE: f64 = 1.0;

// =============================================================================
// Line Map
// =============================================================================

/// Visual rows of one track plus the reverse index
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineMap {
    rows: Vec<Vec<TokenIndex>>,
    index_to_row: HashMap<TokenIndex, usize>,
}

impl LineMap {
    /// Builds the rows of a single track.
    ///
    /// Tokens without finite coordinates are left out of every row; a
    /// repeated token index keeps its first measurement.
    pub fn build(geometry: &[TokenGeometry], tolerance: f64) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance
        } else {
            DEFAULT_ROW_TOLERANCE
        };

        let mut seen = HashSet::new();
        let mut measured: Vec<&TokenGeometry> = geometry
            .iter()
            .filter(|g| g.is_measured())
            .filter(|g| seen.insert(g.token_index))
            .collect();
        measured.sort_by(|a, b| {
            a.top
                .total_cmp(&b.top)
                .then(a.left.total_cmp(&b.left))
                .then(a.token_index.cmp(&b.token_index))
        });

        let mut rows: Vec<Vec<&TokenGeometry>> = Vec::new();
        let mut row_top = f64::NEG_INFINITY;
        for token in measured {
            let same_row = !rows.is_empty() && token.top - row_top < tolerance;
            if same_row {
                if let Some(row) = rows.last_mut() {
                    row.push(token);
                }
            } else {
                row_top = token.top;
                rows.push(vec![token]);
            }
        }

        let rows: Vec<Vec<TokenIndex>> = rows
            .into_iter()
            .map(|mut row| {
                row.sort_by(|a, b| {
                    a.left
                        .total_cmp(&b.left)
                        .then(a.token_index.cmp(&b.token_index))
                });
                row.into_iter().map(|g| g.token_index).collect()
            })
            .collect();

        let index_to_row = rows
            .iter()
            .enumerate()
            .flat_map(|(row_number, row)| row.iter().map(move |index| (*index, row_number)))
            .collect();

        Self { rows, index_to_row }
    }

    /// Rows in top-to-bottom order
    pub fn rows(&self) -> &[Vec<TokenIndex>] {
        &self.rows
    }

    /// Row number of a token, if it was rendered
    pub fn row_of(&self, index: TokenIndex) -> Option<usize> {
        self.index_to_row.get(&index).copied()
    }

    /// Tokens of a row, left to right
    pub fn row(&self, row_number: usize) -> Option<&[TokenIndex]> {
        self.rows.get(row_number).map(Vec::as_slice)
    }

    /// Returns the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no token was mapped (callers fall back to linear order)
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Line Maps (all tracks)
// =============================================================================

/// Line maps for every rendered track
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineMaps {
    maps: BTreeMap<TrackKind, LineMap>,
}

impl LineMaps {
    /// Line map of a track; `None` means nothing is rendered there
    pub fn get(&self, track: TrackKind) -> Option<&LineMap> {
        self.maps.get(&track)
    }

    /// Drops every map (content changed, geometry not yet re-measured)
    pub fn clear(&mut self) {
        self.maps.clear();
    }

    /// Returns true if no track has rows
    pub fn is_empty(&self) -> bool {
        self.maps.values().all(LineMap::is_empty)
    }
}

/// Builds one line map per track from a geometry snapshot
pub fn build_line_maps(snapshot: &GeometrySnapshot, tolerance: f64) -> LineMaps {
    let maps: BTreeMap<TrackKind, LineMap> = TrackKind::RENDER_ORDER
        .into_iter()
        .map(|track| (track, LineMap::build(snapshot.track(track), tolerance)))
        .filter(|(_, map)| !map.is_empty())
        .collect();

    debug!(
        "Rebuilt line maps: {}",
        maps.iter()
            .map(|(track, map)| format!("{}={} rows", track, map.row_count()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    LineMaps { maps }
}

// =============================================================================
// Tests
// =============================================================================
