//! Spatial Navigator
//!
//! Moves a token selection with the keyboard.
//!
//! Left/right stays inside the token's visual row and wraps at the row's
//! ends. Up/down steps to the neighbouring visible track in render order and
//! carries the index over, clamped to the destination's length.

use std::collections::BTreeMap;

use crate::core::cues::TokenTrack;
use crate::core::layout::LineMap;
use crate::core::{Direction, Selection, TokenIndex, TrackKind};

/// Moves one token left or right.
///
/// Falls back to cycling over the whole track when the token has no row
/// (stale or empty line map).
pub fn move_horizontal(
    index: TokenIndex,
    direction: Direction,
    token_count: usize,
    line_map: Option<&LineMap>,
) -> TokenIndex {
    if token_count <= 1 {
        return 0;
    }

    let row = line_map.and_then(|map| map.row_of(index).and_then(|row| map.row(row)));
    if let Some(row) = row {
        if let Some(position) = row.iter().position(|candidate| *candidate == index) {
            let next = cyclic_step(position, direction, row.len());
            let target = row[next];
            if target < token_count {
                return target;
            }
        }
    }

    cyclic_step(index, direction, token_count)
}

/// Moves to the previous/next visible track.
///
/// Returns `None` (selection unchanged) when the move would leave the visible
/// tracks or the destination track has no tokens.
pub fn move_vertical(
    current_track: TrackKind,
    current_index: TokenIndex,
    direction: Direction,
    visible_tracks: &[TrackKind],
    tokens_by_track: &BTreeMap<TrackKind, TokenTrack>,
) -> Option<Selection> {
    let position = visible_tracks
        .iter()
        .position(|track| *track == current_track)?;
    let target_position = position.checked_add_signed(direction.step())?;
    let target_track = *visible_tracks.get(target_position)?;

    let token_count = tokens_by_track.get(&target_track).map_or(0, TokenTrack::len);
    if token_count == 0 {
        return None;
    }

    Some(Selection::new(
        target_track,
        current_index.min(token_count - 1),
    ))
}

fn cyclic_step(position: usize, direction: Direction, len: usize) -> usize {
    let len = len as isize;
    (position as isize + direction.step()).rem_euclid(len) as usize
}

// =============================================================================
// Tests
// =============================================================================
