//! Cue Locator
//!
//! Finds the cue covering a playback time.
//!
//! Playback time usually advances monotonically, so the previously returned
//! index is checked first; a binary search over the ordering invariant
//! handles seeks and jumps.

use super::Cue;
use crate::core::TimeSec;

/// Returns the index of the cue covering `time`, or `None` in gaps.
///
/// `last_known_index` is a hint checked before any search. The list must be
/// sorted by start and non-overlapping; on a list that violates this the
/// result may be wrong, but the search always terminates.
pub fn locate(cues: &[Cue], time: TimeSec, last_known_index: Option<usize>) -> Option<usize> {
    if time.is_nan() {
        return None;
    }

    if let Some(hint) = last_known_index {
        if cues.get(hint).is_some_and(|cue| cue.is_active_at(time)) {
            return Some(hint);
        }
    }

    let mut low = 0usize;
    let mut high = cues.len();
    while low < high {
        let mid = low + (high - low) / 2;
        let cue = &cues[mid];
        if time < cue.start {
            high = mid;
        } else if time >= cue.end {
            low = mid + 1;
        } else {
            return Some(mid);
        }
    }

    None
}

// =============================================================================
// Cue Cursor
// =============================================================================

/// Caches the last located index and feeds it back as the next hint
#[derive(Clone, Debug, Default)]
pub struct CueCursor {
    last_index: Option<usize>,
}

impl CueCursor {
    /// Creates a cursor with no cached index
    pub fn new() -> Self {
        Self::default()
    }

    /// Locates the active cue, updating the cached hint on a hit
    pub fn locate(&mut self, cues: &[Cue], time: TimeSec) -> Option<usize> {
        let found = locate(cues, time, self.last_index);
        if found.is_some() {
            self.last_index = found;
        }
        found
    }

    /// Returns the cached hint
    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    /// Drops the cached hint (new cue list)
    pub fn reset(&mut self) {
        self.last_index = None;
    }
}

// =============================================================================
// Tests
// =============================================================================
