//! Cue Data Models
//!
//! Defines data structures for timed cues and their token tracks.
//!
//! # Overview
//!
//! A cue spans a `[start, end)` interval and carries up to three parallel
//! token tracks. The cue list is built once per subtitle source and stays
//! immutable for the rest of the playback session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{CueId, OverlayError, OverlayResult, TimeSec, TokenIndex, TrackKind};

// =============================================================================
// Token Track
// =============================================================================

/// Ordered tokens of one track plus the upstream "currently spoken" index
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTrack {
    /// Selectable units of text, fixed once the cue is built
    pub tokens: Vec<String>,
    /// Playback-synchronized index supplied by the alignment system
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_index: Option<TokenIndex>,
}

impl TokenTrack {
    /// Creates a track from its tokens
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            current_index: None,
        }
    }

    /// Splits text on whitespace into tokens
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split_whitespace())
    }

    /// Sets the playback-synchronized index
    pub fn with_current_index(mut self, index: TokenIndex) -> Self {
        self.current_index = Some(index);
        self
    }

    /// Returns the number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the track has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the token at the given index
    pub fn token(&self, index: TokenIndex) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Returns the current index only when it addresses an existing token
    pub fn current_index_in_range(&self) -> Option<TokenIndex> {
        self.current_index.filter(|index| *index < self.tokens.len())
    }
}

// =============================================================================
// Cue
// =============================================================================

/// A time-bounded unit of subtitle content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    /// Unique identifier
    #[serde(default = "generate_cue_id")]
    pub id: CueId,
    /// Start time in seconds (inclusive)
    pub start: TimeSec,
    /// End time in seconds (exclusive)
    pub end: TimeSec,
    /// Parallel token tracks keyed by kind
    #[serde(default)]
    pub tracks: BTreeMap<TrackKind, TokenTrack>,
}

fn generate_cue_id() -> CueId {
    ulid::Ulid::new().to_string()
}

impl Cue {
    /// Creates a cue with no tracks
    pub fn new(id: &str, start: TimeSec, end: TimeSec) -> Self {
        Self {
            id: id.to_string(),
            start,
            end,
            tracks: BTreeMap::new(),
        }
    }

    /// Creates a cue with auto-generated ID
    pub fn create(start: TimeSec, end: TimeSec) -> Self {
        Self::new(&generate_cue_id(), start, end)
    }

    /// Attaches a token track
    pub fn with_track(mut self, kind: TrackKind, track: TokenTrack) -> Self {
        self.tracks.insert(kind, track);
        self
    }

    /// Returns the track of the given kind
    pub fn track(&self, kind: TrackKind) -> Option<&TokenTrack> {
        self.tracks.get(&kind)
    }

    /// Returns a mutable track of the given kind
    pub fn track_mut(&mut self, kind: TrackKind) -> Option<&mut TokenTrack> {
        self.tracks.get_mut(&kind)
    }

    /// Returns the tokens of a track, if the cue carries it
    pub fn tokens(&self, kind: TrackKind) -> Option<&[String]> {
        self.track(kind).map(|track| track.tokens.as_slice())
    }

    /// Number of tokens in a track (0 when absent)
    pub fn token_count(&self, kind: TrackKind) -> usize {
        self.track(kind).map_or(0, TokenTrack::len)
    }

    /// Returns true if the cue covers the given time
    pub fn is_active_at(&self, time: TimeSec) -> bool {
        self.start <= time && time < self.end
    }
}

// =============================================================================
// Cue List
// =============================================================================

/// Sorted, non-overlapping cues for one playback session
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueList {
    /// Cues ordered by start time
    #[serde(default)]
    pub cues: Vec<Cue>,
    /// Language code per track (e.g., "ja", "en")
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub languages: BTreeMap<TrackKind, String>,
}

impl CueList {
    /// Builds a list, sorting cues by start time
    pub fn from_cues(mut cues: Vec<Cue>) -> Self {
        cues.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self {
            cues,
            languages: BTreeMap::new(),
        }
    }

    /// Parses a JSON payload into a list
    ///
    /// Cues are sorted but not validated; call [`CueList::validate`] for that.
    pub fn from_json(payload: &str) -> OverlayResult<Self> {
        let mut list: CueList = serde_json::from_str(payload)
            .map_err(|e| OverlayError::SourceParseFailed(e.to_string()))?;
        list.cues.sort_by(|a, b| a.start.total_cmp(&b.start));
        debug!("Parsed cue list with {} cues", list.cues.len());
        Ok(list)
    }

    /// Sets the language code of a track
    pub fn with_language(mut self, kind: TrackKind, language: &str) -> Self {
        self.languages.insert(kind, language.to_string());
        self
    }

    /// Checks the ordering invariant: valid ranges, no overlaps
    pub fn validate(&self) -> OverlayResult<()> {
        for cue in &self.cues {
            if !(cue.start.is_finite() && cue.end.is_finite()) || cue.end < cue.start {
                return Err(OverlayError::InvalidTimeRange(cue.start, cue.end));
            }
        }
        for pair in self.cues.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if previous.end > next.start {
                return Err(OverlayError::CueOverlap {
                    previous: previous.id.clone(),
                    previous_end: previous.end,
                    next: next.id.clone(),
                    next_start: next.start,
                });
            }
        }
        Ok(())
    }

    /// Returns the cue at the given index
    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    /// Returns the language code of a track
    pub fn language(&self, kind: TrackKind) -> Option<&str> {
        self.languages.get(&kind).map(String::as_str)
    }

    /// Returns the number of cues
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Returns true if the list has no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Token Track Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_token_track_from_text() {
        let track = TokenTrack::from_text("  watashi wa   gakusei desu ");
        assert_eq!(track.len(), 4);
        assert_eq!(track.token(2), Some("gakusei"));
        assert_eq!(track.token(4), None);
    }

    #[test]
    fn test_current_index_in_range() {
        let track = TokenTrack::new(["a", "b"]).with_current_index(1);
        assert_eq!(track.current_index_in_range(), Some(1));

        let stale = TokenTrack::new(["a", "b"]).with_current_index(5);
        assert_eq!(stale.current_index_in_range(), None);
    }

    // -------------------------------------------------------------------------
    // Cue Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_cue_activity_is_half_open() {
        let cue = Cue::new("c1", 2.0, 5.0);

        assert!(!cue.is_active_at(1.99));
        assert!(cue.is_active_at(2.0));
        assert!(cue.is_active_at(4.99));
        assert!(!cue.is_active_at(5.0));
    }

    #[test]
    fn test_cue_token_count_for_missing_track() {
        let cue = Cue::create(0.0, 1.0)
            .with_track(TrackKind::Translation, TokenTrack::new(["hello", "world"]));

        assert_eq!(cue.token_count(TrackKind::Translation), 2);
        assert_eq!(cue.token_count(TrackKind::Original), 0);
        assert!(cue.tokens(TrackKind::Transliteration).is_none());
    }

    // -------------------------------------------------------------------------
    // Cue List Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_from_cues_sorts_by_start() {
        let list = CueList::from_cues(vec![
            Cue::new("b", 3.0, 4.0),
            Cue::new("a", 0.0, 2.0),
        ]);
        assert_eq!(list.cues[0].id, "a");
        assert_eq!(list.cues[1].id, "b");
        assert!(list.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let list = CueList::from_cues(vec![Cue::new("a", 0.0, 3.0), Cue::new("b", 2.0, 4.0)]);
        assert!(matches!(
            list.validate(),
            Err(OverlayError::CueOverlap { ref previous, .. }) if previous == "a"
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let list = CueList::from_cues(vec![Cue::new("a", 3.0, 1.0)]);
        assert!(matches!(
            list.validate(),
            Err(OverlayError::InvalidTimeRange(_, _))
        ));
    }

    #[test]
    fn test_validate_accepts_touching_cues() {
        let list = CueList::from_cues(vec![Cue::new("a", 0.0, 2.0), Cue::new("b", 2.0, 5.0)]);
        assert!(list.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let payload = r#"{
            "cues": [
                {
                    "id": "second",
                    "start": 2.0,
                    "end": 5.0,
                    "tracks": { "translation": { "tokens": ["good", "night"] } }
                },
                {
                    "start": 0.0,
                    "end": 2.0,
                    "tracks": {
                        "original": { "tokens": ["oyasumi"] },
                        "translation": { "tokens": ["good", "night"], "currentIndex": 1 }
                    }
                }
            ],
            "languages": { "original": "ja", "translation": "en" }
        }"#;

        let list = CueList::from_json(payload).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.cues[1].id, "second");
        assert!(!list.cues[0].id.is_empty());
        assert_eq!(
            list.cues[0]
                .track(TrackKind::Translation)
                .and_then(|t| t.current_index),
            Some(1)
        );
        assert_eq!(list.language(TrackKind::Original), Some("ja"));
    }

    #[test]
    fn test_from_json_malformed() {
        let result = CueList::from_json("{ not json");
        assert!(matches!(result, Err(OverlayError::SourceParseFailed(_))));
    }
}
