//! Cuelens Error Definitions
//!
//! Defines error types used throughout the engine.

use thiserror::Error;

use super::{CueId, TimeSec};

/// Overlay engine error types
#[derive(Error, Debug)]
pub enum OverlayError {
    // =========================================================================
    // Cue Source Errors
    // =========================================================================
    #[error("Cue source fetch failed: {0}")]
    SourceFetchFailed(String),

    #[error("Cue source could not be parsed: {0}")]
    SourceParseFailed(String),

    #[error("Cue source load cancelled")]
    SourceCancelled,

    // =========================================================================
    // Cue List Errors
    // =========================================================================
    #[error("Invalid time range: {0}~{1} seconds")]
    InvalidTimeRange(TimeSec, TimeSec),

    #[error("Cues out of order: {previous} ends at {previous_end:.3}s but {next} starts at {next_start:.3}s")]
    CueOverlap {
        previous: CueId,
        previous_end: TimeSec,
        next: CueId,
        next_start: TimeSec,
    },

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    #[error("Dictionary lookup failed: {0}")]
    LookupFailed(String),

    // =========================================================================
    // Settings Errors
    // =========================================================================
    #[error("Invalid settings: {0}")]
    SettingsInvalid(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Overlay engine result type
pub type OverlayResult<T> = Result<T, OverlayError>;

impl OverlayError {
    /// Returns true for malformed-input errors that the overlay recovers from
    /// by showing no cues
    pub fn is_recoverable_input(&self) -> bool {
        matches!(
            self,
            Self::SourceFetchFailed(_)
                | Self::SourceParseFailed(_)
                | Self::InvalidTimeRange(..)
                | Self::CueOverlap { .. }
                | Self::JsonError(_)
        )
    }
}
