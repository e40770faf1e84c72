//! Dictionary Provider Module
//!
//! Defines the trait for the external dictionary collaborator and the async
//! dispatch helper that turns its result into a counter-tagged response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::LookupRequest;
use crate::core::{LookupCounter, OverlayResult, TrackKind};

// =============================================================================
// Dictionary Provider Trait
// =============================================================================

/// Trait for dictionary/assistant backends
#[async_trait]
pub trait DictionaryProvider: Send + Sync {
    /// Returns the provider name
    fn name(&self) -> &str;

    /// Looks up a word
    async fn lookup(&self, query: LookupQuery) -> OverlayResult<LookupAnswer>;
}

// =============================================================================
// Query / Answer
// =============================================================================

/// What the collaborator receives
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupQuery {
    /// Word to look up
    pub word: String,
    /// Source language code, when known
    pub language_hint: Option<String>,
    /// `original`, `translation`, or `translit`
    pub variant: String,
}

impl LookupQuery {
    /// Creates a query for a token of the given track
    pub fn new(word: &str, track: TrackKind, language_hint: Option<&str>) -> Self {
        Self {
            word: word.to_string(),
            language_hint: language_hint.map(str::to_string),
            variant: track.lookup_variant().to_string(),
        }
    }
}

/// Answer text produced by the collaborator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupAnswer {
    pub text: String,
}

impl LookupAnswer {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// Result of one lookup, success or failure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LookupOutcome {
    Answer { answer: LookupAnswer },
    Failed { error: String },
}

/// Outcome tagged with the counter of the request that produced it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    pub counter: LookupCounter,
    pub outcome: LookupOutcome,
}

impl LookupResponse {
    pub fn answer(counter: LookupCounter, text: &str) -> Self {
        Self {
            counter,
            outcome: LookupOutcome::Answer {
                answer: LookupAnswer::new(text),
            },
        }
    }

    pub fn failed(counter: LookupCounter, error: &str) -> Self {
        Self {
            counter,
            outcome: LookupOutcome::Failed {
                error: error.to_string(),
            },
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Runs a request against a provider.
///
/// Provider errors become [`LookupOutcome::Failed`] so the popup can show
/// them; whether the response is shown at all is decided by the coordinator.
pub async fn dispatch(
    provider: &dyn DictionaryProvider,
    request: &LookupRequest,
) -> LookupResponse {
    debug!(
        "Lookup #{} '{}' via {}",
        request.counter,
        request.query.word,
        provider.name()
    );

    match provider.lookup(request.query.clone()).await {
        Ok(answer) => LookupResponse {
            counter: request.counter,
            outcome: LookupOutcome::Answer { answer },
        },
        Err(e) => {
            warn!("Lookup #{} failed: {}", request.counter, e);
            LookupResponse::failed(request.counter, &e.to_string())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
