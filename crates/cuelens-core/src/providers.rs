//! Built-in dictionary providers

use async_trait::async_trait;

use cuelens_lib::core::lookup::{DictionaryProvider, LookupAnswer, LookupQuery};
use cuelens_lib::core::{OverlayError, OverlayResult};

/// Answers every lookup with the word itself.
///
/// Useful for replays and smoke tests where no real dictionary is wired.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoProvider;

#[async_trait]
impl DictionaryProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn lookup(&self, query: LookupQuery) -> OverlayResult<LookupAnswer> {
        if query.word.trim().is_empty() {
            return Err(OverlayError::LookupFailed("Empty word".to_string()));
        }
        let text = match &query.language_hint {
            Some(language) => format!("{} ({}, {})", query.word, query.variant, language),
            None => format!("{} ({})", query.word, query.variant),
        };
        Ok(LookupAnswer { text })
    }
}
