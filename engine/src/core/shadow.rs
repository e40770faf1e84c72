//! Shadow Resolver
//!
//! Links a token in the translation track to the token at the same position
//! in the transliteration track (and back). Only applies when both tracks
//! have the same length; the link is a visual hint and nothing depends on it.

use crate::core::{Selection, TokenIndex, TrackKind};

/// Resolves the mirrored token for a source selection
pub fn resolve<S: AsRef<str>>(
    source_track: TrackKind,
    source_index: TokenIndex,
    translation: Option<&[S]>,
    transliteration: Option<&[S]>,
) -> Option<Selection> {
    let (translation, transliteration) = (translation?, transliteration?);
    if translation.len() != transliteration.len() {
        return None;
    }

    let target = match source_track {
        TrackKind::Translation => TrackKind::Transliteration,
        TrackKind::Transliteration => TrackKind::Translation,
        TrackKind::Original => return None,
    };

    // Equal lengths, so either array bounds the index
    (source_index < transliteration.len()).then(|| Selection::new(target, source_index))
}
