//! Selection Reconciler
//!
//! Decides the authoritative token selection from playback state, the active
//! cue, and track visibility.
//!
//! Every triggering event goes through one total transition function,
//! [`reconcile`], so cue changes, play/pause, and visibility toggles never
//! race each other over the selection slot. While playing, the playback
//! highlight is kept separately from the user's selection: it drives visual
//! emphasis only and never overwrites what the user froze in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::cues::{Cue, TokenTrack};
use crate::core::{Selection, TokenIndex, TrackKind, TrackVisibility};

/// Tracks eligible for playback highlighting, highest priority first
const HIGHLIGHT_PRIORITY: [TrackKind; 2] = [TrackKind::Translation, TrackKind::Transliteration];

/// Tracks tried for the paused default selection, highest priority first
const DEFAULT_PRIORITY: [TrackKind; 3] = [
    TrackKind::Translation,
    TrackKind::Transliteration,
    TrackKind::Original,
];

// =============================================================================
// State and Events
// =============================================================================

/// Authoritative selection state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SelectionState {
    #[default]
    NoSelection,
    Selected(Selection),
}

impl SelectionState {
    /// Returns the selection, if any
    pub fn selection(&self) -> Option<Selection> {
        match self {
            SelectionState::NoSelection => None,
            SelectionState::Selected(selection) => Some(*selection),
        }
    }
}

impl From<Option<Selection>> for SelectionState {
    fn from(selection: Option<Selection>) -> Self {
        selection.map_or(SelectionState::NoSelection, SelectionState::Selected)
    }
}

/// Events that may change the selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionEvent {
    /// A different cue (or none) became active
    CueChanged,
    /// Media started playing
    PlaybackStarted,
    /// Media paused or stopped
    PlaybackStopped,
    /// Playback position jumped
    Seeked,
    /// Visible track set changed
    VisibilityChanged,
    /// Per-frame update while playing
    Tick,
    /// Pointer click or Enter on a token
    Activated(Selection),
    /// Keyboard navigation produced a new target
    Navigated(Selection),
}

/// Inputs read (never written) by the transition function
#[derive(Clone, Copy, Debug)]
pub struct ReconcileContext<'a> {
    /// Active cue, if any
    pub cue: Option<&'a Cue>,
    /// Host visibility flags
    pub visibility: TrackVisibility,
    /// Whether media is currently playing
    pub playing: bool,
}

impl<'a> ReconcileContext<'a> {
    fn track(&self, kind: TrackKind) -> Option<&'a TokenTrack> {
        self.cue.and_then(|cue| cue.track(kind))
    }

    fn token_count(&self, kind: TrackKind) -> usize {
        self.track(kind).map_or(0, TokenTrack::len)
    }

    /// Visible and holding at least one token
    fn is_selectable(&self, kind: TrackKind) -> bool {
        self.visibility.is_visible(kind) && self.token_count(kind) > 0
    }

    /// Returns true if the selection addresses an existing visible token
    pub fn is_valid(&self, selection: Selection) -> bool {
        self.visibility.is_visible(selection.track)
            && selection.index < self.token_count(selection.track)
    }
}

/// Selection plus the transient playback highlight
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcilerState {
    /// User-facing selection
    pub selection: SelectionState,
    /// Playback-driven highlight (only while playing)
    pub highlight: Option<Selection>,
    /// Last `current_index` advertised per track for the active cue
    pub last_known_current: BTreeMap<TrackKind, TokenIndex>,
}

// =============================================================================
// Transition Function
// =============================================================================

/// Evaluates one event against the current state.
///
/// Rules, in priority order:
/// 1. No active cue, or no visible track with tokens: no selection.
/// 2. Activation selects the token.
/// 3. Playing: highlight follows translation, then transliteration.
/// 4. Paused: an invalid or missing selection is replaced by the default.
pub fn reconcile(
    state: &ReconcilerState,
    event: SelectionEvent,
    ctx: &ReconcileContext<'_>,
) -> ReconcilerState {
    let mut last_known_current = match event {
        SelectionEvent::CueChanged => BTreeMap::new(),
        _ => state.last_known_current.clone(),
    };

    let Some(cue) = ctx.cue else {
        return ReconcilerState::default();
    };
    if !TrackKind::RENDER_ORDER
        .iter()
        .any(|track| ctx.is_selectable(*track))
    {
        return ReconcilerState {
            last_known_current,
            ..ReconcilerState::default()
        };
    }

    for (kind, track) in &cue.tracks {
        if let Some(index) = track.current_index_in_range() {
            last_known_current.insert(*kind, index);
        }
    }

    let mut selection = state.selection;
    match event {
        SelectionEvent::Activated(target) | SelectionEvent::Navigated(target)
            if ctx.is_valid(target) =>
        {
            selection = SelectionState::Selected(target);
        }
        _ => {}
    }

    if ctx.playing {
        return ReconcilerState {
            selection,
            highlight: playback_highlight(ctx),
            last_known_current,
        };
    }

    let keep = selection
        .selection()
        .is_some_and(|current| ctx.is_valid(current));
    if !keep {
        selection = default_selection(ctx, &last_known_current).into();
    }

    ReconcilerState {
        selection,
        highlight: None,
        last_known_current,
    }
}

/// Track advertising a `current_index`, translation first
fn playback_highlight(ctx: &ReconcileContext<'_>) -> Option<Selection> {
    HIGHLIGHT_PRIORITY.into_iter().find_map(|kind| {
        if !ctx.visibility.is_visible(kind) {
            return None;
        }
        ctx.track(kind)
            .and_then(TokenTrack::current_index_in_range)
            .map(|index| Selection::new(kind, index))
    })
}

/// First selectable track in default priority, at its last known index
fn default_selection(
    ctx: &ReconcileContext<'_>,
    last_known_current: &BTreeMap<TrackKind, TokenIndex>,
) -> Option<Selection> {
    let kind = DEFAULT_PRIORITY
        .into_iter()
        .find(|kind| ctx.is_selectable(*kind))?;
    let count = ctx.token_count(kind);
    let index = ctx
        .track(kind)
        .and_then(|track| track.current_index)
        .or_else(|| last_known_current.get(&kind).copied())
        .map_or(0, |index| index.min(count - 1));
    Some(Selection::new(kind, index))
}

// =============================================================================
// Reconciler
// =============================================================================

/// Owner of the selection state
#[derive(Clone, Debug, Default)]
pub struct SelectionReconciler {
    state: ReconcilerState,
}

/// What a single event changed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Selection or highlight differs from before
    pub changed: bool,
    /// Token activated by this event (caller issues the lookup)
    pub activated: Option<Selection>,
}

impl SelectionReconciler {
    /// Creates a reconciler with no selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event atomically
    pub fn handle(
        &mut self,
        event: SelectionEvent,
        ctx: &ReconcileContext<'_>,
    ) -> ReconcileOutcome {
        let next = reconcile(&self.state, event, ctx);
        let changed =
            next.selection != self.state.selection || next.highlight != self.state.highlight;

        let activated = match event {
            SelectionEvent::Activated(target)
                if next.selection == SelectionState::Selected(target) =>
            {
                Some(target)
            }
            _ => None,
        };

        if changed {
            debug!(
                "Selection {:?} -> {:?} (highlight {:?}) on {:?}",
                self.state.selection, next.selection, next.highlight, event
            );
        }
        self.state = next;

        ReconcileOutcome { changed, activated }
    }

    /// Current selection state
    pub fn state(&self) -> SelectionState {
        self.state.selection
    }

    /// Current selection, if any
    pub fn selection(&self) -> Option<Selection> {
        self.state.selection.selection()
    }

    /// Current playback highlight, if any
    pub fn highlight(&self) -> Option<Selection> {
        self.state.highlight
    }

    /// Drops all state (new cue list)
    pub fn reset(&mut self) {
        self.state = ReconcilerState::default();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(counts: &[(TrackKind, usize)]) -> Cue {
        counts.iter().fold(Cue::new("c", 0.0, 1.0), |cue, (kind, count)| {
            cue.with_track(*kind, TokenTrack::new((0..*count).map(|i| format!("t{}", i))))
        })
    }

    fn ctx(cue: Option<&Cue>, visibility: TrackVisibility, playing: bool) -> ReconcileContext<'_> {
        ReconcileContext {
            cue,
            visibility,
            playing,
        }
    }

    fn selected(track: TrackKind, index: usize) -> SelectionState {
        SelectionState::Selected(Selection::new(track, index))
    }

    // -------------------------------------------------------------------------
    // Rule 1
    // -------------------------------------------------------------------------

    #[test]
    fn test_no_active_cue_clears_selection() {
        let mut reconciler = SelectionReconciler::new();
        let cue = cue(&[(TrackKind::Translation, 3)]);
        let visible = TrackVisibility::default();

        reconciler.handle(SelectionEvent::CueChanged, &ctx(Some(&cue), visible, false));
        assert!(reconciler.selection().is_some());

        let outcome = reconciler.handle(SelectionEvent::CueChanged, &ctx(None, visible, false));
        assert!(outcome.changed);
        assert_eq!(reconciler.state(), SelectionState::NoSelection);
    }

    #[test]
    fn test_no_visible_tokens_clears_selection() {
        let cue = cue(&[(TrackKind::Original, 0), (TrackKind::Translation, 3)]);
        let visible = TrackVisibility::new(true, false, true);
        let state = ReconcilerState {
            selection: selected(TrackKind::Translation, 1),
            ..Default::default()
        };

        let next = reconcile(
            &state,
            SelectionEvent::VisibilityChanged,
            &ctx(Some(&cue), visible, false),
        );
        assert_eq!(next.selection, SelectionState::NoSelection);
        assert_eq!(next.highlight, None);
    }

    #[test]
    fn test_activation_ignored_without_cue() {
        let mut reconciler = SelectionReconciler::new();
        let target = Selection::new(TrackKind::Original, 0);
        let outcome = reconciler.handle(
            SelectionEvent::Activated(target),
            &ctx(None, TrackVisibility::default(), false),
        );
        assert_eq!(outcome.activated, None);
        assert_eq!(reconciler.selection(), None);
    }

    // -------------------------------------------------------------------------
    // Rule 2
    // -------------------------------------------------------------------------

    #[test]
    fn test_activation_selects_and_reports() {
        let mut reconciler = SelectionReconciler::new();
        let cue = cue(&[(TrackKind::Original, 4), (TrackKind::Translation, 4)]);
        let target = Selection::new(TrackKind::Original, 3);

        let outcome = reconciler.handle(
            SelectionEvent::Activated(target),
            &ctx(Some(&cue), TrackVisibility::default(), false),
        );

        assert_eq!(outcome.activated, Some(target));
        assert_eq!(reconciler.selection(), Some(target));
    }

    #[test]
    fn test_activation_while_playing_keeps_highlight_separate() {
        let mut reconciler = SelectionReconciler::new();
        let mut cue = cue(&[(TrackKind::Original, 4), (TrackKind::Translation, 4)]);
        cue.track_mut(TrackKind::Translation).unwrap().current_index = Some(1);
        let target = Selection::new(TrackKind::Original, 2);

        let outcome = reconciler.handle(
            SelectionEvent::Activated(target),
            &ctx(Some(&cue), TrackVisibility::default(), true),
        );

        assert_eq!(outcome.activated, Some(target));
        assert_eq!(reconciler.selection(), Some(target));
        assert_eq!(
            reconciler.highlight(),
            Some(Selection::new(TrackKind::Translation, 1))
        );
    }

    #[test]
    fn test_out_of_range_activation_is_ignored() {
        let mut reconciler = SelectionReconciler::new();
        let cue = cue(&[(TrackKind::Translation, 2)]);

        let outcome = reconciler.handle(
            SelectionEvent::Activated(Selection::new(TrackKind::Translation, 9)),
            &ctx(Some(&cue), TrackVisibility::default(), false),
        );

        assert_eq!(outcome.activated, None);
        assert_eq!(reconciler.state(), selected(TrackKind::Translation, 0));
    }

    // -------------------------------------------------------------------------
    // Rule 3
    // -------------------------------------------------------------------------

    #[test]
    fn test_translation_wins_playback_highlight() {
        let cue = cue(&[(TrackKind::Translation, 3), (TrackKind::Transliteration, 3)]);
        let mut cue = cue;
        cue.track_mut(TrackKind::Translation).unwrap().current_index = Some(2);
        cue.track_mut(TrackKind::Transliteration).unwrap().current_index = Some(0);

        let next = reconcile(
            &ReconcilerState::default(),
            SelectionEvent::Tick,
            &ctx(Some(&cue), TrackVisibility::default(), true),
        );
        assert_eq!(next.highlight, Some(Selection::new(TrackKind::Translation, 2)));
    }

    #[test]
    fn test_transliteration_highlight_when_translation_silent() {
        let mut cue = cue(&[(TrackKind::Translation, 3), (TrackKind::Transliteration, 3)]);
        cue.track_mut(TrackKind::Transliteration).unwrap().current_index = Some(1);

        let next = reconcile(
            &ReconcilerState::default(),
            SelectionEvent::Tick,
            &ctx(Some(&cue), TrackVisibility::default(), true),
        );
        assert_eq!(
            next.highlight,
            Some(Selection::new(TrackKind::Transliteration, 1))
        );
    }

    #[test]
    fn test_original_never_drives_highlight() {
        let mut cue = cue(&[(TrackKind::Original, 3)]);
        cue.track_mut(TrackKind::Original).unwrap().current_index = Some(1);

        let next = reconcile(
            &ReconcilerState::default(),
            SelectionEvent::PlaybackStarted,
            &ctx(Some(&cue), TrackVisibility::default(), true),
        );
        assert_eq!(next.highlight, None);
    }

    #[test]
    fn test_playing_leaves_manual_selection_untouched() {
        let mut cue = cue(&[(TrackKind::Original, 3), (TrackKind::Translation, 3)]);
        cue.track_mut(TrackKind::Translation).unwrap().current_index = Some(2);
        let state = ReconcilerState {
            selection: selected(TrackKind::Original, 1),
            ..Default::default()
        };

        let next = reconcile(
            &state,
            SelectionEvent::Tick,
            &ctx(Some(&cue), TrackVisibility::default(), true),
        );
        assert_eq!(next.selection, selected(TrackKind::Original, 1));
        assert_eq!(next.highlight, Some(Selection::new(TrackKind::Translation, 2)));
    }

    // -------------------------------------------------------------------------
    // Rule 4
    // -------------------------------------------------------------------------

    #[test]
    fn test_pause_replaces_selection_on_hidden_track() {
        let cue = cue(&[(TrackKind::Translation, 5), (TrackKind::Transliteration, 5)]);
        let visible = TrackVisibility::new(false, true, false);
        let state = ReconcilerState {
            selection: selected(TrackKind::Transliteration, 2),
            ..Default::default()
        };

        let next = reconcile(
            &state,
            SelectionEvent::PlaybackStopped,
            &ctx(Some(&cue), visible, false),
        );
        assert_eq!(next.selection, selected(TrackKind::Translation, 0));
        assert_eq!(next.highlight, None);
    }

    #[test]
    fn test_pause_default_uses_last_known_current_index() {
        let mut playing_cue = cue(&[(TrackKind::Translation, 5)]);
        playing_cue.track_mut(TrackKind::Translation).unwrap().current_index = Some(3);
        let paused_cue = cue(&[(TrackKind::Translation, 5)]);
        let visible = TrackVisibility::default();

        let mut reconciler = SelectionReconciler::new();
        reconciler.handle(SelectionEvent::Tick, &ctx(Some(&playing_cue), visible, true));
        assert_eq!(reconciler.selection(), None);

        reconciler.handle(SelectionEvent::PlaybackStopped, &ctx(Some(&paused_cue), visible, false));
        assert_eq!(reconciler.state(), selected(TrackKind::Translation, 3));
    }

    #[test]
    fn test_default_index_is_clamped() {
        let mut cue = cue(&[(TrackKind::Transliteration, 2)]);
        cue.track_mut(TrackKind::Transliteration).unwrap().current_index = Some(7);

        let next = reconcile(
            &ReconcilerState::default(),
            SelectionEvent::PlaybackStopped,
            &ctx(Some(&cue), TrackVisibility::default(), false),
        );
        assert_eq!(next.selection, selected(TrackKind::Transliteration, 1));
    }

    #[test]
    fn test_default_prefers_translation_then_transliteration_then_original() {
        let visible = TrackVisibility::default();

        let all = cue(&[
            (TrackKind::Original, 1),
            (TrackKind::Translation, 1),
            (TrackKind::Transliteration, 1),
        ]);
        let no_translation = cue(&[(TrackKind::Original, 1), (TrackKind::Transliteration, 1)]);
        let original_only = cue(&[(TrackKind::Original, 1), (TrackKind::Translation, 0)]);

        let pick = |cue: &Cue| {
            reconcile(
                &ReconcilerState::default(),
                SelectionEvent::CueChanged,
                &ctx(Some(cue), visible, false),
            )
            .selection
        };

        assert_eq!(pick(&all), selected(TrackKind::Translation, 0));
        assert_eq!(pick(&no_translation), selected(TrackKind::Transliteration, 0));
        assert_eq!(pick(&original_only), selected(TrackKind::Original, 0));
    }

    #[test]
    fn test_valid_manual_selection_survives_cue_change() {
        let first = cue(&[(TrackKind::Original, 4), (TrackKind::Translation, 4)]);
        let second = cue(&[(TrackKind::Original, 3), (TrackKind::Translation, 6)]);
        let visible = TrackVisibility::default();

        let mut reconciler = SelectionReconciler::new();
        reconciler.handle(
            SelectionEvent::Navigated(Selection::new(TrackKind::Original, 2)),
            &ctx(Some(&first), visible, false),
        );
        let outcome =
            reconciler.handle(SelectionEvent::CueChanged, &ctx(Some(&second), visible, false));

        assert!(!outcome.changed);
        assert_eq!(reconciler.state(), selected(TrackKind::Original, 2));
    }

    #[test]
    fn test_out_of_range_selection_replaced_after_cue_change() {
        let first = cue(&[(TrackKind::Original, 6), (TrackKind::Translation, 2)]);
        let second = cue(&[(TrackKind::Original, 3), (TrackKind::Translation, 2)]);
        let visible = TrackVisibility::default();

        let mut reconciler = SelectionReconciler::new();
        reconciler.handle(
            SelectionEvent::Navigated(Selection::new(TrackKind::Original, 5)),
            &ctx(Some(&first), visible, false),
        );
        reconciler.handle(SelectionEvent::CueChanged, &ctx(Some(&second), visible, false));

        assert_eq!(reconciler.state(), selected(TrackKind::Translation, 0));
    }

    #[test]
    fn test_cue_change_forgets_last_known_index() {
        let mut first = cue(&[(TrackKind::Translation, 5)]);
        first.track_mut(TrackKind::Translation).unwrap().current_index = Some(4);
        let second = cue(&[(TrackKind::Translation, 5)]);
        let visible = TrackVisibility::default();

        let mut reconciler = SelectionReconciler::new();
        reconciler.handle(SelectionEvent::Tick, &ctx(Some(&first), visible, true));
        reconciler.handle(SelectionEvent::CueChanged, &ctx(Some(&second), visible, true));
        reconciler.handle(SelectionEvent::PlaybackStopped, &ctx(Some(&second), visible, false));

        assert_eq!(reconciler.state(), selected(TrackKind::Translation, 0));
    }

    #[test]
    fn test_reset() {
        let mut reconciler = SelectionReconciler::new();
        let cue = cue(&[(TrackKind::Translation, 1)]);
        reconciler.handle(
            SelectionEvent::CueChanged,
            &ctx(Some(&cue), TrackVisibility::default(), false),
        );
        reconciler.reset();
        assert_eq!(reconciler.state(), SelectionState::NoSelection);
    }
}
