//! Overlay Session
//!
//! Single owner of the overlay state for one playback session.
//!
//! The host forwards its events here: playback notifications, per-frame
//! ticks, visibility and layout changes, key presses, and pointer
//! activation. Each method evaluates exactly one event, so selection
//! reconciliation is atomic per trigger. [`OverlaySession::frame`] returns
//! everything the renderer needs to draw.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::cues::{Cue, CueCursor, CueList};
use crate::core::layout::{build_line_maps, GeometrySnapshot, LineMaps, TokenGeometry};
use crate::core::lookup::{
    AnchorRect, LookupCoordinator, LookupPopup, LookupRequest, LookupResponse,
};
use crate::core::navigation::{move_horizontal, move_vertical};
use crate::core::selection::{
    ReconcileContext, ReconcileOutcome, SelectionEvent, SelectionReconciler,
};
use crate::core::settings::OverlaySettings;
use crate::core::{shadow, Direction, Selection, TimeSec, TokenIndex, TrackKind, TrackVisibility};

// =============================================================================
// Input
// =============================================================================

/// Live "currently spoken" index per track, as reported by the aligner
pub type CurrentIndices = BTreeMap<TrackKind, Option<TokenIndex>>;

/// Keys the overlay reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavKey {
    Left,
    Right,
    Up,
    Down,
    Enter,
    Escape,
}

/// What a key press did
#[derive(Clone, Debug, PartialEq)]
pub enum KeyEffect {
    /// Nothing to do (no selection, edge of tracks, ...)
    Ignored,
    /// Selection moved
    Moved(Selection),
    /// Token activated; the host should dispatch the lookup
    Lookup(LookupRequest),
    /// Lookup popup closed
    Closed,
}

// =============================================================================
// Frame
// =============================================================================

/// One rendered track of the active cue
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTrack {
    pub kind: TrackKind,
    pub tokens: Vec<String>,
}

/// Render snapshot of the overlay
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayFrame {
    pub time: TimeSec,
    pub playing: bool,
    /// Index of the active cue
    pub active_cue: Option<usize>,
    pub cue_id: Option<String>,
    /// Visible tracks of the active cue, in render order
    pub tracks: Vec<FrameTrack>,
    pub selection: Option<Selection>,
    pub highlight: Option<Selection>,
    pub shadow: Option<Selection>,
    pub lookup: Option<LookupPopup>,
    pub scale: f64,
    pub background_opacity: f64,
}

// =============================================================================
// Session
// =============================================================================

/// Overlay state machine driven by host events
#[derive(Debug, Default)]
pub struct OverlaySession {
    cues: CueList,
    cursor: CueCursor,
    active: Option<usize>,
    time: TimeSec,
    playing: bool,
    settings: OverlaySettings,
    geometry: GeometrySnapshot,
    line_maps: LineMaps,
    layout_dirty: bool,
    reconciler: SelectionReconciler,
    lookup: LookupCoordinator,
}

impl OverlaySession {
    /// Creates a session with no cues
    pub fn new(mut settings: OverlaySettings) -> Self {
        settings.normalize();
        Self {
            settings,
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------
    // Cue source
    // -------------------------------------------------------------------------

    /// Installs a new cue list (new file or track disabled)
    pub fn set_cues(&mut self, cues: CueList) {
        info!("Installing cue list with {} cues", cues.len());
        self.cues = cues;
        self.cursor.reset();
        self.active = None;
        self.reconciler.reset();
        self.lookup.close();
        self.refresh_active();
        self.invalidate_layout();
        self.reconcile(SelectionEvent::CueChanged);
    }

    /// Drops all cues (source failed or removed)
    pub fn clear_cues(&mut self) {
        self.set_cues(CueList::default());
    }

    // -------------------------------------------------------------------------
    // Playback clock
    // -------------------------------------------------------------------------

    /// Media started playing; arms per-frame polling
    pub fn on_play(&mut self) {
        self.playing = true;
        self.step(SelectionEvent::PlaybackStarted);
    }

    /// Media paused; disarms polling and reconciles immediately
    pub fn on_pause(&mut self, time: TimeSec) {
        self.playing = false;
        self.time = time;
        self.step(SelectionEvent::PlaybackStopped);
    }

    /// Playback position jumped
    pub fn on_seek(&mut self, time: TimeSec) {
        self.time = time;
        self.step(SelectionEvent::Seeked);
    }

    /// Per-frame timing signal. A no-op unless playing.
    ///
    /// Returns true when the frame changed something visible.
    pub fn on_frame(&mut self, time: TimeSec) -> bool {
        self.on_frame_synced(time, &CurrentIndices::new())
    }

    /// Per-frame timing signal carrying the live spoken-token indices.
    ///
    /// Indices are written into the active cue (after it is re-located for
    /// `time`) before the single reconciliation runs. Tracks missing from
    /// `current` keep their index. A no-op unless playing.
    pub fn on_frame_synced(&mut self, time: TimeSec, current: &CurrentIndices) -> bool {
        if !self.is_polling() {
            return false;
        }
        self.time = time;
        let cue_changed = self.relocate();
        let mut index_changed = false;
        for (track, index) in current {
            index_changed |= self.write_current_index(*track, *index);
        }
        let event = if cue_changed {
            SelectionEvent::CueChanged
        } else {
            SelectionEvent::Tick
        };
        self.reconcile(event).changed || cue_changed || index_changed
    }

    /// Updates the live index of one track of the active cue.
    ///
    /// Returns false when there is no active cue, the track is absent, or
    /// the index did not change.
    pub fn set_current_index(&mut self, track: TrackKind, index: Option<TokenIndex>) -> bool {
        if !self.write_current_index(track, index) {
            return false;
        }
        self.reconcile(SelectionEvent::Tick);
        true
    }

    /// Returns true while active-cue polling is armed
    pub fn is_polling(&self) -> bool {
        self.playing
    }

    // -------------------------------------------------------------------------
    // Visibility and layout
    // -------------------------------------------------------------------------

    /// Applies new visibility flags
    pub fn set_visibility(&mut self, visibility: TrackVisibility) {
        if self.settings.display.visibility == visibility {
            return;
        }
        self.settings.display.visibility = visibility;
        self.invalidate_layout();
        self.reconcile(SelectionEvent::VisibilityChanged);
    }

    /// Applies a new text scale
    pub fn set_scale(&mut self, scale: f64) {
        self.settings.display.scale = scale;
        self.settings.normalize();
        self.invalidate_layout();
    }

    /// Applies a new background opacity
    pub fn set_background_opacity(&mut self, opacity: f64) {
        self.settings.display.background_opacity = opacity;
        self.settings.normalize();
    }

    /// Container resized
    pub fn on_resize(&mut self) {
        self.invalidate_layout();
    }

    /// Returns true if the host should re-measure token geometry
    pub fn layout_dirty(&self) -> bool {
        self.layout_dirty
    }

    /// Receives freshly measured token geometry
    pub fn on_layout(&mut self, geometry: Vec<TokenGeometry>) {
        self.geometry = GeometrySnapshot::from_tokens(geometry);
        self.line_maps = build_line_maps(&self.geometry, self.settings.layout.row_tolerance);
        self.layout_dirty = false;
    }

    /// Current line maps
    pub fn line_maps(&self) -> &LineMaps {
        &self.line_maps
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Handles a key press
    pub fn on_key(&mut self, key: NavKey) -> KeyEffect {
        match key {
            NavKey::Escape => {
                if self.lookup.close() {
                    KeyEffect::Closed
                } else {
                    KeyEffect::Ignored
                }
            }
            NavKey::Enter => match self.navigation_origin() {
                Some(selection) => {
                    let anchor = self.anchor_of(selection);
                    self.activate(selection, anchor)
                        .map_or(KeyEffect::Ignored, KeyEffect::Lookup)
                }
                None => KeyEffect::Ignored,
            },
            NavKey::Left => self.navigate(|session, origin| {
                session.horizontal_target(origin, Direction::Backward)
            }),
            NavKey::Right => self.navigate(|session, origin| {
                session.horizontal_target(origin, Direction::Forward)
            }),
            NavKey::Up => self.navigate(|session, origin| {
                session.vertical_target(origin, Direction::Backward)
            }),
            NavKey::Down => self.navigate(|session, origin| {
                session.vertical_target(origin, Direction::Forward)
            }),
        }
    }

    /// Pointer click (or Enter) on a token.
    ///
    /// Returns the lookup to dispatch when the activation selected a token.
    pub fn activate(&mut self, selection: Selection, anchor: AnchorRect) -> Option<LookupRequest> {
        let outcome = self.reconcile(SelectionEvent::Activated(selection));
        let activated = outcome.activated?;

        let word = self
            .active_cue()
            .and_then(|cue| cue.track(activated.track))
            .and_then(|track| track.token(activated.index))?
            .to_string();
        let language_hint = self.language_hint(activated.track);

        Some(
            self.lookup
                .activate(&word, anchor, activated.track, language_hint.as_deref()),
        )
    }

    /// Pointer press anywhere; closes the popup when outside it
    pub fn on_pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.lookup.pointer_down(x, y)
    }

    /// Records where the host placed the lookup popup
    pub fn on_lookup_placed(&mut self, bounds: AnchorRect) {
        self.lookup.set_placement(bounds);
    }

    /// Applies a lookup response; stale ones are dropped
    pub fn apply_lookup(&mut self, response: LookupResponse) -> bool {
        self.lookup.apply(response)
    }

    /// Closes the lookup popup
    pub fn close_lookup(&mut self) -> bool {
        self.lookup.close()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Active cue, if any
    pub fn active_cue(&self) -> Option<&Cue> {
        self.active.and_then(|index| self.cues.get(index))
    }

    /// Index of the active cue
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// User selection, if valid for the active cue
    pub fn selection(&self) -> Option<Selection> {
        self.reconciler
            .selection()
            .filter(|selection| self.context().is_valid(*selection))
    }

    /// Playback highlight, if any
    pub fn highlight(&self) -> Option<Selection> {
        self.reconciler.highlight()
    }

    /// Token linked to the emphasized one in the aligned parallel track
    pub fn shadow(&self) -> Option<Selection> {
        let source = if self.playing {
            self.highlight().or_else(|| self.selection())
        } else {
            self.selection()
        }?;
        let cue = self.active_cue()?;
        shadow::resolve(
            source.track,
            source.index,
            cue.tokens(TrackKind::Translation),
            cue.tokens(TrackKind::Transliteration),
        )
    }

    /// Current settings
    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    /// Render snapshot
    pub fn frame(&self) -> OverlayFrame {
        let visibility = self.settings.display.visibility;
        let cue = self.active_cue();
        let tracks: Vec<FrameTrack> = cue
            .map(|cue| {
                visibility
                    .visible_tracks()
                    .into_iter()
                    .filter_map(|kind| {
                        cue.track(kind).map(|track| FrameTrack {
                            kind,
                            tokens: track.tokens.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        OverlayFrame {
            time: self.time,
            playing: self.playing,
            active_cue: self.active,
            cue_id: cue.map(|cue| cue.id.clone()),
            tracks,
            selection: self.selection(),
            highlight: self.highlight(),
            shadow: self.shadow(),
            lookup: self.lookup.popup().cloned(),
            scale: self.settings.display.scale,
            background_opacity: self.settings.display.background_opacity,
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn context(&self) -> ReconcileContext<'_> {
        ReconcileContext {
            cue: self.active_cue(),
            visibility: self.settings.display.visibility,
            playing: self.playing,
        }
    }

    fn reconcile(&mut self, event: SelectionEvent) -> ReconcileOutcome {
        let ctx = ReconcileContext {
            cue: self.active.and_then(|index| self.cues.get(index)),
            visibility: self.settings.display.visibility,
            playing: self.playing,
        };
        self.reconciler.handle(event, &ctx)
    }

    /// Re-locates the active cue, then reconciles once.
    ///
    /// A cue change takes the place of `event` so one trigger never runs
    /// two transitions.
    fn step(&mut self, event: SelectionEvent) -> bool {
        let cue_changed = self.relocate();
        let event = if cue_changed {
            SelectionEvent::CueChanged
        } else {
            event
        };
        self.reconcile(event).changed || cue_changed
    }

    /// Re-locates the active cue; a change dirties the layout
    fn relocate(&mut self) -> bool {
        let cue_changed = self.refresh_active();
        if cue_changed {
            self.invalidate_layout();
        }
        cue_changed
    }

    fn write_current_index(&mut self, track: TrackKind, index: Option<TokenIndex>) -> bool {
        let Some(token_track) = self
            .active
            .and_then(|active| self.cues.cues.get_mut(active))
            .and_then(|cue| cue.track_mut(track))
        else {
            return false;
        };
        if token_track.current_index == index {
            return false;
        }
        token_track.current_index = index;
        true
    }

    fn refresh_active(&mut self) -> bool {
        let active = self.cursor.locate(&self.cues.cues, self.time);
        if active == self.active {
            return false;
        }
        debug!("Active cue {:?} -> {:?} at {:.3}s", self.active, active, self.time);
        self.active = active;
        true
    }

    fn invalidate_layout(&mut self) {
        self.layout_dirty = true;
        self.geometry = GeometrySnapshot::default();
        self.line_maps.clear();
    }

    /// Where keyboard navigation starts from
    fn navigation_origin(&self) -> Option<Selection> {
        self.selection()
            .or_else(|| self.highlight())
            .filter(|selection| self.context().is_valid(*selection))
    }

    fn navigate(
        &mut self,
        target: impl FnOnce(&Self, Selection) -> Option<Selection>,
    ) -> KeyEffect {
        let Some(origin) = self.navigation_origin() else {
            return KeyEffect::Ignored;
        };
        let Some(next) = target(&*self, origin) else {
            return KeyEffect::Ignored;
        };
        self.reconcile(SelectionEvent::Navigated(next));
        if self.selection() == Some(next) {
            KeyEffect::Moved(next)
        } else {
            KeyEffect::Ignored
        }
    }

    fn horizontal_target(&self, origin: Selection, direction: Direction) -> Option<Selection> {
        let count = self.active_cue()?.token_count(origin.track);
        let index = move_horizontal(
            origin.index,
            direction,
            count,
            self.line_maps.get(origin.track),
        );
        Some(Selection::new(origin.track, index))
    }

    fn vertical_target(&self, origin: Selection, direction: Direction) -> Option<Selection> {
        let cue = self.active_cue()?;
        move_vertical(
            origin.track,
            origin.index,
            direction,
            &self.settings.display.visibility.visible_tracks(),
            &cue.tracks,
        )
    }

    fn anchor_of(&self, selection: Selection) -> AnchorRect {
        self.geometry
            .track(selection.track)
            .iter()
            .find(|g| g.token_index == selection.index && g.is_measured())
            .map(|g| AnchorRect::new(g.top, g.left, 0.0, 0.0))
            .unwrap_or_default()
    }

    fn language_hint(&self, track: TrackKind) -> Option<String> {
        self.cues
            .language(track)
            .or_else(|| {
                self.settings
                    .lookup
                    .language_hints
                    .get(&track)
                    .map(String::as_str)
            })
            .map(str::to_string)
    }
}

// =============================================================================
// Tests
// =============================================================================
