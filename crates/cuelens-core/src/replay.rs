//! Scripted Replay
//!
//! Drives an [`OverlaySession`] from a recorded list of host events and
//! emits a frame after every step. Lookups are dispatched inline, so a
//! replay is fully deterministic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use cuelens_lib::core::cues::CueList;
use cuelens_lib::core::layout::TokenGeometry;
use cuelens_lib::core::lookup::{dispatch, AnchorRect, DictionaryProvider, LookupRequest};
use cuelens_lib::core::session::{CurrentIndices, KeyEffect, NavKey};
use cuelens_lib::core::settings::OverlaySettings;
use cuelens_lib::core::{OverlayResult, Selection, TimeSec, TokenIndex, TrackKind, TrackVisibility};
use cuelens_lib::{OverlayFrame, OverlaySession};

use crate::events::{EventSink, OverlayEvent};

/// One recorded host event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScriptStep {
    Play,
    Pause {
        time: TimeSec,
    },
    Seek {
        time: TimeSec,
    },
    /// Frame tick; `currentIndex` carries live spoken-token indices
    #[serde(rename_all = "camelCase")]
    Frame {
        time: TimeSec,
        #[serde(default, skip_serializing_if = "CurrentIndices::is_empty")]
        current_index: CurrentIndices,
    },
    Key {
        key: NavKey,
    },
    #[serde(rename_all = "camelCase")]
    Activate {
        track: TrackKind,
        index: TokenIndex,
        #[serde(default)]
        anchor: AnchorRect,
    },
    Visibility {
        visibility: TrackVisibility,
    },
    Layout {
        tokens: Vec<TokenGeometry>,
    },
    Resize,
    Scale {
        scale: f64,
    },
    Pointer {
        x: f64,
        y: f64,
    },
    Placed {
        bounds: AnchorRect,
    },
}

/// Parses a script (JSON array of steps)
pub fn parse_script(payload: &str) -> OverlayResult<Vec<ScriptStep>> {
    Ok(serde_json::from_str(payload)?)
}

/// Feeds script steps into a session
pub struct ReplayDriver<S: EventSink> {
    session: OverlaySession,
    provider: Arc<dyn DictionaryProvider>,
    sink: S,
    step: usize,
}

impl<S: EventSink> ReplayDriver<S> {
    pub fn new(settings: OverlaySettings, provider: Arc<dyn DictionaryProvider>, sink: S) -> Self {
        Self {
            session: OverlaySession::new(settings),
            provider,
            sink,
            step: 0,
        }
    }

    /// Installs the cue list to replay against
    pub fn load_cues(&mut self, cues: CueList) {
        let count = cues.len();
        self.session.set_cues(cues);
        self.sink.emit(OverlayEvent::CuesLoaded { count });
    }

    /// Applies one step and emits the resulting frame
    pub async fn apply(&mut self, step: ScriptStep) -> OverlayFrame {
        match step {
            ScriptStep::Play => self.session.on_play(),
            ScriptStep::Pause { time } => self.session.on_pause(time),
            ScriptStep::Seek { time } => self.session.on_seek(time),
            ScriptStep::Frame {
                time,
                current_index,
            } => {
                self.session.on_frame_synced(time, &current_index);
            }
            ScriptStep::Key { key } => {
                if let KeyEffect::Lookup(request) = self.session.on_key(key) {
                    self.lookup(request).await;
                }
            }
            ScriptStep::Activate {
                track,
                index,
                anchor,
            } => {
                if let Some(request) = self.session.activate(Selection::new(track, index), anchor) {
                    self.lookup(request).await;
                }
            }
            ScriptStep::Visibility { visibility } => self.session.set_visibility(visibility),
            ScriptStep::Layout { tokens } => self.session.on_layout(tokens),
            ScriptStep::Resize => self.session.on_resize(),
            ScriptStep::Scale { scale } => self.session.set_scale(scale),
            ScriptStep::Pointer { x, y } => {
                self.session.on_pointer_down(x, y);
            }
            ScriptStep::Placed { bounds } => self.session.on_lookup_placed(bounds),
        }

        self.step += 1;
        let frame = self.session.frame();
        self.sink.emit(OverlayEvent::Frame {
            step: self.step,
            frame: frame.clone(),
        });
        frame
    }

    /// Applies every step in order, returning how many ran
    pub async fn run(&mut self, steps: Vec<ScriptStep>) -> usize {
        let total = steps.len();
        for step in steps {
            self.apply(step).await;
        }
        info!("Replayed {} steps via {}", total, self.provider.name());
        total
    }

    /// The driven session
    pub fn session(&self) -> &OverlaySession {
        &self.session
    }

    /// Consumes the driver, handing back its sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    async fn lookup(&mut self, request: LookupRequest) {
        self.sink.emit(OverlayEvent::LookupIssued {
            request: request.clone(),
        });
        let response = dispatch(self.provider.as_ref(), &request).await;
        let shown = self.session.apply_lookup(response.clone());
        self.sink.emit(OverlayEvent::LookupResolved { response, shown });
    }
}

// =============================================================================
// Tests
// =============================================================================
