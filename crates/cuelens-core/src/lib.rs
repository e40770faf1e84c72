//! Cuelens Core
//!
//! Stable facade over the overlay engine for embedders without a GUI.
//! Re-exports the engine and adds the pieces a headless host needs: an
//! event sink abstraction, a scripted replay driver, and a trivial
//! dictionary provider.

pub mod events;
pub mod providers;
pub mod replay;

pub use cuelens_lib::core;
pub use cuelens_lib::{OverlayFrame, OverlaySession};

pub use events::{ChannelSink, EventSink, NullSink, OverlayEvent};
pub use providers::EchoProvider;
pub use replay::{parse_script, ReplayDriver, ScriptStep};
