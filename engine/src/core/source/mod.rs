//! Cue Source Module
//!
//! Loads the cue list for a playback session through a pluggable source.
//!
//! Only one load is in flight at a time: starting a new one cancels the
//! previous fetch. A failed load never surfaces as a hard error; the overlay
//! simply has no cues.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::cues::CueList;
use crate::core::{OverlayError, OverlayResult};

// =============================================================================
// Cue Source Trait
// =============================================================================

/// Something that produces an already-built cue list
#[async_trait]
pub trait CueSource: Send + Sync {
    /// Human-readable origin, for logs
    fn describe(&self) -> String;

    /// Fetches and builds the cue list
    async fn fetch(&self) -> OverlayResult<CueList>;
}

/// Cue list carried inline as a JSON payload
pub struct InlineJsonSource {
    payload: String,
}

impl InlineJsonSource {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

#[async_trait]
impl CueSource for InlineJsonSource {
    fn describe(&self) -> String {
        format!("inline payload ({} bytes)", self.payload.len())
    }

    async fn fetch(&self) -> OverlayResult<CueList> {
        CueList::from_json(&self.payload)
    }
}

/// Cue list stored as a JSON file
pub struct FileJsonSource {
    path: PathBuf,
}

impl FileJsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CueSource for FileJsonSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> OverlayResult<CueList> {
        let payload = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            OverlayError::SourceFetchFailed(format!("{}: {}", self.path.display(), e))
        })?;
        CueList::from_json(&payload)
    }
}

// =============================================================================
// Loader
// =============================================================================

/// A load started by [`CueSourceLoader::load`]
#[derive(Debug)]
pub struct PendingLoad {
    /// Loader generation this load belongs to
    pub generation: u64,
    handle: JoinHandle<OverlayResult<CueList>>,
}

impl PendingLoad {
    /// Waits for the fetch to finish or be cancelled
    pub async fn wait(self) -> (u64, OverlayResult<CueList>) {
        let result = match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(OverlayError::Internal(format!("Cue source task failed: {}", e))),
        };
        (self.generation, result)
    }
}

/// Runs cue source fetches, one at a time
#[derive(Debug, Default)]
pub struct CueSourceLoader {
    generation: u64,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl CueSourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts fetching from `source`, cancelling any load still in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load(&mut self, source: Arc<dyn CueSource>) -> PendingLoad {
        if self.cancel() {
            debug!("Superseded cue source load #{}", self.generation);
        }

        self.generation += 1;
        let generation = self.generation;
        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.cancel_tx = Some(cancel_tx);

        info!("Loading cues #{} from {}", generation, source.describe());
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel_rx => Err(OverlayError::SourceCancelled),
                result = source.fetch() => result,
            }
        });

        PendingLoad { generation, handle }
    }

    /// Cancels the in-flight load, if any
    pub fn cancel(&mut self) -> bool {
        match self.cancel_tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Returns true if `generation` is the latest load
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Turns a finished load into the cue list to install.
    ///
    /// Returns `None` for superseded or cancelled loads and for internal
    /// failures (keep what is shown). Bad or unreachable input installs an
    /// empty list so the overlay just disappears.
    pub fn finish(&mut self, generation: u64, result: OverlayResult<CueList>) -> Option<CueList> {
        if !self.is_current(generation) {
            debug!("Dropping superseded cue load #{}", generation);
            return None;
        }
        self.cancel_tx = None;

        match result {
            Ok(list) => {
                if let Err(e) = list.validate() {
                    warn!("Cue list #{} violates ordering: {}", generation, e);
                }
                info!("Loaded {} cues (#{})", list.len(), generation);
                Some(list)
            }
            Err(OverlayError::SourceCancelled) => None,
            Err(e) if e.is_recoverable_input() => {
                warn!("Cue source load #{} failed, overlay disabled: {}", generation, e);
                Some(CueList::default())
            }
            Err(e) => {
                error!("Cue source load #{} aborted, keeping current cues: {}", generation, e);
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
