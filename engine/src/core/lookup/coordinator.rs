//! Lookup Request Coordinator
//!
//! Issues lookups and decides which response may reach the screen.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LookupOutcome, LookupQuery, LookupResponse};
use crate::core::{LookupCounter, TrackKind};

/// Bounding box of the activated token, used to place the popup
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl AnchorRect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Returns true if the point lies inside the rectangle
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left
            && x <= self.left + self.width
            && y >= self.top
            && y <= self.top + self.height
    }
}

/// One issued lookup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    /// Value of the coordinator counter when issued
    pub counter: LookupCounter,
    /// What the collaborator receives
    pub query: LookupQuery,
    /// Track of the activated token
    pub track: TrackKind,
    /// Where the token was on screen
    pub anchor: AnchorRect,
}

/// State of the single lookup popup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LookupStatus {
    /// Waiting for the collaborator
    Pending,
    /// Answer arrived
    Ready { text: String },
    /// Collaborator reported an error
    Failed { error: String },
}

/// The visible lookup popup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupPopup {
    pub request: LookupRequest,
    pub status: LookupStatus,
    /// Popup bounds reported by the host after placement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placed: Option<AnchorRect>,
}

/// Issues lookups and filters stale responses
#[derive(Clone, Debug, Default)]
pub struct LookupCoordinator {
    counter: LookupCounter,
    current: Option<LookupCounter>,
    popup: Option<LookupPopup>,
}

impl LookupCoordinator {
    /// Creates a coordinator with nothing issued
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new lookup, replacing any pending or shown one
    pub fn activate(
        &mut self,
        word: &str,
        anchor: AnchorRect,
        track: TrackKind,
        language_hint: Option<&str>,
    ) -> LookupRequest {
        self.counter += 1;
        self.current = Some(self.counter);

        let request = LookupRequest {
            counter: self.counter,
            query: LookupQuery::new(word, track, language_hint),
            track,
            anchor,
        };
        self.popup = Some(LookupPopup {
            request: request.clone(),
            status: LookupStatus::Pending,
            placed: None,
        });
        request
    }

    /// Applies a response if it belongs to the current request.
    ///
    /// Returns false (and changes nothing) for superseded or closed lookups.
    pub fn apply(&mut self, response: LookupResponse) -> bool {
        if self.current != Some(response.counter) {
            debug!(
                "Discarding stale lookup #{} (current {:?})",
                response.counter, self.current
            );
            return false;
        }

        let Some(popup) = self.popup.as_mut() else {
            return false;
        };
        popup.status = match response.outcome {
            LookupOutcome::Answer { answer } => LookupStatus::Ready { text: answer.text },
            LookupOutcome::Failed { error } => LookupStatus::Failed { error },
        };
        true
    }

    /// Records where the host placed the popup
    pub fn set_placement(&mut self, bounds: AnchorRect) {
        if let Some(popup) = self.popup.as_mut() {
            popup.placed = Some(bounds);
        }
    }

    /// Closes the popup and invalidates the current request
    pub fn close(&mut self) -> bool {
        let was_open = self.popup.is_some();
        self.popup = None;
        self.current = None;
        was_open
    }

    /// Closes the popup when a pointer press lands outside it
    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        let inside = self
            .popup
            .as_ref()
            .and_then(|popup| popup.placed)
            .is_some_and(|bounds| bounds.contains(x, y));
        if inside {
            return false;
        }
        self.close()
    }

    /// The popup, if one is open
    pub fn popup(&self) -> Option<&LookupPopup> {
        self.popup.as_ref()
    }

    /// Counter of the request whose response would be shown
    pub fn current(&self) -> Option<LookupCounter> {
        self.current
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn activate(coordinator: &mut LookupCoordinator, word: &str) -> LookupRequest {
        coordinator.activate(word, AnchorRect::default(), TrackKind::Original, Some("ja"))
    }

    fn shown_text(coordinator: &LookupCoordinator) -> Option<String> {
        match coordinator.popup().map(|popup| &popup.status) {
            Some(LookupStatus::Ready { text }) => Some(text.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_counter_is_monotonic() {
        let mut coordinator = LookupCoordinator::new();
        let first = activate(&mut coordinator, "a");
        let second = activate(&mut coordinator, "b");

        assert_eq!(first.counter, 1);
        assert_eq!(second.counter, 2);
        assert_eq!(coordinator.current(), Some(2));
        assert_eq!(coordinator.popup().unwrap().request.query.word, "b");
        assert_eq!(coordinator.popup().unwrap().status, LookupStatus::Pending);
    }

    #[test]
    fn test_only_latest_response_is_shown() {
        let mut coordinator = LookupCoordinator::new();
        let requests: Vec<LookupRequest> = (0..5)
            .map(|i| activate(&mut coordinator, &format!("w{}", i)))
            .collect();

        // Arrive out of order: 3, 5, 1, 4, 2
        for position in [2usize, 4, 0, 3, 1] {
            let request = &requests[position];
            let applied = coordinator.apply(LookupResponse::answer(
                request.counter,
                &request.query.word,
            ));
            assert_eq!(applied, request.counter == 5);
            if request.counter >= 5 {
                assert_eq!(shown_text(&coordinator).as_deref(), Some("w4"));
            }
        }
        assert_eq!(shown_text(&coordinator).as_deref(), Some("w4"));
    }

    #[test]
    fn test_failure_is_shown_for_current_request() {
        let mut coordinator = LookupCoordinator::new();
        let request = activate(&mut coordinator, "x");
        assert!(coordinator.apply(LookupResponse::failed(request.counter, "offline")));
        assert_eq!(
            coordinator.popup().unwrap().status,
            LookupStatus::Failed {
                error: "offline".to_string()
            }
        );
    }

    #[test]
    fn test_close_suppresses_late_response() {
        let mut coordinator = LookupCoordinator::new();
        let request = activate(&mut coordinator, "x");

        assert!(coordinator.close());
        assert!(!coordinator.apply(LookupResponse::answer(request.counter, "late")));
        assert!(coordinator.popup().is_none());
        assert_eq!(coordinator.current(), None);
    }

    #[test]
    fn test_new_activation_replaces_resolved_popup() {
        let mut coordinator = LookupCoordinator::new();
        let first = activate(&mut coordinator, "one");
        coordinator.apply(LookupResponse::answer(first.counter, "ONE"));
        activate(&mut coordinator, "two");

        assert_eq!(coordinator.popup().unwrap().status, LookupStatus::Pending);
        assert!(!coordinator.apply(LookupResponse::answer(first.counter, "ONE")));
    }

    #[test]
    fn test_pointer_down_outside_closes() {
        let mut coordinator = LookupCoordinator::new();
        activate(&mut coordinator, "x");
        coordinator.set_placement(AnchorRect::new(100.0, 100.0, 50.0, 30.0));

        assert!(!coordinator.pointer_down(120.0, 110.0));
        assert!(coordinator.popup().is_some());

        assert!(coordinator.pointer_down(10.0, 10.0));
        assert!(coordinator.popup().is_none());
    }

    #[test]
    fn test_close_resets_placement() {
        let mut coordinator = LookupCoordinator::new();
        activate(&mut coordinator, "x");
        coordinator.set_placement(AnchorRect::new(0.0, 0.0, 10.0, 10.0));
        coordinator.close();
        activate(&mut coordinator, "y");

        assert_eq!(coordinator.popup().unwrap().placed, None);
        assert_eq!(coordinator.current(), Some(2));
    }
}
