//! Dictionary Lookup Module
//!
//! Coordinates word lookups triggered by token activation.
//!
//! Requests are never aborted. Each activation takes the next value of a
//! monotonic counter and only the response carrying the current counter is
//! shown; anything older is dropped on arrival.

mod coordinator;
mod provider;

pub use coordinator::{AnchorRect, LookupCoordinator, LookupPopup, LookupRequest, LookupStatus};
pub use provider::{
    dispatch, DictionaryProvider, LookupAnswer, LookupOutcome, LookupQuery, LookupResponse,
};
