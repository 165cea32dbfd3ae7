//! # Session State
//!
//! Everything the view needs to render one conversation, plus the bookkeeping
//! that keeps history fetches and live delivery from clobbering each other.
//!
//! ```text
//! ChatState
//! ├── messages: Option<Vec<Message>>   // None = not loaded yet (≠ empty)
//! ├── status: SessionStatus            // gates the input box
//! ├── error: Option<String>            // visible failure text
//! ├── history_epoch: u64               // last epoch handed out
//! ├── fetch_in_flight: Option<u64>     // epoch we're waiting on
//! ├── live_during_fetch: Vec<Message>  // merged back when the fetch lands
//! ├── history_attempt: u32             // retries used by the current fetch
//! └── max_history_retries: u32
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use crate::core::types::{Message, SessionStatus};

pub const DEFAULT_HISTORY_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatState {
    pub messages: Option<Vec<Message>>,
    pub status: SessionStatus,
    pub error: Option<String>,
    pub history_epoch: u64,
    pub fetch_in_flight: Option<u64>,
    pub live_during_fetch: Vec<Message>,
    pub history_attempt: u32,
    pub max_history_retries: u32,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_RETRIES)
    }
}

impl ChatState {
    pub fn new(max_history_retries: u32) -> Self {
        Self {
            messages: None,
            status: SessionStatus::Idle,
            error: None,
            history_epoch: 0,
            fetch_in_flight: None,
            live_during_fetch: Vec::new(),
            history_attempt: 0,
            max_history_retries,
        }
    }

    /// Hands out the epoch for a new history fetch. Any fetch still in flight
    /// becomes stale.
    pub fn begin_history_fetch(&mut self) -> u64 {
        self.history_epoch += 1;
        self.fetch_in_flight = Some(self.history_epoch);
        self.live_during_fetch.clear();
        self.history_attempt = 0;
        self.history_epoch
    }

    /// Forget the in-flight fetch without starting another one.
    pub fn invalidate_history_fetch(&mut self) {
        self.history_epoch += 1;
        self.fetch_in_flight = None;
        self.live_during_fetch.clear();
        self.history_attempt = 0;
    }

    pub fn is_loading(&self) -> bool {
        self.fetch_in_flight.is_some()
    }

    pub fn message_count(&self) -> usize {
        self.messages.as_ref().map_or(0, Vec::len)
    }
}
