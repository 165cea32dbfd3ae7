//! # Actions
//!
//! Everything that can happen to a conversation becomes an `Action`.
//! History lands? That's `Action::HistoryLoaded`. The socket pushes a
//! message? That's `Action::MessageReceived`.
//!
//! The `update()` function takes the current state and an action, mutates the
//! state, and returns an `Effect` for the session to carry out. No I/O here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};

use crate::core::error::ChatError;
use crate::core::state::ChatState;
use crate::core::types::{Message, SessionStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A history fetch finished. `epoch` identifies which one.
    HistoryLoaded { epoch: u64, messages: Vec<Message> },
    /// A history fetch attempt failed.
    HistoryFailed { epoch: u64, error: ChatError },
    /// The channel delivered `new_message`.
    MessageReceived(Message),
    /// An outgoing message was handed to the channel.
    MessageSent,
    /// An outgoing message could not be handed to the channel.
    SendFailed(ChatError),
    /// The channel joined its namespace.
    ChannelConnected,
    /// The channel dropped. Carries the reason for logging.
    ChannelDisconnected(String),
    /// A new conversation identity replaced the previous one.
    ChatCreated,
    /// The identity could not be read or written.
    StorageFailed(ChatError),
}

/// Follow-up work the session must perform after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Re-run the fetch for `epoch`; `attempt` starts at 1.
    RetryHistory { epoch: u64, attempt: u32 },
}

pub fn update(state: &mut ChatState, action: Action) -> Effect {
    match action {
        Action::HistoryLoaded { epoch, messages } => {
            if state.fetch_in_flight != Some(epoch) {
                debug!(
                    "Discarding stale history (epoch {}, current {:?})",
                    epoch, state.fetch_in_flight
                );
                return Effect::None;
            }
            let live = std::mem::take(&mut state.live_during_fetch);
            let mut merged = messages;
            let fetched_len = merged.len();
            for msg in live {
                if !merged[..fetched_len].iter().any(|m| m.id == msg.id) {
                    merged.push(msg);
                }
            }
            info!(
                "History loaded: {} fetched, {} total after merge",
                fetched_len,
                merged.len()
            );
            state.messages = Some(merged);
            state.fetch_in_flight = None;
            state.history_attempt = 0;
            state.error = None;
            Effect::None
        }
        Action::HistoryFailed { epoch, error } => {
            if state.fetch_in_flight != Some(epoch) {
                debug!("Ignoring failure of stale history fetch (epoch {})", epoch);
                return Effect::None;
            }
            if state.history_attempt < state.max_history_retries {
                state.history_attempt += 1;
                warn!(
                    "History fetch failed ({}), retry {}/{}",
                    error, state.history_attempt, state.max_history_retries
                );
                return Effect::RetryHistory {
                    epoch,
                    attempt: state.history_attempt,
                };
            }
            warn!("History fetch gave up: {}", error);
            state.fetch_in_flight = None;
            state.live_during_fetch.clear();
            state.error = Some(error.to_string());
            Effect::None
        }
        Action::MessageReceived(msg) => {
            debug!("new_message id={} sender={}", msg.id, msg.sender);
            if state.fetch_in_flight.is_some() {
                state.live_during_fetch.push(msg.clone());
            }
            if msg.is_from_system() && state.status == SessionStatus::Waiting {
                state.status = SessionStatus::Idle;
            }
            state.messages.get_or_insert_with(Vec::new).push(msg);
            Effect::None
        }
        Action::MessageSent => {
            state.status = SessionStatus::Waiting;
            state.error = None;
            Effect::None
        }
        Action::SendFailed(error) => {
            warn!("{}", error);
            if state.status != SessionStatus::Disconnected {
                state.status = SessionStatus::Idle;
            }
            state.error = Some(error.to_string());
            Effect::None
        }
        Action::ChannelConnected => {
            if state.status == SessionStatus::Disconnected {
                state.status = SessionStatus::Idle;
            }
            // Without messages the error is what the loading view shows
            if state.messages.is_some() {
                state.error = None;
            }
            Effect::None
        }
        Action::ChannelDisconnected(reason) => {
            info!("Channel disconnected: {}", reason);
            state.status = SessionStatus::Disconnected;
            Effect::None
        }
        Action::ChatCreated => {
            // A fetch still in flight belongs to the previous identity
            state.invalidate_history_fetch();
            if state.status == SessionStatus::Waiting {
                state.status = SessionStatus::Idle;
            }
            state.error = None;
            Effect::None
        }
        Action::StorageFailed(error) => {
            warn!("{}", error);
            state.error = Some(error.to_string());
            Effect::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SYSTEM_SENDER;

    fn msg(id: i64, sender: &str, text: &str) -> Message {
        Message {
            id,
            sender: sender.to_string(),
            message: text.to_string(),
            date: format!("t{id}"),
        }
    }

    #[test]
    fn test_history_replaces_existing_messages() {
        let mut state = ChatState::default();
        state.messages = Some(vec![msg(9, "me", "old")]);
        let epoch = state.begin_history_fetch();
        let fetched = vec![msg(1, SYSTEM_SENDER, "a"), msg(2, "me", "b")];

        let effect = update(
            &mut state,
            Action::HistoryLoaded {
                epoch,
                messages: fetched.clone(),
            },
        );

        assert_eq!(effect, Effect::None);
        assert_eq!(state.messages, Some(fetched));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_stale_history_is_discarded() {
        let mut state = ChatState::default();
        let stale = state.begin_history_fetch();
        let _current = state.begin_history_fetch();

        update(
            &mut state,
            Action::HistoryLoaded {
                epoch: stale,
                messages: vec![msg(1, SYSTEM_SENDER, "stale")],
            },
        );

        assert!(state.messages.is_none());
        assert!(state.is_loading());
    }

    #[test]
    fn test_live_message_survives_in_flight_fetch() {
        let mut state = ChatState::default();
        let epoch = state.begin_history_fetch();
        let live = msg(3, SYSTEM_SENDER, "live");
        update(&mut state, Action::MessageReceived(live.clone()));

        update(
            &mut state,
            Action::HistoryLoaded {
                epoch,
                messages: vec![msg(1, "me", "a"), msg(2, SYSTEM_SENDER, "b")],
            },
        );

        let messages = state.messages.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2], live);
    }

    #[test]
    fn test_live_message_already_in_history_is_not_doubled() {
        let mut state = ChatState::default();
        let epoch = state.begin_history_fetch();
        update(&mut state, Action::MessageReceived(msg(2, SYSTEM_SENDER, "b")));

        update(
            &mut state,
            Action::HistoryLoaded {
                epoch,
                messages: vec![msg(1, "me", "a"), msg(2, SYSTEM_SENDER, "b")],
            },
        );

        assert_eq!(state.message_count(), 2);
    }

    #[test]
    fn test_live_delivery_appends_in_arrival_order() {
        let mut state = ChatState::default();
        state.messages = Some(vec![msg(1, "me", "a")]);
        let arrivals = vec![msg(5, SYSTEM_SENDER, "x"), msg(4, SYSTEM_SENDER, "y")];
        for m in arrivals.clone() {
            update(&mut state, Action::MessageReceived(m));
        }

        let mut expected = vec![msg(1, "me", "a")];
        expected.extend(arrivals);
        assert_eq!(state.messages, Some(expected));
    }

    #[test]
    fn test_receive_on_uninitialized_list() {
        let mut state = ChatState::default();
        let m = msg(1, SYSTEM_SENDER, "hi");
        update(&mut state, Action::MessageReceived(m.clone()));
        assert_eq!(state.messages, Some(vec![m]));
    }

    #[test]
    fn test_duplicate_live_ids_are_appended() {
        let mut state = ChatState::default();
        state.messages = Some(Vec::new());
        update(&mut state, Action::MessageReceived(msg(1, SYSTEM_SENDER, "hi")));
        update(&mut state, Action::MessageReceived(msg(1, SYSTEM_SENDER, "hi")));
        assert_eq!(state.message_count(), 2);
    }

    #[test]
    fn test_failure_retries_then_surfaces_error() {
        let mut state = ChatState::new(2);
        let epoch = state.begin_history_fetch();
        let fail = || Action::HistoryFailed {
            epoch,
            error: ChatError::history("refused"),
        };

        assert_eq!(update(&mut state, fail()), Effect::RetryHistory { epoch, attempt: 1 });
        assert_eq!(update(&mut state, fail()), Effect::RetryHistory { epoch, attempt: 2 });
        assert_eq!(update(&mut state, fail()), Effect::None);

        assert!(state.messages.is_none());
        assert!(!state.is_loading());
        assert_eq!(state.error.as_deref(), Some("unable to load messages: refused"));
    }

    #[test]
    fn test_success_clears_previous_error() {
        let mut state = ChatState::new(0);
        let epoch = state.begin_history_fetch();
        update(
            &mut state,
            Action::HistoryFailed {
                epoch,
                error: ChatError::history("refused"),
            },
        );
        assert!(state.error.is_some());

        let epoch = state.begin_history_fetch();
        update(&mut state, Action::HistoryLoaded { epoch, messages: vec![] });
        assert!(state.error.is_none());
        assert_eq!(state.messages, Some(vec![]));
    }

    #[test]
    fn test_send_waits_until_system_reply() {
        let mut state = ChatState::default();
        state.messages = Some(Vec::new());
        update(&mut state, Action::MessageSent);
        assert_eq!(state.status, SessionStatus::Waiting);

        // Our own echo doesn't release the input
        update(&mut state, Action::MessageReceived(msg(1, "abc", "hello")));
        assert_eq!(state.status, SessionStatus::Waiting);

        update(&mut state, Action::MessageReceived(msg(2, SYSTEM_SENDER, "hi")));
        assert_eq!(state.status, SessionStatus::Idle);
    }

    #[test]
    fn test_send_failure_releases_input() {
        let mut state = ChatState::default();
        update(&mut state, Action::SendFailed(ChatError::SendFailed("closed".into())));
        assert_eq!(state.status, SessionStatus::Idle);
        assert_eq!(state.error.as_deref(), Some("send failed: closed"));
    }

    #[test]
    fn test_disconnect_is_distinct_status() {
        let mut state = ChatState::default();
        update(&mut state, Action::ChannelDisconnected("server closed".into()));
        assert_eq!(state.status, SessionStatus::Disconnected);
        assert!(!state.status.can_send());

        update(&mut state, Action::ChannelConnected);
        assert_eq!(state.status, SessionStatus::Idle);
    }

    #[test]
    fn test_next_send_clears_send_error() {
        let mut state = ChatState::default();
        state.messages = Some(Vec::new());
        update(&mut state, Action::SendFailed(ChatError::ChannelDisconnected));
        assert!(state.error.is_some());

        update(&mut state, Action::MessageSent);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_reconnect_clears_error_only_once_loaded() {
        let mut state = ChatState::default();
        state.error = Some("unable to load messages: refused".into());
        update(&mut state, Action::ChannelConnected);
        assert!(state.error.is_some());

        state.messages = Some(Vec::new());
        update(&mut state, Action::ChannelConnected);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_new_chat_releases_waiting_but_not_disconnected() {
        let mut state = ChatState::default();
        update(&mut state, Action::MessageSent);
        update(&mut state, Action::ChatCreated);
        assert_eq!(state.status, SessionStatus::Idle);

        update(&mut state, Action::ChannelDisconnected("gone".into()));
        update(&mut state, Action::ChatCreated);
        assert_eq!(state.status, SessionStatus::Disconnected);
    }

    #[test]
    fn test_new_chat_makes_in_flight_fetch_stale() {
        let mut state = ChatState::default();
        let epoch = state.begin_history_fetch();
        update(&mut state, Action::ChatCreated);

        update(
            &mut state,
            Action::HistoryLoaded {
                epoch,
                messages: vec![msg(1, SYSTEM_SENDER, "old")],
            },
        );
        assert!(state.messages.is_none());
    }

    #[test]
    fn test_storage_failure_is_visible() {
        let mut state = ChatState::default();
        update(&mut state, Action::StorageFailed(ChatError::Storage("bad json".into())));
        assert_eq!(state.error.as_deref(), Some("storage error: bad json"));
        assert!(state.messages.is_none());
    }
}
