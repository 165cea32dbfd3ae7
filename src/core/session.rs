//! # Chat Session
//!
//! Client-side view of one conversation. The session:
//!
//! - bootstraps the conversation identity (stored under `"uuid"`)
//! - loads history over HTTP and appends live `new_message` events
//! - sends user messages over the real-time channel
//!
//! ```text
//!   channel callbacks ─┐
//!   history fetches  ──┼──▶ Action channel ──▶ update(state) ──▶ Effect
//!   send_message()   ──┘                                          │
//!                                      retry fetch after backoff ◀┘
//! ```
//!
//! Background work never touches `ChatState` directly. It sends an `Action`,
//! and the owner of the session applies it with `drain()` (non-blocking, used
//! by the view loop) or `next().await`.
//!
//! Sent messages are not appended locally. They show up when the server
//! echoes them back as `new_message`.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::core::action::{Action, Effect, update};
use crate::core::config::{DEFAULT_RETRY_BASE_MS, ResolvedConfig};
use crate::core::error::ChatError;
use crate::core::state::{ChatState, DEFAULT_HISTORY_RETRIES};
use crate::core::storage::{IDENTITY_KEY, LocalStorage};
use crate::core::types::{ConversationId, IdGenerator, Message, SessionStatus};
use crate::transport::channel::{
    EVENT_CONNECT, EVENT_DISCONNECT, EVENT_INITIALIZE_CHAT, EVENT_MESSAGE_EMITTED,
    EVENT_NEW_MESSAGE, RealtimeChannel,
};
use crate::transport::history::HistoryService;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Extra attempts after a failed history fetch.
    pub history_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_base: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            history_retries: DEFAULT_HISTORY_RETRIES,
            retry_base: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
        }
    }
}

impl From<&ResolvedConfig> for SessionOptions {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            history_retries: config.history_retries,
            retry_base: Duration::from_millis(config.retry_base_ms),
        }
    }
}

impl SessionOptions {
    fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.retry_base.saturating_mul(1u32 << exponent)
    }
}

pub struct ChatSession {
    channel: Arc<dyn RealtimeChannel>,
    history: Arc<dyn HistoryService>,
    storage: Arc<dyn LocalStorage>,
    ids: Arc<dyn IdGenerator>,
    options: SessionOptions,
    state: ChatState,
    /// Identity the in-flight fetch was issued for (used by retries).
    fetch_target: Option<ConversationId>,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Action>,
    mounted: bool,
}

impl ChatSession {
    pub fn new(
        channel: Arc<dyn RealtimeChannel>,
        history: Arc<dyn HistoryService>,
        storage: Arc<dyn LocalStorage>,
        ids: Arc<dyn IdGenerator>,
        options: SessionOptions,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            channel,
            history,
            storage,
            ids,
            state: ChatState::new(options.history_retries),
            options,
            fetch_target: None,
            tx,
            rx,
            mounted: false,
        }
    }

    // ------------------------------------------------------------------------
    // UI-facing state
    // ------------------------------------------------------------------------

    /// `None` until history has loaded or a live message arrived.
    pub fn messages(&self) -> Option<&[Message]> {
        self.state.messages.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// The identity currently in storage. Always read fresh.
    pub fn stored_identity(&self) -> Result<Option<ConversationId>, ChatError> {
        Ok(self
            .storage
            .get_item(IDENTITY_KEY)?
            .filter(|id| !id.is_empty())
            .map(ConversationId::from))
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Subscribe to the channel and load the conversation. Calling it again
    /// while mounted does nothing.
    pub fn mount(&mut self) -> Result<(), ChatError> {
        if self.mounted {
            debug!("Session already mounted");
            return Ok(());
        }

        let tx = self.tx.clone();
        self.channel.on(
            EVENT_NEW_MESSAGE,
            Box::new(move |payload: Value| match serde_json::from_value::<Message>(payload) {
                Ok(msg) => {
                    if tx.send(Action::MessageReceived(msg)).is_err() {
                        debug!("new_message after session dropped");
                    }
                }
                Err(e) => warn!("Ignoring malformed new_message: {}", e),
            }),
        );

        let tx = self.tx.clone();
        self.channel.on(
            EVENT_CONNECT,
            Box::new(move |_| {
                if tx.send(Action::ChannelConnected).is_err() {
                    debug!("connect after session dropped");
                }
            }),
        );

        let tx = self.tx.clone();
        self.channel.on(
            EVENT_DISCONNECT,
            Box::new(move |reason: Value| {
                let reason = reason.as_str().unwrap_or("unknown").to_string();
                if tx.send(Action::ChannelDisconnected(reason)).is_err() {
                    debug!("disconnect after session dropped");
                }
            }),
        );

        // The channel may have connected or given up before anyone listened
        if self.channel.is_closed() {
            self.apply(Action::ChannelDisconnected(
                "closed before mount".to_string(),
            ));
        } else if self.channel.is_connected() {
            self.apply(Action::ChannelConnected);
        }

        self.mounted = true;
        info!("Session mounted");
        self.initialize_chat()
    }

    /// Detach every listener from the shared channel. In-flight fetches keep
    /// running; their results are still applied if the session is pumped.
    pub fn unmount(&mut self) {
        if self.mounted {
            self.channel.off_all();
            self.mounted = false;
            info!("Session unmounted");
        }
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Make sure an identity exists, then load its history in the background.
    pub fn initialize_chat(&mut self) -> Result<(), ChatError> {
        let stored = self.stored_identity();
        let id = match self.report_storage(stored)? {
            Some(id) => id,
            None => self.create_new_chat()?,
        };
        let epoch = self.state.begin_history_fetch();
        self.fetch_target = Some(id.clone());
        self.spawn_fetch(id, epoch, Duration::ZERO);
        Ok(())
    }

    /// Mint and persist a new identity, and tell the server about it.
    /// Returns the identity right away; nothing waits for the server.
    pub fn create_new_chat(&mut self) -> Result<ConversationId, ChatError> {
        let id = ConversationId::new(self.ids.generate());

        if let Err(e) = self
            .channel
            .emit(EVENT_INITIALIZE_CHAT, Value::String(id.as_str().to_string()))
        {
            warn!("initialize_chat not sent: {}", e);
        }
        let saved = self.storage.set_item(IDENTITY_KEY, id.as_str());
        self.report_storage(saved)?;

        self.apply(Action::ChatCreated);
        self.fetch_target = None;

        info!("Created conversation {}", id);
        Ok(id)
    }

    /// New identity plus a fresh history load for it.
    pub fn start_new_chat(&mut self) -> Result<ConversationId, ChatError> {
        let id = self.create_new_chat()?;
        self.initialize_chat()?;
        Ok(id)
    }

    /// Emit `message_emitted`. The text is sent as-is, empty or not, and is
    /// not added to `messages` until the server echoes it.
    pub fn send_message(&mut self, text: &str) -> Result<(), ChatError> {
        let stored = self.stored_identity();
        let id = match self.report_storage(stored)? {
            Some(id) => id,
            None => self.create_new_chat()?,
        };
        let payload = json!({ "message": text, "uuid": id.as_str() });

        match self.channel.emit(EVENT_MESSAGE_EMITTED, payload) {
            Ok(()) => {
                debug!("Sent message ({} bytes) to {}", text.len(), id);
                self.apply(Action::MessageSent);
                Ok(())
            }
            Err(e) => {
                self.apply(Action::SendFailed(e.clone()));
                Err(e)
            }
        }
    }

    /// Append one delivered message.
    pub fn ingest(&mut self, message: Message) {
        self.apply(Action::MessageReceived(message));
    }

    // ------------------------------------------------------------------------
    // Action pump
    // ------------------------------------------------------------------------

    /// Apply every pending action without waiting. Returns true if any were
    /// applied.
    pub fn drain(&mut self) -> bool {
        let mut applied = false;
        while let Ok(action) = self.rx.try_recv() {
            self.apply(action);
            applied = true;
        }
        applied
    }

    /// Wait for the next action, apply it, and return it.
    pub async fn next(&mut self) -> Option<Action> {
        let action = self.rx.recv().await?;
        self.apply(action.clone());
        Some(action)
    }

    /// Make a storage failure visible before handing it back.
    fn report_storage<T>(&mut self, result: Result<T, ChatError>) -> Result<T, ChatError> {
        if let Err(e) = &result {
            self.apply(Action::StorageFailed(e.clone()));
        }
        result
    }

    fn apply(&mut self, action: Action) {
        match update(&mut self.state, action) {
            Effect::None => {}
            Effect::RetryHistory { epoch, attempt } => {
                let Some(id) = self.fetch_target.clone() else {
                    return;
                };
                let delay = self.options.retry_delay(attempt);
                debug!("Retrying history for {} in {:?}", id, delay);
                self.spawn_fetch(id, epoch, delay);
            }
        }
    }

    fn spawn_fetch(&self, id: ConversationId, epoch: u64, delay: Duration) {
        let history = self.history.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let action = match history.fetch(&id).await {
                Ok(messages) => Action::HistoryLoaded { epoch, messages },
                Err(error) => Action::HistoryFailed { epoch, error },
            };
            if tx.send(action).is_err() {
                debug!("Session gone, dropping history result (epoch {})", epoch);
            }
        });
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.unmount();
    }
}
