use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;
use serde_json::Value;

use crate::core::error::ChatError;

/// client → server: a new conversation should be set up server-side.
pub const EVENT_INITIALIZE_CHAT: &str = "initialize_chat";
/// client → server: the user sent a message.
pub const EVENT_MESSAGE_EMITTED: &str = "message_emitted";
/// server → client: a message was added to the conversation.
pub const EVENT_NEW_MESSAGE: &str = "new_message";
/// Dispatched locally once the namespace join is acknowledged.
pub const EVENT_CONNECT: &str = "connect";
/// Dispatched locally when the connection is lost. Payload is the reason.
pub const EVENT_DISCONNECT: &str = "disconnect";

/// Names the server side treats as lifecycle events; they can't be emitted.
pub const RESERVED_EVENTS: &[&str] = &[
    EVENT_CONNECT,
    "connect_error",
    EVENT_DISCONNECT,
    "disconnecting",
    "newListener",
    "removeListener",
];

pub type EventHandler = Box<dyn Fn(Value) + Send + Sync>;

/// A named-event, bidirectional message channel over a persistent connection.
///
/// One channel is shared by every session in the process. Emits are
/// fire-and-forget: `Ok` means the event was queued, not that the server
/// received it.
pub trait RealtimeChannel: Send + Sync {
    fn emit(&self, event: &str, payload: Value) -> Result<(), ChatError>;

    /// Register a handler. Several handlers may listen to the same event.
    fn on(&self, event: &str, handler: EventHandler);

    /// Remove every handler for every event.
    fn off_all(&self);

    fn is_connected(&self) -> bool;

    /// True once the connection has ended for good. A channel that is still
    /// connecting is neither connected nor closed.
    fn is_closed(&self) -> bool;
}

/// Event name → handlers. Handlers are called outside the lock, so a handler
/// may register or remove handlers itself.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Mutex<HashMap<String, Vec<Arc<EventHandler>>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, event: &str, handler: EventHandler) {
        let mut handlers = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
        handlers
            .entry(event.to_string())
            .or_default()
            .push(Arc::new(handler));
    }

    pub fn clear(&self) {
        self.handlers.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn count(&self, event: &str) -> usize {
        let handlers = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
        handlers.get(event).map_or(0, Vec::len)
    }

    /// Returns how many handlers were invoked.
    pub fn dispatch(&self, event: &str, payload: Value) -> usize {
        let targets: Vec<Arc<EventHandler>> = {
            let handlers = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
            handlers.get(event).cloned().unwrap_or_default()
        };
        if targets.is_empty() {
            debug!("No handler for event '{}'", event);
            return 0;
        }
        for handler in &targets {
            handler(payload.clone());
        }
        targets.len()
    }
}
