use std::fmt;

use serde::{Deserialize, Serialize};

/// Sender value that marks a message as coming from the other side of the
/// conversation rather than from this client.
pub const SYSTEM_SENDER: &str = "System";

/// A single chat entry as delivered by the server.
///
/// The `id` is assigned remotely and only unique within one conversation.
/// `date` is display-only and never used for ordering.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub message: String,
    pub date: String,
}

impl Message {
    /// True when the message should be rendered as received, not sent by us.
    pub fn is_from_system(&self) -> bool {
        self.sender == SYSTEM_SENDER
    }

    /// Short display form of `date`: local `HH:MM` when it parses as RFC 3339,
    /// the raw string otherwise.
    pub fn display_time(&self) -> String {
        match chrono::DateTime::parse_from_rfc3339(&self.date) {
            Ok(dt) => dt
                .with_timezone(&chrono::Local)
                .format("%H:%M")
                .to_string(),
            Err(_) => self.date.clone(),
        }
    }
}

/// Opaque token identifying one conversation, persisted client-side.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Whether the input affordance is usable, and why not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Ready to send.
    #[default]
    Idle,
    /// User is composing. Reserved; nothing sets it yet.
    Writing,
    /// A message was sent and we're waiting for the other side.
    Waiting,
    /// The real-time channel dropped.
    Disconnected,
}

impl SessionStatus {
    pub fn can_send(self) -> bool {
        self == SessionStatus::Idle
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Idle | SessionStatus::Writing => "Live",
            SessionStatus::Waiting => "Writing...",
            SessionStatus::Disconnected => "Offline",
        }
    }
}

/// Produces fresh, globally unique identity tokens.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// UUID v4 identity generator.
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
