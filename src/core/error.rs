use std::fmt;

/// Errors surfaced by the chat session and its transports.
///
/// None of these are fatal to the process. The worst case is a conversation
/// that stays in its loading state with the error text shown.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatError {
    /// History load failed: network error, non-2xx status, or a body that isn't
    /// a JSON array of messages. `status` is set when the server answered.
    HistoryFetchFailed {
        status: Option<u16>,
        message: String,
    },
    /// The real-time channel is gone.
    ChannelDisconnected,
    /// An outgoing event could not be handed to the connection.
    SendFailed(String),
    /// Durable client storage could not be read or written.
    Storage(String),
    /// A frame on the wire didn't decode as Socket.IO.
    Protocol(String),
}

impl ChatError {
    pub fn history(message: impl Into<String>) -> Self {
        ChatError::HistoryFetchFailed {
            status: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::HistoryFetchFailed {
                status: Some(status),
                message,
            } => write!(f, "unable to load messages (HTTP {status}): {message}"),
            ChatError::HistoryFetchFailed {
                status: None,
                message,
            } => write!(f, "unable to load messages: {message}"),
            ChatError::ChannelDisconnected => write!(f, "channel disconnected"),
            ChatError::SendFailed(msg) => write!(f, "send failed: {msg}"),
            ChatError::Storage(msg) => write!(f, "storage error: {msg}"),
            ChatError::Protocol(msg) => write!(f, "protocol error: {msg}"),
        }
    }
}

impl std::error::Error for ChatError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_error_display_includes_status() {
        let err = ChatError::HistoryFetchFailed {
            status: Some(503),
            message: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "unable to load messages (HTTP 503): busy");
    }

    #[test]
    fn test_history_helper_has_no_status() {
        let err = ChatError::history("connection refused");
        assert_eq!(err.to_string(), "unable to load messages: connection refused");
    }
}
