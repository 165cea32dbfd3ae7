//! Chatwire library exports for testing

use clap::ValueEnum;

pub mod core;
pub mod transport;
pub mod tui;

#[cfg(test)]
pub mod test_support;

pub use crate::core::error::ChatError;
pub use crate::core::session::{ChatSession, SessionOptions};
pub use crate::core::types::{ConversationId, Message, SessionStatus};

/// Where the conversation identity is kept.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Storage {
    #[default]
    File,
    Memory,
}

impl From<Storage> for crate::core::config::StorageBackend {
    fn from(value: Storage) -> Self {
        match value {
            Storage::File => crate::core::config::StorageBackend::File,
            Storage::Memory => crate::core::config::StorageBackend::Memory,
        }
    }
}
