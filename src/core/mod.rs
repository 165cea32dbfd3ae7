//! # Core Chat Logic
//!
//! The conversation state machine. It knows nothing about terminals; the
//! real-time channel and history endpoint are reached through the traits in
//! [`crate::transport`].
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • ChatState            │
//!                    │  • Action / update()    │
//!                    │  • ChatSession          │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │  Socket.IO │      │    HTTP    │
//!     │  Adapter   │      │  channel   │      │  history   │
//!     │ (ratatui)  │      │            │      │ (reqwest)  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`]: `Message`, `ConversationId`, `SessionStatus`
//! - [`state`]: `ChatState`, everything the view renders
//! - [`action`]: the `Action` enum and the `update()` reducer
//! - [`session`]: `ChatSession`, the operations the view calls
//! - [`storage`]: durable key/value storage for the conversation identity
//! - [`config`]: layered configuration
//! - [`error`]: `ChatError`

pub mod action;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod storage;
pub mod types;
