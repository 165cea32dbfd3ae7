//! # TUI Components
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Created fresh each frame with the data they display:
//! - `Header`: title, server and live indicator
//! - `MessageBubble`: a single chat message
//! - `LandingPage` / `LoadingView`: placeholders for empty or missing history
//!
//! ### Stateful Components (Event-Driven)
//!
//! Hold local state that persists in `TuiState` and emit events:
//! - `InputBox`: message composer, disabled while a reply is pending
//! - `MessageList`: scrollable conversation that follows new messages
//!
//! Components receive session data as props and never reach into the
//! session themselves; the event loop turns their events into intents.

pub mod header;
pub mod input_box;
pub mod landing;
pub mod message;
pub mod message_list;

pub use header::Header;
pub use input_box::{InputBox, InputEvent};
pub use landing::{LandingPage, LoadingView};
pub use message_list::{MessageList, MessageListState};
