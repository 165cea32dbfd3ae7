//! # Transports
//!
//! The two remote collaborators a chat session talks to:
//!
//! - [`channel`]: the named-event real-time channel (`RealtimeChannel`), with
//!   [`socket::SocketChannel`] as the Socket.IO implementation
//! - [`history`]: the REST history endpoint (`HistoryService`), with
//!   [`history::HttpHistory`] as the reqwest implementation
//!
//! [`protocol`] holds the Socket.IO frame codec used by the socket channel.

pub mod channel;
pub mod history;
pub mod protocol;
pub mod socket;

pub use channel::{EventHandler, RealtimeChannel};
pub use history::{HistoryService, HttpHistory};
pub use socket::SocketChannel;
