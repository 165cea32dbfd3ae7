//! Socket.IO client over a single WebSocket.
//!
//! `SocketChannel::open` returns immediately and connects in a background
//! task. Emits are queued on an unbounded channel; the task only starts
//! flushing that queue after the server acknowledges the namespace join, so
//! anything emitted before then goes out in order once connected.
//!
//! There is no reconnection. When the connection ends for any reason the task
//! dispatches `disconnect` and exits, and later emits fail with
//! `ChannelDisconnected`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::core::error::ChatError;
use crate::transport::channel::{
    EVENT_CONNECT, EVENT_DISCONNECT, EventHandler, HandlerRegistry, RESERVED_EVENTS,
    RealtimeChannel,
};
use crate::transport::protocol::{self, Packet};

/// Path the Socket.IO server listens on.
pub const SOCKET_IO_PATH: &str = "/socket.io/";

/// `http://host:3000` → `ws://host:3000/socket.io/?EIO=4&transport=websocket`.
pub fn socket_url(server_url: &str) -> String {
    let base = server_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{base}{SOCKET_IO_PATH}?EIO=4&transport=websocket")
}

pub struct SocketChannel {
    outgoing: mpsc::UnboundedSender<Packet>,
    handlers: Arc<HandlerRegistry>,
    connected: Arc<AtomicBool>,
}

impl SocketChannel {
    /// Start connecting to `server_url` (an `http(s)://` base URL).
    /// Must be called from inside a tokio runtime.
    pub fn open(server_url: &str) -> Arc<Self> {
        let url = socket_url(server_url);
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let handlers = Arc::new(HandlerRegistry::new());
        let connected = Arc::new(AtomicBool::new(false));

        info!("Opening real-time channel to {}", url);
        tokio::spawn(run_connection(
            url,
            outgoing_rx,
            handlers.clone(),
            connected.clone(),
        ));

        Arc::new(Self {
            outgoing,
            handlers,
            connected,
        })
    }
}

impl RealtimeChannel for SocketChannel {
    fn emit(&self, event: &str, payload: Value) -> Result<(), ChatError> {
        if RESERVED_EVENTS.contains(&event) {
            return Err(ChatError::SendFailed(format!(
                "'{event}' is a reserved event name"
            )));
        }
        debug!("emit {}", event);
        self.outgoing.send(Packet::event(event, payload)).map_err(|_| {
            debug!("'{}' dropped, connection closed", event);
            ChatError::ChannelDisconnected
        })
    }

    fn on(&self, event: &str, handler: EventHandler) {
        self.handlers.add(event, handler);
    }

    fn off_all(&self) {
        self.handlers.clear();
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_closed(&self) -> bool {
        self.outgoing.is_closed()
    }
}

async fn run_connection(
    url: String,
    mut outgoing: mpsc::UnboundedReceiver<Packet>,
    handlers: Arc<HandlerRegistry>,
    connected: Arc<AtomicBool>,
) {
    let reason = match connect_async(url.as_str()).await {
        Ok((ws, _response)) => {
            let (mut sink, mut stream) = ws.split();
            let mut joined = false;

            loop {
                tokio::select! {
                    frame = stream.next() => {
                        let text = match frame {
                            Some(Ok(WsMessage::Text(text))) => text,
                            Some(Ok(WsMessage::Close(_))) | None => break "server closed the connection".to_string(),
                            Some(Ok(_)) => continue, // binary/ping/pong frames carry nothing for us
                            Some(Err(e)) => break format!("read error: {e}"),
                        };
                        let packet = match protocol::decode(&text) {
                            Ok(packet) => packet,
                            Err(e) => {
                                warn!("Skipping frame: {}", e);
                                continue;
                            }
                        };
                        match packet {
                            Packet::Open(info) => {
                                debug!("engine.io open sid={} ping={}ms", info.sid, info.ping_interval);
                                if let Err(e) = sink.send(WsMessage::Text(protocol::encode(&Packet::Connect(None)))).await {
                                    break format!("write error: {e}");
                                }
                            }
                            Packet::Ping => {
                                if let Err(e) = sink.send(WsMessage::Text(protocol::encode(&Packet::Pong))).await {
                                    break format!("write error: {e}");
                                }
                            }
                            Packet::Connect(_) => {
                                info!("Real-time channel connected");
                                joined = true;
                                connected.store(true, Ordering::SeqCst);
                                handlers.dispatch(EVENT_CONNECT, Value::Null);
                            }
                            Packet::Event { name, data } => {
                                handlers.dispatch(&name, data);
                            }
                            Packet::ConnectError(data) => {
                                break format!("connect error: {data}");
                            }
                            Packet::Disconnect | Packet::Close => {
                                break "server disconnected".to_string();
                            }
                            Packet::Pong | Packet::Noop => {}
                        }
                    }
                    packet = outgoing.recv(), if joined => {
                        // The sender lives in SocketChannel, which outlives this task
                        let Some(packet) = packet else {
                            break "channel dropped".to_string();
                        };
                        if let Err(e) = sink.send(WsMessage::Text(protocol::encode(&packet))).await {
                            break format!("write error: {e}");
                        }
                    }
                }
            }
        }
        Err(e) => format!("connect failed: {e}"),
    };

    warn!("Real-time channel down: {}", reason);
    connected.store(false, Ordering::SeqCst);
    // Close the queue before telling listeners, so emits from a disconnect
    // handler already fail.
    outgoing.close();
    handlers.dispatch(EVENT_DISCONNECT, Value::String(reason));
}
