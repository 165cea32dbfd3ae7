//! Socket.IO v5 over Engine.IO v4, text frames only.
//!
//! Each WebSocket text frame carries one Engine.IO packet. The first character
//! is the Engine.IO type; `4` (message) wraps a Socket.IO packet whose own type
//! is the next character.
//!
//! ```text
//! 0{"sid":"..","pingInterval":25000,...}   open
//! 2 / 3                                     ping / pong
//! 40  /  40{"sid":".."}                     namespace connect (request / ack)
//! 41                                        namespace disconnect
//! 42["new_message",{...}]                   event
//! 44{"message":"not authorized"}           connect error
//! ```
//!
//! Only the default namespace is used. Namespaces and ack ids on incoming
//! frames are skipped rather than rejected.

use serde::Deserialize;
use serde_json::Value;

use crate::core::error::ChatError;

/// Handshake data the server sends in its Engine.IO open packet.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(OpenInfo),
    Close,
    Ping,
    Pong,
    Noop,
    /// Namespace join. Outgoing carries no payload; the server's ack may.
    Connect(Option<Value>),
    Disconnect,
    Event { name: String, data: Value },
    ConnectError(Value),
}

impl Packet {
    pub fn event(name: &str, data: Value) -> Self {
        Packet::Event {
            name: name.to_string(),
            data,
        }
    }
}

pub fn encode(packet: &Packet) -> String {
    match packet {
        Packet::Open(info) => format!(
            "0{}",
            serde_json::json!({
                "sid": info.sid,
                "pingInterval": info.ping_interval,
                "pingTimeout": info.ping_timeout,
            })
        ),
        Packet::Close => "1".to_string(),
        Packet::Ping => "2".to_string(),
        Packet::Pong => "3".to_string(),
        Packet::Noop => "6".to_string(),
        Packet::Connect(None) => "40".to_string(),
        Packet::Connect(Some(data)) => format!("40{data}"),
        Packet::Disconnect => "41".to_string(),
        Packet::Event { name, data } => {
            let args = Value::Array(vec![Value::String(name.clone()), data.clone()]);
            format!("42{args}")
        }
        Packet::ConnectError(data) => format!("44{data}"),
    }
}

pub fn decode(frame: &str) -> Result<Packet, ChatError> {
    let mut chars = frame.chars();
    let kind = chars
        .next()
        .ok_or_else(|| ChatError::Protocol("empty frame".to_string()))?;
    let rest = chars.as_str();

    match kind {
        '0' => serde_json::from_str(rest)
            .map(Packet::Open)
            .map_err(|e| ChatError::Protocol(format!("bad open packet: {e}"))),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '6' => Ok(Packet::Noop),
        '4' => decode_socket_packet(rest),
        other => Err(ChatError::Protocol(format!(
            "unsupported engine.io packet type '{other}'"
        ))),
    }
}

fn decode_socket_packet(body: &str) -> Result<Packet, ChatError> {
    let mut chars = body.chars();
    let kind = chars
        .next()
        .ok_or_else(|| ChatError::Protocol("empty socket.io packet".to_string()))?;
    let payload = skip_ack_id(skip_namespace(chars.as_str()));

    match kind {
        '0' => {
            if payload.is_empty() {
                Ok(Packet::Connect(None))
            } else {
                parse_json(payload).map(|v| Packet::Connect(Some(v)))
            }
        }
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(payload),
        '4' => parse_json(payload).map(Packet::ConnectError),
        other => Err(ChatError::Protocol(format!(
            "unsupported socket.io packet type '{other}'"
        ))),
    }
}

/// `/chat,42[...]` → `42[...]`. A namespace always starts with `/` and ends
/// at the first comma.
fn skip_namespace(s: &str) -> &str {
    if s.starts_with('/') {
        match s.find(',') {
            Some(i) => &s[i + 1..],
            None => "",
        }
    } else {
        s
    }
}

fn skip_ack_id(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn parse_json(s: &str) -> Result<Value, ChatError> {
    serde_json::from_str(s).map_err(|e| ChatError::Protocol(format!("bad payload: {e}")))
}

fn decode_event(payload: &str) -> Result<Packet, ChatError> {
    let value = parse_json(payload)?;
    let Value::Array(mut items) = value else {
        return Err(ChatError::Protocol("event payload is not an array".to_string()));
    };
    if items.is_empty() {
        return Err(ChatError::Protocol("event without a name".to_string()));
    }
    let name = match items.remove(0) {
        Value::String(name) => name,
        other => {
            return Err(ChatError::Protocol(format!("event name is not a string: {other}")));
        }
    };
    // Extra arguments beyond the first are ignored
    let data = if items.is_empty() {
        Value::Null
    } else {
        items.swap_remove(0)
    };
    Ok(Packet::Event { name, data })
}
