//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::core::error::ChatError;
use crate::core::session::{ChatSession, SessionOptions};
use crate::core::storage::MemoryStorage;
use crate::core::types::{ConversationId, IdGenerator, Message};
use crate::transport::channel::{EventHandler, HandlerRegistry, RealtimeChannel};
use crate::transport::history::HistoryService;

/// In-process channel that records emits and lets tests push events.
pub struct FakeChannel {
    pub emitted: Mutex<Vec<(String, Value)>>,
    pub handlers: HandlerRegistry,
    pub connected: AtomicBool,
    pub closed: AtomicBool,
    pub fail_emits: AtomicBool,
}

impl FakeChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            emitted: Mutex::new(Vec::new()),
            handlers: HandlerRegistry::new(),
            connected: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            fail_emits: AtomicBool::new(false),
        })
    }

    /// Simulate the server pushing `event`.
    pub fn deliver(&self, event: &str, payload: Value) -> usize {
        self.handlers.dispatch(event, payload)
    }

    pub fn emits_named(&self, event: &str) -> Vec<Value> {
        self.emitted
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl RealtimeChannel for FakeChannel {
    fn emit(&self, event: &str, payload: Value) -> Result<(), ChatError> {
        if self.fail_emits.load(Ordering::SeqCst) {
            return Err(ChatError::ChannelDisconnected);
        }
        self.emitted.lock().unwrap().push((event.to_string(), payload));
        Ok(())
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
        self.closed.load(Ordering::SeqCst)
    }
}

/// Scripted history endpoint. Per-id scripts win over the shared queue;
/// unscripted fetches return an empty history. With a gate set, every fetch
/// waits for one `Notify` permit first.
#[derive(Default)]
pub struct FakeHistory {
    pub responses: Mutex<VecDeque<Result<Vec<Message>, ChatError>>>,
    pub by_id: Mutex<HashMap<String, VecDeque<Result<Vec<Message>, ChatError>>>>,
    pub requested: Mutex<Vec<ConversationId>>,
    pub gate: Option<Arc<Notify>>,
}

impl FakeHistory {
    pub fn with_responses(responses: Vec<Result<Vec<Message>, ChatError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        })
    }

    pub fn gated(responses: Vec<Result<Vec<Message>, ChatError>>, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            gate: Some(gate),
            ..Default::default()
        })
    }

    pub fn respond_for(&self, id: &str, response: Result<Vec<Message>, ChatError>) {
        self.by_id
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn requested_ids(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }
}

#[async_trait]
impl HistoryService for FakeHistory {
    async fn fetch(&self, id: &ConversationId) -> Result<Vec<Message>, ChatError> {
        self.requested.lock().unwrap().push(id.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let scripted = self
            .by_id
            .lock()
            .unwrap()
            .get_mut(id.as_str())
            .and_then(VecDeque::pop_front);
        if let Some(response) = scripted {
            return response;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Deterministic ids: `id-1`, `id-2`, ...
#[derive(Default)]
pub struct SequentialIds {
    pub issued: AtomicUsize,
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        format!("id-{n}")
    }
}

pub fn message(id: i64, sender: &str, text: &str) -> Message {
    Message {
        id,
        sender: sender.to_string(),
        message: text.to_string(),
        date: format!("t{id}"),
    }
}

/// Everything a session test needs to poke at.
pub struct Harness {
    pub channel: Arc<FakeChannel>,
    pub history: Arc<FakeHistory>,
    pub storage: Arc<MemoryStorage>,
    pub ids: Arc<SequentialIds>,
}

impl Harness {
    pub fn new(history: Arc<FakeHistory>) -> Self {
        Self {
            channel: FakeChannel::new(),
            history,
            storage: Arc::new(MemoryStorage::new()),
            ids: Arc::new(SequentialIds::default()),
        }
    }

    pub fn session(&self) -> ChatSession {
        self.session_with(SessionOptions::default())
    }

    pub fn session_with(&self, options: SessionOptions) -> ChatSession {
        ChatSession::new(
            self.channel.clone(),
            self.history.clone(),
            self.storage.clone(),
            self.ids.clone(),
            options,
        )
    }
}
