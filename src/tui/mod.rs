//! # TUI Adapter
//!
//! The ratatui-specific layer. Renders the `ChatSession` state and turns
//! key presses into session intents (send, start new chat, retry).
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! The loop polls the terminal for up to 100ms, then drains whatever the
//! background tasks reported. A frame is drawn only when an event arrived or
//! the session applied an action.

mod component;
mod components;
mod event;
mod ui;

use log::{info, warn};
use std::io::stdout;
use std::time::Duration;

use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;

use crate::core::session::ChatSession;
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::tui::ui::Screen;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// TUI-specific presentation state (not part of the session)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    /// Set once the user chose to start a chat, so an empty conversation
    /// shows the composer instead of the start prompt.
    pub prompt_dismissed: bool,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            prompt_dismissed: false,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)?;
        info!("Terminal modes enabled (mouse, bracketed paste)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste);
    }
}

fn start_new_chat(session: &mut ChatSession, tui: &mut TuiState) {
    match session.start_new_chat() {
        Ok(id) => {
            info!("Started conversation {}", id);
            tui.prompt_dismissed = true;
            tui.message_list = MessageListState::new();
        }
        Err(e) => warn!("Could not start a new chat: {}", e),
    }
}

/// Route one terminal event. Returns false when the user asked to quit.
fn handle_event(session: &mut ChatSession, tui: &mut TuiState, event: TuiEvent) -> bool {
    match event {
        TuiEvent::Quit => return false,
        TuiEvent::Resize => {}
        TuiEvent::NewChat => start_new_chat(session, tui),
        TuiEvent::Retry => {
            if let Err(e) = session.initialize_chat() {
                warn!("Retry failed: {}", e);
            }
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown => {
            tui.message_list.handle_event(&event);
        }
        TuiEvent::Submit if ui::current_screen(session, tui) == Screen::StartPrompt => {
            start_new_chat(session, tui);
        }
        _ => {
            if let Some(InputEvent::Submit(text)) = tui.input_box.handle_event(&event)
                && let Err(e) = session.send_message(&text)
            {
                warn!("Message not sent: {}", e);
            }
        }
    }
    true
}

/// Mount `session` and drive it until the user quits.
pub fn run(mut session: ChatSession, server: &str) -> std::io::Result<()> {
    if let Err(e) = session.mount() {
        warn!("Session failed to initialize: {}", e);
    }
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();
    let mut needs_redraw = true; // Force first frame

    loop {
        if session.drain() {
            needs_redraw = true;
        }

        // Sync InputBox props with session state
        tui.input_box.enabled = session.status().can_send();

        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &session, &mut tui, server))?;
            needs_redraw = false;
        }

        // Process first event + drain ALL pending events before next draw
        let first_event = poll_event_timeout(POLL_INTERVAL);
        if first_event.is_some() {
            needs_redraw = true;
        }
        let mut keep_running = true;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if !handle_event(&mut session, &mut tui, event) {
                keep_running = false;
                break;
            }
        }
        if !keep_running {
            break;
        }
    }

    session.unmount();
    ratatui::restore();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SessionStatus;
    use crate::test_support::{FakeHistory, Harness};
    use crate::transport::channel::{EVENT_INITIALIZE_CHAT, EVENT_MESSAGE_EMITTED};

    #[tokio::test]
    async fn test_enter_on_start_prompt_starts_chat() {
        let harness = Harness::new(FakeHistory::with_responses(vec![Ok(vec![])]));
        let mut session = harness.session();
        session.mount().unwrap();
        session.next().await;
        let mut tui = TuiState::new();
        let before = harness.channel.emits_named(EVENT_INITIALIZE_CHAT).len();

        assert!(handle_event(&mut session, &mut tui, TuiEvent::Submit));

        assert!(tui.prompt_dismissed);
        assert_eq!(harness.channel.emits_named(EVENT_INITIALIZE_CHAT).len(), before + 1);
        assert!(harness.channel.emits_named(EVENT_MESSAGE_EMITTED).is_empty());
    }

    #[tokio::test]
    async fn test_typed_message_is_sent() {
        let harness = Harness::new(FakeHistory::with_responses(vec![Ok(vec![])]));
        let mut session = harness.session();
        session.mount().unwrap();
        session.next().await;
        let mut tui = TuiState::new();
        tui.prompt_dismissed = true;

        for c in "hi".chars() {
            handle_event(&mut session, &mut tui, TuiEvent::InputChar(c));
        }
        handle_event(&mut session, &mut tui, TuiEvent::Submit);

        let sent = harness.channel.emits_named(EVENT_MESSAGE_EMITTED);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["message"], "hi");
        assert_eq!(session.status(), SessionStatus::Waiting);
    }

    #[tokio::test]
    async fn test_quit_stops_loop() {
        let harness = Harness::new(FakeHistory::with_responses(vec![]));
        let mut session = harness.session();
        let mut tui = TuiState::new();
        assert!(!handle_event(&mut session, &mut tui, TuiEvent::Quit));
    }
}
