use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::session::ChatSession;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::header::HEADER_HEIGHT;
use crate::tui::components::input_box::INPUT_HEIGHT;
use crate::tui::components::{Header, LandingPage, LoadingView, MessageList};

pub const TITLE: &str = "Chatwire";

/// Which view fills the main area this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    StartPrompt,
    Conversation,
}

pub fn current_screen(session: &ChatSession, tui: &TuiState) -> Screen {
    match session.messages() {
        None => Screen::Loading,
        Some([]) if !tui.prompt_dismissed => Screen::StartPrompt,
        Some(_) => Screen::Conversation,
    }
}

pub fn draw_ui(frame: &mut Frame, session: &ChatSession, tui: &mut TuiState, server: &str) {
    let screen = current_screen(session, tui);

    if screen == Screen::StartPrompt {
        LandingPage.render(frame, frame.area());
        return;
    }

    use Constraint::{Length, Min};
    let [header_area, main_area, input_area] =
        Layout::vertical([Length(HEADER_HEIGHT), Min(0), Length(INPUT_HEIGHT)])
            .areas(frame.area());

    // The loading view already shows a history error
    let header_error = match screen {
        Screen::Loading => None,
        _ => session.error(),
    };
    Header::new(TITLE, server, session.status(), header_error).render(frame, header_area);

    match session.messages() {
        Some(messages) => MessageList::new(&mut tui.message_list, messages).render(frame, main_area),
        None => LoadingView {
            error: session.error(),
        }
        .render(frame, main_area),
    }

    tui.input_box.render(frame, input_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ChatError;
    use crate::core::types::SYSTEM_SENDER;
    use crate::test_support::{FakeHistory, Harness, message};
    use crate::transport::channel::EVENT_NEW_MESSAGE;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use serde_json::json;

    fn render_to_text(session: &ChatSession, tui: &mut TuiState) -> String {
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| draw_ui(f, session, tui, "http://localhost:3000"))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_loading_before_history() {
        let harness = Harness::new(FakeHistory::with_responses(vec![]));
        let mut session = harness.session();
        session.mount().unwrap();
        let mut tui = TuiState::new();

        assert_eq!(current_screen(&session, &tui), Screen::Loading);
        let text = render_to_text(&session, &mut tui);
        assert!(text.contains("Loading conversation..."));
        assert!(text.contains(TITLE));
    }

    #[tokio::test]
    async fn test_empty_history_shows_start_prompt() {
        let harness = Harness::new(FakeHistory::with_responses(vec![Ok(vec![])]));
        let mut session = harness.session();
        session.mount().unwrap();
        session.next().await;
        let mut tui = TuiState::new();

        assert_eq!(current_screen(&session, &tui), Screen::StartPrompt);
        assert!(render_to_text(&session, &mut tui).contains("Start new chat"));

        tui.prompt_dismissed = true;
        assert_eq!(current_screen(&session, &tui), Screen::Conversation);
        assert!(render_to_text(&session, &mut tui).contains("Write your message!"));
    }

    #[tokio::test]
    async fn test_conversation_renders_messages_and_status() {
        let history = vec![message(1, SYSTEM_SENDER, "welcome aboard")];
        let harness = Harness::new(FakeHistory::with_responses(vec![Ok(history)]));
        let mut session = harness.session();
        session.mount().unwrap();
        session.next().await;

        harness.channel.deliver(
            EVENT_NEW_MESSAGE,
            json!({"id": 2, "sender": "id-1", "message": "thanks", "date": "t2"}),
        );
        session.drain();

        let mut tui = TuiState::new();
        let text = render_to_text(&session, &mut tui);
        assert!(text.contains("welcome aboard"));
        assert!(text.contains("thanks"));
        assert!(text.contains("Live"));
    }

    #[tokio::test]
    async fn test_history_error_shows_retry_hint() {
        let harness = Harness::new(FakeHistory::with_responses(vec![
            Err(ChatError::history("refused")),
        ]));
        let mut session = harness.session_with(crate::SessionOptions {
            history_retries: 0,
            ..Default::default()
        });
        session.mount().unwrap();
        session.next().await;
        let mut tui = TuiState::new();

        let text = render_to_text(&session, &mut tui);
        assert!(text.contains("refused"));
        assert!(text.contains("Ctrl+R to retry"));
    }
}
