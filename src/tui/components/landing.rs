//! # Landing Views
//!
//! Full-area placeholders shown instead of the message list:
//!
//! - `LandingPage`: the conversation exists but is empty; Enter starts it.
//! - `LoadingView`: history has not arrived yet, or loading failed
//!   (history or local storage).

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::tui::component::Component;

fn render_centered(frame: &mut Frame, area: Rect, lines: Vec<Line<'_>>) {
    let height = lines.len() as u16;
    let [middle] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, middle);
}

pub struct LandingPage;

impl Component for LandingPage {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                "Start new chat",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Enter",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        render_centered(frame, area, lines);
    }
}

pub struct LoadingView<'a> {
    pub error: Option<&'a str>,
}

impl Component for LoadingView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = match self.error {
            Some(error) => vec![
                Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red))),
                Line::from(""),
                Line::from(Span::styled(
                    "Ctrl+R to retry, Ctrl+N for a new chat",
                    Style::default().fg(Color::DarkGray),
                )),
            ],
            None => vec![Line::from(Span::styled(
                "Loading conversation...",
                Style::default().fg(Color::DarkGray),
            ))],
        };
        render_centered(frame, area, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render_to_text(component: &mut dyn Component) -> String {
        let backend = TestBackend::new(50, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| component.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_landing_prompt() {
        let text = render_to_text(&mut LandingPage);
        assert!(text.contains("Start new chat"));
        assert!(text.contains("Press Enter"));
    }

    #[test]
    fn test_loading_and_error() {
        assert!(render_to_text(&mut LoadingView { error: None }).contains("Loading conversation..."));

        let text = render_to_text(&mut LoadingView {
            error: Some("unable to load messages: refused"),
        });
        assert!(text.contains("unable to load messages: refused"));
        assert!(text.contains("Ctrl+R to retry"));
        assert!(text.contains("Ctrl+N for a new chat"));
    }
}
