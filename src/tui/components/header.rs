//! # Header Component
//!
//! Top bar: conversation title, server, and a live indicator.
//!
//! The indicator follows the session status:
//!
//! 1. **Waiting**: `● Writing...` (yellow), the other side is composing
//! 2. **Disconnected**: `● Offline` (red)
//! 3. **Otherwise**: `● Live` (green)
//!
//! A transient error (failed send) is appended after the indicator.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::core::types::SessionStatus;
use crate::tui::component::Component;

/// Rows the header occupies, including its bottom border.
pub const HEADER_HEIGHT: u16 = 3;

pub struct Header<'a> {
    pub title: &'a str,
    pub server: &'a str,
    pub status: SessionStatus,
    pub error: Option<&'a str>,
}

impl<'a> Header<'a> {
    pub fn new(title: &'a str, server: &'a str, status: SessionStatus, error: Option<&'a str>) -> Self {
        Self {
            title,
            server,
            status,
            error,
        }
    }

    fn indicator_color(&self) -> Color {
        match self.status {
            SessionStatus::Waiting => Color::Yellow,
            SessionStatus::Disconnected => Color::Red,
            SessionStatus::Idle | SessionStatus::Writing => Color::Green,
        }
    }
}

impl Component for Header<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let title_line = Line::from(vec![
            Span::styled(
                self.title.to_string(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", self.server),
                Style::default().fg(Color::DarkGray),
            ),
        ]);

        let mut status_spans = vec![
            Span::styled("● ", Style::default().fg(self.indicator_color())),
            Span::raw(self.status.label()),
        ];
        if let Some(error) = self.error {
            status_spans.push(Span::styled(
                format!("  {error}"),
                Style::default().fg(Color::Red),
            ));
        }

        let paragraph = Paragraph::new(vec![title_line, Line::from(status_spans)]).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(paragraph, area);
    }
}
