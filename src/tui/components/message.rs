use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::core::types::Message;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;
/// Bubbles never grow wider than this share of the list (numerator over 4).
const MAX_WIDTH_QUARTERS: u16 = 3;

/// A single chat bubble.
///
/// `MessageBubble` is a **transient component**: it's created fresh each frame with
/// the data it needs to render. Messages from `System` sit on the left in
/// gray; our own sit on the right in blue. The bubble title is the message
/// time.
///
/// [`MessageBubble::layout`] predicts the bubble size with `textwrap`, using the
/// same options `Paragraph` wraps with, so the list can size its scroll
/// canvas without rendering.
#[derive(Clone, Copy)]
pub struct MessageBubble<'a> {
    pub message: &'a Message,
}

/// Size and horizontal placement of a bubble within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleLayout {
    pub x_offset: u16,
    pub width: u16,
    pub height: u16,
}

fn wrap_options(width: usize) -> textwrap::Options<'static> {
    textwrap::Options::new(width)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

impl<'a> MessageBubble<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self { message }
    }

    /// Where the bubble goes in a row of `row_width` columns.
    pub fn layout(message: &Message, row_width: u16) -> BubbleLayout {
        let max_width = (row_width.saturating_mul(MAX_WIDTH_QUARTERS) / 4).max(HORIZONTAL_OVERHEAD + 1);
        let max_inner = max_width.saturating_sub(HORIZONTAL_OVERHEAD).max(1);

        let content = message.message.trim();
        let lines = if content.is_empty() {
            Vec::new()
        } else {
            textwrap::wrap(content, wrap_options(max_inner as usize))
        };

        let text_width = lines.iter().map(|l| l.width()).max().unwrap_or(0);
        let title_width = message.display_time().width();
        let inner = u16::try_from(text_width.max(title_width))
            .unwrap_or(u16::MAX)
            .clamp(1, max_inner);
        let width = inner.saturating_add(HORIZONTAL_OVERHEAD).min(row_width);
        // Ensure at least 1 content line even for an empty message
        let line_count = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        let height = line_count.max(1).saturating_add(VERTICAL_OVERHEAD);

        let x_offset = if message.is_from_system() {
            0
        } else {
            row_width.saturating_sub(width)
        };

        BubbleLayout {
            x_offset,
            width,
            height,
        }
    }
}

impl Widget for MessageBubble<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (style, alignment) = if self.message.is_from_system() {
            (Style::default().fg(Color::Gray), Alignment::Left)
        } else {
            (Style::default().fg(Color::Blue), Alignment::Right)
        };

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(style.add_modifier(Modifier::DIM))
            .title(self.message.display_time())
            .title_alignment(alignment)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        Paragraph::new(self.message.message.trim())
            .block(block)
            .style(style)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}
