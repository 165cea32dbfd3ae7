//! # MessageList Component
//!
//! Scrollable view of the conversation.
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the message slice
//! (props). Bubble sizes are measured up front so the scroll position can be
//! resolved before anything is drawn.
//!
//! ## Scrolling
//!
//! The scroll offset lives in `MessageListState` as a `usize` row over the
//! whole conversation, so long histories never overflow terminal
//! coordinates. Each frame only the bubbles that intersect the viewport are
//! laid out on a `ScrollView` canvas, and the scrollbar is drawn separately
//! against the full content height.
//!
//! The list sticks to the bottom until the user scrolls up, and snaps back
//! to the bottom whenever the message count grows.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::types::Message;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::MessageBubble;
use crate::tui::event::TuiEvent;

/// Blank rows between bubbles.
const BUBBLE_GAP: usize = 1;

/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    /// First content row shown at the top of the viewport
    pub offset: usize,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Message count at the last render
    pub last_count: usize,
    /// Total content height at the last render
    pub content_height: usize,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            offset: 0,
            stick_to_bottom: true,
            last_count: 0,
            content_height: 0,
            viewport_height: 0,
        }
    }

    fn max_offset(&self) -> usize {
        self.content_height
            .saturating_sub(usize::from(self.viewport_height))
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        self.offset = self.offset.min(self.max_offset());
    }

    /// Re-engage auto-scroll once the user is back at the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        self.clamp_scroll();
        if self.offset >= self.max_offset() {
            self.stick_to_bottom = true;
        }
    }

    fn page(&self) -> usize {
        usize::from(self.viewport_height.max(1))
    }
}

impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<()> {
        match event {
            TuiEvent::ScrollUp => {
                self.stick_to_bottom = false;
                self.clamp_scroll();
                self.offset = self.offset.saturating_sub(1);
            }
            TuiEvent::ScrollPageUp => {
                self.stick_to_bottom = false;
                self.clamp_scroll();
                self.offset = self.offset.saturating_sub(self.page());
            }
            TuiEvent::ScrollDown => {
                self.offset = self.offset.saturating_add(1);
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageDown => {
                self.offset = self.offset.saturating_add(self.page());
                self.repin_if_at_bottom();
            }
            _ => return None,
        }
        Some(())
    }
}

pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub messages: &'a [Message],
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut MessageListState, messages: &'a [Message]) -> Self {
        Self { state, messages }
    }
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area

        // 1. Measure every bubble; tops/bottoms are absolute content rows
        let layouts: Vec<_> = self
            .messages
            .iter()
            .map(|m| MessageBubble::layout(m, content_width))
            .collect();
        let mut tops = Vec::with_capacity(layouts.len());
        let mut bottoms = Vec::with_capacity(layouts.len());
        let mut y: usize = 0;
        for layout in &layouts {
            tops.push(y);
            y += usize::from(layout.height);
            bottoms.push(y);
            y += BUBBLE_GAP;
        }
        let total_height = bottoms.last().copied().unwrap_or(0);

        // 2. Resolve the scroll position
        self.state.content_height = total_height;
        self.state.viewport_height = area.height;

        if self.messages.len() > self.state.last_count {
            self.state.stick_to_bottom = true;
        }
        self.state.last_count = self.messages.len();

        if self.state.stick_to_bottom {
            self.state.offset = self.state.max_offset();
        } else {
            self.state.clamp_scroll();
        }
        let view_top = self.state.offset;
        let view_bottom = view_top + usize::from(area.height);

        // 3. Lay out only the bubbles that intersect the viewport
        let first = bottoms.partition_point(|&b| b <= view_top);
        let last = tops.partition_point(|&t| t < view_bottom);
        if first >= last {
            return;
        }
        let slice_top = tops[first];
        // The canvas reaches the bottom of the view, otherwise ScrollView resets the offset
        let slice_bottom = bottoms[last - 1].max(view_bottom);
        let slice_height = u16::try_from(slice_bottom - slice_top).unwrap_or(u16::MAX);

        let mut scroll_view = ScrollView::new(Size::new(content_width, slice_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Never)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        for i in first..last {
            let Ok(y) = u16::try_from(tops[i] - slice_top) else {
                break;
            };
            let layout = layouts[i];
            let rect = Rect::new(layout.x_offset, y, layout.width, layout.height);
            scroll_view.render_widget(MessageBubble::new(&self.messages[i]), rect);
        }

        let mut scroll_state = ScrollViewState::default();
        scroll_state.set_offset(Position {
            x: 0,
            y: u16::try_from(view_top - slice_top).unwrap_or(u16::MAX),
        });
        frame.render_stateful_widget(scroll_view, area, &mut scroll_state);

        // 4. Scrollbar against the whole conversation
        let max_offset = self.state.max_offset();
        if max_offset > 0 {
            let mut scrollbar_state = ScrollbarState::new(max_offset).position(view_top);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                area,
                &mut scrollbar_state,
            );
        }
    }
}
