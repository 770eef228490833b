//! # MessageList Component
//!
//! Scrollable view of the conversation.
//!
//! `MessageList` is transient (created each frame) and wraps
//! `&'a mut MessageListState`, which lives in `TuiState` and keeps the scroll
//! position and cached message heights between frames. Only messages near
//! the viewport are rendered.

use std::ops::Range;

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::conversation::ConversationMessage;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

/// Scroll and layout state for the message list.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, follow new content to the bottom.
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
    /// Content continues below the viewport.
    pub has_unseen_content: bool,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
            has_unseen_content: false,
        }
    }

    fn max_offset(&self) -> u16 {
        self.layout
            .total_height()
            .saturating_sub(self.viewport_height)
    }

    /// Keep the offset inside the content.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-engage auto-scroll once the user has scrolled back to the end.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Forget everything; used when the conversation is cleared.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Scrollable conversation view. Created fresh each frame.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub messages: &'a [ConversationMessage],
    pub show_citations: bool,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        messages: &'a [ConversationMessage],
        show_citations: bool,
    ) -> Self {
        Self {
            state,
            messages,
            show_citations,
        }
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // scrollbar column
        let show_citations = self.show_citations;

        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(self.messages, content_width, show_citations);
        layout.heights.truncate(reusable);
        for message in self.messages.iter().skip(reusable) {
            let height = Message::new(message, show_citations).calculate_height(content_width);
            layout.heights.push(height);
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(self.messages.len(), content_width, show_citations);

        let total_height = layout.total_height();
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible = self.state.layout.visible_range(scroll_offset, area.height);

        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset = self.state.layout.top_of(visible.start);
        for i in visible {
            let height = self.state.layout.heights[i];
            let rect = Rect::new(0, y_offset, content_width, height);
            scroll_view.render_widget(Message::new(&self.messages[i], show_citations), rect);
            y_offset = y_offset.saturating_add(height);
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }
        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);

        let offset = self.state.scroll_state.offset().y;
        self.state.has_unseen_content = offset < total_height.saturating_sub(area.height);
    }
}

/// Lives on the state because `MessageList` is rebuilt every frame.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => {
                self.stick_to_bottom = true;
                self.scroll_state.scroll_to_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Cached message heights.
#[derive(Default)]
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    message_count: usize,
    content_width: u16,
    show_citations: bool,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many cached heights are still valid for `messages`.
    ///
    /// A width or citation toggle invalidates everything, as does a shorter
    /// list (the conversation was cleared). The message that was last when
    /// the cache was built, and the one that is last now, are re-measured:
    /// either may still be streaming or have finished between frames.
    pub fn reusable_count(
        &self,
        messages: &[ConversationMessage],
        content_width: u16,
        show_citations: bool,
    ) -> usize {
        if self.content_width != content_width
            || self.show_citations != show_citations
            || messages.len() < self.message_count
        {
            return 0;
        }
        self.heights
            .len()
            .min(self.message_count.saturating_sub(1))
            .min(messages.len().saturating_sub(1))
    }

    pub fn update_metadata(&mut self, message_count: usize, content_width: u16, show_citations: bool) {
        self.message_count = message_count;
        self.content_width = content_width;
        self.show_citations = show_citations;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    /// Canvas row where message `index` starts.
    pub fn top_of(&self, index: usize) -> u16 {
        match index {
            0 => 0,
            i => self.prefix_heights.get(i - 1).copied().unwrap_or(0),
        }
    }

    /// Messages overlapping the viewport, padded by half a screen each way.
    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end.max(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::Role;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn msg(role: Role, content: &str) -> ConversationMessage {
        ConversationMessage {
            role,
            content: content.into(),
            sources: Vec::new(),
            streaming: false,
            error: false,
        }
    }

    fn cached(heights: Vec<u16>, width: u16, citations: bool) -> LayoutCache {
        let mut cache = LayoutCache::new();
        cache.update_metadata(heights.len(), width, citations);
        cache.heights = heights;
        cache.rebuild_prefix_heights();
        cache
    }

    #[test]
    fn last_message_is_always_remeasured() {
        let cache = cached(vec![3, 3], 80, false);
        let messages = vec![msg(Role::User, "q"), msg(Role::Assistant, "a")];
        assert_eq!(cache.reusable_count(&messages, 80, false), 1);
    }

    #[test]
    fn appended_messages_keep_settled_heights() {
        let cache = cached(vec![3, 3], 80, false);
        let messages = vec![
            msg(Role::User, "q"),
            msg(Role::Assistant, "a"),
            msg(Role::User, "q2"),
            msg(Role::Assistant, ""),
        ];
        assert_eq!(cache.reusable_count(&messages, 80, false), 1);
    }

    #[test]
    fn width_toggle_or_clear_invalidates() {
        let cache = cached(vec![3, 3], 80, false);
        let messages = vec![msg(Role::User, "q"), msg(Role::Assistant, "a")];
        assert_eq!(cache.reusable_count(&messages, 40, false), 0);
        assert_eq!(cache.reusable_count(&messages, 80, true), 0);
        assert_eq!(cache.reusable_count(&messages[..1], 80, false), 0);
    }

    #[test]
    fn visible_range_covers_viewport_with_buffer() {
        let cache = cached(vec![10; 10], 80, false);
        assert_eq!(cache.visible_range(0, 10), 0..2);
        assert_eq!(cache.visible_range(50, 10), 4..7);
        assert_eq!(cache.top_of(4), 40);
        assert_eq!(cache.total_height(), 100);
    }

    #[test]
    fn scrolling_up_unpins_and_end_repins() {
        let mut state = MessageListState::new();
        state.layout = cached(vec![10; 5], 80, false);
        state.viewport_height = 10;
        state.scroll_state.set_offset(Position { x: 0, y: 40 });

        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.stick_to_bottom);

        state.handle_event(&TuiEvent::ScrollDown);
        assert!(state.stick_to_bottom);
    }

    #[test]
    fn render_shows_streaming_reply_as_it_grows() {
        let mut state = MessageListState::new();
        let mut messages = vec![msg(Role::User, "What is BFS?")];
        let mut reply = msg(Role::Assistant, "");
        reply.streaming = true;
        messages.push(reply);

        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        for chunk in ["Breadth ", "first ", "search ", "visits ", "level ", "by ", "level."] {
            messages[1].content.push_str(chunk);
            terminal
                .draw(|f| MessageList::new(&mut state, &messages, false).render(f, f.area()))
                .unwrap();
        }

        assert!(state.stick_to_bottom);
        assert!(!state.has_unseen_content);
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("level."));
    }
}
