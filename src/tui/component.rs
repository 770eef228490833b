use ratatui::Frame;
use ratatui::layout::Rect;

/// A piece of the screen.
///
/// Components are built each frame from borrowed app data and draw into the
/// `Rect` they are given. `render` takes `&mut self` so a component that
/// wraps persistent state (scroll offsets, cached heights) can update it
/// while drawing, as Ratatui's `StatefulWidget` does.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// Something that reacts to terminal input.
pub trait EventHandler {
    /// The higher-level event this handler reports back, if any.
    type Event;

    /// Consume a `TuiEvent`, returning `Some` when the owner must act on it.
    fn handle_event(&mut self, event: &super::event::TuiEvent) -> Option<Self::Event>;
}
