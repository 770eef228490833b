use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::sources_panel::{MIN_TERMINAL_WIDTH, PANEL_WIDTH};
use crate::tui::components::{LandingPage, MessageList, SourcesPanel, TitleBar};

const DEMO_LABEL: &str = "demo simulator";

/// What the title bar and landing page name as the answer source.
fn source_label(app: &App) -> &str {
    if app.demo_mode {
        DEMO_LABEL
    } else {
        &app.service_label
    }
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};

    let input_height = tui.input_box.calculate_height(frame.area().width);
    let [title_area, main_area, input_area] =
        Layout::vertical([Length(1), Min(0), Length(input_height)]).areas(frame.area());

    if app.conversation.is_empty() {
        LandingPage::new(source_label(app), tui.suggestion_index).render(frame, main_area);
    } else {
        let sources = app.conversation.latest_sources();
        let show_panel = tui.show_citations
            && sources.is_some()
            && main_area.width >= MIN_TERMINAL_WIDTH;

        let (list_area, panel_area) = if show_panel {
            let [list, panel] =
                Layout::horizontal([Min(0), Length(PANEL_WIDTH)]).areas(main_area);
            (list, Some(panel))
        } else {
            (main_area, None)
        };

        MessageList::new(
            &mut tui.message_list,
            app.conversation.messages(),
            tui.show_citations,
        )
        .render(frame, list_area);

        if let (Some(area), Some(sources)) = (panel_area, sources) {
            SourcesPanel::new(sources).render(frame, area);
        }
    }

    TitleBar {
        mode: app.mode_label(),
        service: source_label(app),
        filters: app.filters.label(),
        status_message: &app.status_message,
        is_loading: app.is_loading,
        spinner_frame,
        has_unseen_content: tui.message_list.has_unseen_content,
    }
    .render(frame, title_area);

    tui.input_box.disabled = app.conversation.is_streaming();
    tui.input_box.render(frame, input_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, update};
    use crate::rag::{Source, StreamEvent};
    use crate::test_support::test_app;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(app: &App, tui: &mut TuiState, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw_ui(f, app, tui, 0)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn answered_app() -> App {
        let mut app = test_app();
        update(&mut app, Action::Submit("What is BFS?".into()));
        let generation = app.conversation.generation();
        let source = Source {
            resource_id: "7".into(),
            title: "Graph Algorithms".into(),
            code: "BCA404".into(),
            score: 0.88,
            index: 1,
            page: Some(3),
            text: Some("BFS visits vertices level by level.".into()),
        };
        for event in [
            StreamEvent::Sources(vec![source]),
            StreamEvent::Token("BFS uses a queue [1].".into()),
            StreamEvent::Done,
        ] {
            update(&mut app, Action::Stream { generation, event });
        }
        app
    }

    #[test]
    fn empty_conversation_shows_landing_page() {
        let app = test_app();
        let mut tui = TuiState::new();
        let screen = draw(&app, &mut tui, 100, 24);
        assert!(screen.contains("Explain BFS and DFS with examples"));
        assert!(screen.contains("Corpus [live]"));
        assert!(screen.contains("Ask about your course material"));
    }

    #[test]
    fn answer_with_sources_shows_panel_on_wide_terminal() {
        let app = answered_app();
        let mut tui = TuiState::new();
        let screen = draw(&app, &mut tui, 120, 30);
        assert!(screen.contains("What is BFS?"));
        assert!(screen.contains("BFS uses a queue [1]."));
        assert!(screen.contains("Sources (1)"));
        assert!(screen.contains("Answer complete"));
    }

    #[test]
    fn narrow_terminal_or_hidden_citations_drop_panel() {
        let app = answered_app();
        let mut tui = TuiState::new();
        assert!(!draw(&app, &mut tui, 60, 30).contains("Sources (1)"));

        tui.show_citations = false;
        assert!(!draw(&app, &mut tui, 120, 30).contains("Sources (1)"));
    }

    #[test]
    fn input_is_disabled_while_streaming() {
        let mut app = test_app();
        update(&mut app, Action::Submit("q".into()));
        let mut tui = TuiState::new();
        let screen = draw(&app, &mut tui, 100, 24);
        assert!(tui.input_box.disabled);
        assert!(screen.contains("waiting for the answer"));
    }
}
