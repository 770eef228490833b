//! # Actions
//!
//! Everything that can happen in Corpus becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! The service streams a token? That's `Action::Stream { generation, event }`.
//!
//! `update()` applies an action to the state and returns an `Effect`
//! describing any I/O the caller should start. No side effects here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info};

use crate::core::state::App;
use crate::rag::{AskRequest, StreamEvent};

pub const STATUS_SEARCHING: &str = "Searching course material...";
pub const STATUS_STREAMING: &str = "Answering...";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Submit(String),
    /// An event from the request started for `generation`.
    Stream { generation: u64, event: StreamEvent },
    Reset,
    ToggleDemoMode,
    CycleSemester,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    SpawnRequest { generation: u64, request: AskRequest },
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => {
            let history = app.conversation.history();
            let Some(generation) = app.conversation.ask(&text) else {
                debug!("Submit ignored (blank or still streaming)");
                return Effect::None;
            };

            let request = AskRequest {
                question: text.trim().to_string(),
                semester: app.filters.semester,
                subject_id: app.filters.subject_id.clone(),
                history,
            };
            info!(
                "Submitting question (generation {generation}, {} mode)",
                app.mode_label()
            );
            app.is_loading = true;
            app.status_message = STATUS_SEARCHING.to_string();
            Effect::SpawnRequest {
                generation,
                request,
            }
        }
        Action::Stream { generation, event } => {
            let terminal_status = match &event {
                StreamEvent::Done => Some("Answer complete".to_string()),
                StreamEvent::NoContext => Some("No relevant material found".to_string()),
                StreamEvent::Error(_) if app.demo_mode => Some("Request failed".to_string()),
                StreamEvent::Error(_) => {
                    Some("Request failed. Press Ctrl+D to try demo mode.".to_string())
                }
                StreamEvent::Token(_) | StreamEvent::Sources(_) => None,
            };
            let first_output = matches!(event, StreamEvent::Token(_)) && app.is_loading;

            if !app.conversation.apply(generation, event) {
                return Effect::None;
            }

            if let Some(status) = terminal_status {
                app.is_loading = false;
                app.status_message = status;
            } else if first_output {
                app.is_loading = false;
                app.status_message = STATUS_STREAMING.to_string();
            }
            Effect::None
        }
        Action::Reset => {
            app.conversation.reset();
            app.is_loading = false;
            app.status_message = "Conversation cleared".to_string();
            Effect::None
        }
        Action::ToggleDemoMode => {
            app.demo_mode = !app.demo_mode;
            info!("Switched to {} mode", app.mode_label());
            app.status_message = if app.demo_mode {
                "Demo mode: answers come from the built-in simulator".to_string()
            } else {
                format!("Live mode: {}", app.service_label)
            };
            Effect::None
        }
        Action::CycleSemester => {
            app.filters.cycle_semester();
            app.status_message = format!("Filter: {}", app.filters.label());
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::NO_CONTEXT_NOTICE;
    use crate::rag::{HistoryTurn, Role};
    use crate::test_support::test_app;

    fn submit(app: &mut App, text: &str) -> u64 {
        match update(app, Action::Submit(text.into())) {
            Effect::SpawnRequest { generation, .. } => generation,
            other => panic!("expected SpawnRequest, got {other:?}"),
        }
    }

    fn stream(app: &mut App, generation: u64, event: StreamEvent) {
        assert_eq!(update(app, Action::Stream { generation, event }), Effect::None);
    }

    #[test]
    fn submit_builds_request_with_filters_and_history() {
        let mut app = test_app();
        app.filters.semester = Some(4);
        app.filters.subject_id = Some("2".into());

        let g = submit(&mut app, "What is BFS?");
        stream(&mut app, g, StreamEvent::Token("Breadth-first.".into()));
        stream(&mut app, g, StreamEvent::Done);

        let effect = update(&mut app, Action::Submit(" and DFS? ".into()));
        let Effect::SpawnRequest { request, .. } = effect else {
            panic!("expected SpawnRequest");
        };
        assert_eq!(request.question, "and DFS?");
        assert_eq!(request.semester, Some(4));
        assert_eq!(request.subject_id.as_deref(), Some("2"));
        assert_eq!(
            request.history,
            vec![
                HistoryTurn {
                    role: Role::User,
                    content: "What is BFS?".into()
                },
                HistoryTurn {
                    role: Role::Assistant,
                    content: "Breadth-first.".into()
                },
            ]
        );
    }

    #[test]
    fn first_request_has_no_history() {
        let mut app = test_app();
        let effect = update(&mut app, Action::Submit("hello".into()));
        assert!(matches!(
            effect,
            Effect::SpawnRequest { ref request, .. } if request.history.is_empty()
        ));
    }

    #[test]
    fn submit_while_streaming_does_nothing() {
        let mut app = test_app();
        submit(&mut app, "first");
        assert_eq!(update(&mut app, Action::Submit("second".into())), Effect::None);
        assert_eq!(app.conversation.messages().len(), 2);
    }

    #[test]
    fn loading_until_first_token() {
        let mut app = test_app();
        let g = submit(&mut app, "q");
        assert!(app.is_loading);
        assert_eq!(app.status_message, STATUS_SEARCHING);

        stream(&mut app, g, StreamEvent::Sources(vec![]));
        assert!(app.is_loading);

        stream(&mut app, g, StreamEvent::Token("a".into()));
        assert!(!app.is_loading);
        assert_eq!(app.status_message, STATUS_STREAMING);

        stream(&mut app, g, StreamEvent::Done);
        assert_eq!(app.status_message, "Answer complete");
    }

    #[test]
    fn no_context_ends_loading() {
        let mut app = test_app();
        let g = submit(&mut app, "q");
        stream(&mut app, g, StreamEvent::NoContext);
        assert!(!app.is_loading);
        assert_eq!(app.conversation.messages()[1].content, NO_CONTEXT_NOTICE);
    }

    #[test]
    fn live_error_suggests_demo_mode() {
        let mut app = test_app();
        let g = submit(&mut app, "q");
        stream(&mut app, g, StreamEvent::Error("overloaded".into()));
        assert!(!app.is_loading);
        assert!(app.status_message.contains("Ctrl+D"));
        assert_eq!(app.conversation.messages()[1].content, "Error: overloaded");
    }

    #[test]
    fn stale_events_after_reset_change_nothing() {
        let mut app = test_app();
        let g = submit(&mut app, "q");
        update(&mut app, Action::Reset);
        assert!(!app.is_loading);

        stream(&mut app, g, StreamEvent::Token("ghost".into()));
        stream(&mut app, g, StreamEvent::Done);
        assert!(app.conversation.is_empty());
        assert_eq!(app.status_message, "Conversation cleared");
    }

    #[test]
    fn toggle_and_cycle_update_status() {
        let mut app = test_app();
        update(&mut app, Action::ToggleDemoMode);
        assert!(app.demo_mode);
        assert!(app.status_message.starts_with("Demo mode"));

        update(&mut app, Action::CycleSemester);
        assert_eq!(app.filters.semester, Some(1));
        assert_eq!(app.status_message, "Filter: Sem 1");
    }

    #[test]
    fn quit_returns_quit_effect() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
