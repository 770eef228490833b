//! # Application State
//!
//! Core business state for Corpus. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── conversation: Conversation            // messages + generation counter
//! ├── live_provider: Arc<dyn AnswerProvider> // answering service
//! ├── demo_provider: Arc<dyn AnswerProvider> // local simulator
//! ├── demo_mode: bool                       // which of the two is used
//! ├── filters: Filters                      // semester / subject sent with asks
//! ├── status_message: String                // status bar text
//! └── is_loading: bool                      // asked, no token or outcome yet
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use crate::core::config::{ResolvedConfig, SEMESTERS};
use crate::core::conversation::Conversation;
use crate::rag::{AnswerProvider, CorpusProvider, DemoProvider, DemoSession};

/// Retrieval filters attached to every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub semester: Option<u8>,
    pub subject_id: Option<String>,
    /// Subject from config or `--subject`, with the semester it was set for.
    configured_subject: Option<(Option<u8>, String)>,
}

impl Filters {
    pub fn new(semester: Option<u8>, subject_id: Option<String>) -> Self {
        Self {
            semester,
            configured_subject: subject_id.clone().map(|id| (semester, id)),
            subject_id,
        }
    }

    /// Step the semester through 1..=6 and back to "any". A subject belongs
    /// to one semester: it is cleared on the way out and the configured one
    /// comes back when the cycle returns to its semester.
    pub fn cycle_semester(&mut self) {
        self.semester = match self.semester {
            None => Some(*SEMESTERS.start()),
            Some(s) if s >= *SEMESTERS.end() => None,
            Some(s) => Some(s + 1),
        };
        self.subject_id = self
            .configured_subject
            .as_ref()
            .filter(|(semester, _)| *semester == self.semester)
            .map(|(_, id)| id.clone());
    }

    pub fn label(&self) -> String {
        let semester = match self.semester {
            Some(s) => format!("Sem {s}"),
            None => "All semesters".to_string(),
        };
        match &self.subject_id {
            Some(subject) => format!("{semester} · subject {subject}"),
            None => semester,
        }
    }
}

pub struct App {
    pub conversation: Conversation,
    pub live_provider: Arc<dyn AnswerProvider>,
    pub demo_provider: Arc<dyn AnswerProvider>,
    pub demo_mode: bool,
    pub filters: Filters,
    pub status_message: String,
    pub is_loading: bool,
    /// Where live requests go, for the title bar.
    pub service_label: String,
}

impl App {
    pub fn new(
        live_provider: Arc<dyn AnswerProvider>,
        demo_provider: Arc<dyn AnswerProvider>,
        demo_mode: bool,
    ) -> Self {
        Self {
            conversation: Conversation::new(),
            live_provider,
            demo_provider,
            demo_mode,
            filters: Filters::default(),
            status_message: String::from("Ask anything about your course material"),
            is_loading: false,
            service_label: String::new(),
        }
    }

    /// Build the app and both providers from resolved config.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        let live = CorpusProvider::new(Some(config.base_url.clone()), config.access_token.clone());
        let demo = DemoProvider::new(DemoSession::sign_in(&config.demo_user), config.token_delay);

        let mut app = Self::new(Arc::new(live), Arc::new(demo), config.demo_mode);
        app.filters = Filters::new(config.semester, config.subject_id.clone());
        app.service_label = config.base_url.clone();
        app
    }

    /// The provider new questions are sent to.
    pub fn provider(&self) -> Arc<dyn AnswerProvider> {
        if self.demo_mode {
            self.demo_provider.clone()
        } else {
            self.live_provider.clone()
        }
    }

    pub fn mode_label(&self) -> &'static str {
        if self.demo_mode { "demo" } else { "live" }
    }
}
