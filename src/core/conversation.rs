//! # Conversation
//!
//! The ordered list of turns and the streaming lifecycle of the last one.
//!
//! ```text
//!   ask("q") ──► [.., user "q", assistant "" (streaming)]
//!                                       │
//!       token ─► append     sources ─► replace
//!                                       │
//!       done / no_context / error ──► streaming = false (frozen)
//! ```
//!
//! At most one message streams at a time and it is always the last one.
//! Every `ask` (and every `reset`) bumps a generation counter; producers tag
//! their events with the generation they were started for, and events with
//! any other generation are ignored.

use log::debug;

use crate::rag::{HistoryTurn, Role, Source, StreamEvent, StreamHandler, dispatch};

pub const NO_CONTEXT_NOTICE: &str =
    "No relevant material found. Try different filters or rephrase.";

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    pub sources: Vec<Source>,
    pub streaming: bool,
    pub error: bool,
}

impl ConversationMessage {
    fn user(content: String) -> Self {
        Self {
            role: Role::User,
            content,
            sources: Vec::new(),
            streaming: false,
            error: false,
        }
    }

    fn pending_reply() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            sources: Vec::new(),
            streaming: true,
            error: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    generation: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_streaming(&self) -> bool {
        self.messages.last().is_some_and(|m| m.streaming)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Prior turns in the shape the service expects as `history`.
    pub fn history(&self) -> Vec<HistoryTurn> {
        self.messages
            .iter()
            .map(|m| HistoryTurn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    /// Start a new exchange. Returns the generation to tag its events with,
    /// or `None` if a reply is still streaming or the question is blank.
    pub fn ask(&mut self, question: &str) -> Option<u64> {
        let question = question.trim();
        if question.is_empty() || self.is_streaming() {
            return None;
        }

        self.messages.push(ConversationMessage::user(question.to_string()));
        self.messages.push(ConversationMessage::pending_reply());
        self.generation += 1;
        Some(self.generation)
    }

    /// Apply an event produced for `generation`. Returns false if it was
    /// stale and ignored.
    pub fn apply(&mut self, generation: u64, event: StreamEvent) -> bool {
        if generation != self.generation {
            debug!(
                "Ignoring stale {} (generation {generation}, current {})",
                event.kind(),
                self.generation
            );
            return false;
        }
        dispatch(event, self);
        true
    }

    /// Drop every message. Outstanding streams become stale.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.generation += 1;
    }

    /// Sources of the most recent assistant message that has any.
    pub fn latest_sources(&self) -> Option<&[Source]> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && !m.sources.is_empty())
            .map(|m| m.sources.as_slice())
    }

    fn streaming_reply(&mut self) -> Option<&mut ConversationMessage> {
        self.messages.last_mut().filter(|m| m.streaming)
    }
}

impl StreamHandler for Conversation {
    fn on_token(&mut self, text: String) {
        if let Some(reply) = self.streaming_reply() {
            reply.content.push_str(&text);
        }
    }

    fn on_sources(&mut self, sources: Vec<Source>) {
        if let Some(reply) = self.streaming_reply() {
            reply.sources = sources;
        }
    }

    fn on_done(&mut self) {
        if let Some(reply) = self.streaming_reply() {
            reply.streaming = false;
        }
    }

    fn on_no_context(&mut self) {
        if let Some(reply) = self.streaming_reply() {
            reply.content = NO_CONTEXT_NOTICE.to_string();
            reply.streaming = false;
        }
    }

    fn on_error(&mut self, message: String) {
        if let Some(reply) = self.streaming_reply() {
            reply.content = format!("Error: {message}");
            reply.streaming = false;
            reply.error = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(index: usize) -> Source {
        Source {
            resource_id: format!("r{index}"),
            title: format!("Unit {index}"),
            code: "BCA401".into(),
            score: 0.5,
            index,
            page: None,
            text: None,
        }
    }

    fn streaming_count(c: &Conversation) -> usize {
        c.messages().iter().filter(|m| m.streaming).count()
    }

    #[test]
    fn ask_appends_user_and_streaming_reply() {
        let mut c = Conversation::new();
        let generation = c.ask("  What is BFS? ").unwrap();
        assert_eq!(generation, 1);

        let messages = c.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What is BFS?");
        assert!(!messages[0].streaming);
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].streaming);
        assert!(messages[1].content.is_empty());
    }

    #[test]
    fn blank_question_is_ignored() {
        let mut c = Conversation::new();
        assert_eq!(c.ask("   \n"), None);
        assert!(c.is_empty());
        assert_eq!(c.generation(), 0);
    }

    #[test]
    fn ask_while_streaming_is_a_no_op() {
        let mut c = Conversation::new();
        c.ask("first").unwrap();
        let before = c.messages().to_vec();
        assert_eq!(c.ask("second"), None);
        assert_eq!(c.messages(), before.as_slice());
        assert_eq!(c.generation(), 1);
    }

    #[test]
    fn tokens_concatenate_in_order() {
        let mut c = Conversation::new();
        let g = c.ask("q").unwrap();
        for piece in ["BFS ", "", "is ", "fast."] {
            c.apply(g, StreamEvent::Token(piece.into()));
        }
        assert_eq!(c.messages()[1].content, "BFS is fast.");
        assert!(c.is_streaming());
    }

    #[test]
    fn sources_replace_previous_sources() {
        let mut c = Conversation::new();
        let g = c.ask("q").unwrap();
        c.apply(g, StreamEvent::Sources(vec![source(1), source(2)]));
        c.apply(g, StreamEvent::Sources(vec![source(3)]));
        assert_eq!(c.messages()[1].sources, vec![source(3)]);
    }

    #[test]
    fn done_freezes_content() {
        let mut c = Conversation::new();
        let g = c.ask("q").unwrap();
        c.apply(g, StreamEvent::Token("answer".into()));
        c.apply(g, StreamEvent::Done);
        c.apply(g, StreamEvent::Token(" late".into()));
        c.apply(g, StreamEvent::Error("late".into()));

        let reply = &c.messages()[1];
        assert_eq!(reply.content, "answer");
        assert!(!reply.streaming);
        assert!(!reply.error);
    }

    #[test]
    fn no_context_replaces_content_with_notice() {
        let mut c = Conversation::new();
        let g = c.ask("q").unwrap();
        c.apply(g, StreamEvent::Token("partial".into()));
        c.apply(g, StreamEvent::NoContext);
        let reply = &c.messages()[1];
        assert_eq!(reply.content, NO_CONTEXT_NOTICE);
        assert!(!reply.streaming);
        assert!(!reply.error);
    }

    #[test]
    fn error_marks_reply() {
        let mut c = Conversation::new();
        let g = c.ask("q").unwrap();
        c.apply(g, StreamEvent::Error("overloaded".into()));
        let reply = &c.messages()[1];
        assert_eq!(reply.content, "Error: overloaded");
        assert!(reply.error);
        assert!(!reply.streaming);
    }

    #[test]
    fn at_most_one_streaming_message_and_it_is_last() {
        let mut c = Conversation::new();
        for round in 0..3 {
            let g = c.ask(&format!("q{round}")).unwrap();
            assert_eq!(streaming_count(&c), 1);
            assert!(c.messages().last().unwrap().streaming);
            c.apply(g, StreamEvent::Token("a".into()));
            c.apply(g, StreamEvent::Done);
            assert_eq!(streaming_count(&c), 0);
        }
        assert_eq!(c.messages().len(), 6);
    }

    #[test]
    fn reset_makes_outstanding_events_stale() {
        let mut c = Conversation::new();
        let old = c.ask("q").unwrap();
        c.reset();
        assert!(c.is_empty());
        assert!(!c.apply(old, StreamEvent::Token("ghost".into())));

        let fresh = c.ask("again").unwrap();
        assert_ne!(fresh, old);
        assert!(!c.apply(old, StreamEvent::Token("ghost".into())));
        assert!(c.apply(fresh, StreamEvent::Token("real".into())));
        assert_eq!(c.messages()[1].content, "real");
    }

    #[test]
    fn history_lists_prior_turns() {
        let mut c = Conversation::new();
        let g = c.ask("What is BFS?").unwrap();
        c.apply(g, StreamEvent::Sources(vec![source(1)]));
        c.apply(g, StreamEvent::Token("Breadth-first [1].".into()));
        c.apply(g, StreamEvent::Done);

        let history = c.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].content, "Breadth-first [1].");
    }

    #[test]
    fn latest_sources_skips_replies_without_sources() {
        let mut c = Conversation::new();
        assert!(c.latest_sources().is_none());

        let g = c.ask("first").unwrap();
        c.apply(g, StreamEvent::Sources(vec![source(1)]));
        c.apply(g, StreamEvent::Done);
        let g = c.ask("second").unwrap();
        c.apply(g, StreamEvent::Sources(vec![]));
        c.apply(g, StreamEvent::NoContext);

        assert_eq!(c.latest_sources(), Some(&[source(1)][..]));
    }
}
