//! Demo provider: a local stand-in for the answering service.
//!
//! Produces the same event contract as the live client (sources first, then
//! tokens, then exactly one terminal) from a small built-in catalog, so the
//! interface can be explored without a backend.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::mpsc::Sender;

use crate::rag::{AnswerProvider, AskRequest, ProviderError, Source, StreamEvent};

pub const DEFAULT_TOKEN_DELAY: Duration = Duration::from_millis(40);

const MAX_SOURCES: usize = 3;

const DEMO_REPLY: [&str; 4] = [
    "I am currently in Demo Mode because I couldn't reach the backend server.",
    " In this mode, I can still show you how the interface works and provide pre-defined mock responses.",
    " Once the backend is online, I will be able to answer your questions by searching through your actual documents.",
    " How can I help you explore the interface today?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoRole {
    Hod,
    Faculty,
    Student,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoUser {
    pub email: &'static str,
    pub name: &'static str,
    pub role: DemoRole,
    /// Students are pinned to their own semester.
    pub semester: Option<u8>,
}

static DEMO_USERS: [DemoUser; 3] = [
    DemoUser {
        email: "hod@bca.edu",
        name: "Dr. Alice HOD",
        role: DemoRole::Hod,
        semester: None,
    },
    DemoUser {
        email: "faculty@bca.edu",
        name: "Prof. John Faculty",
        role: DemoRole::Faculty,
        semester: None,
    },
    DemoUser {
        email: "student@bca.edu",
        name: "Bob Student",
        role: DemoRole::Student,
        semester: Some(4),
    },
];

/// Who the demo is running as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSession {
    user: DemoUser,
}

impl DemoSession {
    /// Unknown emails fall back to the head-of-department account.
    pub fn sign_in(email: &str) -> Self {
        let email = email.trim();
        let user = DEMO_USERS
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .unwrap_or(&DEMO_USERS[0])
            .clone();
        Self { user }
    }

    pub fn user(&self) -> &DemoUser {
        &self.user
    }

    /// The semester a request is answered for. A student's own semester
    /// always wins over the requested one.
    pub fn effective_semester(&self, requested: Option<u8>) -> Option<u8> {
        match self.user.role {
            DemoRole::Student => self.user.semester.or(requested),
            DemoRole::Hod | DemoRole::Faculty => requested,
        }
    }
}

impl Default for DemoSession {
    fn default() -> Self {
        Self {
            user: DEMO_USERS[0].clone(),
        }
    }
}

struct CatalogEntry {
    subject_id: u32,
    semester: u8,
    code: &'static str,
    title: &'static str,
    page: u32,
    excerpt: &'static str,
    keywords: &'static [&'static str],
}

static CATALOG: [CatalogEntry; 6] = [
    CatalogEntry {
        subject_id: 1,
        semester: 4,
        code: "BCA401",
        title: "DBMS Lecture Notes - Unit 1",
        page: 12,
        excerpt: "Normalisation removes redundancy by decomposing relations into 1NF, 2NF and 3NF.",
        keywords: &["dbms", "database", "normal", "sql", "er "],
    },
    CatalogEntry {
        subject_id: 2,
        semester: 4,
        code: "BCA402",
        title: "Operating Systems Previous Year Papers",
        page: 3,
        excerpt: "Explain round-robin and shortest-job-first process scheduling with an example.",
        keywords: &["os", "operating", "process", "schedul", "memory"],
    },
    CatalogEntry {
        subject_id: 3,
        semester: 4,
        code: "BCA403",
        title: "Software Engineering Project Template",
        page: 5,
        excerpt: "The requirements chapter lists functional and non-functional requirements.",
        keywords: &["software", "sdlc", "requirement", "project"],
    },
    CatalogEntry {
        subject_id: 4,
        semester: 4,
        code: "BCA404",
        title: "Computer Networks Lab Manual",
        page: 21,
        excerpt: "BFS visits every neighbour before going deeper; DFS follows one path to its end.",
        keywords: &["network", "tcp", "socket", "bfs", "dfs", "graph"],
    },
    CatalogEntry {
        subject_id: 5,
        semester: 4,
        code: "BCA405",
        title: "Java Programming - Unit 2 Notes",
        page: 40,
        excerpt: "A class bundles state and behaviour; objects are its instances.",
        keywords: &["java", "class", "object", "inherit"],
    },
    CatalogEntry {
        subject_id: 6,
        semester: 6,
        code: "BCA601",
        title: "Python for Data Science - NumPy Basics",
        page: 7,
        excerpt: "NumPy arrays are homogeneous and support vectorised arithmetic.",
        keywords: &["python", "numpy", "pandas", "data"],
    },
];

impl CatalogEntry {
    fn relevance(&self, question: &str) -> usize {
        self.keywords.iter().filter(|k| question.contains(*k)).count()
    }
}

pub struct DemoProvider {
    session: DemoSession,
    token_delay: Duration,
    script: Option<Vec<StreamEvent>>,
}

impl DemoProvider {
    pub fn new(session: DemoSession, token_delay: Duration) -> Self {
        Self {
            session,
            token_delay,
            script: None,
        }
    }

    /// Replay `events` instead of generating a reply.
    ///
    /// The script is normalised to the provider contract: it is cut after its
    /// first terminal event, gets a trailing `Done` if it has none, and gets a
    /// leading empty `Sources` if it never sends one.
    pub fn scripted(events: Vec<StreamEvent>) -> Self {
        let mut events = events;
        if let Some(end) = events.iter().position(StreamEvent::is_terminal) {
            events.truncate(end + 1);
        } else {
            events.push(StreamEvent::Done);
        }
        if !events.iter().any(|e| matches!(e, StreamEvent::Sources(_))) {
            events.insert(0, StreamEvent::Sources(Vec::new()));
        }

        Self {
            session: DemoSession::default(),
            token_delay: Duration::ZERO,
            script: Some(events),
        }
    }

    /// The full event sequence this provider will send for `request`.
    pub fn plan(&self, request: &AskRequest) -> Vec<StreamEvent> {
        if let Some(script) = &self.script {
            return script.clone();
        }

        let sources = self.select_sources(request);
        if sources.is_empty() {
            return vec![StreamEvent::Sources(sources), StreamEvent::NoContext];
        }

        let reply = self.reply_text(&sources[0]);
        let mut events = vec![StreamEvent::Sources(sources)];
        events.extend(
            reply
                .split_inclusive(' ')
                .map(|word| StreamEvent::Token(word.to_string())),
        );
        events.push(StreamEvent::Done);
        events
    }

    fn select_sources(&self, request: &AskRequest) -> Vec<Source> {
        let semester = self.session.effective_semester(request.semester);
        let subject = request.subject_id.as_deref().map(str::trim);
        let question = request.question.to_lowercase();

        let mut matches: Vec<&CatalogEntry> = CATALOG
            .iter()
            .filter(|e| semester.is_none_or(|s| e.semester == s))
            .filter(|e| subject.is_none_or(|id| e.subject_id.to_string() == id))
            .collect();
        matches.sort_by_key(|e| std::cmp::Reverse(e.relevance(&question)));

        matches
            .into_iter()
            .take(MAX_SOURCES)
            .enumerate()
            .map(|(i, entry)| Source {
                resource_id: format!("demo-{}", entry.subject_id),
                title: entry.title.to_string(),
                code: entry.code.to_string(),
                score: 0.92 - 0.07 * i as f64,
                index: i + 1,
                page: Some(entry.page),
                text: Some(entry.excerpt.to_string()),
            })
            .collect()
    }

    fn reply_text(&self, top: &Source) -> String {
        let mut reply = format!("Hello {}. ", self.session.user().name);
        reply.extend(DEMO_REPLY);
        reply.push_str(&format!(
            " Answers cite their material inline, for example {} [1].",
            top.title
        ));
        reply
    }
}

#[async_trait]
impl AnswerProvider for DemoProvider {
    fn name(&self) -> &str {
        "demo"
    }

    async fn stream_answer(
        &self,
        request: &AskRequest,
        sender: Sender<StreamEvent>,
    ) -> Result<(), ProviderError> {
        let events = self.plan(request);
        info!(
            "Demo answer for {}: {} events",
            self.session.user().email,
            events.len()
        );

        for event in events {
            if matches!(event, StreamEvent::Token(_)) && !self.token_delay.is_zero() {
                tokio::time::sleep(self.token_delay).await;
            }
            debug!("Demo event: {}", event.kind());
            sender
                .send(event)
                .await
                .map_err(|_| ProviderError::ChannelClosed)?;
        }
        Ok(())
    }
}
