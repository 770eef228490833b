//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::core::state::App;
use crate::rag::{AnswerProvider, AskRequest, DemoProvider, DemoSession, ProviderError, StreamEvent};

/// A no-op provider for tests that don't need real network calls.
pub struct NoopProvider;

#[async_trait]
impl AnswerProvider for NoopProvider {
    fn name(&self) -> &str {
        "noop"
    }

    async fn stream_answer(
        &self,
        _request: &AskRequest,
        _sender: Sender<StreamEvent>,
    ) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Creates a test App in live mode backed by a NoopProvider, with an
/// instant demo provider.
pub fn test_app() -> App {
    let demo = DemoProvider::new(DemoSession::default(), Duration::ZERO);
    App::new(Arc::new(NoopProvider), Arc::new(demo), false)
}
