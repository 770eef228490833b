use std::fmt;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::mpsc::Sender;

use super::types::{AskRequest, StreamEvent};

/// Errors that can occur while producing an answer stream.
#[derive(Debug)]
pub enum ProviderError {
    /// Provider misconfigured (bad base URL).
    Config(String),
    /// Transport failure: connection refused, reset mid-stream, premature EOF.
    Network(String),
    /// The service answered with a non-success status.
    Api { status: u16, message: String },
    /// The receiver went away (conversation reset or app closed).
    ChannelClosed,
}

impl ProviderError {
    /// Text suitable for the `Error:` line of an assistant message.
    pub fn user_message(&self) -> String {
        match self {
            ProviderError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
            ProviderError::Network(msg) => write!(f, "network error: {msg}"),
            ProviderError::Api { status, message } => {
                write!(f, "service error (HTTP {status}): {message}")
            }
            ProviderError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for ProviderError {}

#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Short label shown in the title bar and logs.
    fn name(&self) -> &str;

    /// Streams the answer to `request` as protocol events.
    ///
    /// Implementations stop sending after the first terminal event. Returning
    /// `Err` means no terminal event was sent.
    async fn stream_answer(
        &self,
        request: &AskRequest,
        sender: Sender<StreamEvent>,
    ) -> Result<(), ProviderError>;
}

/// Run `provider` and guarantee the receiver sees exactly one terminal event,
/// converting a failure into [`StreamEvent::Error`].
pub async fn stream_to_channel(
    provider: &dyn AnswerProvider,
    request: &AskRequest,
    sender: Sender<StreamEvent>,
) {
    match provider.stream_answer(request, sender.clone()).await {
        Ok(()) => debug!("{} stream finished", provider.name()),
        Err(ProviderError::ChannelClosed) => {
            debug!("{} stream abandoned: receiver dropped", provider.name())
        }
        Err(e) => {
            warn!("{} stream failed: {e}", provider.name());
            let _ = sender.send(StreamEvent::Error(e.user_message())).await;
        }
    }
}
