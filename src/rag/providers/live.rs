//! Live provider: streams answers from the department's answering service.
//!
//! `POST {base_url}/rag/ask/` with an [`AskRequest`] body. A success response
//! is a `data: `-prefixed line stream (see [`crate::rag::decoder`]). A failure
//! response may carry `{"error": "..."}`.

use std::pin::pin;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc::Sender;

use crate::rag::decoder::decode_stream;
use crate::rag::{AnswerProvider, AskRequest, ProviderError, StreamEvent};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Shown when a failure response has no usable `error` field.
pub const CONNECT_FAILURE: &str = "Failed to connect to the answering service";

/// Tunnelled deployments put an interstitial page in front of the API unless
/// this header is present.
const TUNNEL_HEADER: (&str, &str) = ("ngrok-skip-browser-warning", "69420");

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct CorpusProvider {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl CorpusProvider {
    pub fn new(base_url: Option<String>, access_token: Option<String>) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            base_url,
            access_token: access_token.filter(|t| !t.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/rag/ask/", self.base_url)
    }
}

/// Pull the service's message out of a failure body, if it has one.
fn failure_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| CONNECT_FAILURE.to_string())
}

#[async_trait]
impl AnswerProvider for CorpusProvider {
    fn name(&self) -> &str {
        "live"
    }

    async fn stream_answer(
        &self,
        request: &AskRequest,
        sender: Sender<StreamEvent>,
    ) -> Result<(), ProviderError> {
        info!(
            "Ask request: question_len={}, semester={:?}, subject={:?}, history={}",
            request.question.len(),
            request.semester,
            request.subject_id,
            request.history.len()
        );

        let mut builder = self
            .client
            .post(self.endpoint())
            .header(TUNNEL_HEADER.0, TUNNEL_HEADER.1)
            .json(request);
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                ProviderError::Config(format!("invalid service URL {}: {e}", self.base_url))
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        debug!("Answering service status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("Answering service error: {} - {}", status, body);
            return Err(ProviderError::Api {
                status,
                message: failure_message(&body),
            });
        }

        let mut events = pin!(decode_stream(Box::pin(response.bytes_stream())));
        let mut finished = false;
        let mut forwarded = 0usize;

        while let Some(item) = events.next().await {
            match item {
                Ok(event) if finished => {
                    debug!("Ignoring {} after terminal event", event.kind());
                }
                Ok(event) => {
                    finished = event.is_terminal();
                    forwarded += 1;
                    if sender.send(event).await.is_err() {
                        warn!("Event send failed: receiver dropped");
                        return Err(ProviderError::ChannelClosed);
                    }
                }
                Err(e) if finished => {
                    debug!("Transport error after terminal event: {e}");
                    break;
                }
                Err(e) => {
                    return Err(ProviderError::Network(format!("connection lost: {e}")));
                }
            }
        }

        info!("Answer stream ended: {forwarded} events forwarded");

        if finished {
            Ok(())
        } else {
            Err(ProviderError::Network(
                "the answer stream ended before completion".to_string(),
            ))
        }
    }
}
