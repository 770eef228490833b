use corpus::rag::providers::live::CONNECT_FAILURE;
use corpus::rag::{
    AnswerProvider, AskRequest, CorpusProvider, HistoryTurn, ProviderError, Role, StreamEvent,
    stream_to_channel,
};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

const ASK_PATH: &str = "/rag/ask/";

fn provider(server: &MockServer) -> CorpusProvider {
    CorpusProvider::new(Some(server.uri()), None)
}

async fn mount_body(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Runs a request the way the UI does and collects what reached the channel.
async fn ask(provider: &CorpusProvider, request: AskRequest) -> Vec<StreamEvent> {
    let (tx, mut rx) = mpsc::channel(100);
    stream_to_channel(provider, &request, tx).await;

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn answer_text(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Token(t) => Some(t.as_str()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Streaming
// ============================================================================

#[tokio::test]
async fn test_bfs_answer_streams_sources_tokens_and_done() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"type\":\"sources\",\"sources\":[",
        "{\"resource_id\":7,\"title\":\"Computer Networks Lab Manual\",\"code\":\"BCA404\",",
        "\"score\":0.91,\"index\":1,\"page\":12}]}\n",
        "\n",
        "data: {\"type\":\"token\",\"content\":\"BFS explores \"}\n",
        "data: {\"type\":\"token\",\"content\":\"level by level [1].\"}\n",
        "data: {\"type\":\"done\"}\n",
    );
    mount_body(&server, 200, body).await;

    let events = ask(&provider(&server), AskRequest::new("Explain BFS")).await;

    assert_eq!(events.len(), 4);
    match &events[0] {
        StreamEvent::Sources(sources) => {
            assert_eq!(sources.len(), 1);
            assert_eq!(sources[0].resource_id, "7");
            assert_eq!(sources[0].code, "BCA404");
            assert_eq!(sources[0].page, Some(12));
        }
        other => panic!("expected sources first, got {other:?}"),
    }
    assert_eq!(answer_text(&events), "BFS explores level by level [1].");
    assert_eq!(events.last(), Some(&StreamEvent::Done));
}

#[tokio::test]
async fn test_unknown_and_malformed_records_are_skipped() {
    let server = MockServer::start().await;
    let body = concat!(
        ": keep-alive\n",
        "event: message\n",
        "data: {\"type\":\"progress\",\"pct\":40}\n",
        "data: {not json\n",
        "data: {\"type\":\"token\",\"content\":\"ok\"}\r\n",
        "data: {\"type\":\"done\"}\n",
    );
    mount_body(&server, 200, body).await;

    let events = ask(&provider(&server), AskRequest::new("q")).await;
    assert_eq!(
        events,
        vec![StreamEvent::Token("ok".into()), StreamEvent::Done]
    );
}

#[tokio::test]
async fn test_no_context_reply() {
    let server = MockServer::start().await;
    mount_body(
        &server,
        200,
        "data: {\"type\":\"sources\",\"sources\":[]}\ndata: {\"type\":\"no_context\"}\n",
    )
    .await;

    let events = ask(&provider(&server), AskRequest::new("q")).await;
    assert_eq!(
        events,
        vec![StreamEvent::Sources(vec![]), StreamEvent::NoContext]
    );
}

#[tokio::test]
async fn test_service_error_record_is_forwarded() {
    let server = MockServer::start().await;
    mount_body(
        &server,
        200,
        "data: {\"type\":\"error\",\"message\":\"vector store offline\"}\n",
    )
    .await;

    let events = ask(&provider(&server), AskRequest::new("q")).await;
    assert_eq!(events, vec![StreamEvent::Error("vector store offline".into())]);
}

#[tokio::test]
async fn test_events_after_terminal_are_ignored() {
    let server = MockServer::start().await;
    mount_body(
        &server,
        200,
        "data: {\"type\":\"done\"}\ndata: {\"type\":\"token\",\"content\":\"late\"}\n",
    )
    .await;

    let events = ask(&provider(&server), AskRequest::new("q")).await;
    assert_eq!(events, vec![StreamEvent::Done]);
}

#[tokio::test]
async fn test_stream_ending_without_terminal_reports_error() {
    let server = MockServer::start().await;
    mount_body(
        &server,
        200,
        "data: {\"type\":\"token\",\"content\":\"half an \"}\ndata: {\"type\":\"tok",
    )
    .await;

    let events = ask(&provider(&server), AskRequest::new("q")).await;
    assert_eq!(events[0], StreamEvent::Token("half an ".into()));
    match events.last() {
        Some(StreamEvent::Error(message)) => assert!(message.contains("ended before completion")),
        other => panic!("expected a trailing error, got {other:?}"),
    }
    assert_eq!(events.len(), 2);
}

// ============================================================================
// Failure responses
// ============================================================================

#[tokio::test]
async fn test_error_status_uses_service_message() {
    let server = MockServer::start().await;
    mount_body(&server, 500, r#"{"error":"overloaded"}"#).await;

    let events = ask(&provider(&server), AskRequest::new("q")).await;
    assert_eq!(events, vec![StreamEvent::Error("overloaded".into())]);
}

#[tokio::test]
async fn test_error_status_without_json_uses_fallback() {
    let server = MockServer::start().await;
    mount_body(&server, 502, "<html>Bad Gateway</html>").await;

    let provider = provider(&server);
    let (tx, _rx) = mpsc::channel(8);
    let result = provider.stream_answer(&AskRequest::new("q"), tx).await;

    match result {
        Err(ProviderError::Api { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, CONNECT_FAILURE);
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    // Nothing listens on the discard port.
    let provider = CorpusProvider::new(Some("http://127.0.0.1:9".into()), None);
    let (tx, _rx) = mpsc::channel(8);
    let result = provider.stream_answer(&AskRequest::new("q"), tx).await;
    assert!(matches!(result, Err(ProviderError::Network(_))));
}

// ============================================================================
// Request shape
// ============================================================================

#[tokio::test]
async fn test_request_carries_filters_history_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ASK_PATH))
        .and(header("ngrok-skip-browser-warning", "69420"))
        .and(header("Authorization", "Bearer s3cret"))
        .and(body_partial_json(json!({
            "question": "and DFS?",
            "semester": 4,
            "subject_id": "12",
            "history": [
                {"role": "user", "content": "What is BFS?"},
                {"role": "assistant", "content": "Breadth-first search."}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: {\"type\":\"done\"}\n"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = CorpusProvider::new(Some(format!("{}/", server.uri())), Some("s3cret".into()));
    let request = AskRequest {
        question: "and DFS?".into(),
        semester: Some(4),
        subject_id: Some("12".into()),
        history: vec![
            HistoryTurn {
                role: Role::User,
                content: "What is BFS?".into(),
            },
            HistoryTurn {
                role: Role::Assistant,
                content: "Breadth-first search.".into(),
            },
        ],
    };

    let events = ask(&provider, request).await;
    assert_eq!(events, vec![StreamEvent::Done]);
}
