mod common;

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use ragchat::application::ports::{Embedder, EmbedderError, LlmClient, LlmClientError};
use ragchat::infrastructure::llm::{OpenAiClient, OpenAiEmbedder};

use common::start_mock_server;

#[derive(Clone, Default)]
struct Captured {
    body: Arc<Mutex<Option<Value>>>,
    authorization: Arc<Mutex<Option<String>>>,
}

fn recording_route(path: &str, status: StatusCode, reply: Value, captured: Captured) -> Router {
    Router::new()
        .route(
            path,
            post(
                move |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        *captured.body.lock().unwrap() = Some(body);
                        *captured.authorization.lock().unwrap() = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        (status, Json(reply)).into_response()
                    }
                },
            ),
        )
        .with_state(captured)
}

#[tokio::test]
async fn given_prompt_when_completed_then_sends_single_user_message_with_settings() {
    let captured = Captured::default();
    let reply = json!({"choices": [{"message": {"role": "assistant", "content": "Grounded answer."}}]});
    let (base_url, shutdown_tx) = start_mock_server(recording_route(
        "/chat/completions",
        StatusCode::OK,
        reply,
        captured.clone(),
    ))
    .await;

    let client = OpenAiClient::new("sk-test".to_string(), "gpt-4o".to_string(), 0.3)
        .with_base_url(base_url);

    let answer = client.complete("What is RAG?").await.unwrap();

    assert_eq!(answer, "Grounded answer.");
    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["messages"], json!([{"role": "user", "content": "What is RAG?"}]));
    assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    assert!(body.get("max_tokens").is_none());
    assert_eq!(
        captured.authorization.lock().unwrap().as_deref(),
        Some("Bearer sk-test")
    );
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_rate_limit_status_when_completing_then_rate_limited_error() {
    let (base_url, shutdown_tx) = start_mock_server(recording_route(
        "/chat/completions",
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"message": "slow down"}}),
        Captured::default(),
    ))
    .await;
    let client = OpenAiClient::new("sk-test".to_string(), "gpt-4o".to_string(), 0.3)
        .with_base_url(base_url);

    let result = client.complete("Hi").await;

    assert!(matches!(result, Err(LlmClientError::RateLimited)));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_server_error_when_completing_then_api_error_carries_status() {
    let (base_url, shutdown_tx) = start_mock_server(recording_route(
        "/chat/completions",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "boom"}),
        Captured::default(),
    ))
    .await;
    let client = OpenAiClient::new("sk-test".to_string(), "gpt-4o".to_string(), 0.3)
        .with_base_url(base_url);

    let result = client.complete("Hi").await;

    match result {
        Err(LlmClientError::ApiRequestFailed(message)) => assert!(message.contains("500")),
        other => panic!("unexpected result: {other:?}"),
    }
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_no_choices_when_completing_then_invalid_response() {
    let (base_url, shutdown_tx) = start_mock_server(recording_route(
        "/chat/completions",
        StatusCode::OK,
        json!({"choices": []}),
        Captured::default(),
    ))
    .await;
    let client = OpenAiClient::new("sk-test".to_string(), "gpt-4o".to_string(), 0.3)
        .with_base_url(base_url);

    let result = client.complete("Hi").await;

    assert!(matches!(result, Err(LlmClientError::InvalidResponse(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_out_of_order_embeddings_when_batch_embedded_then_sorted_by_index() {
    let captured = Captured::default();
    let reply = json!({"data": [
        {"index": 1, "embedding": [0.0, 1.0]},
        {"index": 0, "embedding": [1.0, 0.0]}
    ]});
    let (base_url, shutdown_tx) = start_mock_server(recording_route(
        "/embeddings",
        StatusCode::OK,
        reply,
        captured.clone(),
    ))
    .await;
    let embedder = OpenAiEmbedder::new("sk-test".to_string(), "text-embedding-ada-002".to_string())
        .with_base_url(base_url);

    let embeddings = embedder.embed_batch(&["first", "second"]).await.unwrap();

    assert_eq!(embeddings[0].values, vec![1.0, 0.0]);
    assert_eq!(embeddings[1].values, vec![0.0, 1.0]);
    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "text-embedding-ada-002");
    assert_eq!(body["input"], json!(["first", "second"]));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_short_embedding_response_when_batch_embedded_then_invalid_response() {
    let (base_url, shutdown_tx) = start_mock_server(recording_route(
        "/embeddings",
        StatusCode::OK,
        json!({"data": [{"index": 0, "embedding": [1.0]}]}),
        Captured::default(),
    ))
    .await;
    let embedder = OpenAiEmbedder::new("sk-test".to_string(), "text-embedding-ada-002".to_string())
        .with_base_url(base_url);

    let result = embedder.embed_batch(&["a", "b"]).await;

    assert!(matches!(result, Err(EmbedderError::InvalidResponse(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_empty_batch_when_embedded_then_no_request_sent() {
    let embedder = OpenAiEmbedder::new("sk-test".to_string(), "text-embedding-ada-002".to_string())
        .with_base_url("http://127.0.0.1:9");

    let embeddings = embedder.embed_batch(&[]).await.unwrap();

    assert!(embeddings.is_empty());
}
