use std::time::Duration;

use arx_backend::error::AppError;
use arx_backend::providers::{
    http_client, ClaudeAdapter, FailureCause, GeminiAdapter, HuggingFaceAdapter, OllamaAdapter,
    ProviderEndpoint, ProviderError, ProviderId, TranslationAdapter, TranslationRequest,
};
use httpmock::prelude::*;
use serde_json::json;

fn request() -> TranslationRequest {
    TranslationRequest {
        source_code: "print('hi')".to_string(),
        source_lang: "python".to_string(),
        target_lang: "rust".to_string(),
    }
}

fn endpoint(server: &MockServer, model: &str) -> ProviderEndpoint {
    ProviderEndpoint {
        api_key: Some("test-key".to_string()),
        base_url: server.base_url(),
        model: model.to_string(),
    }
}

fn client() -> reqwest::Client {
    http_client(Duration::from_secs(5)).unwrap()
}

// key: provider-http-tests -> wire shapes per backend
#[tokio::test]
async fn gemini_extracts_first_candidate_and_strips_fences() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-pro:generateContent")
                .header("x-goog-api-key", "test-key")
                .body_contains("Translate this python code to rust");
            then.status(200).json_body(json!({
                "candidates": [
                    { "content": { "parts": [ { "text": "```rust\nfn main() { println!(\"hi\"); }\n```" } ] } }
                ]
            }));
        })
        .await;

    let adapter = GeminiAdapter::new(client(), &endpoint(&server, "gemini-pro"), "test-key");
    let output = adapter.translate(&request()).await.unwrap();
    mock.assert_async().await;
    assert_eq!(output, "fn main() { println!(\"hi\"); }");
}

#[tokio::test]
async fn gemini_explains_without_touching_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-pro:generateContent")
                .body_contains("Explain this python code");
            then.status(200).json_body(json!({
                "candidates": [ { "content": { "parts": [ { "text": "Prints `hi`." } ] } } ]
            }));
        })
        .await;

    let adapter = GeminiAdapter::new(client(), &endpoint(&server, "gemini-pro"), "test-key");
    let output = adapter.explain("print('hi')", "python").await.unwrap();
    assert_eq!(output, "Prints `hi`.");
}

#[tokio::test]
async fn gemini_missing_candidates_is_malformed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/models/gemini-pro:generateContent");
            then.status(200).json_body(json!({ "candidates": [] }));
        })
        .await;

    let adapter = GeminiAdapter::new(client(), &endpoint(&server, "gemini-pro"), "test-key");
    let err = adapter.translate(&request()).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::ProviderFailure {
            provider: ProviderId::Gemini,
            cause: FailureCause::MalformedResponse(_)
        }
    ));
}

#[tokio::test]
async fn huggingface_uses_bearer_auth() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/bigcode/starcoder")
                .header("authorization", "Bearer test-key");
            then.status(200)
                .json_body(json!([ { "generated_text": "fn main() {}" } ]));
        })
        .await;

    let adapter = HuggingFaceAdapter::new(
        client(),
        &endpoint(&server, "bigcode/starcoder"),
        "test-key",
    );
    let output = adapter.translate(&request()).await.unwrap();
    mock.assert_async().await;
    assert_eq!(output, "fn main() {}");
}

#[tokio::test]
async fn huggingface_server_error_is_status_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/models/bigcode/starcoder");
            then.status(500).body("model overloaded");
        })
        .await;

    let adapter = HuggingFaceAdapter::new(
        client(),
        &endpoint(&server, "bigcode/starcoder"),
        "test-key",
    );
    let err = adapter.translate(&request()).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::ProviderFailure {
            provider: ProviderId::HuggingFace,
            cause: FailureCause::Status(500)
        }
    ));
}

#[tokio::test]
async fn claude_sends_version_header() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "test-key")
                .header("anthropic-version", "2023-06-01");
            then.status(200).json_body(json!({
                "content": [ { "type": "text", "text": "fn main() {}" } ]
            }));
        })
        .await;

    let adapter = ClaudeAdapter::new(client(), &endpoint(&server, "claude-3-haiku"), "test-key");
    let output = adapter.translate(&request()).await.unwrap();
    mock.assert_async().await;
    assert_eq!(output, "fn main() {}");
}

#[tokio::test]
async fn ollama_needs_no_credential() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .json_body_partial(r#"{ "model": "mistral", "stream": false }"#);
            then.status(200).json_body(json!({ "response": "fn main() {}" }));
        })
        .await;

    let adapter = OllamaAdapter::new(
        client(),
        &ProviderEndpoint {
            api_key: None,
            base_url: server.base_url(),
            model: "mistral".to_string(),
        },
    );
    let output = adapter.translate(&request()).await.unwrap();
    mock.assert_async().await;
    assert_eq!(output, "fn main() {}");

    let err = adapter.explain("x = 1", "python").await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::CapabilityUnsupported {
            provider: ProviderId::Ollama,
            ..
        }
    ));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .delay(Duration::from_millis(1500))
                .json_body(json!({ "response": "too late" }));
        })
        .await;

    let adapter = OllamaAdapter::new(
        http_client(Duration::from_millis(200)).unwrap(),
        &ProviderEndpoint {
            api_key: None,
            base_url: server.base_url(),
            model: "mistral".to_string(),
        },
    );
    let err = adapter.translate(&request()).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::ProviderFailure {
            provider: ProviderId::Ollama,
            cause: FailureCause::Timeout
        }
    ));
    assert!(err.to_string().contains("timeout"));
}

#[tokio::test]
async fn unreachable_backend_does_not_expose_credentials() {
    let secret = "SUPERSECRETKEY123";
    let endpoint = ProviderEndpoint {
        api_key: Some(secret.to_string()),
        base_url: "http://127.0.0.1:9".to_string(),
        model: "gemini-pro".to_string(),
    };

    let adapter = GeminiAdapter::new(client(), &endpoint, secret);
    let err = adapter.translate(&request()).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::ProviderFailure {
            provider: ProviderId::Gemini,
            cause: FailureCause::Transport(_) | FailureCause::Timeout
        }
    ));
    let err = AppError::from(err);
    let body = err.body().to_string();
    assert_eq!(err.kind(), "provider_failure");
    assert!(!body.contains(secret), "credential leaked: {body}");
    assert!(!body.contains("127.0.0.1:9"), "url leaked: {body}");
    assert!(!err.to_string().contains(secret));

    let adapter = HuggingFaceAdapter::new(client(), &endpoint, secret);
    let err = AppError::from(adapter.translate(&request()).await.unwrap_err());
    assert!(!err.body().to_string().contains(secret));
}

#[tokio::test]
async fn undecodable_body_does_not_expose_url() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/models/gemini-pro:generateContent");
            then.status(200).body("not json");
        })
        .await;

    let adapter = GeminiAdapter::new(client(), &endpoint(&server, "gemini-pro"), "test-key");
    let err = AppError::from(adapter.translate(&request()).await.unwrap_err());
    let body = err.body().to_string();
    assert!(body.contains("malformed response"));
    assert!(!body.contains(&server.base_url()));
    assert!(!body.contains("test-key"));
}
