mod common;

use std::time::{Duration, Instant};

use imaginai::client::{RequestExecutor, RequestFailure, WebhookClient, classify};
use imaginai::core::config::Environment;
use imaginai::errors::ErrorCode;
use imaginai::validation::{FileValidator, MemoryUpload, PromptValidator, encode_upload};

fn client(base: &str, timeout: Duration) -> WebhookClient {
    WebhookClient::with_executor(
        base,
        RequestExecutor::new(timeout, Environment::Development),
        timeout,
    )
}

#[tokio::test]
async fn test_execute_times_out_against_silent_endpoint() {
    let base = common::hanging_server().await;
    let executor = RequestExecutor::new(Duration::from_secs(30), Environment::Development);
    let timeout = Duration::from_millis(100);

    let started = Instant::now();
    let failure = executor
        .execute(&format!("{base}/generate"), &serde_json::json!({ "prompt": "x" }), timeout)
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(failure, RequestFailure::TimedOut { .. }));
    assert!(elapsed >= timeout, "fired early after {elapsed:?}");
    assert!(elapsed < timeout + Duration::from_secs(2), "fired late after {elapsed:?}");

    let err = classify(failure, "generate");
    assert_eq!(err.code(), ErrorCode::TimeoutError);
}

#[tokio::test]
async fn test_generate_times_out_with_timeout_error() {
    let base = common::hanging_server().await;
    let prompt = PromptValidator::new()
        .validate("a quiet harbor")
        .into_result()
        .unwrap();

    let err = client(&base, Duration::from_millis(100))
        .generate(&prompt)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::TimeoutError);
    assert_eq!(err.user_message(), "Request timed out. Please try again.");
}

#[tokio::test]
async fn test_generate_success() {
    let (base, received) =
        common::canned_server(200, r#"{"imageData":"iVBORw0KGgo="}"#).await;
    let prompt = PromptValidator::new()
        .validate("  a quiet harbor\u{0007} ")
        .into_result()
        .unwrap();

    let image = client(&base, Duration::from_secs(5))
        .generate(&prompt)
        .await
        .unwrap();
    assert_eq!(image.base64_png, "iVBORw0KGgo=");
    assert_eq!(image.data_url(), "data:image/png;base64,iVBORw0KGgo=");

    let requests = received.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/generate");
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    // the sanitized prompt is what goes over the wire
    assert_eq!(body, serde_json::json!({ "prompt": "a quiet harbor" }));
}

#[tokio::test]
async fn test_edit_sends_prompt_and_image() {
    let (base, received) = common::canned_server(200, r#"{"imageData":"AAAA"}"#).await;
    let prompt = PromptValidator::new()
        .validate("make the sky purple")
        .into_result()
        .unwrap();
    let upload = MemoryUpload::new("cat.gif", "image/gif", b"GIF89a\x01\x00".to_vec());
    let image = encode_upload(&FileValidator::new(), &upload).await.unwrap();

    let result = client(&base, Duration::from_secs(5))
        .edit(&prompt, &image)
        .await
        .unwrap();
    assert_eq!(result.base64_png, "AAAA");

    let requests = received.lock().unwrap().clone();
    assert_eq!(requests[0].path, "/edit");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["prompt"], "make the sky purple");
    assert_eq!(body["image"]["mimeType"], "image/gif");
    assert_eq!(body["image"]["data"], image.data());
}

#[tokio::test]
async fn test_missing_image_data_is_classified() {
    let prompt = PromptValidator::new()
        .validate("a quiet harbor")
        .into_result()
        .unwrap();

    for body in [r#"{"status":"done"}"#, r#"{"imageData":null}"#, r#"{"imageData":""}"#] {
        let (base, _) = common::canned_server(200, body).await;
        let err = client(&base, Duration::from_secs(5))
            .generate(&prompt)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoImageData, "{body}");
        assert_eq!(err.status_code(), None);
    }
}

#[tokio::test]
async fn test_non_success_status_is_webhook_error() {
    let (base, _) = common::canned_server(500, r#"{"error":"workflow crashed at node 7"}"#).await;
    let prompt = PromptValidator::new()
        .validate("a quiet harbor")
        .into_result()
        .unwrap();

    let err = client(&base, Duration::from_secs(5))
        .generate(&prompt)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::WebhookError);
    assert_eq!(err.status_code(), Some(500));
    assert!(err.internal_message().contains("workflow crashed"));
    assert!(!err.user_message().contains("workflow crashed"));
}

#[tokio::test]
async fn test_status_wins_over_missing_image_data() {
    let (base, _) = common::canned_server(404, "{}").await;
    let prompt = PromptValidator::new()
        .validate("a quiet harbor")
        .into_result()
        .unwrap();

    let err = client(&base, Duration::from_secs(5))
        .generate(&prompt)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::WebhookError);
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_unparsable_body_is_unknown_error() {
    let (base, _) = common::canned_server(200, "<html>gateway page</html>").await;
    let prompt = PromptValidator::new()
        .validate("a quiet harbor")
        .into_result()
        .unwrap();

    let err = client(&base, Duration::from_secs(5))
        .generate(&prompt)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownError);
    assert_eq!(
        err.user_message(),
        "An unexpected error occurred. Please try again."
    );
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let base = common::unreachable_base().await;
    let prompt = PromptValidator::new()
        .validate("a quiet harbor")
        .into_result()
        .unwrap();

    let err = client(&base, Duration::from_secs(5))
        .generate(&prompt)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NetworkError);
}

#[tokio::test]
async fn test_error_status_with_stalled_body_is_webhook_error() {
    let base = common::stalled_body_server(500, "partial").await;
    let prompt = PromptValidator::new()
        .validate("a quiet harbor")
        .into_result()
        .unwrap();

    let started = Instant::now();
    let err = client(&base, Duration::from_millis(300))
        .generate(&prompt)
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::WebhookError);
    assert_eq!(err.status_code(), Some(500));
    assert!(err.internal_message().contains("partial"));
    assert!(!err.user_message().contains("partial"));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_error_status_with_stalled_body_under_long_timeout() {
    let base = common::stalled_body_server(503, "busy").await;
    let prompt = PromptValidator::new()
        .validate("a quiet harbor")
        .into_result()
        .unwrap();

    // the diagnostic read gives up long before the request deadline
    let started = Instant::now();
    let err = client(&base, Duration::from_secs(30))
        .generate(&prompt)
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::WebhookError);
    assert_eq!(err.status_code(), Some(503));
    assert!(started.elapsed() < Duration::from_secs(5));
}
