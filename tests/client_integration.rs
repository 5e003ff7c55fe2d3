//! Integration tests for the IndexNow submission client.
//!
//! These tests verify the full submission flow with mock HTTP endpoints.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use toolslab_core::indexnow::{
    IndexNowClient, RetryPolicy, SubmissionConfig, SubmissionRateLimiter, SubmitError,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client pointed at a mock endpoint with a fast retry policy and no pacing.
fn make_client(mock_uri: &str, max_attempts: u32) -> IndexNowClient {
    let config = SubmissionConfig::new("toolslab.dev", "0123456789abcdef");
    let policy = RetryPolicy::new(
        max_attempts,
        Duration::from_millis(10),
        Duration::from_millis(50),
        2.0,
    );
    IndexNowClient::with_policy(config, policy, Arc::new(SubmissionRateLimiter::disabled()))
        .expect("valid test config")
        .with_endpoint_url(format!("{mock_uri}/indexnow"))
}

fn urls(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("https://toolslab.dev/it/tools/tool-{i}"))
        .collect()
}

#[tokio::test]
async fn test_submit_success_sends_protocol_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .and(header("content-type", "application/json; charset=utf-8"))
        .and(body_partial_json(json!({
            "host": "toolslab.dev",
            "key": "0123456789abcdef",
            "urlList": [
                "https://toolslab.dev/it/tools/tool-0",
                "https://toolslab.dev/it/tools/tool-1"
            ]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = make_client(&mock_server.uri(), 3);
    let report = client.submit(&urls(2)).await;

    assert!(report.is_complete_success(), "report: {report:?}");
    assert_eq!(report.submitted_count(), 2);
    assert_eq!(report.batches.len(), 1);
    assert_eq!(report.batches[0].attempts, 1);
}

#[tokio::test]
async fn test_submit_202_accepted_is_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = make_client(&mock_server.uri(), 3);
    let report = client.submit(&urls(1)).await;

    assert!(report.is_complete_success());
}

#[tokio::test]
async fn test_submit_includes_key_location_when_configured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .and(body_partial_json(json!({
            "keyLocation": "https://cdn.toolslab.dev/key.txt"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = SubmissionConfig::new("toolslab.dev", "0123456789abcdef")
        .with_key_location("https://cdn.toolslab.dev/key.txt");
    let client = IndexNowClient::with_policy(
        config,
        RetryPolicy::default(),
        Arc::new(SubmissionRateLimiter::disabled()),
    )
    .expect("valid test config")
    .with_endpoint_url(format!("{}/indexnow", mock_server.uri()));

    let report = client.submit(&urls(1)).await;
    assert!(report.is_complete_success());
}

#[tokio::test]
async fn test_submit_403_key_rejected_no_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = make_client(&mock_server.uri(), 3);
    let report = client.submit(&urls(1)).await;

    assert_eq!(report.batches.len(), 1);
    assert_eq!(report.batches[0].attempts, 1, "403 must not be retried");
    assert!(matches!(
        report.batches[0].result,
        Err(SubmitError::KeyRejected { .. })
    ));
}

#[tokio::test]
async fn test_submit_400_permanent_no_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = make_client(&mock_server.uri(), 3);
    let report = client.submit(&urls(1)).await;

    assert_eq!(report.batches[0].attempts, 1);
    assert!(matches!(
        report.batches[0].result,
        Err(SubmitError::HttpStatus { status: 400, .. })
    ));
}

#[tokio::test]
async fn test_submit_429_retries_after_server_delay() {
    let mock_server = MockServer::start().await;

    // First request is rate limited with an immediate Retry-After, the
    // second succeeds.
    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = make_client(&mock_server.uri(), 3);
    let report = client.submit(&urls(1)).await;

    assert!(report.is_complete_success(), "report: {report:?}");
    assert_eq!(report.batches[0].attempts, 2);
}

#[tokio::test]
async fn test_submit_500_retries_then_exhausts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = make_client(&mock_server.uri(), 2);
    let report = client.submit(&urls(1)).await;

    assert_eq!(report.batches[0].attempts, 2);
    assert!(matches!(
        report.batches[0].result,
        Err(SubmitError::HttpStatus { status: 500, .. })
    ));
    assert_eq!(report.failed_count(), 1);
}

#[tokio::test]
async fn test_submit_503_transient_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = make_client(&mock_server.uri(), 3);
    let report = client.submit(&urls(3)).await;

    assert!(report.is_complete_success());
    assert_eq!(report.batches[0].attempts, 2);
    assert_eq!(report.submitted_count(), 3);
}

#[tokio::test]
async fn test_submit_splits_oversized_input_into_batches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = make_client(&mock_server.uri(), 1);
    let report = client.submit(&urls(10_001)).await;

    assert_eq!(report.batches.len(), 2);
    assert_eq!(report.batches[0].url_count, 10_000);
    assert_eq!(report.batches[1].url_count, 1);
    assert!(report.is_complete_success());
}

#[tokio::test]
async fn test_submit_failed_batch_does_not_abort_remaining() {
    let mock_server = MockServer::start().await;

    // First batch gets a permanent 422, second batch succeeds.
    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(422))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = make_client(&mock_server.uri(), 1);
    let report = client.submit(&urls(10_001)).await;

    assert_eq!(report.batches.len(), 2);
    assert!(!report.batches[0].is_success());
    assert!(report.batches[1].is_success());
    assert_eq!(report.failed_count(), 10_000);
    assert_eq!(report.submitted_count(), 1);
}

#[tokio::test]
async fn test_submit_foreign_host_rejected_before_any_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .and(body_partial_json(json!({
            "urlList": ["https://toolslab.dev/keep"]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = make_client(&mock_server.uri(), 3);
    let report = client
        .submit(&[
            "https://toolslab.dev/keep".to_string(),
            "https://evil.example/drop".to_string(),
        ])
        .await;

    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].url, "https://evil.example/drop");
    assert_eq!(report.batches[0].url_count, 1);
    assert!(!report.is_complete_success());
}

#[tokio::test]
async fn test_submit_empty_input_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/indexnow"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = make_client(&mock_server.uri(), 3);
    let report = client.submit(&[]).await;

    assert!(report.batches.is_empty());
    assert!(report.is_complete_success());
}

#[tokio::test]
async fn test_submit_network_error_is_reported() {
    // Port 1 is reserved and should refuse connections immediately.
    let config = SubmissionConfig::new("toolslab.dev", "0123456789abcdef");
    let client = IndexNowClient::with_policy(
        config,
        RetryPolicy::with_max_attempts(1),
        Arc::new(SubmissionRateLimiter::disabled()),
    )
    .expect("valid test config")
    .with_endpoint_url("http://127.0.0.1:1/indexnow");

    let report = client.submit(&urls(1)).await;
    assert!(matches!(
        report.batches[0].result,
        Err(SubmitError::Network { .. } | SubmitError::Timeout { .. })
    ));
}
