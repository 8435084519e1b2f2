//! Key read/write handler tests

use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use tests::{FailureMode, GatewayTestHarness};

// ============================================================================
// Round trips
// ============================================================================

#[tokio::test]
async fn write_then_read_round_trips() {
    let (harness, _store) = GatewayTestHarness::with_store().await;

    let resp = harness.post("color", "blue").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "OK");

    let resp = harness.get("color").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "blue");
}

#[tokio::test]
async fn overwrite_returns_the_latest_value() {
    let (harness, _store) = GatewayTestHarness::with_store().await;

    harness.post("color", "blue").await;
    harness.post("color", "green").await;

    let resp = harness.get("color").await;
    assert_eq!(resp.text().await.unwrap(), "green");
}

#[tokio::test]
async fn repeated_writes_are_idempotent() {
    let (harness, _store) = GatewayTestHarness::with_store().await;

    for _ in 0..3 {
        let resp = harness.post("color", "blue").await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = harness.get("color").await;
    assert_eq!(resp.text().await.unwrap(), "blue");
}

#[tokio::test]
async fn values_are_stored_and_returned_verbatim() {
    let (harness, store) = GatewayTestHarness::with_store().await;

    let payload: Vec<u8> = vec![0, 159, 13, 10, 255, 32];
    let resp = harness.post("blob", payload.clone()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(store.get("blob").unwrap(), payload);

    let resp = harness.get("blob").await;
    assert_eq!(resp.bytes().await.unwrap().to_vec(), payload);
}

#[tokio::test]
async fn keys_are_raw_path_segments() {
    let (harness, _store) = GatewayTestHarness::with_store().await;

    let key = "answer-42.x~y";
    harness.post(key, "deep thought").await;

    let resp = harness.get(key).await;
    assert_eq!(resp.text().await.unwrap(), "deep thought");
}

// ============================================================================
// Failure mapping
// ============================================================================

#[tokio::test]
async fn missing_key_is_not_found() {
    let (harness, _store) = GatewayTestHarness::with_store().await;

    let resp = harness.get("nonexistent").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.text().await.unwrap(), "key not found");
}

#[tokio::test]
async fn store_error_replies_map_to_unavailable() {
    let (harness, store) = GatewayTestHarness::with_store().await;

    store.set_failure(FailureMode::ErrorReply);

    let resp = harness.get("color").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.text().await.unwrap(), "store unavailable");

    let resp = harness.post("color", "blue").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
