//! Liveness probe and store-failure isolation tests

use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use tests::GatewayTestHarness;

#[tokio::test]
async fn root_reports_the_configured_port() {
    let (harness, _store) = GatewayTestHarness::with_store().await;

    let resp = harness.get_root().await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.text().await.unwrap(),
        format!("hello from port {}", harness.port)
    );
}

#[tokio::test]
async fn root_succeeds_while_store_is_unreachable() {
    let harness = GatewayTestHarness::unreachable().await;

    let resp = harness.get_root().await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .text()
        .await
        .unwrap()
        .contains(&harness.port.to_string()));
}

#[tokio::test]
async fn reads_and_writes_fail_closed_while_store_is_unreachable() {
    let harness = GatewayTestHarness::unreachable().await;

    let resp = harness.get("color").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.text().await.unwrap(), "store unavailable");

    let resp = harness.post("color", "blue").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    // The breaker is open now; requests keep failing fast, and the
    // liveness probe is still unaffected.
    let resp = harness.get("color").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(harness.get_root().await.status(), StatusCode::OK);
}

#[tokio::test]
async fn store_failure_does_not_poison_later_recovery_checks() {
    let (harness, store) = GatewayTestHarness::with_store().await;

    harness.post("color", "blue").await;

    // Simulate an outage observed by a request, then a probe recovery.
    harness.store_client.health().mark_degraded("test outage");
    let resp = harness.get("color").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    // The health monitor's probe path observes the store answering again.
    use kvgate_core::KeyValueStore;
    harness.store_client.ping().await.unwrap();

    let resp = harness.get("color").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "blue");

    drop(store);
}
