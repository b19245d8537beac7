use std::sync::Arc;
use std::time::Duration;

use reaper_core::{
    CleanupOutcome, CleanupRequest, ControllerConfig, Credential, FailureReason, ManagementApi,
    PullRequestId, ReaperError, ResourceKind, build_handler,
};
use reaper_databricks::DatabricksClient;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ControllerConfig {
    ControllerConfig::new(server.uri(), Credential::new("dapi-test-token"))
}

#[tokio::test]
async fn delete_catalog_is_forced_and_authenticated() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/2.1/unity-catalog/catalogs/sandbox_pr_123_sales"))
        .and(query_param("force", "true"))
        .and(header("authorization", "Bearer dapi-test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let client = DatabricksClient::new(&config(&server)).unwrap();
    let resp = client
        .delete_catalog("sandbox_pr_123_sales", true)
        .await
        .unwrap();

    assert!(resp.is_success());
    assert_eq!(resp.body, "{}");
}

#[tokio::test]
async fn delete_warehouse_passes_status_and_body_through() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/2.0/sql/warehouses/wh-99"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string(r#"{"error_code":"INTERNAL_ERROR"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = DatabricksClient::new(&config(&server)).unwrap();
    let resp = client.delete_warehouse("wh-99").await.unwrap();

    assert_eq!(resp.status, 500);
    assert_eq!(resp.body, r#"{"error_code":"INTERNAL_ERROR"}"#);
}

#[tokio::test]
async fn slow_workspace_is_a_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/2.0/sql/warehouses/wh-slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.request_timeout = Some(Duration::from_millis(50));
    let client = DatabricksClient::new(&cfg).unwrap();

    let err = client.delete_warehouse("wh-slow").await.unwrap_err();
    assert!(matches!(err, ReaperError::TransportFailure { .. }));
}

#[tokio::test]
async fn unreachable_workspace_is_a_transport_failure() {
    // Nothing listens on the discard port
    let cfg = ControllerConfig::new("http://127.0.0.1:9", Credential::new("token"));
    let client = DatabricksClient::new(&cfg).unwrap();

    let err = client.delete_catalog("sandbox_pr_1", true).await.unwrap_err();
    assert!(matches!(err, ReaperError::TransportFailure { .. }));
}

#[tokio::test]
async fn end_to_end_failed_catalog_and_missing_warehouse() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/2.1/unity-catalog/catalogs/sandbox_pr_7_tmp"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let api: Arc<dyn ManagementApi> = Arc::new(DatabricksClient::new(&config(&server)).unwrap());
    let handler = build_handler(&config(&server), api).unwrap();

    let request =
        CleanupRequest::new(PullRequestId::new(7).unwrap()).with_catalog("sandbox_pr_7_tmp");
    let summary = handler.on_pull_request_closed(&request).await;

    assert_eq!(
        summary.outcome(ResourceKind::Catalog),
        Some(&CleanupOutcome::Failed(FailureReason::Remote {
            status: 500,
            body: "boom".into()
        }))
    );
    assert_eq!(
        summary.outcome(ResourceKind::Warehouse),
        Some(&CleanupOutcome::NotFound)
    );
}

#[tokio::test]
async fn second_delivery_sees_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/2.1/unity-catalog/catalogs/sandbox_pr_5"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/2.1/unity-catalog/catalogs/sandbox_pr_5"))
        .respond_with(ResponseTemplate::new(404).set_body_string(
            r#"{"error_code":"CATALOG_DOES_NOT_EXIST","message":"Catalog 'sandbox_pr_5' does not exist."}"#,
        ))
        .mount(&server)
        .await;

    let api: Arc<dyn ManagementApi> = Arc::new(DatabricksClient::new(&config(&server)).unwrap());
    let handler = build_handler(&config(&server), api).unwrap();
    let request =
        CleanupRequest::new(PullRequestId::new(5).unwrap()).with_catalog("sandbox_pr_5");

    let first = handler.on_pull_request_closed(&request).await;
    let second = handler.on_pull_request_closed(&request).await;

    assert_eq!(first.outcome(ResourceKind::Catalog), Some(&CleanupOutcome::Deleted));
    assert_eq!(second.outcome(ResourceKind::Catalog), Some(&CleanupOutcome::NotFound));
}

#[tokio::test]
async fn bare_404_is_reported_as_failure() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/2.1/unity-catalog/catalogs/sandbox_pr_6"))
        .respond_with(ResponseTemplate::new(404).set_body_string("404 page not found"))
        .expect(1)
        .mount(&server)
        .await;

    let api: Arc<dyn ManagementApi> = Arc::new(DatabricksClient::new(&config(&server)).unwrap());
    let handler = build_handler(&config(&server), api).unwrap();
    let request =
        CleanupRequest::new(PullRequestId::new(6).unwrap()).with_catalog("sandbox_pr_6");

    let summary = handler.on_pull_request_closed(&request).await;

    assert_eq!(
        summary.outcome(ResourceKind::Catalog),
        Some(&CleanupOutcome::Failed(FailureReason::Remote {
            status: 404,
            body: "404 page not found".into(),
        }))
    );
    assert!(summary.has_failures());
}
