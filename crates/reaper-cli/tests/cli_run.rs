use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use reaper_cli::app::{EXIT_OK, EXIT_RESOURCE_FAILURE, run};
use reaper_cli::cli::Cli;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATALOG_PATH: &str = "/api/2.1/unity-catalog/catalogs/sandbox_pr_7_tmp";
const WAREHOUSE_PATH: &str = "/api/2.0/sql/warehouses/wh-7";

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("sandbox-reaper.toml");
    fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();
    path
}

fn write_state(dir: &Path) -> PathBuf {
    let path = dir.join("terraform.tfstate");
    let state = serde_json::json!({
        "version": 4,
        "resources": [
            {
                "mode": "managed",
                "type": "databricks_catalog",
                "name": "sandbox",
                "instances": [{"attributes": {"name": "sandbox_pr_7_tmp"}}]
            },
            {
                "mode": "managed",
                "type": "databricks_sql_warehouse",
                "name": "pr",
                "instances": [{"attributes": {"id": "wh-7", "name": "pr_warehouse_7"}}]
            }
        ]
    });
    fs::write(&path, state.to_string()).unwrap();
    path
}

fn cli(server: &MockServer, config: &Path, extra: &[&str]) -> Cli {
    let uri = server.uri();
    let mut argv = vec![
        "sandbox-reaper",
        "--host",
        uri.as_str(),
        "--token",
        "dapi-test",
        "--config",
        config.to_str().unwrap(),
        "--format",
        "json",
    ];
    argv.extend_from_slice(extra);
    Cli::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn closed_event_tears_down_resources_from_state() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let state = write_state(dir.path());
    let event = dir.path().join("event.json");
    fs::write(&event, r#"{"action":"closed","number":7}"#).unwrap();

    Mock::given(method("DELETE"))
        .and(path(CATALOG_PATH))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(WAREHOUSE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let code = run(cli(
        &server,
        &config,
        &[
            "--event-path",
            event.to_str().unwrap(),
            "--state-file",
            state.to_str().unwrap(),
            "--strict",
        ],
    ))
    .await
    .unwrap();
    assert_eq!(code, EXIT_OK);
}

#[tokio::test]
async fn resource_failure_only_fails_the_run_when_strict() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    Mock::given(method("DELETE"))
        .and(path(CATALOG_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(2)
        .mount(&server)
        .await;

    let explicit = ["--pr", "7", "--catalog", "sandbox_pr_7_tmp"];
    let lenient = run(cli(&server, &config, &explicit)).await.unwrap();
    assert_eq!(lenient, EXIT_OK);

    let mut strict = explicit.to_vec();
    strict.push("--strict");
    let code = run(cli(&server, &config, &strict)).await.unwrap();
    assert_eq!(code, EXIT_RESOURCE_FAILURE);
}

#[tokio::test]
async fn non_close_event_is_ignored() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let event = dir.path().join("event.json");
    fs::write(&event, r#"{"action":"synchronize","number":7}"#).unwrap();

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let code = run(cli(
        &server,
        &config,
        &["--event-path", event.to_str().unwrap()],
    ))
    .await
    .unwrap();
    assert_eq!(code, EXIT_OK);
}

#[tokio::test]
async fn dry_run_makes_no_calls() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let state = write_state(dir.path());

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let code = run(cli(
        &server,
        &config,
        &[
            "--pr",
            "7",
            "--state-file",
            state.to_str().unwrap(),
            "--dry-run",
            "--strict",
        ],
    ))
    .await
    .unwrap();
    assert_eq!(code, EXIT_OK);
}

#[tokio::test]
async fn invalid_pr_number_is_a_hard_failure() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let err = run(cli(&server, &config, &["--pr", "0"])).await.unwrap_err();
    assert!(format!("{err:#}").contains("pull request"));
}
