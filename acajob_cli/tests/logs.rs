#![warn(rust_2018_idioms)]

mod common;
use common::{config, path};

use acajob::logs::{fetch_logs, query_logs};
use mockito::{mock, Matcher};
use url::Url;

const TABLES: &str = r#"{
  "tables": [{
    "name": "PrimaryResult",
    "columns": [{"name": "TimeGenerated", "type": "datetime"}, {"name": "Log_s", "type": "string"}],
    "rows": [
      ["2024-05-01T10:00:02Z", "done"],
      ["2024-05-01T10:00:01Z", "hello"]
    ]
  }]
}"#;

fn base() -> Url {
    Url::parse(&mockito::server_url()).unwrap()
}

#[tokio::test]
async fn query_returns_rows_in_time_order() {
    let q = mock("POST", path("/v1/workspaces/ws-order/query"))
        .match_header("authorization", "Bearer testtoken")
        .match_body(Matcher::Regex("ContainerJobName_s == 'logs-job'".into()))
        .with_header("content-type", "application/json")
        .with_body(TABLES)
        .expect(1)
        .create();
    let res = query_logs(&base(), "testtoken", "ws-order", "logs-job").await.unwrap();
    let lines: Vec<_> = res.rows.iter().map(|r| r.line.as_str()).collect();
    assert_eq!(lines, vec!["hello", "done"]);
    assert!(res.partial_error.is_none());
    q.assert();
}

#[tokio::test]
async fn partial_results_keep_rows() {
    let body = r#"{
      "tables": [{"columns": [{"name": "TimeGenerated"}, {"name": "Log_s"}], "rows": [["2024-05-01T10:00:00Z", "x"]]}],
      "error": {"code": "PartialError", "message": "some shards timed out"}
    }"#;
    let _q = mock("POST", path("/v1/workspaces/ws-partial/query"))
        .with_body(body)
        .create();
    let res = query_logs(&base(), "testtoken", "ws-partial", "logs-job").await.unwrap();
    assert_eq!(res.rows.len(), 1);
    assert_eq!(res.partial_error.as_deref(), Some("some shards timed out"));
}

#[tokio::test]
async fn missing_workspace_skips_retrieval() {
    let q = mock("POST", Matcher::Any).expect(0).create();
    let conf = config(&[("job-name", "logs-skip")]);
    assert!(fetch_logs(&conf, "logs-skip").await.is_empty());
    q.assert();
}

#[tokio::test]
async fn query_errors_never_fail() {
    let q = mock("POST", path("/v1/workspaces/ws-broken/query"))
        .with_status(500)
        .expect(1)
        .create();
    let conf = config(&[("job-name", "logs-broken"), ("log-analytics-workspace-id", "ws-broken")]);
    assert!(fetch_logs(&conf, "logs-broken").await.is_empty());
    q.assert();
}

#[tokio::test]
async fn fetched_rows_are_returned() {
    let _q = mock("POST", path("/v1/workspaces/ws-fetch/query"))
        .with_body(TABLES)
        .create();
    let conf = config(&[("job-name", "logs-fetch"), ("log-analytics-workspace-id", "ws-fetch")]);
    let rows = fetch_logs(&conf, "logs-fetch").await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].line, "hello");
}
