use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use url::Url;

use super::policy::OrWarn;
use super::{Config, Error, ErrorKind, Result, ResultExt};

/// Lookback window for console logs
pub const TIMESPAN: &str = "PT1H";

/// One console line from a job's containers
#[derive(Clone, Debug, PartialEq)]
pub struct LogRow {
    /// `None` when the store returned something that is not a timestamp
    pub time: Option<DateTime<Utc>>,
    pub line: String,
}

/// Rows plus any partial failure the store reported alongside them
#[derive(Debug, Default)]
pub struct LogResult {
    pub rows: Vec<LogRow>,
    pub partial_error: Option<String>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    tables: Vec<Table>,
    error: Option<Value>,
}

#[derive(Deserialize)]
struct Table {
    columns: Vec<Column>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct Column {
    name: String,
}

fn job_query(job: &str) -> String {
    format!(
        "ContainerAppConsoleLogs_CL | where ContainerJobName_s == '{}' | project TimeGenerated, Log_s | order by TimeGenerated asc",
        job.replace('\'', "")
    )
}

fn parse_rows(table: &Table) -> Vec<LogRow> {
    let idx = |name: &str, fallback: usize| {
        table
            .columns
            .iter()
            .position(|c| c.name == name)
            .unwrap_or(fallback)
    };
    let (ti, li) = (idx("TimeGenerated", 0), idx("Log_s", 1));
    let mut rows: Vec<LogRow> = table
        .rows
        .iter()
        .map(|r| {
            let time = r
                .get(ti)
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc));
            let line = match r.get(li) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            LogRow { time, line }
        })
        .collect();
    // stable, so rows without a timestamp keep their relative order
    rows.sort_by_key(|r| r.time);
    rows
}

/// Query the console logs of a job from a log analytics workspace
pub async fn query_logs(base: &Url, token: &str, workspace: &str, job: &str) -> Result<LogResult> {
    let url = base.join(&format!("v1/workspaces/{}/query", workspace))?;
    debug!("POST {}", url);
    let body = json!({ "query": job_query(job), "timespan": TIMESPAN });
    let res = reqwest::Client::new()
        .post(url.clone())
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .chain_err(|| ErrorKind::Url(url.clone()))?;
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        let err: Error = ErrorKind::UnexpectedHttpStatus(status, super::azure::error_message(&text)).into();
        return Err(err);
    }
    let qr: QueryResponse = res.json().await?;
    let rows = qr.tables.first().map(parse_rows).unwrap_or_default();
    let partial_error = qr.error.map(|e| match e["message"].as_str() {
        Some(m) => m.to_string(),
        None => e.to_string(),
    });
    Ok(LogResult { rows, partial_error })
}

/// Print whatever logs the store has for a job
///
/// Never fails: ingestion lags job completion, so missing or partial logs are expected.
/// Returns the rows that were printed.
pub async fn fetch_logs(conf: &Config, job: &str) -> Vec<LogRow> {
    let workspace = match conf.inputs.log_workspace_id.as_ref().filter(|w| !w.trim().is_empty()) {
        Some(w) => w.trim().to_string(),
        None => {
            info!("No log analytics workspace given, skipping log retrieval");
            return vec![];
        }
    };
    let base = &conf.endpoints.log_analytics;
    let res: Result<LogResult> = async {
        let token = conf.credential.token(&conf.endpoints.login, base.as_str()).await?;
        query_logs(base, &token, &workspace, job).await
    }
    .await;
    let res = match res.or_warn("Could not retrieve logs") {
        Some(r) => r,
        None => return vec![],
    };
    if let Some(e) = &res.partial_error {
        warn!("Log query only partially succeeded: {}", e);
    }
    if res.rows.is_empty() {
        info!("No logs found for {} yet; ingestion can lag by several minutes", job);
    }
    for r in &res.rows {
        match r.time {
            Some(t) => println!("{} {}", t.to_rfc3339(), r.line),
            None => println!("{}", r.line),
        }
    }
    res.rows
}
