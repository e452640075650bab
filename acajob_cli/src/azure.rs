use std::time::Duration;

use reqwest::{header::HeaderMap, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::track::{poll_until, Progress};
use super::{Error, ErrorKind, Result, ResultExt, Timing};

/// Api version for `Microsoft.App`
pub const API_VERSION: &str = "2023-05-01";

/// Pull `error.code` / `error.message` out of a resource manager error body
///
/// Falls back to the raw body when it is not the usual shape.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(v) => match (v["error"]["code"].as_str(), v["error"]["message"].as_str()) {
            (Some(code), Some(msg)) => format!("{}: {}", code, msg),
            (None, Some(msg)) => msg.to_string(),
            _ => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn header_url(headers: &HeaderMap, name: &str) -> Option<Url> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Url::parse(s).ok())
}

/// A response that has been status checked
pub struct Accepted {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed body, `Value::Null` when empty
    pub body: Value,
}

/// Resource manager client
///
/// Holds one bearer token for the lifetime of a run.
pub struct Arm {
    /// Our HTTP client
    client: reqwest::Client,
    /// Resource manager base url
    base: Url,
    token: String,
    timing: Timing,
}

impl Arm {
    pub fn new(base: Url, token: String, timing: Timing) -> Arm {
        Arm {
            client: reqwest::Client::new(),
            base,
            token,
            timing,
        }
    }

    /// Url for a resource path, with the api version attached
    pub fn url(&self, path: &str) -> Result<Url> {
        let mut url = self.base.join(path.trim_start_matches('/'))?;
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    // Send and turn non-success statuses into errors with the provider's message
    async fn send(&self, req: reqwest::RequestBuilder, url: &Url) -> Result<Response> {
        let mkerr = || ErrorKind::Url(url.clone());
        let res = req.bearer_auth(&self.token).send().await.chain_err(&mkerr)?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            let err: Error = ErrorKind::UnexpectedHttpStatus(status, error_message(&body)).into();
            return Err(err);
        }
        Ok(res)
    }

    async fn accept(res: Response) -> Result<Accepted> {
        let status = res.status();
        let headers = res.headers().clone();
        let text = res.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        Ok(Accepted { status, headers, body })
    }

    /// GET a resource path
    pub async fn get(&self, path: &str) -> Result<Value> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let res = self.send(self.client.get(url.clone()), &url).await?;
        Ok(res.json().await?)
    }

    /// PUT a document to a resource path
    pub async fn put<T: Serialize>(&self, path: &str, doc: &T) -> Result<Accepted> {
        let url = self.url(path)?;
        debug!("PUT {}", url);
        let res = self.send(self.client.put(url.clone()).json(doc), &url).await?;
        Arm::accept(res).await
    }

    /// POST an empty json object to an action path
    pub async fn post(&self, path: &str) -> Result<Accepted> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        let req = self.client.post(url.clone()).json(&serde_json::json!({}));
        let res = self.send(req, &url).await?;
        Arm::accept(res).await
    }

    /// DELETE a resource path
    ///
    /// A missing resource is not an error; `None` is returned instead.
    pub async fn delete(&self, path: &str) -> Result<Option<Accepted>> {
        let url = self.url(path)?;
        debug!("DELETE {}", url);
        match self.send(self.client.delete(url.clone()), &url).await {
            Ok(res) => Ok(Some(Arm::accept(res).await?)),
            Err(e) => {
                let gone = matches!(e.kind(), ErrorKind::UnexpectedHttpStatus(s, _) if *s == StatusCode::NOT_FOUND);
                if gone {
                    Ok(None)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Block until the long running operation behind a response completes
    ///
    /// Follows `Azure-AsyncOperation` when present, otherwise a `Location`
    /// header on a 202. Other responses are already complete.
    pub async fn wait_for(&self, op: &str, acc: &Accepted) -> Result<()> {
        if let Some(url) = header_url(&acc.headers, "azure-asyncoperation") {
            debug!("Waiting for {} operation at {}", op, url);
            self.wait(op, url, retry_after(&acc.headers), true).await
        } else if acc.status == StatusCode::ACCEPTED {
            match header_url(&acc.headers, "location") {
                Some(url) => {
                    debug!("Waiting for {} result at {}", op, url);
                    self.wait(op, url, retry_after(&acc.headers), false).await
                }
                None => Ok(()),
            }
        } else {
            Ok(())
        }
    }

    async fn wait(&self, op: &str, url: Url, first: Option<Duration>, async_op: bool) -> Result<()> {
        if let Some(d) = first {
            futures_timer::Delay::new(d).await;
        }
        let timeout = self.timing.operation_timeout;
        let done = poll_until(self.timing.operation_interval, timeout, |_| {
            let url = url.clone();
            async move {
                let res = self.send(self.client.get(url.clone()), &url).await?;
                let wait = retry_after(res.headers());
                let acc = Arm::accept(res).await?;
                if async_op {
                    let status = acc.body["status"].as_str().unwrap_or("Unknown").to_string();
                    match status.as_str() {
                        "Succeeded" => Ok(Progress::Done(())),
                        "Failed" | "Canceled" => {
                            let msg = acc.body["error"]["message"]
                                .as_str()
                                .unwrap_or("no error message")
                                .to_string();
                            bail!(ErrorKind::OperationFailed(op.into(), status, msg))
                        }
                        _ => {
                            trace!("{} operation is {}", op, status);
                            Ok(wait.map(Progress::RetryAfter).unwrap_or(Progress::Pending))
                        }
                    }
                } else if acc.status == StatusCode::ACCEPTED {
                    Ok(wait.map(Progress::RetryAfter).unwrap_or(Progress::Pending))
                } else {
                    Ok(Progress::Done(()))
                }
            }
        })
        .await?;
        match done {
            Some(()) => Ok(()),
            None => bail!(ErrorKind::OperationTimeout(op.into(), timeout.as_secs())),
        }
    }
}
