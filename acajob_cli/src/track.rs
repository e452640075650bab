//- deadline bounded polling used for executions and long running operations
use std::{
    future::Future,
    time::{Duration, Instant},
};

use futures_timer::Delay;

use super::Result;

/// Result of one check inside `poll_until`
#[derive(Debug)]
pub enum Progress<T> {
    /// Stop polling with this value
    Done(T),
    /// Check again after the normal interval
    Pending,
    /// Check again after the given wait
    RetryAfter(Duration),
}

/// Run `check` until it is done or `timeout` has elapsed
///
/// Sleeps between checks, never past the deadline. Returns `Ok(None)` on timeout.
/// Errors from `check` abort the loop; callers that want to tolerate them
/// should map them to `Progress::Pending`.
///
/// The loop only advances while awaited, so dropping the future
/// (e.g. from a `select!` or `tokio::time::timeout`) cancels it between checks.
pub async fn poll_until<T, F, Fut>(interval: Duration, timeout: Duration, mut check: F) -> Result<Option<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Progress<T>>>,
{
    let deadline = Instant::now() + timeout;
    let mut attempt = 0;
    loop {
        attempt += 1;
        trace!("poll iteration {}", attempt);
        let wait = match check(attempt).await? {
            Progress::Done(v) => return Ok(Some(v)),
            Progress::Pending => interval,
            Progress::RetryAfter(d) => d,
        };
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        let remaining = deadline - now;
        Delay::new(std::cmp::min(wait, remaining)).await;
    }
}
