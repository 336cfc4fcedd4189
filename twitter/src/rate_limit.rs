use std::time::{Duration, UNIX_EPOCH};

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tokio::time::sleep;
use tracing::debug;

use crate::client::ApiResponse;
use crate::error::{TwitterError, TwitterResult};

static RESET_HEADER: &str = "x-rate-limit-reset";

/// Length of the API's rate limit window.
pub const WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BackoffState {
    Active,
    Throttled,
    Done,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    /// The response carries a usable body.
    Proceed,
    /// Wait this long, then send the same request again.
    Throttle(Duration),
}

/// Decides what to do with each response and keeps count of the pauses it imposed.
#[derive(Debug)]
pub struct BackoffController {
    state: BackoffState,
    fallback_wait: Duration,
    throttles: usize,
    slept: Duration,
}

impl Default for BackoffController {
    fn default() -> Self {
        Self::new(WINDOW)
    }
}

impl BackoffController {
    /// `fallback_wait` is used when a 429 response does not say when the window resets.
    pub fn new(fallback_wait: Duration) -> Self {
        Self {
            state: BackoffState::Active,
            fallback_wait,
            throttles: 0,
            slept: Duration::ZERO,
        }
    }

    pub fn state(&self) -> BackoffState {
        self.state
    }

    /// Number of times a request was throttled and retried.
    pub fn throttles(&self) -> usize {
        self.throttles
    }

    pub fn slept(&self) -> Duration {
        self.slept
    }

    pub fn inspect(&mut self, response: &ApiResponse) -> TwitterResult<Verdict> {
        if response.status == StatusCode::TOO_MANY_REQUESTS {
            let wait = reset_wait(&response.headers).unwrap_or(self.fallback_wait);
            self.state = BackoffState::Throttled;
            return Ok(Verdict::Throttle(wait));
        }

        if response.status != StatusCode::OK {
            return Err(TwitterError::Request {
                status: response.status.as_u16(),
                body: response.body.clone(),
            });
        }

        self.state = BackoffState::Active;
        Ok(Verdict::Proceed)
    }

    /// Sleep out a throttle and return to `Active`.
    pub async fn wait(&mut self, duration: Duration) {
        debug!(?duration, "rate limited, sleeping");
        sleep(duration).await;
        self.throttles += 1;
        self.slept += duration;
        self.state = BackoffState::Active;
    }

    pub fn finish(&mut self) {
        self.state = BackoffState::Done;
    }
}

/// Time until the window advertised by `x-rate-limit-reset` opens again.
fn reset_wait(headers: &HeaderMap) -> Option<Duration> {
    let rate_reset_at = headers.get(RESET_HEADER)?.to_str().ok()?;
    let reset = Duration::from_secs(rate_reset_at.trim().parse::<u64>().ok()?);
    reset.checked_sub(UNIX_EPOCH.elapsed().ok()?)
}

#[cfg(test)]
mod test {
    use super::*;
    use reqwest::header::HeaderValue;

    fn response(status: u16) -> ApiResponse {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: "{\"title\":\"nope\"}".to_owned(),
        }
    }

    #[test]
    fn ok_proceeds() {
        let mut backoff = BackoffController::default();
        assert_eq!(Verdict::Proceed, backoff.inspect(&response(200)).unwrap());
        assert_eq!(BackoffState::Active, backoff.state());
    }

    #[test]
    fn too_many_requests_uses_fallback() {
        let mut backoff = BackoffController::new(Duration::from_secs(900));
        let verdict = backoff.inspect(&response(429)).unwrap();
        assert_eq!(Verdict::Throttle(Duration::from_secs(900)), verdict);
        assert_eq!(BackoffState::Throttled, backoff.state());
    }

    #[test]
    fn reset_header_sets_wait() {
        let reset = UNIX_EPOCH.elapsed().unwrap().as_secs() + 120;
        let mut resp = response(429);
        resp.headers
            .insert(RESET_HEADER, HeaderValue::from_str(&reset.to_string()).unwrap());

        let mut backoff = BackoffController::new(Duration::from_secs(900));
        match backoff.inspect(&resp).unwrap() {
            Verdict::Throttle(wait) => {
                assert!(wait <= Duration::from_secs(120));
                assert!(wait > Duration::from_secs(100));
            }
            v => panic!("unexpected verdict {:?}", v),
        }
    }

    #[test]
    fn stale_reset_header_falls_back() {
        let mut resp = response(429);
        resp.headers
            .insert(RESET_HEADER, HeaderValue::from_static("1000"));

        let mut backoff = BackoffController::new(Duration::from_secs(60));
        assert_eq!(
            Verdict::Throttle(Duration::from_secs(60)),
            backoff.inspect(&resp).unwrap()
        );
    }

    #[test]
    fn other_status_is_request_error() {
        let mut backoff = BackoffController::default();
        match backoff.inspect(&response(401)).unwrap_err() {
            TwitterError::Request { status, body } => {
                assert_eq!(401, status);
                assert!(body.contains("nope"));
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[tokio::test]
    async fn wait_returns_to_active() {
        let mut backoff = BackoffController::new(Duration::ZERO);
        for _ in 0..3 {
            let Verdict::Throttle(wait) = backoff.inspect(&response(429)).unwrap() else {
                panic!("expected throttle");
            };
            backoff.wait(wait).await;
            assert_eq!(BackoffState::Active, backoff.state());
        }
        backoff.finish();
        assert_eq!(3, backoff.throttles());
        assert_eq!(BackoffState::Done, backoff.state());
    }
}
