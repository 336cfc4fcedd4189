use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::endpoint::Endpoint;
use crate::error::{TwitterError, TwitterResult};
use crate::rate_limit::{BackoffController, WINDOW};
use crate::request::{FetchRequest, RequestBuilder};

pub static API_BASE: &str = "https://api.twitter.com/";

/// Status, headers and body of one API call, read in full before anything inspects it.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Clone, Debug)]
pub struct TwitterClient<'a> {
    reqwest_client: &'a Client,
    requests: RequestBuilder,
    api_base: Url,
    throttle_wait: Duration,
}

impl<'a> TwitterClient<'a> {
    /// Create a new TwitterClient against the public API
    pub fn new(reqwest_client: &'a Client, requests: RequestBuilder) -> Self {
        Self {
            reqwest_client,
            requests,
            api_base: Url::parse(API_BASE).expect("static api url"),
            throttle_wait: WINDOW,
        }
    }

    /// Point the client at another API root, e.g. a proxy or a mock server
    pub fn with_api_base(mut self, api_base: &str) -> TwitterResult<Self> {
        let mut base = api_base.to_owned();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.api_base = Url::parse(&base)
            .map_err(|e| TwitterError::Configuration(format!("invalid api base {}: {}", api_base, e)))?;
        Ok(self)
    }

    /// Pause used after a 429 that carries no reset time
    pub fn with_throttle_wait(mut self, wait: Duration) -> Self {
        self.throttle_wait = wait;
        self
    }

    pub fn reqwest_client(&self) -> &'a Client {
        self.reqwest_client
    }

    pub fn request(&self, endpoint: Endpoint, subject_id: &str) -> TwitterResult<FetchRequest> {
        self.requests.build(endpoint, subject_id)
    }

    pub fn backoff(&self) -> BackoffController {
        BackoffController::new(self.throttle_wait)
    }

    pub(crate) async fn send(
        &self,
        request: &FetchRequest,
        timeout: Option<Duration>,
    ) -> TwitterResult<ApiResponse> {
        let url = request.url(&self.api_base)?;
        debug!(endpoint = %request.endpoint(), cursor = ?request.cursor(), "requesting {}", url.path());

        let mut builder = self
            .reqwest_client
            .get(url)
            .headers(request.headers()?);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
