use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use url::Url;

use crate::endpoint::Endpoint;
use crate::error::{TwitterError, TwitterResult};

/// Environment variable the bearer token is read from.
pub static TOKEN_VAR: &str = "BEARER_TOKEN";

static CURSOR_PARAM: &str = "pagination_token";

static USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (compatible; MSIE 9.0; Windows NT 6.0) Opera 12.14",
    "Mozilla/5.0 (X11; Ubuntu; Linux i686; rv:26.0) Gecko/20100101 Firefox/26.0",
    "Mozilla/5.0 (X11; U; Linux x86_64; en-US; rv:1.9.1.3) Gecko/20090913 Firefox/3.5.3",
    "Mozilla/5.0 (Windows; U; Windows NT 6.1; en; rv:1.9.1.3) Gecko/20090824 Firefox/3.5.3 (.NET CLR 3.5.30729)",
    "Mozilla/5.0 (Windows NT 6.2) AppleWebKit/535.7 (KHTML, like Gecko) Comodo_Dragon/16.1.1.0 Chrome/16.0.912.63 Safari/535.7",
    "Mozilla/5.0 (Windows; U; Windows NT 5.2; en-US; rv:1.9.1.3) Gecko/20090824 Firefox/3.5.3 (.NET CLR 3.5.30729)",
    "Mozilla/5.0 (Windows; U; Windows NT 6.1; en-US; rv:1.9.1.1) Gecko/20090718 Firefox/3.5.1",
];

#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BearerToken(***)")
    }
}

#[derive(Clone, Debug)]
pub struct RequestBuilder {
    token: Option<BearerToken>,
}

impl RequestBuilder {
    pub fn new(token: Option<String>) -> Self {
        let token = token
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .map(BearerToken);
        Self { token }
    }

    /// Read the token from `BEARER_TOKEN`, using `fallback` when the variable is unset or blank.
    pub fn from_env(fallback: Option<String>) -> Self {
        Self::resolve(std::env::var(TOKEN_VAR).ok(), fallback)
    }

    fn resolve(primary: Option<String>, fallback: Option<String>) -> Self {
        let primary = primary.filter(|t| !t.trim().is_empty());
        Self::new(primary.or(fallback))
    }

    pub fn build(&self, endpoint: Endpoint, subject_id: &str) -> TwitterResult<FetchRequest> {
        let subject_id = subject_id.trim();
        if subject_id.is_empty() {
            return Err(TwitterError::Configuration(
                "user id must not be empty".to_owned(),
            ));
        }
        let auth_token = self.token.clone().ok_or_else(|| {
            TwitterError::Configuration(format!("{} is not set", TOKEN_VAR))
        })?;

        let query_params = endpoint
            .params(subject_id)
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect();

        Ok(FetchRequest {
            endpoint,
            subject_id: subject_id.to_owned(),
            query_params,
            auth_token,
        })
    }
}

/// A fully specified API call. Only the pagination cursor changes between pages.
#[derive(Clone, Debug)]
pub struct FetchRequest {
    endpoint: Endpoint,
    subject_id: String,
    query_params: BTreeMap<String, String>,
    auth_token: BearerToken,
}

impl FetchRequest {
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query_params
    }

    pub fn cursor(&self) -> Option<&str> {
        self.query_params.get(CURSOR_PARAM).map(String::as_str)
    }

    pub fn set_cursor(&mut self, cursor: impl Into<String>) {
        self.query_params
            .insert(CURSOR_PARAM.to_owned(), cursor.into());
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query_params.insert(key.to_owned(), value.into());
        self
    }

    pub fn url(&self, base: &Url) -> TwitterResult<Url> {
        let mut url = base
            .join(&self.endpoint.path(&self.subject_id))
            .map_err(|e| TwitterError::Configuration(format!("invalid api url: {}", e)))?;
        url.query_pairs_mut().extend_pairs(&self.query_params);
        Ok(url)
    }

    /// Authorization plus a user agent drawn from the pool on every call.
    pub fn headers(&self) -> TwitterResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.auth_token.0))
            .map_err(|_| TwitterError::Configuration("malformed bearer token".to_owned()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(USER_AGENT, HeaderValue::from_static(random_user_agent()));
        Ok(headers)
    }
}

fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}
