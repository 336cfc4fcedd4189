use serde::Deserialize;
use tracing::warn;

use crate::endpoint::Endpoint;
use crate::error::{TwitterError, TwitterResult};

#[derive(Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Record {
    Tweet(Tweet),
    User(User),
}

impl Record {
    fn from_value(endpoint: Endpoint, value: serde_json::Value) -> Result<Self, String> {
        if endpoint.returns_users() {
            let user: User = serde_json::from_value(value).map_err(|e| e.to_string())?;
            return Ok(Self::User(user));
        }

        let tweet: Tweet = serde_json::from_value(value).map_err(|e| e.to_string())?;
        // Liked tweets link through the author, so the row is useless without one
        if endpoint == Endpoint::LikedTweets && tweet.author_id.is_none() {
            return Err(format!("tweet {} has no author_id", tweet.id));
        }
        Ok(Self::Tweet(tweet))
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Tweet(t) => &t.id,
            Self::User(u) => &u.id,
        }
    }

    /// CSV columns for this record. Timeline rows link through the subject, since the API omits
    /// the author when asked for a user's own tweets.
    pub fn to_row(&self, endpoint: Endpoint, subject_id: &str) -> Vec<String> {
        match self {
            Self::User(u) => vec![
                u.name.clone(),
                u.id.clone(),
                u.username.clone(),
                format!("https://twitter.com/intent/user?user_id={}", u.id),
            ],
            Self::Tweet(t) if endpoint == Endpoint::LikedTweets => {
                let author = t.author_id.as_deref().unwrap_or_default();
                vec![
                    t.text.clone(),
                    t.id.clone(),
                    author.to_owned(),
                    format!("https://twitter.com/{}/status/{}", author, t.id),
                ]
            }
            Self::Tweet(t) => vec![
                t.id.clone(),
                t.text.clone(),
                format!("https://twitter.com/{}/status/{}", subject_id, t.id),
            ],
        }
    }
}

/// One API response worth of records.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Page {
    pub records: Vec<Record>,
    pub next_cursor: Option<String>,
    /// Records dropped for missing fields.
    pub skipped: usize,
}

#[derive(Deserialize, Debug)]
struct RawPage {
    data: Option<serde_json::Value>,
    meta: Option<Meta>,
}

#[derive(Deserialize, Debug)]
struct Meta {
    next_token: Option<String>,
}

impl Page {
    /// Parse a list response. `Ok(None)` means the response has no `data` field, which the API
    /// uses to signal an exhausted (or empty) collection.
    pub fn parse(endpoint: Endpoint, body: &str) -> TwitterResult<Option<Self>> {
        let raw: RawPage = serde_json::from_str(body)
            .map_err(|e| TwitterError::data_shape(endpoint, e.to_string()))?;

        let data = match raw.data {
            None | Some(serde_json::Value::Null) => return Ok(None),
            Some(serde_json::Value::Array(data)) => data,
            Some(_) => return Err(TwitterError::data_shape(endpoint, "data is not an array")),
        };

        let mut records = Vec::with_capacity(data.len());
        let mut skipped = 0;
        for value in data {
            match Record::from_value(endpoint, value) {
                Ok(r) => records.push(r),
                Err(msg) => {
                    warn!(%endpoint, "skipping record: {}", msg);
                    skipped += 1;
                }
            }
        }

        Ok(Some(Self {
            records,
            next_cursor: raw.meta.and_then(|m| m.next_token),
            skipped,
        }))
    }
}
