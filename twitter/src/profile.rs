use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::client::TwitterClient;
use crate::endpoint::Endpoint;
use crate::error::{TwitterError, TwitterResult};
use crate::progress::{ProgressBar, ProgressReport};
use crate::rate_limit::{BackoffController, Verdict};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct UserProfile {
    pub screen_name: String,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub favourites_count: u64,
    #[serde(default)]
    pub statuses_count: u64,
    #[serde(default)]
    pub profile_image_url_https: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl UserProfile {
    /// Point-in-time size of the collection behind `endpoint`, if the profile reports one.
    pub fn total_for(&self, endpoint: Endpoint) -> Option<u64> {
        match endpoint {
            Endpoint::LikedTweets => Some(self.favourites_count),
            Endpoint::Followers => Some(self.followers_count),
            Endpoint::Timeline => Some(self.statuses_count),
            Endpoint::Mentions | Endpoint::UserProfile => None,
        }
    }

    pub fn icon_url(&self) -> Option<&str> {
        self.profile_image_url_https
            .as_deref()
            .or(self.profile_image_url.as_deref())
            .filter(|u| !u.is_empty())
    }
}

impl TwitterClient<'_> {
    /// Look up a user's profile, waiting out any rate limit.
    pub async fn profile(&self, subject_id: &str) -> TwitterResult<UserProfile> {
        let mut backoff = self.backoff();
        self.profile_with(subject_id, &mut backoff, |_| {}).await
    }

    pub(crate) async fn profile_with<F: FnMut(Duration)>(
        &self,
        subject_id: &str,
        backoff: &mut BackoffController,
        mut on_throttle: F,
    ) -> TwitterResult<UserProfile> {
        let request = self.request(Endpoint::UserProfile, subject_id)?;
        loop {
            let resp = self.send(&request, Some(LOOKUP_TIMEOUT)).await?;
            match backoff.inspect(&resp)? {
                Verdict::Throttle(wait) => {
                    on_throttle(wait);
                    backoff.wait(wait).await;
                }
                Verdict::Proceed => {
                    return serde_json::from_str(&resp.body).map_err(|e| {
                        TwitterError::data_shape(Endpoint::UserProfile, e.to_string())
                    });
                }
            }
        }
    }

    /// Look up `ids` one after another. Blank ids, lookups the API rejects and profiles that do
    /// not parse come back as `None`; any other error ends the whole batch.
    pub(crate) async fn profile_each<PB: ProgressBar>(
        &self,
        ids: &[String],
        backoff: &mut BackoffController,
        description: &str,
    ) -> TwitterResult<Vec<Option<UserProfile>>> {
        let total = ids.len() as u64;
        let quota = Endpoint::UserProfile.quota_per_window();
        let pb = PB::init(Some(total), description);

        let mut profiles = Vec::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if id.is_empty() {
                profiles.push(None);
                continue;
            }

            let fetched = i as u64;
            let lookup = self
                .profile_with(id, backoff, |wait| {
                    pb.throttled(&ProgressReport::render(total, fetched, quota), wait)
                })
                .await;
            pb.update(&ProgressReport::render(total, fetched + 1, quota));

            match lookup {
                Ok(profile) => profiles.push(Some(profile)),
                Err(
                    e @ (TwitterError::Request { .. }
                    | TwitterError::Http(_)
                    | TwitterError::DataShape { .. }),
                ) => {
                    warn!("lookup of {} failed: {}", id, e);
                    profiles.push(None);
                }
                Err(e) => {
                    pb.destroy();
                    return Err(e);
                }
            }
        }
        pb.destroy();

        Ok(profiles)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::request::RequestBuilder;
    use reqwest::Client;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lookup_reports_counts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/users/show.json"))
            .and(query_param("user_id", "42"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "screen_name": "someone",
                "followers_count": 1234,
                "favourites_count": 56,
                "statuses_count": 7,
                "profile_image_url_https": "https://pbs.twimg.com/a.jpg"
            })))
            .mount(&server)
            .await;

        let reqwest_client = Client::new();
        let client = TwitterClient::new(&reqwest_client, RequestBuilder::new(Some("token".into())))
            .with_api_base(&server.uri())
            .unwrap();
        let profile = client.profile("42").await.unwrap();

        assert_eq!("someone", profile.screen_name);
        assert_eq!(Some(1234), profile.total_for(Endpoint::Followers));
        assert_eq!(Some(56), profile.total_for(Endpoint::LikedTweets));
        assert_eq!(None, profile.total_for(Endpoint::Mentions));
        assert_eq!(Some("https://pbs.twimg.com/a.jpg"), profile.icon_url());
    }

    #[tokio::test]
    async fn lookup_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("User not found."))
            .mount(&server)
            .await;

        let reqwest_client = Client::new();
        let client = TwitterClient::new(&reqwest_client, RequestBuilder::new(Some("token".into())))
            .with_api_base(&server.uri())
            .unwrap();
        let err = client.profile("42").await.unwrap_err();

        assert!(matches!(err, TwitterError::Request { status: 404, .. }));
    }
}
