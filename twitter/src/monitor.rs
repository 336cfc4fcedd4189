use std::collections::HashSet;
use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use crate::client::TwitterClient;
use crate::endpoint::Endpoint;
use crate::error::TwitterResult;
use crate::rate_limit::{BackoffController, Verdict};
use crate::record::{Page, Record};
use crate::request::FetchRequest;
use crate::sink::{Destination, Sink};

/// Tweets requested per poll.
const POLL_SIZE: &str = "5";

/// Repeatedly polls the newest tweets of a timeline and keeps the ones it has not seen yet.
pub struct TimelineMonitor<'c, 'a> {
    client: &'c TwitterClient<'a>,
    request: FetchRequest,
    destination: Destination,
    seen: HashSet<String>,
    backoff: BackoffController,
}

impl<'c, 'a> TimelineMonitor<'c, 'a> {
    /// Watch `subject_id`'s own tweets, or the tweets mentioning them. A rate limited poll is
    /// retried after `retry_wait` unless the API says otherwise.
    pub fn new(
        client: &'c TwitterClient<'a>,
        subject_id: &str,
        mentions: bool,
        retry_wait: Duration,
    ) -> TwitterResult<Self> {
        let endpoint = if mentions {
            Endpoint::Mentions
        } else {
            Endpoint::Timeline
        };
        let request = client
            .request(endpoint, subject_id)?
            .with_param("max_results", POLL_SIZE);
        let destination = Destination::new(request.subject_id(), endpoint);

        Ok(Self {
            client,
            request,
            destination,
            seen: HashSet::new(),
            backoff: BackoffController::new(retry_wait),
        })
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Fetch the newest tweets once and append the unseen ones to `sink`, in API order.
    pub async fn poll_once<S: Sink>(&mut self, sink: &mut S) -> TwitterResult<Vec<Record>> {
        let resp = loop {
            let resp = self.client.send(&self.request, None).await?;
            match self.backoff.inspect(&resp)? {
                Verdict::Throttle(wait) => self.backoff.wait(wait).await,
                Verdict::Proceed => break resp,
            }
        };

        let Some(page) = Page::parse(self.destination.endpoint, &resp.body)? else {
            return Ok(vec![]);
        };
        let fresh: Vec<Record> = page
            .records
            .into_iter()
            .filter(|r| self.seen.insert(r.id().to_owned()))
            .collect();
        sink.append(&self.destination, &fresh)?;

        Ok(fresh)
    }

    /// Poll forever, sleeping `interval` between scans. `on_poll` sees the new tweets of every
    /// scan, which may be none.
    pub async fn run<S: Sink, F: FnMut(&[Record])>(
        &mut self,
        sink: &mut S,
        interval: Duration,
        mut on_poll: F,
    ) -> TwitterResult<()> {
        loop {
            info!(
                "scanning {} of {}",
                self.destination.endpoint, self.destination.subject_id
            );
            let fresh = self.poll_once(sink).await?;
            if fresh.is_empty() {
                info!("no new tweets");
            }
            on_poll(&fresh);

            info!("next scan in {:?}", interval);
            sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::request::RequestBuilder;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client<'a>(reqwest_client: &'a Client, server: &MockServer) -> TwitterClient<'a> {
        TwitterClient::new(reqwest_client, RequestBuilder::new(Some("token".to_owned())))
            .with_api_base(&server.uri())
            .unwrap()
    }

    fn page(ids: &[&str]) -> serde_json::Value {
        let data: Vec<_> = ids
            .iter()
            .map(|id| json!({"id": id, "text": format!("tweet {}", id)}))
            .collect();
        json!({"data": data, "meta": {"next_token": "older"}})
    }

    #[tokio::test]
    async fn only_new_tweets_are_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/42/tweets"))
            .and(query_param("max_results", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["2", "1"])))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/2/users/42/tweets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["3", "2", "1"])))
            .mount(&server)
            .await;

        let reqwest_client = Client::new();
        let client = client(&reqwest_client, &server);
        let mut monitor =
            TimelineMonitor::new(&client, "42", false, Duration::from_millis(1)).unwrap();
        let mut sink: Vec<Record> = vec![];

        let first = monitor.poll_once(&mut sink).await.unwrap();
        assert_eq!(vec!["2", "1"], first.iter().map(Record::id).collect::<Vec<_>>());
        assert!(monitor.poll_once(&mut sink).await.unwrap().is_empty());
        let third = monitor.poll_once(&mut sink).await.unwrap();
        assert_eq!(vec!["3"], third.iter().map(Record::id).collect::<Vec<_>>());
        assert_eq!(3, sink.len());
    }

    #[tokio::test]
    async fn mentions_retry_after_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/42/mentions"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/2/users/42/mentions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["7"])))
            .mount(&server)
            .await;

        let reqwest_client = Client::new();
        let client = client(&reqwest_client, &server);
        let mut monitor =
            TimelineMonitor::new(&client, "42", true, Duration::from_millis(1)).unwrap();
        let mut sink: Vec<Record> = vec![];

        let fresh = monitor.poll_once(&mut sink).await.unwrap();
        assert_eq!(1, fresh.len());
        assert_eq!(Endpoint::Mentions, monitor.destination().endpoint);
        assert_eq!(2, server.received_requests().await.unwrap().len());
    }
}
