use std::collections::HashSet;

use tracing::{info, warn};

use crate::client::TwitterClient;
use crate::endpoint::Endpoint;
use crate::error::{TwitterError, TwitterResult};
use crate::progress::{ProgressBar, ProgressReport};
use crate::rate_limit::{BackoffController, Verdict};
use crate::record::Page;
use crate::request::FetchRequest;
use crate::sink::{Destination, Sink};

/// Running totals of one full fetch.
#[derive(Clone, Debug)]
pub struct FetchSession {
    pub subject_id: String,
    pub expected_total: Option<u64>,
    pub fetched: u64,
    /// Quota assumed to be covered by the rate limit waits so far.
    pub waited_quota: u64,
    pub cursor: Option<String>,
    consumed: HashSet<String>,
}

impl FetchSession {
    pub fn new(subject_id: impl Into<String>, expected_total: Option<u64>) -> Self {
        Self {
            subject_id: subject_id.into(),
            expected_total,
            fetched: 0,
            waited_quota: 0,
            cursor: None,
            consumed: HashSet::new(),
        }
    }

    pub fn report(&self, quota_per_window: u64) -> ProgressReport {
        ProgressReport::render(
            self.expected_total.unwrap_or(0),
            self.fetched,
            quota_per_window,
        )
    }

    /// Fetched count plus one quota for every window spent waiting.
    pub fn projected(&self) -> u64 {
        self.fetched + self.waited_quota
    }

    /// Report shown while throttled, counting the volume the wait stands for.
    pub fn throttled_report(&self, quota_per_window: u64) -> ProgressReport {
        ProgressReport::render(
            self.expected_total.unwrap_or(0),
            self.projected(),
            quota_per_window,
        )
    }

    fn record_page(&mut self, written: usize) {
        self.fetched += written as u64;
    }

    fn record_throttle(&mut self, quota_per_window: u64) {
        self.waited_quota += quota_per_window;
    }

    /// Move to `next`, refusing a cursor this session already followed.
    fn advance(&mut self, endpoint: Endpoint, next: String) -> TwitterResult<()> {
        if !self.consumed.insert(next.clone()) {
            return Err(TwitterError::data_shape(
                endpoint,
                format!("pagination cursor {} was returned twice", next),
            ));
        }
        self.cursor = Some(next);
        Ok(())
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub session: FetchSession,
    pub requests: usize,
    pub pages: usize,
    /// Records handed to the sink.
    pub records: u64,
    pub skipped: usize,
    pub throttles: usize,
}

/// Walks a cursor-paginated endpoint one request at a time.
pub struct Paginator<'c, 'a> {
    client: &'c TwitterClient<'a>,
    expected_total: Option<u64>,
}

impl<'c, 'a> Paginator<'c, 'a> {
    pub fn new(client: &'c TwitterClient<'a>, expected_total: Option<u64>) -> Self {
        Self {
            client,
            expected_total,
        }
    }

    /// Fetch every page reachable from `initial`, handing each page to `sink` before following its
    /// cursor. A request that is rate limited is retried unchanged once the wait is over.
    pub async fn run<PB: ProgressBar, S: Sink>(
        &self,
        initial: FetchRequest,
        sink: &mut S,
        backoff: &mut BackoffController,
    ) -> TwitterResult<FetchOutcome> {
        let endpoint = initial.endpoint();
        if !endpoint.is_paginated() {
            return Err(TwitterError::Configuration(format!(
                "{} cannot be paginated",
                endpoint
            )));
        }

        let mut session = FetchSession::new(initial.subject_id(), self.expected_total);
        if let Some(cursor) = initial.cursor() {
            session.advance(endpoint, cursor.to_owned())?;
        }

        let pb = PB::init(
            self.expected_total,
            &format!("{} of {}", endpoint, initial.subject_id()),
        );
        let mut outcome = FetchOutcome {
            session,
            requests: 0,
            pages: 0,
            records: 0,
            skipped: 0,
            throttles: 0,
        };
        let result = self
            .drive(initial, sink, backoff, &pb, &mut outcome)
            .await;
        pb.destroy();
        outcome.records = outcome.session.fetched;
        outcome.throttles = backoff.throttles();

        match result {
            Ok(()) => {
                info!(
                    %endpoint,
                    subject = %outcome.session.subject_id,
                    fetched = outcome.session.fetched,
                    requests = outcome.requests,
                    "done"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(
                    %endpoint,
                    fetched = outcome.session.fetched,
                    "aborting after {} pages",
                    outcome.pages
                );
                Err(e)
            }
        }
    }

    async fn drive<PB: ProgressBar, S: Sink>(
        &self,
        mut request: FetchRequest,
        sink: &mut S,
        backoff: &mut BackoffController,
        pb: &PB,
        outcome: &mut FetchOutcome,
    ) -> TwitterResult<()> {
        let endpoint = request.endpoint();
        let quota = endpoint.quota_per_window();
        let destination = Destination::new(request.subject_id(), endpoint);

        loop {
            outcome.requests += 1;
            let resp = self.client.send(&request, None).await?;

            if let Verdict::Throttle(wait) = backoff.inspect(&resp)? {
                outcome.session.record_throttle(quota);
                let report = outcome.session.throttled_report(quota);
                info!(%endpoint, "rate limited, waiting {:?}: {}", wait, report);
                pb.throttled(&report, wait);
                backoff.wait(wait).await;
                continue;
            }

            // No data field: the collection is exhausted
            let Some(page) = Page::parse(endpoint, &resp.body)? else {
                outcome.session.cursor = None;
                backoff.finish();
                return Ok(());
            };
            outcome.pages += 1;
            outcome.skipped += page.skipped;

            // Persist before looking at the cursor
            let written = sink.append(&destination, &page.records)?;
            outcome.session.record_page(written);
            pb.update(&outcome.session.report(quota));

            match page.next_cursor {
                Some(next) => {
                    outcome.session.advance(endpoint, next.clone())?;
                    request.set_cursor(next);
                }
                None => {
                    outcome.session.cursor = None;
                    backoff.finish();
                    return Ok(());
                }
            }
        }
    }
}

impl TwitterClient<'_> {
    /// Fetch the whole `endpoint` collection of `subject_id` into `sink`, using the profile's
    /// count (when it has one) as the expected total.
    pub async fn fetch_all<PB: ProgressBar, S: Sink>(
        &self,
        endpoint: Endpoint,
        subject_id: &str,
        sink: &mut S,
    ) -> TwitterResult<FetchOutcome> {
        let request = self.request(endpoint, subject_id)?;

        let expected_total = if endpoint.has_profile_total() {
            let profile = self.profile(subject_id).await?;
            let total = profile.total_for(endpoint);
            if let Some(total) = total {
                info!("{} has {} {}", profile.screen_name, total, endpoint);
            }
            total
        } else {
            None
        };

        let mut backoff = self.backoff();
        Paginator::new(self, expected_total)
            .run::<PB, S>(request, sink, &mut backoff)
            .await
    }
}
