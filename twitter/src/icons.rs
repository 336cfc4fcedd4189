use std::path::Path;

use futures::stream::{self, StreamExt};
use harvest_common::streamed_download;
use tracing::{debug, info, warn};

use crate::client::TwitterClient;
use crate::error::TwitterResult;
use crate::profile::UserProfile;
use crate::progress::ProgressBar;
use crate::rate_limit::BackoffController;

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct IconSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Ids in the second column of a header-less followers CSV, blank ones included.
fn read_ids(followers_csv: &Path) -> TwitterResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(followers_csv)?;

    let mut ids = vec![];
    for record in reader.records() {
        ids.push(record?.get(1).unwrap_or_default().to_owned());
    }
    Ok(ids)
}

/// Download the avatar of every follower listed in `followers_csv` into `icon_dir`, one file per
/// user id. Profiles are looked up one by one; only the image downloads run in parallel.
pub async fn download_icons<PB: ProgressBar>(
    client: &TwitterClient<'_>,
    followers_csv: impl AsRef<Path>,
    icon_dir: impl AsRef<Path>,
    max_connections: usize,
    backoff: &mut BackoffController,
) -> TwitterResult<IconSummary> {
    let ids = read_ids(followers_csv.as_ref())?;
    let icon_dir = icon_dir.as_ref();
    let mut summary = IconSummary::default();

    let profiles = client
        .profile_each::<PB>(&ids, backoff, "profile lookups")
        .await?;
    let mut targets = vec![];
    for (id, profile) in ids.iter().zip(profiles) {
        match profile.as_ref().and_then(UserProfile::icon_url) {
            Some(url) => targets.push((id.clone(), url.to_owned())),
            None => {
                debug!("no profile image for {:?}", id);
                summary.skipped += 1;
            }
        }
    }

    info!("downloading {} icons to {}", targets.len(), icon_dir.display());
    let reqwest_client = client.reqwest_client();
    let results: Vec<_> = stream::iter(targets)
        .map(|(id, url)| async move {
            let result = streamed_download(reqwest_client, url.as_str(), icon_dir.join(&id)).await;
            (id, result)
        })
        .buffer_unordered(max_connections.max(1))
        .collect()
        .await;

    for (id, result) in results {
        match result {
            Ok(_) => summary.downloaded += 1,
            Err(e) => {
                warn!("icon of {} failed: {}", id, e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
