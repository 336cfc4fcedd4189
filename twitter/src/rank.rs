use std::cmp::Reverse;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::client::TwitterClient;
use crate::common_users::read_followers;
use crate::error::TwitterResult;
use crate::progress::ProgressBar;
use crate::rate_limit::BackoffController;

/// A follower together with the size of their own audience.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct RankedFollower {
    pub name: String,
    pub id: String,
    pub username: String,
    pub link: String,
    pub follower_number: u64,
}

/// Look up the follower count of everyone in `followers_csv` and order them by it, largest
/// first. Followers whose lookup fails are left out.
pub async fn rank_followers<PB: ProgressBar>(
    client: &TwitterClient<'_>,
    followers_csv: impl AsRef<Path>,
    backoff: &mut BackoffController,
) -> TwitterResult<Vec<RankedFollower>> {
    let followers = read_followers(followers_csv)?;
    let ids: Vec<String> = followers.iter().map(|f| f.id.clone()).collect();
    let profiles = client
        .profile_each::<PB>(&ids, backoff, "follower counts")
        .await?;

    let mut ranked: Vec<RankedFollower> = followers
        .into_iter()
        .zip(profiles)
        .filter_map(|(follower, profile)| {
            let profile = profile?;
            Some(RankedFollower {
                link: format!("https://twitter.com/intent/user?user_id={}", follower.id),
                name: follower.name,
                id: follower.id,
                username: follower.username,
                follower_number: profile.followers_count,
            })
        })
        .collect();
    ranked.sort_by_key(|r| Reverse(r.follower_number));

    Ok(ranked)
}

/// Write `rows` as CSV with a `name,id,username,link,follower_number` header.
pub fn write_ranked_to<W: Write>(writer: W, rows: &[RankedFollower]) -> TwitterResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_ranked(path: impl AsRef<Path>, rows: &[RankedFollower]) -> TwitterResult<()> {
    write_ranked_to(File::create(path)?, rows)
}
