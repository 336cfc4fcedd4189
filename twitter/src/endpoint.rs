use std::fmt::Display;

/// Resources the fetch engine knows how to request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Endpoint {
    LikedTweets,
    Followers,
    Timeline,
    Mentions,
    UserProfile,
}

impl Endpoint {
    /// Path relative to the API base, with `{id}` already substituted.
    pub fn path(&self, subject_id: &str) -> String {
        match self {
            Self::LikedTweets => format!("2/users/{}/liked_tweets", subject_id),
            Self::Followers => format!("2/users/{}/followers", subject_id),
            Self::Timeline => format!("2/users/{}/tweets", subject_id),
            Self::Mentions => format!("2/users/{}/mentions", subject_id),
            Self::UserProfile => "1.1/users/show.json".to_owned(),
        }
    }

    /// Fixed query parameters sent with every request to this endpoint.
    pub fn params(&self, subject_id: &str) -> Vec<(&'static str, String)> {
        let mut params = match self {
            Self::LikedTweets => vec![("tweet.fields", "lang,author_id".to_owned())],
            Self::Followers => vec![("user.fields", "created_at".to_owned())],
            Self::Timeline | Self::Mentions => {
                vec![("tweet.fields", "created_at,author_id".to_owned())]
            }
            Self::UserProfile => vec![
                ("user_id", subject_id.to_owned()),
                ("include_entities", "false".to_owned()),
            ],
        };
        if let Some(size) = self.page_size() {
            params.push(("max_results", size.to_string()));
        }
        params
    }

    /// Largest page the API will return, `None` for endpoints that do not paginate.
    pub fn page_size(&self) -> Option<u64> {
        match self {
            Self::LikedTweets | Self::Timeline | Self::Mentions => Some(100),
            Self::Followers => Some(1000),
            Self::UserProfile => None,
        }
    }

    /// Items (or lookups, for profiles) the API allows per 15 minute window.
    pub fn quota_per_window(&self) -> u64 {
        match self {
            Self::LikedTweets | Self::Timeline | Self::Mentions => 1500,
            Self::Followers => 15000,
            Self::UserProfile => 300,
        }
    }

    /// Suffix of the CSV file records from this endpoint are appended to.
    pub fn file_suffix(&self) -> Option<&'static str> {
        match self {
            Self::LikedTweets => Some("liked_tweets"),
            Self::Followers => Some("followers_data"),
            Self::Timeline => Some("timeline_data"),
            Self::Mentions => Some("mentions_data"),
            Self::UserProfile => None,
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.page_size().is_some()
    }

    /// Whether the profile lookup reports the size of this collection.
    pub fn has_profile_total(&self) -> bool {
        matches!(self, Self::LikedTweets | Self::Followers | Self::Timeline)
    }

    pub fn returns_users(&self) -> bool {
        matches!(self, Self::Followers)
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::LikedTweets => "liked tweets",
            Self::Followers => "followers",
            Self::Timeline => "timeline",
            Self::Mentions => "mentions",
            Self::UserProfile => "user profile",
        };
        write!(f, "{}", name)
    }
}
