mod client;
pub mod common_users;
pub mod endpoint;
mod error;
pub mod icons;
mod monitor;
mod paginator;
mod profile;
mod progress;
pub mod rank;
mod rate_limit;
mod record;
mod request;
mod sink;

pub use client::{ApiResponse, TwitterClient};
pub use endpoint::Endpoint;
pub use error::{TwitterError, TwitterResult};
pub use monitor::TimelineMonitor;
pub use paginator::{FetchOutcome, FetchSession, Paginator};
pub use profile::UserProfile;
pub use progress::{ProgressBar, ProgressReport};
pub use rate_limit::{BackoffController, BackoffState, Verdict};
pub use record::{Page, Record, Tweet, User};
pub use request::{FetchRequest, RequestBuilder, TOKEN_VAR};
pub use sink::{CsvSink, Destination, Sink};
