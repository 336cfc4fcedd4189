mod config;
mod progress;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use twitter::common_users::{find_common_users, write_common_users, write_common_users_to};
use twitter::icons::download_icons;
use twitter::rank::{rank_followers, write_ranked, write_ranked_to};
use twitter::{CsvSink, Endpoint, Record, RequestBuilder, TimelineMonitor, TwitterClient};

use crate::config::Config;
use crate::progress::ProgressBar;

/// Archive a Twitter user's likes, followers, avatars and timeline
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// Config file location
    #[clap(short, long, default_value_os_t = default_config_path(), value_parser)]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save every tweet the user has liked
    Liked {
        #[clap(short = 'i', long, value_parser)]
        userid: String,
    },
    /// Save the user's full follower list
    Followers {
        #[clap(short = 'i', long, value_parser)]
        userid: String,
    },
    /// Save the user's own tweets
    Timeline {
        #[clap(short = 'i', long, value_parser)]
        userid: String,
    },
    /// Save tweets mentioning the user
    Mentions {
        #[clap(short = 'i', long, value_parser)]
        userid: String,
    },
    /// Print new tweets as they appear
    Monitor {
        #[clap(short = 'i', long, value_parser)]
        userid: String,

        /// Watch mentions instead of the user's own tweets
        #[clap(long)]
        mentions: bool,
    },
    /// Download the avatar of every follower in a followers CSV
    Icons {
        #[clap(short, long, value_parser)]
        file: PathBuf,
    },
    /// Find users that appear in all given followers CSVs
    Common {
        #[clap(short = 'f', long = "file", value_parser, required = true)]
        files: Vec<PathBuf>,

        /// Write the result here instead of stdout
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,
    },
    /// Rank the followers in a followers CSV by their own follower count
    Rank {
        #[clap(short, long, value_parser)]
        file: PathBuf,

        /// Write the result here instead of stdout
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,
    },
}

fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "Tweet Harvest")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    dotenv::dotenv().ok();

    match run().await {
        Ok(_) => process::exit(0),
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let conf = Config::read(&args.config)?;

    let reqwest_client = reqwest::Client::new();
    let client = TwitterClient::new(&reqwest_client, RequestBuilder::from_env(conf.bearer.clone()))
        .with_api_base(&conf.api_base)?
        .with_throttle_wait(conf.throttle_wait());

    match args.command {
        Command::Liked { userid } => fetch(&client, &conf, Endpoint::LikedTweets, &userid).await?,
        Command::Followers { userid } => {
            fetch(&client, &conf, Endpoint::Followers, &userid).await?
        }
        Command::Timeline { userid } => fetch(&client, &conf, Endpoint::Timeline, &userid).await?,
        Command::Mentions { userid } => fetch(&client, &conf, Endpoint::Mentions, &userid).await?,
        Command::Monitor { userid, mentions } => {
            let mut monitor =
                TimelineMonitor::new(&client, &userid, mentions, conf.monitor_interval())?;
            let mut sink = CsvSink::new(&conf.download_path);
            monitor
                .run(&mut sink, conf.monitor_interval(), |records| {
                    for record in records {
                        if let Record::Tweet(tweet) = record {
                            println!("{}", tweet.text);
                            println!("{}", "-".repeat(40));
                        }
                    }
                })
                .await?;
        }
        Command::Icons { file } => {
            let mut backoff = client.backoff();
            let summary = download_icons::<ProgressBar>(
                &client,
                &file,
                &conf.icon_path,
                conf.max_connections,
                &mut backoff,
            )
            .await?;
            info!(
                "{} icons saved to {}, {} skipped, {} failed",
                summary.downloaded,
                conf.icon_path.display(),
                summary.skipped,
                summary.failed
            );
        }
        Command::Common { files, output } => {
            let rows = find_common_users(&files)?;
            info!("{} users in common", rows.len());
            match output {
                Some(path) => write_common_users(path, &rows)?,
                None => write_common_users_to(std::io::stdout().lock(), &rows)?,
            }
        }
        Command::Rank { file, output } => {
            let mut backoff = client.backoff();
            let ranked = rank_followers::<ProgressBar>(&client, &file, &mut backoff).await?;
            info!("ranked {} followers", ranked.len());
            match output {
                Some(path) => write_ranked(path, &ranked)?,
                None => write_ranked_to(std::io::stdout().lock(), &ranked)?,
            }
        }
    }

    Ok(())
}

async fn fetch(
    client: &TwitterClient<'_>,
    conf: &Config,
    endpoint: Endpoint,
    userid: &str,
) -> Result<()> {
    let mut sink = CsvSink::new(&conf.download_path);
    let outcome = client
        .fetch_all::<ProgressBar, _>(endpoint, userid, &mut sink)
        .await?;
    info!(
        "saved {} {} of {} to {}",
        outcome.records,
        endpoint,
        userid,
        sink.directory().display()
    );
    if outcome.skipped > 0 {
        info!("{} malformed records were skipped", outcome.skipped);
    }
    Ok(())
}
