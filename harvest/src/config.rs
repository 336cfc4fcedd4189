use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use home_dir::HomeDirExt;
use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    /// Used when `BEARER_TOKEN` is not set
    pub bearer: Option<String>,
    #[serde(deserialize_with = "deserialize_directory")]
    pub download_path: PathBuf,
    #[serde(deserialize_with = "deserialize_directory")]
    pub icon_path: PathBuf,
    pub api_base: String,
    pub max_connections: usize,
    pub throttle_wait_secs: u64,
    pub monitor_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bearer: None,
            download_path: PathBuf::from("."),
            icon_path: PathBuf::from("icon"),
            api_base: "https://api.twitter.com".to_owned(),
            max_connections: 20,
            throttle_wait_secs: 900,
            monitor_interval_secs: 60,
        }
    }
}

impl Config {
    /// Read the config file at `path`. A missing file yields the defaults.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let conf_contents = std::fs::read_to_string(path)?;
        toml::from_str(&conf_contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn throttle_wait(&self) -> Duration {
        Duration::from_secs(self.throttle_wait_secs)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }
}

fn deserialize_directory<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let s: PathBuf = Deserialize::deserialize(deserializer)?;
    s.expand_home().map_err(D::Error::custom)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let conf = Config::read(dir.path().join("config.toml")).unwrap();

        assert_eq!(None, conf.bearer);
        assert_eq!(PathBuf::from("."), conf.download_path);
        assert_eq!(PathBuf::from("icon"), conf.icon_path);
        assert_eq!(Duration::from_secs(900), conf.throttle_wait());
        assert_eq!(Duration::from_secs(60), conf.monitor_interval());
        assert_eq!(20, conf.max_connections);
    }

    #[test]
    fn partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "bearer = \"abc\"\ndownload_path = \"~/archive\"\nmax_connections = 4\n",
        )
        .unwrap();
        let conf = Config::read(&path).unwrap();

        assert_eq!(Some("abc"), conf.bearer.as_deref());
        assert!(!conf.download_path.starts_with("~"));
        assert!(conf.download_path.ends_with("archive"));
        assert_eq!(4, conf.max_connections);
        assert_eq!("https://api.twitter.com", conf.api_base);
    }

    #[test]
    fn invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_connections = \"many\"\n").unwrap();

        assert!(Config::read(&path).is_err());
    }
}
