//! Configuration types for lotto-history

use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

use crate::error::{Error, Result};

/// Lottery service endpoints and request parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Endpoint returning the list of draws for a date range
    #[serde(default = "default_history_url")]
    pub history_url: String,

    /// Endpoint returning the details of a single draw
    #[serde(default = "default_draw_url")]
    pub draw_url: String,

    /// Game name sent with every draw request (default: "LOTTO")
    #[serde(default = "default_game_name")]
    pub game_name: String,

    /// Result limit sent with the history request (default: 10000)
    ///
    /// The service has no usable pagination, so the whole range has to fit in
    /// one page. Draws beyond this limit are silently missing from the
    /// response.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Per-request timeout (None = whatever the transport enforces)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            history_url: default_history_url(),
            draw_url: default_draw_url(),
            game_name: default_game_name(),
            history_limit: default_history_limit(),
            request_timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Worker pool settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum concurrent draw requests (default: 15)
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
        }
    }
}

/// Where the artifacts go
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, created on demand (default: "data/raw")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name for the raw records (default: "lotteries.json")
    #[serde(default = "default_records_file")]
    pub records_file: String,

    /// File name for the flattened detail table (default: "lotteries.csv")
    #[serde(default = "default_details_file")]
    pub details_file: String,

    /// File name for the failed draw list (default: "failed_draw_numbers.json")
    #[serde(default = "default_failures_file")]
    pub failures_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            records_file: default_records_file(),
            details_file: default_details_file(),
            failures_file: default_failures_file(),
        }
    }
}

impl OutputConfig {
    /// Full path of the raw records artifact
    pub fn records_path(&self) -> PathBuf {
        self.output_dir.join(&self.records_file)
    }

    /// Full path of the flattened detail artifact
    pub fn details_path(&self) -> PathBuf {
        self.output_dir.join(&self.details_file)
    }

    /// Full path of the failed draw list artifact
    pub fn failures_path(&self) -> PathBuf {
        self.output_dir.join(&self.failures_file)
    }
}

/// Main configuration for a harvest run
///
/// Every field has a default, so an empty JSON object is a valid config file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Lottery service settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Worker pool settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Artifact locations
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("invalid config file '{}': {}", path.display(), e),
            key: None,
        })
    }

    /// Check that the configuration can drive a run
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.worker_count == 0 {
            return Err(Error::config("worker_count", "must be at least 1"));
        }
        if self.api.history_limit == 0 {
            return Err(Error::config("history_limit", "must be at least 1"));
        }
        if self.api.game_name.trim().is_empty() {
            return Err(Error::config("game_name", "must not be empty"));
        }
        for (key, url) in [
            ("history_url", &self.api.history_url),
            ("draw_url", &self.api.draw_url),
        ] {
            reqwest::Url::parse(url)
                .map_err(|e| Error::config(key, format!("invalid URL '{}': {}", url, e)))?;
        }
        for (key, name) in [
            ("records_file", &self.output.records_file),
            ("details_file", &self.output.details_file),
            ("failures_file", &self.output.failures_file),
        ] {
            if name.trim().is_empty() {
                return Err(Error::config(key, "must not be empty"));
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_history_url() -> String {
    "https://www.nationallottery.co.za/index.php?task=results.getHistoricalData&Itemid=265"
        .to_string()
}

fn default_draw_url() -> String {
    "https://www.nationallottery.co.za/index.php?task=results.redirectPageURL&Itemid=265"
        .to_string()
}

fn default_game_name() -> String {
    "LOTTO".to_string()
}

fn default_history_limit() -> u32 {
    10_000
}

fn default_user_agent() -> String {
    concat!("lotto-history/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_worker_count() -> usize {
    15
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data").join("raw")
}

fn default_records_file() -> String {
    "lotteries.json".to_string()
}

fn default_details_file() -> String {
    "lotteries.csv".to_string()
}

fn default_failures_file() -> String {
    "failed_draw_numbers.json".to_string()
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
