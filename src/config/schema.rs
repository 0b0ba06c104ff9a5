use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Newline-delimited list of pages to audit.
    #[serde(default = "default_seed_file")]
    pub seed_file: PathBuf,

    /// Root of the artifact store; batch directories and the run ledger
    /// live underneath.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    #[serde(default = "default_audit_timeout")]
    #[validate(range(min = 1))]
    pub audit_timeout_secs: u64,

    #[serde(default = "default_http_timeout")]
    #[validate(range(min = 1))]
    pub http_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    #[validate(length(min = 1))]
    pub user_agent: String,

    #[serde(default = "default_channel_capacity")]
    #[validate(range(min = 1))]
    pub channel_capacity: usize,

    #[serde(default = "default_lighthouse_bin")]
    #[validate(length(min = 1))]
    pub lighthouse_bin: String,

    #[serde(default = "default_chrome_flags")]
    pub chrome_flags: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            seed_file: default_seed_file(),
            results_dir: default_results_dir(),
            audit_timeout_secs: default_audit_timeout(),
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
            channel_capacity: default_channel_capacity(),
            lighthouse_bin: default_lighthouse_bin(),
            chrome_flags: default_chrome_flags(),
        }
    }
}

impl AppConfig {
    pub fn ledger_file(&self) -> PathBuf {
        self.results_dir.join("pastRuns.json")
    }

    pub fn index_file(&self) -> PathBuf {
        self.results_dir.join("index.html")
    }

    pub fn audit_timeout(&self) -> Duration {
        Duration::from_secs(self.audit_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn default_seed_file() -> PathBuf {
    PathBuf::from("urls.txt")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_audit_timeout() -> u64 {
    180
}

fn default_http_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "beacon/0.1".to_string()
}

fn default_channel_capacity() -> usize {
    64
}

fn default_lighthouse_bin() -> String {
    "lighthouse".to_string()
}

fn default_chrome_flags() -> Vec<String> {
    vec!["--headless".to_string()]
}
