/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed console, polling and logging configuration
[POS]:    Configuration layer - startup settings
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chaperone_adapter::{ClientConfig, ConsoleClient, Credentials, TailSource};
use serde::{Deserialize, Serialize};

use crate::poller::{FailurePolicy, PollerConfig};
use crate::render::RenderPolicy;

/// Top-level configuration for the tail client
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TailConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Command runs to tail on `watch` without arguments
    #[serde(default)]
    pub targets: Vec<TailSource>,
}

/// Console backend connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Django session key of a logged-in operator
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            session_id: None,
            cookie_name: default_cookie_name(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Polling behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Delay between starting a run and its first tail request
    #[serde(default = "default_interval_ms")]
    pub initial_delay_ms: u64,
    /// Full-log servers want the default; `append` only for incremental ones
    #[serde(default)]
    pub policy: RenderPolicy,
    #[serde(default)]
    pub on_error: FailurePolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            initial_delay_ms: default_interval_ms(),
            policy: RenderPolicy::default(),
            on_error: FailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Also write logs to a daily-rolling file in this directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_cookie_name() -> String {
    chaperone_adapter::http::client::DEFAULT_SESSION_COOKIE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_interval_ms() -> u64 {
    2000
}

impl TailConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    /// `$CONFIG_DIR/chaperone-tail/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chaperone-tail").join("config.yaml"))
    }

    pub fn render_policy(&self) -> RenderPolicy {
        self.poll.policy
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(self.poll.interval_ms),
            policy: self.render_policy(),
            on_error: self.poll.on_error,
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.poll.initial_delay_ms)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.server.timeout_secs),
            connect_timeout: Duration::from_secs(self.server.connect_timeout_secs),
        }
    }

    pub fn build_client(&self) -> anyhow::Result<ConsoleClient> {
        let mut client =
            ConsoleClient::with_config_and_base_url(self.client_config(), &self.server.base_url)
                .context("build console client")?;
        if let Some(session_id) = &self.server.session_id {
            client.set_credentials(Credentials {
                cookie_name: self.server.cookie_name.clone(),
                session_id: session_id.clone(),
            });
        }
        Ok(client)
    }
}
