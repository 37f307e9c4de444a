//! Runtime configuration for console-agent-gateway.
//!
//! Configuration can be loaded from a JSON file and overridden from the
//! command line or environment. It is built once at startup and shared
//! read-only behind an `Arc`.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::Parser;
use serde::{Deserialize, Serialize};

/// Default backend endpoint: the console virtual-assistant "talk" API.
pub const DEFAULT_BACKEND_URL: &str =
    "https://console.redhat.com/api/virtual-assistant-v2/v2/talk";

/// Model identifier reported in every completion.
pub const DEFAULT_MODEL: &str = "red-hat-console-agent";

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "console-agent-gateway",
    about = "OpenAI-style chat gateway for the Red Hat Console virtual assistant"
)]
pub struct Cli {
    /// Path to an optional configuration file (JSON).
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "gateway.json")]
    pub config: PathBuf,

    /// HTTP listen address.
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen: Option<String>,

    /// Backend talk endpoint.
    #[arg(long, env = "ARH_API_URL")]
    pub backend_url: Option<String>,

    /// Bearer credential forwarded to the backend.
    #[arg(long, env = "ARH_JWT_TOKEN", hide_env_values = true)]
    pub backend_token: Option<String>,

    /// Shared secret inbound callers must present as a bearer token.
    #[arg(long, env = "AGENT_BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Backend conversational API.
    pub backend: BackendConfig,

    /// Inbound authentication.
    pub auth: AuthConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8081").
    pub listen: String,

    /// Model identifier placed in completion responses.
    pub model: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8081".to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Backend client settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Fixed URL every query is POSTed to.
    pub url: String,

    /// Bearer credential for the backend. May be empty; the backend then
    /// rejects the call itself.
    pub token: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            token: String::new(),
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("token", &redacted(&self.token))
            .finish()
    }
}

/// Inbound bearer authentication settings.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// The shared secret compared against `Authorization: Bearer <token>`.
    pub bearer_token: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("bearer_token", &redacted(&self.bearer_token))
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Load the file named by the CLI, apply CLI/env overrides and validate.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = Self::load(&cli.config)?;
        config.apply_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    /// Values given on the command line (or via env) win over the file.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.server.listen = listen.clone();
        }
        if let Some(url) = &cli.backend_url {
            self.backend.url = url.clone();
        }
        if let Some(token) = &cli.backend_token {
            self.backend.token = token.clone();
        }
        if let Some(token) = &cli.bearer_token {
            self.auth.bearer_token = token.clone();
        }
    }

    /// Reject configurations the gateway cannot run safely with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.bearer_token.is_empty() {
            bail!("no inbound bearer token configured (set AGENT_BEARER_TOKEN or auth.bearer_token)");
        }
        if self.backend.url.is_empty() {
            bail!("backend url must not be empty");
        }
        Ok(())
    }
}
