use clap::{Args, ValueEnum};
use std::fmt::{Display, Formatter};
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => f.write_str("http"),
            Protocol::Https => f.write_str("https"),
        }
    }
}

/// Connection settings for the Obsidian Local REST API plugin.
#[derive(Args, Clone, Debug)]
pub struct ObsidianConfig {
    /// API key of the Local REST API plugin
    #[arg(long, env = "OBSIDIAN_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Host the plugin listens on
    #[arg(long = "obsidian-host", env = "OBSIDIAN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port the plugin listens on
    #[arg(long = "obsidian-port", env = "OBSIDIAN_PORT", default_value_t = 27124)]
    pub port: u16,

    /// Protocol of the plugin endpoint
    #[arg(long = "obsidian-protocol", env = "OBSIDIAN_PROTOCOL", value_enum, default_value_t = Protocol::Https)]
    pub protocol: Protocol,

    /// Request timeout in seconds
    #[arg(long = "obsidian-timeout", env = "OBSIDIAN_TIMEOUT", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Verify the TLS certificate (the plugin ships a self-signed one)
    #[arg(long = "verify-ssl", env = "OBSIDIAN_VERIFY_SSL", default_value_t = false)]
    pub verify_ssl: bool,
}

impl ObsidianConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            host: "127.0.0.1".to_string(),
            port: 27124,
            protocol: Protocol::Https,
            timeout_secs: 30,
            verify_ssl: false,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
