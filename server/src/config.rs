use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("history limit must be greater than 0")]
    ZeroHistoryLimit,

    #[error("max frame size must be greater than 0")]
    ZeroFrameSize,

    #[error("allowed origin must not be empty")]
    EmptyOrigin,
}

/// Whiteboard relay configuration, read from CLI arguments or the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "whiteboard-server")]
#[command(about = "Relays drawing events between members of shared canvas rooms")]
pub struct Config {
    /// HTTP/WebSocket bind address
    #[arg(long, env = "WHITEBOARD_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Seconds an empty room is kept before it is deleted
    #[arg(long, env = "WHITEBOARD_GRACE_PERIOD_SECS", default_value_t = 300)]
    pub grace_period_secs: u64,

    /// Drawing operations remembered per room
    #[arg(long, env = "WHITEBOARD_HISTORY_LIMIT", default_value_t = 10_000)]
    pub history_limit: usize,

    /// Largest accepted WebSocket frame in bytes
    #[arg(long, env = "WHITEBOARD_MAX_FRAME_SIZE", default_value_t = 10_000_000)]
    pub max_frame_size: usize,

    /// Browser origin allowed by CORS
    #[arg(
        long,
        env = "WHITEBOARD_ALLOWED_ORIGIN",
        default_value = "http://localhost:3000"
    )]
    pub allowed_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            grace_period_secs: 300,
            history_limit: 10_000,
            max_frame_size: 10_000_000,
            allowed_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::ZeroHistoryLimit);
        }
        if self.max_frame_size == 0 {
            return Err(ConfigError::ZeroFrameSize);
        }
        if self.allowed_origin.trim().is_empty() {
            return Err(ConfigError::EmptyOrigin);
        }
        Ok(())
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}
