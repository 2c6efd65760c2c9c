//! Server configuration

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use leverage_services::trailing_stop_monitor::DEFAULT_POLL_INTERVAL_MS;

/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,leverage_api=debug,leverage_services=debug";

/// Configuration for the API server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// How often the trailing stop monitor polls prices
    pub trailing_stop_poll: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            trailing_stop_poll: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads:
    /// - PORT: listening port (default 3000)
    /// - HOST: bind address (default 0.0.0.0)
    /// - TRAILING_STOP_POLL_MS: trailing stop poll interval (default 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.port = parse_var("PORT", &port)?;
        }

        if let Some(host) = lookup("HOST") {
            config.host = parse_var("HOST", &host)?;
        }

        if let Some(poll) = lookup("TRAILING_STOP_POLL_MS") {
            let millis: u64 = parse_var("TRAILING_STOP_POLL_MS", &poll)?;
            if millis == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "TRAILING_STOP_POLL_MS".to_string(),
                    error: "must be greater than zero".to_string(),
                });
            }
            config.trailing_stop_poll = Duration::from_millis(millis);
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T>(field: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        field: field.to_string(),
        error: e.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {error}")]
    InvalidValue { field: String, error: String },
}
