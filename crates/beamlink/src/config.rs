//! Environment-driven configuration for the relay binary.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

/// Process configuration, read from the environment.
pub struct Config {
    /// Interface to bind (`BIND_ADDR`, default `0.0.0.0`).
    pub bind_addr: String,
    /// Port to listen on (`PORT`, default `3000`).
    pub port: u16,
}

impl Config {
    pub fn load() -> Self {
        Self {
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
        }
    }

    /// The `addr:port` string to bind.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Reads an env var and parses it, falling back to `default` when the
/// variable is unset or malformed.
fn env_or<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    let Ok(raw) = env::var(key) else {
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("invalid {key} value {raw:?} ({e}), using {default}");
            default
        }
    }
}
