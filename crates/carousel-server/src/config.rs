// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.
//!
//! Secrets (database URL, gateway API key, internal token) additionally
//! support `_FILE` indirection: when `CAROUSEL_X_FILE` points at a readable,
//! non-empty file, its trimmed contents win over `CAROUSEL_X`. This is how
//! Docker/Swarm secrets are mounted.

use std::time::Duration;

use tracing::warn;

/// Default join keyword users send to be admitted.
pub const DEFAULT_JOIN_KEYWORD: &str = "ENTRAR";

/// Carousel server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HTTP listen port.
    pub http_port: u16,
    /// Base URL of the group-provisioning API.
    pub gateway_base_url: String,
    /// API key for the group-provisioning API.
    pub gateway_api_key: String,
    /// Per-request timeout for gateway calls.
    pub gateway_timeout: Duration,
    /// Shared secret expected in the `x-internal-token` header of internal
    /// routes.
    pub internal_token: String,
    /// Keyword that triggers admission from an inbound message.
    pub join_keyword: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `CAROUSEL_DATABASE_URL` (or `_FILE`)
    /// - `CAROUSEL_GATEWAY_BASE_URL`
    /// - `CAROUSEL_GATEWAY_API_KEY` (or `_FILE`)
    /// - `CAROUSEL_INTERNAL_TOKEN` (or `_FILE`)
    ///
    /// Optional (with defaults):
    /// - `CAROUSEL_HTTP_PORT`: HTTP listen port (default: 3000)
    /// - `CAROUSEL_GATEWAY_TIMEOUT_MS`: gateway request timeout (default: 8000)
    /// - `CAROUSEL_JOIN_KEYWORD`: admission keyword (default: `ENTRAR`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env_or_file("CAROUSEL_DATABASE_URL")
            .ok_or(ConfigError::Missing("CAROUSEL_DATABASE_URL"))?;

        let http_port: u16 = std::env::var("CAROUSEL_HTTP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("CAROUSEL_HTTP_PORT", "must be a valid port number")
            })?;

        let gateway_base_url = std::env::var("CAROUSEL_GATEWAY_BASE_URL")
            .map_err(|_| ConfigError::Missing("CAROUSEL_GATEWAY_BASE_URL"))?;

        let gateway_api_key = env_or_file("CAROUSEL_GATEWAY_API_KEY")
            .ok_or(ConfigError::Missing("CAROUSEL_GATEWAY_API_KEY"))?;

        let gateway_timeout_ms: u64 = std::env::var("CAROUSEL_GATEWAY_TIMEOUT_MS")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid(
                    "CAROUSEL_GATEWAY_TIMEOUT_MS",
                    "must be a positive integer of milliseconds",
                )
            })?;

        let internal_token = env_or_file("CAROUSEL_INTERNAL_TOKEN")
            .ok_or(ConfigError::Missing("CAROUSEL_INTERNAL_TOKEN"))?;

        let join_keyword = std::env::var("CAROUSEL_JOIN_KEYWORD")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_JOIN_KEYWORD.to_string());

        Ok(Self {
            database_url,
            http_port,
            gateway_base_url,
            gateway_api_key,
            gateway_timeout: Duration::from_millis(gateway_timeout_ms),
            internal_token,
            join_keyword,
        })
    }
}

/// Read `KEY_FILE` (secret file indirection) first, then fall back to `KEY`.
fn env_or_file(key: &str) -> Option<String> {
    if let Ok(path) = std::env::var(format!("{key}_FILE")) {
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let value = contents.trim().to_string();
                if !value.is_empty() {
                    return Some(value);
                }
            }
            Err(err) => {
                warn!(key, path = %path, error = %err, "failed to read secret file, falling back to env");
            }
        }
    }
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set env vars for a test and restore them after
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::set_var(key, value) };
        }

        fn remove(&mut self, key: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::remove_var(key) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.drain(..).rev() {
                // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
                unsafe {
                    match value {
                        Some(v) => env::set_var(&key, v),
                        None => env::remove_var(&key),
                    }
                }
            }
        }
    }

    fn set_required(guard: &mut EnvGuard) {
        guard.set("CAROUSEL_DATABASE_URL", "postgres://localhost/carousel");
        guard.set("CAROUSEL_GATEWAY_BASE_URL", "https://gw.example.com");
        guard.set("CAROUSEL_GATEWAY_API_KEY", "key");
        guard.set("CAROUSEL_INTERNAL_TOKEN", "token");
        guard.remove("CAROUSEL_DATABASE_URL_FILE");
        guard.remove("CAROUSEL_GATEWAY_API_KEY_FILE");
        guard.remove("CAROUSEL_INTERNAL_TOKEN_FILE");
        guard.remove("CAROUSEL_HTTP_PORT");
        guard.remove("CAROUSEL_GATEWAY_TIMEOUT_MS");
        guard.remove("CAROUSEL_JOIN_KEYWORD");
    }

    #[test]
    fn config_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();
        set_required(&mut guard);

        let config = Config::from_env().unwrap();
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.gateway_timeout, Duration::from_millis(8000));
        assert_eq!(config.join_keyword, "ENTRAR");
    }

    #[test]
    fn config_missing_database_url() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();
        set_required(&mut guard);
        guard.remove("CAROUSEL_DATABASE_URL");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CAROUSEL_DATABASE_URL")));
    }

    #[test]
    fn config_invalid_port() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();
        set_required(&mut guard);
        guard.set("CAROUSEL_HTTP_PORT", "not_a_port");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("CAROUSEL_HTTP_PORT", _)));
    }

    #[test]
    fn secret_file_wins_over_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();
        set_required(&mut guard);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "token-from-file  ").unwrap();
        guard.set(
            "CAROUSEL_INTERNAL_TOKEN_FILE",
            file.path().to_str().unwrap(),
        );

        let config = Config::from_env().unwrap();
        assert_eq!(config.internal_token, "token-from-file");
    }

    #[test]
    fn unreadable_secret_file_falls_back_to_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();
        set_required(&mut guard);
        guard.set("CAROUSEL_INTERNAL_TOKEN_FILE", "/nonexistent/secret");

        let config = Config::from_env().unwrap();
        assert_eq!(config.internal_token, "token");
    }

    #[test]
    fn custom_join_keyword() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();
        set_required(&mut guard);
        guard.set("CAROUSEL_JOIN_KEYWORD", "JOIN");

        let config = Config::from_env().unwrap();
        assert_eq!(config.join_keyword, "JOIN");
    }
}
