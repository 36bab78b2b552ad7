// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::PathBuf;

use graft_query::PageLimits;
use serde::Serialize;

pub const ENV_BIND: &str = "GRAFT_BIND";
pub const ENV_MAX_PAGE_SIZE: &str = "GRAFT_MAX_PAGE_SIZE";
pub const ENV_DEFAULT_PAGE_SIZE: &str = "GRAFT_DEFAULT_PAGE_SIZE";
pub const ENV_CURSOR_SECRET: &str = "GRAFT_CURSOR_SECRET";
pub const ENV_INCLUDE_TOTAL_COUNT: &str = "GRAFT_INCLUDE_TOTAL_COUNT";
pub const ENV_SCHEMA_PATH: &str = "GRAFT_SCHEMA_PATH";
pub const ENV_SEED_DEMO: &str = "GRAFT_SEED_DEMO";
pub const ENV_DENY_ANONYMOUS_WRITES: &str = "GRAFT_DENY_ANONYMOUS_WRITES";
pub use graft_core::ENV_GRAFT_LOG_JSON as ENV_LOG_JSON;

/// Used when `GRAFT_CURSOR_SECRET` is unset. Cursors signed with it are forgeable.
pub const DEV_CURSOR_SECRET: &str = "graft-dev-cursor-secret";

#[derive(Clone, Serialize)]
pub struct ServerConfig {
    pub bind: String,
    pub limits: PageLimits,
    #[serde(skip)]
    pub cursor_secret: String,
    pub log_json: bool,
    pub include_total_count: bool,
    /// JSON schema declaration; the bundled demo graph when unset.
    pub schema_path: Option<PathBuf>,
    pub seed_demo: bool,
    pub deny_anonymous_writes: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind", &self.bind)
            .field("limits", &self.limits)
            .field("cursor_secret", &"<redacted>")
            .field("log_json", &self.log_json)
            .field("include_total_count", &self.include_total_count)
            .field("schema_path", &self.schema_path)
            .field("seed_demo", &self.seed_demo)
            .field("deny_anonymous_writes", &self.deny_anonymous_writes)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            limits: PageLimits::default(),
            cursor_secret: DEV_CURSOR_SECRET.to_string(),
            log_json: true,
            include_total_count: true,
            schema_path: None,
            seed_demo: true,
            deny_anonymous_writes: false,
        }
    }
}

pub(crate) fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

pub(crate) fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    /// Reads `GRAFT_*` variables. Does not log: the subscriber is installed from the result, so
    /// callers report [`ServerConfig::uses_dev_cursor_secret`] once tracing is up.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cursor_secret =
            env::var(ENV_CURSOR_SECRET).unwrap_or_else(|_| defaults.cursor_secret.clone());
        Self {
            bind: env::var(ENV_BIND).unwrap_or(defaults.bind),
            limits: PageLimits {
                max_page_size: env_usize(ENV_MAX_PAGE_SIZE, defaults.limits.max_page_size),
                default_page_size: env_usize(
                    ENV_DEFAULT_PAGE_SIZE,
                    defaults.limits.default_page_size,
                ),
            },
            cursor_secret,
            log_json: env_bool(ENV_LOG_JSON, defaults.log_json),
            include_total_count: env_bool(ENV_INCLUDE_TOTAL_COUNT, defaults.include_total_count),
            schema_path: env::var(ENV_SCHEMA_PATH)
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            seed_demo: env_bool(ENV_SEED_DEMO, defaults.seed_demo),
            deny_anonymous_writes: env_bool(
                ENV_DENY_ANONYMOUS_WRITES,
                defaults.deny_anonymous_writes,
            ),
        }
    }

    #[must_use]
    pub fn uses_dev_cursor_secret(&self) -> bool {
        self.cursor_secret == DEV_CURSOR_SECRET
    }

    pub fn validate(&self) -> Result<(), String> {
        self.limits.validate()?;
        if self.cursor_secret.is_empty() {
            return Err(format!("{ENV_CURSOR_SECRET} must not be empty"));
        }
        self.bind
            .parse::<std::net::SocketAddr>()
            .map_err(|e| format!("invalid bind addr {}: {e}", self.bind))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_secret_is_flagged_until_a_real_one_is_set() {
        let mut cfg = ServerConfig::default();
        assert!(cfg.uses_dev_cursor_secret());
        cfg.cursor_secret = "rotated-secret".to_string();
        assert!(!cfg.uses_dev_cursor_secret());
    }

    #[test]
    fn defaults_validate() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_limits_secret_and_bind() {
        let mut cfg = ServerConfig::default();
        cfg.limits.default_page_size = cfg.limits.max_page_size + 1;
        assert!(cfg.validate().is_err());

        let mut cfg = ServerConfig::default();
        cfg.cursor_secret.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = ServerConfig::default();
        cfg.bind = "not-an-addr".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let cfg = ServerConfig::default();
        assert!(!format!("{cfg:?}").contains(DEV_CURSOR_SECRET));
    }
}
