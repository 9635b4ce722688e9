//! Environment-backed configuration helpers.
//!
//! Services describe their settings as plain structs and load them through an
//! [`Env`] source, so tests can feed a map instead of touching the process env.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// A source of configuration variables.
pub trait Env {
    /// Raw value of `key`, `None` when unset.
    fn var(&self, key: &str) -> Option<String>;

    /// Trimmed value of `key`; unset and blank are both `None`.
    fn non_blank(&self, key: &str) -> Option<String> {
        self.var(key)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.non_blank(key).ok_or(ConfigError::Missing(key))
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
        Self: Sized,
    {
        match self.non_blank(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw,
                reason: e.to_string(),
            }),
        }
    }

    fn flag_or(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.non_blank(key) else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value: raw,
                reason: "expected a boolean".to_owned(),
            }),
        }
    }

    /// Comma separated list. `None` when unset; a set-but-blank variable is an
    /// empty list, which callers treat differently from "not configured".
    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.var(key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Env for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}
