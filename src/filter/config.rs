//! Filter configuration
//!
//! Loaded from YAML/JSON documents or from the environment:
//!
//! ```yaml
//! strip_fields: [max_output_tokens, max_completion_tokens]
//! on_invalid_json: passthrough   # or: error
//! ```

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Top-level keys removed from JSON request bodies unless configured otherwise.
pub const DEFAULT_STRIPPED_FIELDS: [&str; 2] = ["max_output_tokens", "max_completion_tokens"];

pub const ENV_STRIP_FIELDS: &str = "CODEX_FETCH_STRIP_FIELDS";
pub const ENV_ON_INVALID_JSON: &str = "CODEX_FETCH_ON_INVALID_JSON";

/// What to do with a string body that is not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidJsonPolicy {
    /// Forward the original body unmodified.
    #[default]
    Passthrough,
    /// Fail the call with [`Error::InvalidBody`] before anything is sent.
    Error,
}

impl FromStr for InvalidJsonPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passthrough" | "pass_through" | "pass-through" => Ok(Self::Passthrough),
            "error" | "propagate" => Ok(Self::Error),
            other => Err(Error::configuration_with_context(
                format!("unknown invalid-JSON policy '{}'", other),
                ErrorContext::new()
                    .with_field_path("on_invalid_json")
                    .with_details("expected 'passthrough' or 'error'")
                    .with_source("filter_config"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_strip_fields")]
    pub strip_fields: Vec<String>,
    #[serde(default)]
    pub on_invalid_json: InvalidJsonPolicy,
}

fn default_strip_fields() -> Vec<String> {
    DEFAULT_STRIPPED_FIELDS.iter().map(|s| s.to_string()).collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strip_fields: default_strip_fields(),
            on_invalid_json: InvalidJsonPolicy::default(),
        }
    }
}

impl FilterConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid YAML filter config: {}", e),
                ErrorContext::new().with_source("filter_config"),
            )
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid JSON filter config: {}", e),
                ErrorContext::new().with_source("filter_config"),
            )
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Defaults overridden by `CODEX_FETCH_STRIP_FIELDS` (comma-separated)
    /// and `CODEX_FETCH_ON_INVALID_JSON`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_STRIP_FIELDS) {
            cfg.strip_fields = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(raw) = lookup(ENV_ON_INVALID_JSON) {
            cfg.on_invalid_json = raw.parse()?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        for (i, field) in self.strip_fields.iter().enumerate() {
            if field.trim().is_empty() {
                return Err(Error::configuration_with_context(
                    "field names must not be empty",
                    ErrorContext::new()
                        .with_field_path(format!("strip_fields[{}]", i))
                        .with_source("filter_config"),
                ));
            }
        }
        Ok(())
    }
}
