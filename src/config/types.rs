//! Configuration data model.
//!
//! This module holds struct definitions plus default values. Loader and
//! source-resolution logic stays in `config::mod`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::defaults::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_BASE_DELAY_MS, DEFAULT_DEBOUNCE_MS,
    DEFAULT_MAX_RETRIES, DEFAULT_RADIUS_KM,
};
use crate::retry::{BackoffPolicy, ExecuteOptions};

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub search: SearchConfig,
    /// Per-operation message overrides: `[messages.<operation>]` tables
    /// mapping a status code (or `default`) to display text.
    pub messages: BTreeMap<String, BTreeMap<String, String>>,
}

/// API connection settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token sent with every request; empty disables auth.
    pub token: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
            token: String::new(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

/// Retry engine settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Execution options for one named operation.
    pub fn execute_options(&self, operation_name: &str) -> ExecuteOptions {
        ExecuteOptions::named(operation_name)
            .with_max_retries(self.max_retries)
            .with_backoff(
                BackoffPolicy::new(Duration::from_millis(self.base_delay_ms))
                    .with_jitter(self.jitter),
            )
    }
}

/// Search trigger settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub radius_km: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            radius_km: DEFAULT_RADIUS_KM,
        }
    }
}

impl SearchConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Outcome of `reel config init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalConfigInitResult {
    Created { path: std::path::PathBuf },
    AlreadyInitialized { path: std::path::PathBuf },
}
