//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`REEL_BASE_URL`, `REEL_API_TOKEN`,
//!    `REEL_MAX_RETRIES`, `REEL_BASE_DELAY_MS`, `REEL_DEBOUNCE_MS`)
//! 2. TOML file specified via --config CLI flag
//! 3. ./reel.toml in the current directory
//! 4. $XDG_CONFIG_HOME/reel/reel.toml (or ~/.config/reel/reel.toml)
//! 5. Built-in defaults

use crate::error::ConfigError;
use crate::retry::MessageResolver;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

mod defaults;
mod types;

use defaults::DEFAULT_CONFIG_TEMPLATE;
pub use types::{ApiConfig, Config, GlobalConfigInitResult, RetryConfig, SearchConfig};

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Where the loaded configuration text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Local,
    Global(PathBuf),
    BuiltInDefaults,
}

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    Ok(load_config_with_source(path_override)?.0)
}

/// Load configuration and report which file supplied it.
pub fn load_config_with_source(
    path_override: Option<&str>,
) -> Result<(Config, ConfigSource), ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<(Config, ConfigSource), ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (config_text, source) = read_config_text(path_override, &read_file, &config_root)?;
    let mut config: Config = toml::from_str(&config_text)?;
    apply_env_overrides(&mut config, &env_lookup)?;
    validate(&config)?;
    tracing::debug!(?source, base_url = %config.api.base_url, "configuration loaded");
    Ok((config, source))
}

fn read_config_text<FRead, FRoot>(
    path_override: Option<&str>,
    read_file: &FRead,
    config_root: &FRoot,
) -> Result<(String, ConfigSource), ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FRoot: Fn() -> Option<PathBuf>,
{
    if let Some(p) = path_override {
        let path = PathBuf::from(p);
        let text = read_file(&path)?;
        return Ok((text, ConfigSource::Explicit(path)));
    }

    if let Ok(text) = read_file(Path::new("reel.toml")) {
        return Ok((text, ConfigSource::Local));
    }
    if let Some(dir) = config_root() {
        let global = dir.join("reel").join("reel.toml");
        if let Ok(text) = read_file(&global) {
            return Ok((text, ConfigSource::Global(global)));
        }
    }

    Ok((String::new(), ConfigSource::BuiltInDefaults))
}

fn apply_env_overrides<FEnv>(config: &mut Config, env_lookup: &FEnv) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(url) = env_value(env_lookup, "REEL_BASE_URL") {
        config.api.base_url = url;
    }
    if let Some(token) = env_lookup("REEL_API_TOKEN") {
        config.api.token = token.trim().to_string();
    }
    if let Some(value) = env_value(env_lookup, "REEL_MAX_RETRIES") {
        config.retry.max_retries = parse_env_number("REEL_MAX_RETRIES", &value)?;
    }
    if let Some(value) = env_value(env_lookup, "REEL_BASE_DELAY_MS") {
        config.retry.base_delay_ms = parse_env_number("REEL_BASE_DELAY_MS", &value)?;
    }
    if let Some(value) = env_value(env_lookup, "REEL_DEBOUNCE_MS") {
        config.search.debounce_ms = parse_env_number("REEL_DEBOUNCE_MS", &value)?;
    }
    Ok(())
}

fn env_value<FEnv>(env_lookup: &FEnv, name: &str) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    env_lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_env_number<N: std::str::FromStr>(name: &str, value: &str) -> Result<N, ConfigError> {
    value.parse::<N>().map_err(|_| {
        ConfigError::Invalid(format!(
            "invalid {name} value `{value}`: expected a non-negative integer"
        ))
    })
}

/// Reject values the request layer cannot work with.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "api.base_url must not be empty".to_string(),
        ));
    }
    if config.retry.base_delay_ms == 0 {
        return Err(ConfigError::Invalid(
            "retry.base_delay_ms must be greater than zero".to_string(),
        ));
    }
    if config.search.debounce_ms == 0 {
        return Err(ConfigError::Invalid(
            "search.debounce_ms must be greater than zero".to_string(),
        ));
    }
    if !(config.search.radius_km.is_finite() && config.search.radius_km > 0.0) {
        return Err(ConfigError::Invalid(
            "search.radius_km must be a positive number".to_string(),
        ));
    }
    for (operation, table) in &config.messages {
        for key in table.keys() {
            if key != "default" && key.parse::<u16>().is_err() {
                return Err(ConfigError::Invalid(format!(
                    "messages.{operation}: key `{key}` must be a status code or `default`"
                )));
            }
        }
    }
    Ok(())
}

/// Build the message resolver: built-in tables with `[messages.*]`
/// overrides merged on top.
pub fn message_resolver(config: &Config) -> Result<MessageResolver, ConfigError> {
    let mut resolver = MessageResolver::builtin();
    for (operation, table) in &config.messages {
        for (key, message) in table {
            if key == "default" {
                resolver.set_default_message(operation, message.clone());
                continue;
            }
            let code = key.parse::<u16>().map_err(|_| {
                ConfigError::Invalid(format!(
                    "messages.{operation}: key `{key}` must be a status code or `default`"
                ))
            })?;
            resolver.set_status_message(operation, code, message.clone());
        }
    }
    Ok(resolver)
}

// ---------------------------------------------------------------------------
// Global config file
// ---------------------------------------------------------------------------

/// Default global config path (`$XDG_CONFIG_HOME/reel/reel.toml`).
pub fn default_global_config_path() -> Option<PathBuf> {
    config_root_dir().map(|root| root.join("reel").join("reel.toml"))
}

/// Write the default template to the global config path unless one exists.
pub fn initialize_default_global_config() -> Result<GlobalConfigInitResult, ConfigError> {
    let path = default_global_config_path().ok_or_else(|| {
        ConfigError::Invalid("could not determine a config directory".to_string())
    })?;
    initialize_default_config_at_path(&path)
}

fn initialize_default_config_at_path(path: &Path) -> Result<GlobalConfigInitResult, ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // create_new avoids clobbering an existing file if another process won the race.
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())?;
            tracing::info!("created default config at {}", path.display());
            Ok(GlobalConfigInitResult::Created {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Ok(GlobalConfigInitResult::AlreadyInitialized {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(ConfigError::Io(e)),
    }
}

/// Placeholder shown instead of a configured API token.
pub const REDACTED: &str = "<redacted>";

/// Render the effective configuration as TOML, with the API token redacted.
pub fn render_config(config: &Config) -> Result<String, ConfigError> {
    let mut shown = config.clone();
    if !shown.api.token.is_empty() {
        shown.api.token = REDACTED.to_string();
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| ConfigError::Invalid(format!("failed to render config: {e}")))
}

pub fn config_root_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .or_else(dirs::config_dir)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
