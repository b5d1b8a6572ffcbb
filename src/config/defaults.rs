//! Default configuration constants.
//!
//! Keeping defaults in one module lets the data model, the loader, and the
//! embedded template agree on the same literals.

/// Embedded default `reel.toml` template written by `reel config init`.
pub(super) const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../templates/reel.toml");
/// Default API base URL.
pub(super) const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
/// Default timeout for a single API request.
pub(super) const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
/// Retries allowed after the first attempt.
pub(super) const DEFAULT_MAX_RETRIES: u32 = 3;
/// Seed delay for exponential backoff.
pub(super) const DEFAULT_BASE_DELAY_MS: u64 = 1000;
/// Quiet period before a debounced search fires.
pub(super) const DEFAULT_DEBOUNCE_MS: u64 = 500;
/// Radius used for location searches when none is given.
pub(super) const DEFAULT_RADIUS_KM: f64 = 10.0;
