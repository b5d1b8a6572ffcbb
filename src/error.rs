//! Unified error types for the request layer.

use crate::retry::{RemoteFailure, TransportCause};
use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from the remote API layer.
///
/// The variants mirror the two failure shapes the retry layer understands:
/// a failure with a remote response (`Status`) and one without (`Transport`).
/// The type is `Clone` so an executor can keep a copy in its lifecycle while
/// the caller receives the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No response was received.
    Transport {
        cause: TransportCause,
        /// Low-level code such as `ECONNABORTED`, when the transport reports one.
        code: Option<String>,
        detail: String,
    },
    /// Non-2xx status from the API.
    Status {
        code: u16,
        /// String `message` field from the JSON error body, if any.
        message: Option<String>,
        body: String,
    },
    /// A 2xx response whose body could not be decoded.
    InvalidResponse(String),
}

impl ApiError {
    /// Build a transport failure from a low-level code string.
    ///
    /// `ECONNABORTED` and `ETIMEDOUT` mark an aborted or expired connection;
    /// any other code is a plain network failure; no code at all leaves the
    /// cause unrecognized.
    pub fn transport(code: Option<&str>, detail: impl Into<String>) -> Self {
        let cause = match code {
            Some("ECONNABORTED") | Some("ETIMEDOUT") => TransportCause::TimedOut,
            Some(_) => TransportCause::Connect,
            None => TransportCause::Unrecognized,
        };
        Self::Transport {
            cause,
            code: code.map(str::to_string),
            detail: detail.into(),
        }
    }

    /// Build a status failure, extracting a server message from a JSON body.
    pub fn status(code: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            });
        Self::Status {
            code,
            message,
            body,
        }
    }

    /// HTTP status code when the failure carried a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport {
                code: Some(code),
                detail,
                ..
            } => write!(f, "transport ({code}): {detail}"),
            Self::Transport { detail, .. } => write!(f, "transport: {detail}"),
            Self::Status { code, body, .. } => write!(f, "status {code}: {body}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return Self::status(status.as_u16(), e.to_string());
        }
        if e.is_decode() {
            return Self::InvalidResponse(e.to_string());
        }
        let cause = if e.is_timeout() {
            TransportCause::TimedOut
        } else if e.is_connect() || e.is_request() || e.is_body() {
            TransportCause::Connect
        } else {
            TransportCause::Unrecognized
        };
        let code = match cause {
            TransportCause::TimedOut => Some("ETIMEDOUT".to_string()),
            _ => None,
        };
        Self::Transport {
            cause,
            code,
            detail: e.to_string(),
        }
    }
}

impl RemoteFailure for ApiError {
    fn response_status(&self) -> Option<u16> {
        self.status_code()
    }

    fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    fn transport_cause(&self) -> Option<TransportCause> {
        match self {
            Self::Transport { cause, .. } => Some(*cause),
            Self::Status { .. } | Self::InvalidResponse(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// GeolocationError
// ---------------------------------------------------------------------------

/// Failures from a location provider.
///
/// These are surfaced to the user directly and never go through the retry
/// engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    PermissionDenied,
    Unavailable(String),
    Timeout,
}

impl GeolocationError {
    /// User-facing alert text.
    pub fn alert_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Location access was denied. Enable location permissions to search nearby."
            }
            Self::Unavailable(_) => "Your location is currently unavailable.",
            Self::Timeout => "Timed out while determining your location.",
        }
    }
}

impl fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "geolocation permission denied"),
            Self::Unavailable(reason) => write!(f, "geolocation unavailable: {reason}"),
            Self::Timeout => write!(f, "geolocation timed out"),
        }
    }
}

impl std::error::Error for GeolocationError {}

// ---------------------------------------------------------------------------
// AppError — top-level
// ---------------------------------------------------------------------------

/// Top-level error type for the CLI.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Api(ApiError),
    Geolocation(GeolocationError),
    Io(std::io::Error),
    /// A request failed; carries the resolved user-facing message.
    Request(String),
    Usage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Api(e) => write!(f, "api: {e}"),
            Self::Geolocation(e) => write!(f, "geolocation: {}", e.alert_message()),
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Request(message) => f.write_str(message),
            Self::Usage(message) => write!(f, "usage: {message}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

impl From<GeolocationError> for AppError {
    fn from(e: GeolocationError) -> Self {
        Self::Geolocation(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e = ConfigError::from(io_err);
        let s = e.to_string();
        assert!(s.starts_with("io:"), "got: {s}");
        assert!(s.contains("file not found"));
    }

    #[test]
    fn config_error_from_toml() {
        let toml_err: toml::de::Error = toml::from_str::<toml::Value>("x = [unclosed").unwrap_err();
        let e = ConfigError::from(toml_err);
        assert!(e.to_string().starts_with("toml:"));
    }

    #[test]
    fn status_extracts_json_message() {
        let err = ApiError::status(409, r#"{"message":"Already on your wishlist"}"#);
        assert_eq!(err.server_message(), Some("Already on your wishlist"));
        assert_eq!(err.status_code(), Some(409));
    }

    #[test]
    fn status_ignores_non_string_or_missing_message() {
        assert_eq!(ApiError::status(500, "oops").server_message(), None);
        assert_eq!(ApiError::status(500, r#"{"message":42}"#).server_message(), None);
        assert_eq!(ApiError::status(500, r#"{"error":"x"}"#).server_message(), None);
    }

    #[test]
    fn transport_code_maps_to_cause() {
        let aborted = ApiError::transport(Some("ECONNABORTED"), "aborted");
        assert_eq!(aborted.transport_cause(), Some(TransportCause::TimedOut));
        let reset = ApiError::transport(Some("ECONNRESET"), "reset");
        assert_eq!(reset.transport_cause(), Some(TransportCause::Connect));
        let bare = ApiError::transport(None, "???");
        assert_eq!(bare.transport_cause(), Some(TransportCause::Unrecognized));
    }

    #[test]
    fn api_error_display_variants() {
        assert_eq!(
            ApiError::transport(Some("ETIMEDOUT"), "slow").to_string(),
            "transport (ETIMEDOUT): slow"
        );
        assert_eq!(ApiError::status(404, "nope").to_string(), "status 404: nope");
    }

    #[test]
    fn app_error_from_geolocation() {
        let e = AppError::from(GeolocationError::PermissionDenied);
        assert_eq!(
            e.to_string(),
            "geolocation: Location access was denied. Enable location permissions to search nearby."
        );
    }

    #[test]
    fn request_failure_displays_message_verbatim() {
        let e = AppError::Request("Unable to connect. Check your internet connection.".into());
        assert_eq!(e.to_string(), "Unable to connect. Check your internet connection.");
    }
}
