//! User-facing failure messages.
//!
//! Lookup order for a failure raised by operation `op`:
//! 1. server-supplied message in the response body
//! 2. `op`'s override for the response status
//! 3. `op`'s default message
//! 4. the generic message for the response status
//! 5. timeout or network message when no response was received
//! 6. a generic "unexpected error" message

use super::classify::{RemoteFailure, TransportCause};
use std::collections::BTreeMap;

/// Operation name used when the caller does not pick one.
pub const DEFAULT_OPERATION: &str = "default";

pub const TIMEOUT_MESSAGE: &str = "The request timed out. Please try again.";
pub const NETWORK_MESSAGE: &str =
    "Unable to reach the server. Check your connection and try again.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again.";

const GENERIC_STATUS_MESSAGES: &[(u16, &str)] = &[
    (400, "The request was invalid. Please check your input."),
    (401, "Your session has expired. Please log in again."),
    (403, "You do not have permission to perform this action."),
    (404, "The requested resource was not found."),
    (408, "The request timed out. Please try again."),
    (409, "This conflicts with an existing record."),
    (422, "Some of the submitted data is invalid."),
    (429, "Too many requests. Please wait a moment and try again."),
    (500, "The server encountered an error. Please try again later."),
    (502, "The server is temporarily unreachable. Please try again later."),
    (503, "The service is temporarily unavailable. Please try again later."),
    (504, "The server took too long to respond. Please try again later."),
];

/// Per-operation message table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationMessages {
    pub by_status: BTreeMap<u16, String>,
    pub default: Option<String>,
}

impl OperationMessages {
    fn with_status(mut self, code: u16, message: &str) -> Self {
        self.by_status.insert(code, message.to_string());
        self
    }

    fn with_default(mut self, message: &str) -> Self {
        self.default = Some(message.to_string());
        self
    }
}

/// Maps failures to display strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageResolver {
    generic: BTreeMap<u16, String>,
    operations: BTreeMap<String, OperationMessages>,
}

impl Default for MessageResolver {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MessageResolver {
    /// Resolver with no tables at all; only the transport and fallback
    /// messages apply.
    pub fn empty() -> Self {
        Self {
            generic: BTreeMap::new(),
            operations: BTreeMap::new(),
        }
    }

    /// Resolver seeded with the built-in generic and per-operation tables.
    pub fn builtin() -> Self {
        let generic = GENERIC_STATUS_MESSAGES
            .iter()
            .map(|(code, msg)| (*code, (*msg).to_string()))
            .collect();
        let mut operations = BTreeMap::new();
        operations.insert(
            "login".to_string(),
            OperationMessages::default()
                .with_status(400, "Please enter both your username and password.")
                .with_status(401, "Invalid username or password.")
                .with_status(429, "Too many login attempts. Please wait before trying again."),
        );
        operations.insert(
            "register".to_string(),
            OperationMessages::default()
                .with_status(400, "Please fill in all required fields.")
                .with_status(409, "That username or email is already registered.")
                .with_status(422, "Your password does not meet the requirements."),
        );
        operations.insert(
            "searchTheaters".to_string(),
            OperationMessages::default()
                .with_status(400, "Invalid search filters. Adjust your search and try again."),
        );
        operations.insert(
            "searchMovies".to_string(),
            OperationMessages::default()
                .with_status(400, "Invalid search filters. Adjust your search and try again."),
        );
        operations.insert(
            "searchUsers".to_string(),
            OperationMessages::default().with_status(404, "No matching users were found."),
        );
        operations.insert(
            "createViewing".to_string(),
            OperationMessages::default()
                .with_status(400, "Please provide a movie, theater, and date for the viewing.")
                .with_status(409, "You already recorded this viewing."),
        );
        operations.insert(
            "addToWishlist".to_string(),
            OperationMessages::default()
                .with_status(409, "This movie is already on your wishlist.")
                .with_default("Could not add the movie to your wishlist."),
        );
        operations.insert(
            "removeFromWishlist".to_string(),
            OperationMessages::default()
                .with_status(404, "This movie is no longer on your wishlist.")
                .with_default("Could not remove the movie from your wishlist."),
        );
        Self {
            generic,
            operations,
        }
    }

    /// Register or replace an operation's message for one status code.
    pub fn set_status_message(&mut self, operation: &str, code: u16, message: impl Into<String>) {
        self.operations
            .entry(operation.to_string())
            .or_default()
            .by_status
            .insert(code, message.into());
    }

    /// Register or replace an operation's default message.
    pub fn set_default_message(&mut self, operation: &str, message: impl Into<String>) {
        self.operations
            .entry(operation.to_string())
            .or_default()
            .default = Some(message.into());
    }

    /// Register or replace the generic message for a status code.
    pub fn set_generic_message(&mut self, code: u16, message: impl Into<String>) {
        self.generic.insert(code, message.into());
    }

    pub fn operation(&self, name: &str) -> Option<&OperationMessages> {
        self.operations.get(name)
    }

    /// Resolve the display message for a failure raised by `operation`.
    pub fn resolve<E: RemoteFailure + ?Sized>(&self, error: &E, operation: &str) -> String {
        if let Some(message) = error.server_message() {
            return message.to_string();
        }

        let status = error.response_status();
        if let Some(table) = self.operations.get(operation) {
            if let Some(message) = status.and_then(|code| table.by_status.get(&code)) {
                return message.clone();
            }
            if let Some(message) = &table.default {
                return message.clone();
            }
        }

        if let Some(message) = status.and_then(|code| self.generic.get(&code)) {
            return message.clone();
        }

        match error.transport_cause() {
            Some(TransportCause::TimedOut) => TIMEOUT_MESSAGE.to_string(),
            Some(_) => NETWORK_MESSAGE.to_string(),
            None => UNEXPECTED_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn server_message_wins_over_tables() {
        let resolver = MessageResolver::builtin();
        let err = ApiError::status(401, r#"{"message":"Account locked"}"#);
        assert_eq!(resolver.resolve(&err, "login"), "Account locked");
    }

    #[test]
    fn operation_override_beats_generic_status() {
        let resolver = MessageResolver::builtin();
        let err = ApiError::status(401, "");
        assert_eq!(resolver.resolve(&err, "login"), "Invalid username or password.");
        assert_eq!(
            resolver.resolve(&err, DEFAULT_OPERATION),
            "Your session has expired. Please log in again."
        );
    }

    #[test]
    fn operation_default_beats_generic_status() {
        let resolver = MessageResolver::builtin();
        let err = ApiError::status(500, "");
        assert_eq!(
            resolver.resolve(&err, "addToWishlist"),
            "Could not add the movie to your wishlist."
        );
    }

    #[test]
    fn operation_default_applies_without_response() {
        let resolver = MessageResolver::builtin();
        let err = ApiError::transport(Some("ECONNREFUSED"), "refused");
        assert_eq!(
            resolver.resolve(&err, "removeFromWishlist"),
            "Could not remove the movie from your wishlist."
        );
    }

    #[test]
    fn responseless_failures_use_transport_messages() {
        let resolver = MessageResolver::builtin();
        let timed_out = ApiError::transport(Some("ECONNABORTED"), "aborted");
        assert_eq!(resolver.resolve(&timed_out, "searchMovies"), TIMEOUT_MESSAGE);
        let refused = ApiError::transport(Some("ECONNREFUSED"), "refused");
        assert_eq!(resolver.resolve(&refused, "searchMovies"), NETWORK_MESSAGE);
        let unknown = ApiError::transport(None, "?");
        assert_eq!(resolver.resolve(&unknown, "searchMovies"), NETWORK_MESSAGE);
    }

    #[test]
    fn unmapped_status_falls_back_to_unexpected() {
        let resolver = MessageResolver::builtin();
        let err = ApiError::status(418, "teapot");
        assert_eq!(resolver.resolve(&err, "unregistered"), UNEXPECTED_MESSAGE);
        let invalid = ApiError::InvalidResponse("bad json".into());
        assert_eq!(resolver.resolve(&invalid, DEFAULT_OPERATION), UNEXPECTED_MESSAGE);
    }

    #[test]
    fn custom_overrides_replace_builtins() {
        let mut resolver = MessageResolver::builtin();
        resolver.set_status_message("login", 401, "Wrong credentials");
        resolver.set_default_message("rateMovie", "Could not save your rating.");
        assert_eq!(
            resolver.resolve(&ApiError::status(401, ""), "login"),
            "Wrong credentials"
        );
        assert_eq!(
            resolver.resolve(&ApiError::status(503, ""), "rateMovie"),
            "Could not save your rating."
        );
    }
}
