//! HTTP client for the movie-tracking API.
//!
//! The API layer is kept small:
//! - `client`: the reqwest-backed [`ApiClient`] and its explicit request context
//! - this module: the [`SearchClient`] seam and the searchable [`Resource`]s

use crate::error::ApiError;
use crate::filters::FilterSet;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

mod client;

pub use client::{ApiClient, ApiContext};

/// Searchable collections exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Movies,
    Theaters,
    Users,
}

impl Resource {
    /// URL path segment for this collection.
    pub fn path(self) -> &'static str {
        match self {
            Self::Movies => "movies",
            Self::Theaters => "theaters",
            Self::Users => "users",
        }
    }

    /// Operation name used to pick failure messages for a search.
    pub fn search_operation(self) -> &'static str {
        match self {
            Self::Movies => "searchMovies",
            Self::Theaters => "searchTheaters",
            Self::Users => "searchUsers",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "movies" | "movie" => Ok(Self::Movies),
            "theaters" | "theater" | "theatres" | "theatre" => Ok(Self::Theaters),
            "users" | "user" => Ok(Self::Users),
            other => Err(format!(
                "unknown resource `{other}` (expected movies, theaters, or users)"
            )),
        }
    }
}

/// Minimal search interface used by the search session.
///
/// Tests provide deterministic responses without network calls while the
/// production path uses [`ApiClient`].
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, resource: Resource, filters: &FilterSet) -> Result<Value, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_parses_singular_and_plural() {
        assert_eq!("Theatre".parse::<Resource>(), Ok(Resource::Theaters));
        assert_eq!("movies".parse::<Resource>(), Ok(Resource::Movies));
        assert!("wishlist".parse::<Resource>().is_err());
    }

    #[test]
    fn resource_operation_names_match_message_tables() {
        let resolver = crate::retry::MessageResolver::builtin();
        for resource in [Resource::Movies, Resource::Theaters, Resource::Users] {
            assert!(
                resolver.operation(resource.search_operation()).is_some(),
                "missing table for {resource}"
            );
        }
    }
}
