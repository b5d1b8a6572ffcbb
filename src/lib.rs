//! Reel — a resilient request layer for a movie-tracking API.
//!
//! Remote calls run through a retry engine that classifies failures, backs
//! off exponentially, and turns the final failure into a user-facing
//! message. Search inputs are collapsed by a trailing-edge debouncer and
//! sent as sparse filter sets.
//!
//! # Quick start
//!
//! ```no_run
//! use reel::api::{ApiClient, Resource, SearchClient};
//! use reel::config::{load_config, message_resolver};
//! use reel::filters::SearchCriteria;
//! use reel::retry::RequestExecutor;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let client = ApiClient::new(&config.api);
//! let resolver = Arc::new(message_resolver(&config).unwrap());
//! let options = config.retry.execute_options(Resource::Movies.search_operation());
//! let executor = RequestExecutor::new(resolver, options);
//! let filters = SearchCriteria::default().with_query("dune").build();
//! let movies = executor
//!     .execute(|| client.search(Resource::Movies, &filters))
//!     .await;
//! println!("{movies:?}");
//! # }
//! ```

pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod filters;
pub mod geo;
pub mod logging;
pub mod retry;
pub mod search;
#[cfg(test)]
pub mod testsupport;
