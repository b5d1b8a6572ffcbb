//! Debounced search sessions.
//!
//! A [`SearchSession`] ties one resource's search to a trigger debouncer and
//! a request executor: bursts of criteria changes collapse into a single
//! request carrying the last criteria, and the outcome is published through
//! the executor's lifecycle.

use crate::api::{Resource, SearchClient};
use crate::debounce::{DebounceCoordinator, DebounceTicket};
use crate::error::{ApiError, GeolocationError};
use crate::filters::{FilterSet, SearchCriteria};
use crate::geo::LocationProvider;
use crate::retry::{ExecuteOptions, ExecutionLifecycle, MessageResolver, RequestExecutor};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub type SearchLifecycle = ExecutionLifecycle<Value, ApiError>;

/// Search for one resource, debounced and retried.
pub struct SearchSession {
    client: Arc<dyn SearchClient>,
    executor: Arc<RequestExecutor<Value, ApiError>>,
    debounce: DebounceCoordinator,
    resource: Resource,
    quiet_period: Duration,
    options: ExecuteOptions,
}

impl SearchSession {
    /// `options.operation_name` is replaced by the resource's search
    /// operation so failures pick up its message table.
    pub fn new(
        client: Arc<dyn SearchClient>,
        resolver: Arc<MessageResolver>,
        resource: Resource,
        quiet_period: Duration,
        options: ExecuteOptions,
    ) -> Self {
        let options = ExecuteOptions {
            operation_name: resource.search_operation().to_string(),
            ..options
        };
        Self {
            client,
            executor: Arc::new(RequestExecutor::new(resolver, options.clone())),
            debounce: DebounceCoordinator::new(),
            resource,
            quiet_period,
            options,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Record new criteria. The search fires once the criteria have been
    /// stable for the quiet period; each call restarts the wait.
    pub fn update(&self, criteria: &SearchCriteria) -> DebounceTicket {
        let filters = criteria.build();
        let client = Arc::clone(&self.client);
        let executor = Arc::clone(&self.executor);
        let options = self.options.clone();
        let resource = self.resource;
        tracing::trace!(%resource, params = filters.len(), "search criteria updated");
        self.debounce.trigger(self.quiet_period, move || async move {
            let _ = executor
                .execute_with(search_attempt(client, resource, filters), &options)
                .await;
        })
    }

    /// Skip the quiet period and search immediately.
    ///
    /// A pending debounced search is cancelled first so it cannot overwrite
    /// this result.
    pub async fn search_now(&self, criteria: &SearchCriteria) -> Result<Value, ApiError> {
        self.debounce.cancel_pending();
        let filters = criteria.build();
        self.executor
            .execute_with(
                search_attempt(Arc::clone(&self.client), self.resource, filters),
                &self.options,
            )
            .await
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Wait until no debounced search is pending or running.
    ///
    /// When this returns, the last fired search has published its outcome.
    pub async fn settled(&self) {
        self.debounce.idle().await;
    }

    pub fn lifecycle(&self) -> SearchLifecycle {
        self.executor.lifecycle()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchLifecycle> {
        self.executor.subscribe()
    }

    pub fn clear_error(&self) {
        self.executor.clear_error();
    }

    /// Cancel any pending search. A search already running finishes and
    /// still publishes its outcome.
    pub fn dispose(&self) {
        if self.debounce.cancel_pending() {
            tracing::debug!(resource = %self.resource, "pending search cancelled");
        }
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

type SearchFuture = Pin<Box<dyn Future<Output = Result<Value, ApiError>> + Send>>;

/// One repeatable attempt: every call issues the same request again.
fn search_attempt(
    client: Arc<dyn SearchClient>,
    resource: Resource,
    filters: FilterSet,
) -> impl FnMut() -> SearchFuture {
    let filters = Arc::new(filters);
    move || -> SearchFuture {
        let client = Arc::clone(&client);
        let filters = Arc::clone(&filters);
        Box::pin(async move { client.search(resource, &filters).await })
    }
}

/// Fill in the criteria's coordinates from `provider`.
pub async fn locate(
    provider: &dyn LocationProvider,
    criteria: SearchCriteria,
) -> Result<SearchCriteria, GeolocationError> {
    let coordinates = provider.current_position().await?;
    tracing::debug!(
        latitude = coordinates.latitude,
        longitude = coordinates.longitude,
        "location resolved"
    );
    Ok(criteria.with_coordinates(coordinates))
}
