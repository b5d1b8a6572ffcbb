//! Retry engine with an observable loading/error/data lifecycle.

use super::backoff::BackoffPolicy;
use super::classify::{classify, RemoteFailure};
use super::message::{MessageResolver, DEFAULT_OPERATION};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Per-call execution settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    pub backoff: BackoffPolicy,
    /// Selects the message override table on failure.
    pub operation_name: String,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffPolicy::default(),
            operation_name: DEFAULT_OPERATION.to_string(),
        }
    }
}

impl ExecuteOptions {
    pub fn named(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.backoff.base_delay = base_delay;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Bookkeeping for one in-flight `execute` call.
#[derive(Debug)]
pub struct RetryState<E> {
    /// Attempts that have completed (and failed) so far.
    pub attempts_made: u32,
    /// First attempt plus all allowed retries.
    pub max_attempts: u32,
    pub last_error: Option<E>,
}

impl<E> RetryState<E> {
    pub fn new(max_retries: u32) -> Self {
        Self {
            attempts_made: 0,
            max_attempts: max_retries.saturating_add(1),
            last_error: None,
        }
    }

    fn has_retries_left(&self) -> bool {
        self.attempts_made < self.max_attempts
    }

    /// Zero-based index of the retry about to be scheduled.
    fn retry_index(&self) -> u32 {
        self.attempts_made.saturating_sub(1)
    }
}

/// Terminal failure of an `execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFailure<E> {
    /// The error returned by the last attempt, unchanged.
    pub error: E,
    /// Display message resolved for the failure.
    pub message: String,
    /// Attempts made, including the first.
    pub attempts: u32,
}

impl<E: fmt::Display> fmt::Display for ExecutionFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (after {} attempt(s): {})",
            self.message, self.attempts, self.error
        )
    }
}

/// Outcome of one `execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult<T, E> {
    Success(T),
    Failure(ExecutionFailure<E>),
}

impl<T, E> ExecutionResult<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Convert to a plain `Result`, handing back the original error.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure.error),
        }
    }
}

/// Observable state of the most recent execution.
///
/// `loading` is true only while an execution is running; `error` and `data`
/// hold the outcome of the most recently settled one and are never both set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionLifecycle<T, E> {
    pub loading: bool,
    pub error: Option<ExecutionFailure<E>>,
    pub data: Option<T>,
}

impl<T, E> Default for ExecutionLifecycle<T, E> {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
            data: None,
        }
    }
}

impl<T, E> ExecutionLifecycle<T, E> {
    pub fn is_idle(&self) -> bool {
        !self.loading && self.error.is_none() && self.data.is_none()
    }

    /// Display message of the settled failure, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|failure| failure.message.as_str())
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// exhausts `options.max_retries`.
///
/// Attempts are strictly sequential: the next one starts only after the
/// previous one settled and its backoff delay elapsed.
pub async fn run_with_retry<T, E, F, Fut>(
    mut operation: F,
    options: &ExecuteOptions,
    resolver: &MessageResolver,
) -> ExecutionResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RemoteFailure + fmt::Display,
{
    let mut state = RetryState::new(options.max_retries);
    loop {
        let err = match operation().await {
            Ok(value) => {
                if state.attempts_made > 0 {
                    tracing::debug!(
                        operation = %options.operation_name,
                        attempts = state.attempts_made + 1,
                        "request recovered after retries"
                    );
                }
                return ExecutionResult::Success(value);
            }
            Err(err) => err,
        };

        let kind = classify(&err);
        state.attempts_made = state.attempts_made.saturating_add(1);
        if state.has_retries_left() && kind.is_retryable() {
            let delay = options.backoff.delay(state.retry_index());
            tracing::warn!(
                operation = %options.operation_name,
                attempt = state.attempts_made,
                max_attempts = state.max_attempts,
                %kind,
                delay_ms = delay.as_millis() as u64,
                "request failed; retrying"
            );
            state.last_error = Some(err);
            sleep(delay).await;
            continue;
        }

        let attempts = state.attempts_made;
        tracing::warn!(
            operation = %options.operation_name,
            attempts,
            %kind,
            error = %err,
            "request failed"
        );
        let message = resolver.resolve(&err, &options.operation_name);
        return ExecutionResult::Failure(ExecutionFailure {
            error: err,
            message,
            attempts,
        });
    }
}

/// Owns one lifecycle and runs operations through the retry engine.
///
/// The lifecycle is published through a `watch` channel so presentation code
/// can observe it without mutating it. Each execution takes a sequence
/// number; when an older execution settles after a newer one has started,
/// its result goes back to its own caller but is not published.
pub struct RequestExecutor<T, E> {
    state: watch::Sender<ExecutionLifecycle<T, E>>,
    resolver: Arc<MessageResolver>,
    options: ExecuteOptions,
    sequence: AtomicU64,
}

impl<T, E> Default for RequestExecutor<T, E> {
    fn default() -> Self {
        Self::new(Arc::new(MessageResolver::builtin()), ExecuteOptions::default())
    }
}

impl<T, E> RequestExecutor<T, E> {
    pub fn new(resolver: Arc<MessageResolver>, options: ExecuteOptions) -> Self {
        let (state, _) = watch::channel(ExecutionLifecycle::default());
        Self {
            state,
            resolver,
            options,
            sequence: AtomicU64::new(0),
        }
    }

    /// Default options used by [`RequestExecutor::execute`].
    pub fn options(&self) -> &ExecuteOptions {
        &self.options
    }

    /// Receiver that observes every lifecycle change.
    pub fn subscribe(&self) -> watch::Receiver<ExecutionLifecycle<T, E>> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Clear loading, error, and data. An in-flight call keeps running and
    /// still publishes when it settles.
    pub fn reset(&self) {
        self.state.send_replace(ExecutionLifecycle::default());
    }

    /// Clear only the error.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }
}

impl<T: Clone, E: Clone> RequestExecutor<T, E> {
    /// Snapshot of the current lifecycle.
    pub fn lifecycle(&self) -> ExecutionLifecycle<T, E> {
        self.state.borrow().clone()
    }
}

impl<T, E> RequestExecutor<T, E>
where
    T: Clone,
    E: Clone + RemoteFailure + fmt::Display,
{
    /// Run `operation` with this executor's default options.
    ///
    /// On exhaustion the caller receives the last attempt's error unchanged;
    /// the lifecycle additionally carries the resolved display message.
    pub async fn execute<F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let options = self.options.clone();
        self.execute_with(operation, &options).await
    }

    /// Run `operation` with explicit options.
    pub async fn execute_with<F, Fut>(&self, operation: F, options: &ExecuteOptions) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_settled(operation, options).await.into_result()
    }

    /// Start a fresh execution with identical arguments. Nothing from a
    /// previous sequence carries over.
    pub async fn retry<F, Fut>(&self, operation: F, options: &ExecuteOptions) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with(operation, options).await
    }

    /// Run `operation` and return the full [`ExecutionResult`].
    pub async fn execute_settled<F, Fut>(
        &self,
        operation: F,
        options: &ExecuteOptions,
    ) -> ExecutionResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
            state.data = None;
        });

        let mut guard = LoadingGuard {
            state: &self.state,
            sequence: &self.sequence,
            id: sequence,
            armed: true,
        };
        let result = run_with_retry(operation, options, &self.resolver).await;
        guard.armed = false;

        if self.sequence.load(Ordering::SeqCst) != sequence {
            tracing::debug!(
                operation = %options.operation_name,
                sequence,
                "discarding result of superseded execution"
            );
            return result;
        }

        self.state.send_modify(|state| {
            state.loading = false;
            match &result {
                ExecutionResult::Success(value) => {
                    state.data = Some(value.clone());
                    state.error = None;
                }
                ExecutionResult::Failure(failure) => {
                    state.error = Some(failure.clone());
                    state.data = None;
                }
            }
        });
        result
    }
}

/// Clears `loading` when an execution is dropped before it settles.
struct LoadingGuard<'a, T, E> {
    state: &'a watch::Sender<ExecutionLifecycle<T, E>>,
    sequence: &'a AtomicU64,
    id: u64,
    armed: bool,
}

impl<T, E> Drop for LoadingGuard<'_, T, E> {
    fn drop(&mut self) {
        if !self.armed || self.sequence.load(Ordering::SeqCst) != self.id {
            return;
        }
        tracing::debug!(sequence = self.id, "execution dropped before settling");
        self.state.send_if_modified(|state| std::mem::take(&mut state.loading));
    }
}
