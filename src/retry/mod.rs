//! Retry, backoff, and failure-message policy for remote requests.
//!
//! The module is split into cohesive pieces:
//! - `classify`: failure shape and retryability
//! - `backoff`: capped exponential delays
//! - `message`: user-facing failure text
//! - `executor`: the retry loop and its observable lifecycle

mod backoff;
mod classify;
mod executor;
mod message;

pub use backoff::{delay_ms, BackoffPolicy, MAX_BACKOFF_MS};
pub use classify::{
    classify, classify_status, classify_transport, is_retryable, ErrorKind, RemoteFailure,
    TransportCause,
};
pub use executor::{
    run_with_retry, ExecuteOptions, ExecutionFailure, ExecutionLifecycle, ExecutionResult,
    RequestExecutor, RetryState,
};
pub use message::{
    MessageResolver, OperationMessages, DEFAULT_OPERATION, NETWORK_MESSAGE, TIMEOUT_MESSAGE,
    UNEXPECTED_MESSAGE,
};
