//! Classify remote failures into retry error kinds.

use std::fmt;

/// Why a request failed without receiving any response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCause {
    /// The connection was aborted or its deadline expired.
    TimedOut,
    /// A recognizable network-level failure (refused, reset, DNS, ...).
    Connect,
    /// The transport failed for a reason it did not report.
    Unrecognized,
}

/// Shape of a failure as seen by the retry layer.
///
/// Any collaborator error can be retried and described once it reports
/// whether a remote response was received and, if not, why.
pub trait RemoteFailure {
    /// Status code of the remote response, if one was received.
    fn response_status(&self) -> Option<u16>;

    /// Message supplied by the server in the response body.
    fn server_message(&self) -> Option<&str> {
        None
    }

    /// Transport cause when no response was received.
    fn transport_cause(&self) -> Option<TransportCause>;
}

/// High-level classification of a failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network-level failure with no response.
    Network,
    /// Aborted or expired connection, or HTTP 408.
    Timeout,
    /// 4xx other than 408/429.
    ClientError(u16),
    /// 5xx.
    ServerError(u16),
    /// HTTP 429.
    RateLimited,
    /// Neither a response nor a recognizable transport cause.
    Unknown,
}

impl ErrorKind {
    /// Whether failures of this kind are worth retrying.
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::ClientError(_))
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Timeout => write!(f, "timeout"),
            Self::ClientError(code) => write!(f, "client error {code}"),
            Self::ServerError(code) => write!(f, "server error {code}"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify an HTTP status code.
pub fn classify_status(code: u16) -> ErrorKind {
    match code {
        429 => ErrorKind::RateLimited,
        408 => ErrorKind::Timeout,
        500..=u16::MAX => ErrorKind::ServerError(code),
        // Anything below 500 that reached the error path is the caller's fault.
        _ => ErrorKind::ClientError(code),
    }
}

/// Classify a failure that carried no response.
pub fn classify_transport(cause: Option<TransportCause>) -> ErrorKind {
    match cause {
        Some(TransportCause::TimedOut) => ErrorKind::Timeout,
        Some(TransportCause::Connect) => ErrorKind::Network,
        Some(TransportCause::Unrecognized) | None => ErrorKind::Unknown,
    }
}

/// Classify any remote failure.
pub fn classify<E: RemoteFailure + ?Sized>(error: &E) -> ErrorKind {
    match error.response_status() {
        Some(code) => classify_status(code),
        None => classify_transport(error.transport_cause()),
    }
}

/// Whether a failure should be retried.
///
/// Unknown failures are retried: most unreported transport errors are transient.
pub fn is_retryable<E: RemoteFailure + ?Sized>(error: &E) -> bool {
    classify(error).is_retryable()
}
