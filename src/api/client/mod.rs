//! API client for the movie-tracking service.
//!
//! Every request carries an explicit [`ApiContext`]; there are no
//! process-wide default headers.

mod transport;

use super::{Resource, SearchClient};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::filters::FilterSet;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Connection settings threaded into each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiContext {
    pub base_url: String,
    /// Bearer token for authenticated calls.
    pub token: Option<String>,
}

impl ApiContext {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then(|| token.trim().to_string());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Client for the movie-tracking API.
pub struct ApiClient {
    http: reqwest::Client,
    context: ApiContext,
}

impl ApiClient {
    /// Build a client from resolved API configuration.
    pub fn new(config: &ApiConfig) -> Self {
        let context = ApiContext::new(&config.base_url).with_token(&config.token);
        Self::with_context(context, Duration::from_secs(config.timeout_secs))
    }

    pub fn with_context(context: ApiContext, timeout: Duration) -> Self {
        Self {
            http: transport::build_http_client(timeout),
            context,
        }
    }

    pub fn context(&self) -> &ApiContext {
        &self.context
    }

    /// GET `{base_url}/{path}` with the given query parameters.
    pub async fn get(&self, path: &str, filters: &FilterSet) -> Result<Value, ApiError> {
        let url = self.context.url(path);
        tracing::debug!(%url, params = filters.len(), "api request");
        transport::get_json(
            &self.http,
            &url,
            &filters.to_query_pairs(),
            self.context.token.as_deref(),
        )
        .await
    }
}

#[async_trait]
impl SearchClient for ApiClient {
    async fn search(&self, resource: Resource, filters: &FilterSet) -> Result<Value, ApiError> {
        self.get(&format!("{}/search", resource.path()), filters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::SearchCriteria;
    use crate::retry::TransportCause;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut request_buf = [0u8; 4096];
            let n = stream.read(&mut request_buf).await.unwrap_or(0);
            let _ = stream.write_all(response.as_bytes()).await;
            String::from_utf8_lossy(&request_buf[..n]).to_string()
        });
        (format!("http://{addr}"), server)
    }

    #[test]
    fn context_trims_base_url_and_blank_token() {
        let ctx = ApiContext::new("http://host/api/").with_token("  ");
        assert_eq!(ctx.base_url, "http://host/api");
        assert_eq!(ctx.token, None);
        assert_eq!(ctx.url("/movies/search"), "http://host/api/movies/search");
    }

    #[tokio::test]
    async fn search_sends_filters_and_bearer() {
        let (base, server) = serve_once(concat!(
            "HTTP/1.1 200 OK\r\n",
            "Content-Type: application/json\r\n",
            "Content-Length: 11\r\n",
            "Connection: close\r\n",
            "\r\n",
            "[{\"id\":1}]\n"
        ))
        .await;
        let client = ApiClient::with_context(
            ApiContext::new(base).with_token("secret"),
            Duration::from_secs(3),
        );
        let filters = SearchCriteria::default().with_query("tokyo").build();
        let value = client.search(Resource::Theaters, &filters).await.unwrap();
        assert_eq!(value[0]["id"], 1);

        let request = server.await.unwrap();
        assert!(
            request.starts_with("GET /theaters/search?query=tokyo "),
            "got: {request}"
        );
        assert!(request.contains("authorization: Bearer secret"), "got: {request}");
    }

    #[tokio::test]
    async fn error_status_carries_server_message() {
        let (base, _server) = serve_once(concat!(
            "HTTP/1.1 409 Conflict\r\n",
            "Content-Type: application/json\r\n",
            "Content-Length: 25\r\n",
            "Connection: close\r\n",
            "\r\n",
            "{\"message\":\"Duplicate!\"}\n"
        ))
        .await;
        let client = ApiClient::with_context(ApiContext::new(base), Duration::from_secs(3));
        let err = client
            .search(Resource::Movies, &FilterSet::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(409));
        assert_eq!(
            crate::retry::RemoteFailure::server_message(&err),
            Some("Duplicate!")
        );
    }

    #[tokio::test]
    async fn timeout_is_classified_as_timed_out_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _accept = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = ApiClient::with_context(
            ApiContext::new(format!("http://{addr}")),
            Duration::from_millis(50),
        );
        let err = client
            .search(Resource::Users, &FilterSet::default())
            .await
            .unwrap_err();
        match err {
            ApiError::Transport { cause, .. } => assert_eq!(cause, TransportCause::TimedOut),
            other => panic!("expected timeout transport error, got: {other}"),
        }
    }
}
