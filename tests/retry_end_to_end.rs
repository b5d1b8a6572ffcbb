//! End-to-end retry behavior against a scripted local HTTP server.
//!
//! Each test binds an ephemeral port and answers connections from a fixed
//! script, so no external network is touched.

use reel::api::{ApiClient, ApiContext, Resource, SearchClient};
use reel::config::Config;
use reel::error::ApiError;
use reel::filters::{FilterSet, SearchCriteria};
use reel::retry::{ExecuteOptions, MessageResolver, RequestExecutor, NETWORK_MESSAGE};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn json_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Serve `script` in order, one response per connection.
async fn scripted_server(script: Vec<String>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let served = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&served);
    tokio::spawn(async move {
        for response in script {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });
    (format!("http://{addr}"), served)
}

fn client(base: &str) -> ApiClient {
    ApiClient::with_context(ApiContext::new(base), Duration::from_secs(5))
}

fn fast_options(operation: &str) -> ExecuteOptions {
    ExecuteOptions::named(operation).with_base_delay(Duration::from_millis(10))
}

#[tokio::test]
async fn server_errors_recover_on_third_attempt() {
    let (base, served) = scripted_server(vec![
        json_response("500 Internal Server Error", "{}"),
        json_response("503 Service Unavailable", "{}"),
        json_response("200 OK", r#"[{"id":1,"title":"Dune"}]"#),
    ])
    .await;
    let api = client(&base);
    let executor: RequestExecutor<Value, ApiError> = RequestExecutor::new(
        Arc::new(MessageResolver::builtin()),
        fast_options("searchMovies"),
    );
    let filters = SearchCriteria::default().with_query("dune").build();

    let value = executor
        .execute(|| api.search(Resource::Movies, &filters))
        .await
        .expect("recovered");

    assert_eq!(value, json!([{"id": 1, "title": "Dune"}]));
    assert_eq!(served.load(Ordering::SeqCst), 3);
    let state = executor.lifecycle();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(state.data, Some(value));
}

#[tokio::test]
async fn client_error_is_not_retried_and_uses_operation_message() {
    let (base, served) = scripted_server(vec![
        json_response("401 Unauthorized", "{}"),
        json_response("200 OK", "[]"),
    ])
    .await;
    let api = client(&base);
    let executor: RequestExecutor<Value, ApiError> = RequestExecutor::new(
        Arc::new(MessageResolver::builtin()),
        fast_options("login"),
    );

    let filters = FilterSet::default();
    let err = executor
        .execute(|| api.get("auth/login", &filters))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(401));
    assert_eq!(served.load(Ordering::SeqCst), 1);
    assert_eq!(
        executor.lifecycle().error_message(),
        Some("Invalid username or password.")
    );
}

#[tokio::test]
async fn server_message_wins_over_tables() {
    let (base, _served) = scripted_server(vec![json_response(
        "409 Conflict",
        r#"{"message":"This movie is already on your wishlist."}"#,
    )])
    .await;
    let api = client(&base);
    let executor: RequestExecutor<Value, ApiError> = RequestExecutor::new(
        Arc::new(MessageResolver::builtin()),
        fast_options("addToWishlist"),
    );

    let filters = FilterSet::default();
    let _ = executor.execute(|| api.get("wishlist", &filters)).await;

    assert_eq!(
        executor.lifecycle().error_message(),
        Some("This movie is already on your wishlist.")
    );
}

#[tokio::test]
async fn refused_connection_exhausts_retries_with_network_message() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        listener.local_addr().expect("addr")
    };
    let api = client(&format!("http://{addr}"));
    let executor: RequestExecutor<Value, ApiError> = RequestExecutor::new(
        Arc::new(MessageResolver::builtin()),
        fast_options("searchTheaters").with_max_retries(2),
    );

    let filters = FilterSet::default();
    let result = executor
        .execute_settled(
            || api.search(Resource::Theaters, &filters),
            executor.options(),
        )
        .await;

    let failure = match result {
        reel::retry::ExecutionResult::Failure(failure) => failure,
        other => panic!("expected failure, got: {other:?}"),
    };
    assert_eq!(failure.attempts, 3);
    assert_eq!(failure.message, NETWORK_MESSAGE);
    assert!(matches!(failure.error, ApiError::Transport { .. }));
}

#[test]
fn config_retry_section_feeds_execute_options() {
    let config: Config = toml::from_str("[retry]\nmax_retries = 1\nbase_delay_ms = 250\n").unwrap();
    let options = config.retry.execute_options("searchUsers");
    assert_eq!(options.max_retries, 1);
    assert_eq!(options.backoff.base_delay, Duration::from_millis(250));
    assert_eq!(options.operation_name, "searchUsers");
}
