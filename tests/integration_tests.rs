use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use exchange_log::{
    Direction, ExchangeLoggerConfig, ExchangeLoggerLayer, Logger, LoggerConfig, RequestLine,
};
use futures::stream;
use http_body_util::BodyExt;
use tower::ServiceBuilder;

// Test server handlers
async fn hello_handler() -> impl IntoResponse {
    "Hello, World!"
}

async fn echo_handler(body: Bytes) -> impl IntoResponse {
    format!("Echo: {}", String::from_utf8_lossy(&body))
}

async fn streaming_handler() -> impl IntoResponse {
    let stream = stream::iter(vec![
        Ok::<_, std::convert::Infallible>(Bytes::from("chunk1")),
        Ok(Bytes::from("chunk2")),
        Ok(Bytes::from("chunk3")),
    ]);

    Response::builder()
        .header("content-type", "text/plain")
        .body(Body::from_stream(stream))
        .unwrap()
}

async fn large_handler() -> impl IntoResponse {
    "x".repeat(2048) // 2KB
}

async fn missing_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "no such item")
}

async fn no_content_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

fn create_test_app(config: ExchangeLoggerConfig) -> Router {
    let logger = Logger::new("test").with_config(LoggerConfig::classic());
    Router::new()
        .route("/hello", get(hello_handler))
        .route("/echo", post(echo_handler))
        .route("/streaming", get(streaming_handler))
        .route("/large", get(large_handler))
        .route("/missing", get(missing_handler))
        .route("/empty", get(no_content_handler))
        .layer(
            ServiceBuilder::new()
                .layer(ExchangeLoggerLayer::new(config, logger))
                .into_inner(),
        )
}

#[tokio::test]
async fn test_basic_request_response() {
    let config = ExchangeLoggerConfig {
        log_request_body: false,
        log_response_body: false,
    };
    let server = axum_test::TestServer::new(create_test_app(config)).unwrap();

    let response = server.get("/hello").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "Hello, World!");
}

#[tokio::test]
async fn test_request_body_reaches_handler() {
    let server =
        axum_test::TestServer::new(create_test_app(ExchangeLoggerConfig::default())).unwrap();

    let test_body = r#"{"a":1}"#;
    let response = server.post("/echo").text(test_body).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), format!("Echo: {test_body}"));
}

#[tokio::test]
async fn test_streaming_response_passes_through() {
    let server =
        axum_test::TestServer::new(create_test_app(ExchangeLoggerConfig::default())).unwrap();

    let response = server.get("/streaming").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "chunk1chunk2chunk3");
}

#[tokio::test]
async fn test_large_response_passes_through() {
    let server =
        axum_test::TestServer::new(create_test_app(ExchangeLoggerConfig::default())).unwrap();

    let response = server.get("/large").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "x".repeat(2048));
}

#[tokio::test]
async fn test_error_and_empty_responses_pass_through() {
    let server =
        axum_test::TestServer::new(create_test_app(ExchangeLoggerConfig::default())).unwrap();

    let response = server.get("/missing").expect_failure().await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "no such item");

    let response = server.get("/empty").await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(response.text(), "");
}

#[tokio::test]
async fn test_multiple_concurrent_requests() {
    let server = std::sync::Arc::new(
        axum_test::TestServer::new(create_test_app(ExchangeLoggerConfig::default())).unwrap(),
    );

    use futures::future::join_all;

    let futures: Vec<_> = (0..5)
        .map(|i| {
            let server = server.clone();
            async move { server.post("/echo").text(format!("Request {i}")).await }
        })
        .collect();

    let responses = join_all(futures).await;

    for (i, response) in responses.iter().enumerate() {
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), format!("Echo: Request {i}"));
    }
}

#[tokio::test]
async fn test_client_side_exchange_keeps_bodies() {
    let logger = Logger::new("client").child("items");

    let mut request = Request::builder()
        .method(Method::POST)
        .uri("https://api.example.com/items")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"a":1}"#))
        .unwrap();
    let line = RequestLine::from(&request);
    logger
        .log_request(&mut request, true, Direction::ToService)
        .await;

    let sent = request.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(sent, r#"{"a":1}"#);

    let mut response = Response::builder()
        .status(StatusCode::CREATED)
        .body(Body::from(r#"{"id":7}"#))
        .unwrap();
    logger
        .log_response(&line, &mut response, true, Direction::FromService)
        .await;

    let received = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(received, r#"{"id":7}"#);
}

#[tokio::test]
async fn test_unreadable_body_does_not_fail_the_caller() {
    let logger = Logger::default();
    let body = Body::from_stream(stream::iter(vec![
        Ok::<_, std::io::Error>(Bytes::from("head")),
        Err(std::io::Error::other("upstream went away")),
    ]));
    let mut response = Response::new(body);
    let line = RequestLine::new(Method::GET, "https://x/y".parse().unwrap());

    logger
        .log_response(&line, &mut response, true, Direction::FromService)
        .await;

    // The consumer still observes the original failure rather than a truncated success
    let result = response.into_body().collect().await;
    assert!(result.is_err());
}
