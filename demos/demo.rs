use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use exchange_log::{
    logf, ExchangeLoggerConfig, ExchangeLoggerLayer, LogLevel, Logger, LoggerConfig,
};
use std::time::Duration;
use tokio::{net::TcpListener, time::sleep};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

// Test handlers for our demo server
async fn hello_handler() -> impl IntoResponse {
    sleep(Duration::from_millis(100)).await; // Simulate some work
    "Hello, World!"
}

async fn echo_handler(body: Bytes) -> impl IntoResponse {
    format!("Echo: {}", String::from_utf8_lossy(&body))
}

async fn streaming_handler() -> impl IntoResponse {
    use futures::stream;

    let stream = stream::unfold(0u32, |count| async move {
        if count >= 5 {
            None
        } else {
            sleep(Duration::from_millis(200)).await;
            Some((
                Ok::<_, std::convert::Infallible>(Bytes::from(format!("chunk-{count}\n"))),
                count + 1,
            ))
        }
    });

    Response::builder()
        .header("content-type", "text/plain")
        .body(Body::from_stream(stream))
        .unwrap()
}

async fn missing_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "no such item")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Internal debug events go through tracing; exchange lines go to stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let logger = Logger::new("demo").with_config(LoggerConfig::default());
    let http_logger = logger.child("http");

    let app = Router::new()
        .route("/hello", get(hello_handler))
        .route("/echo", post(echo_handler))
        .route("/streaming", get(streaming_handler))
        .route("/missing", get(missing_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(ExchangeLoggerLayer::new(
                    ExchangeLoggerConfig::default(),
                    http_logger,
                ))
                .into_inner(),
        );

    info!("Try these commands:");
    info!("  curl http://localhost:3000/hello");
    info!("  curl -X POST -d 'Hello from client' http://localhost:3000/echo");
    info!("  curl http://localhost:3000/streaming");
    info!("  curl http://localhost:3000/missing");

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    logf!(logger, LogLevel::Default, "listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
