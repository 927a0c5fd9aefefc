//! # exchange-log
//!
//! Leveled, human-readable logging of HTTP requests and responses that leaves the
//! exchange body readable for whoever consumes it next.
//!
//! ## Features
//!
//! - **Tagged lines**: `[E]`/`[I]` (or `[E!]`/`[ ]`), plus `[<-]`/`[->]` for traffic from
//!   and to other services, an optional timestamp and a hierarchical module name
//! - **Body logging without consuming the body**: the body is drained, logged, and
//!   replaced with an unread copy
//! - **Never fatal**: an unreadable body becomes an Error line, not an error return
//! - **Middleware**: [`ExchangeLoggerLayer`] logs every exchange passing through an
//!   axum router
//!
//! ## Quick Start
//!
//! ```rust
//! use axum::body::Body;
//! use axum::http::Request;
//! use axum::response::Response;
//! use exchange_log::{Direction, Logger, RequestLine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = Logger::new("inventory").child("client");
//!
//! let mut request = Request::post("https://api.example.com/items")
//!     .header("content-type", "application/json")
//!     .body(Body::from(r#"{"a":1}"#))?;
//! let line = RequestLine::from(&request);
//! logger.log_request(&mut request, true, Direction::ToService).await;
//!
//! // ... send the request, get a response back ...
//! let mut response = Response::builder().status(404).body(Body::empty())?;
//! logger.log_response(&line, &mut response, false, Direction::FromService).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Middleware
//!
//! ```rust,no_run
//! use axum::{routing::post, Router};
//! use exchange_log::{ExchangeLoggerConfig, ExchangeLoggerLayer, Logger};
//! use tower::ServiceBuilder;
//!
//! # async fn echo(body: String) -> String { body }
//! # #[tokio::main]
//! # async fn main() {
//! let layer = ExchangeLoggerLayer::new(ExchangeLoggerConfig::default(), Logger::new("api"));
//!
//! let app = Router::new()
//!     .route("/echo", post(echo))
//!     .layer(ServiceBuilder::new().layer(layer));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//! axum::serve(listener, app).await.unwrap();
//! # }
//! ```

use axum::{extract::Request, response::Response};
use serde::{Deserialize, Serialize};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::{debug, debug_span, Instrument};

pub mod types;
pub use types::{Direction, LogLevel, RequestLine};

pub mod logger;
pub use logger::{Logger, LoggerConfig, TagStyle};

pub mod body_wrapper;
pub use body_wrapper::BodyCaptureError;

pub mod exchange;

/// Configuration for the exchange logging middleware.
///
/// Logging a response body holds the response until its body has been fully produced.
/// That stalls streaming endpoints such as server-sent events, long-polling or large
/// downloads, so response bodies are left out by default.
///
/// # Examples
///
/// ```rust
/// use exchange_log::ExchangeLoggerConfig;
///
/// // Request bodies only
/// let config = ExchangeLoggerConfig::default();
/// assert!(!config.log_response_body);
///
/// // Both bodies, for routes that never stream
/// let config = ExchangeLoggerConfig {
///     log_request_body: true,
///     log_response_body: true,
/// };
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeLoggerConfig {
    /// Whether to include request bodies
    pub log_request_body: bool,
    /// Whether to include response bodies. Buffers the whole response before forwarding it
    pub log_response_body: bool,
}

impl Default for ExchangeLoggerConfig {
    fn default() -> Self {
        Self {
            log_request_body: true,
            log_response_body: false,
        }
    }
}

/// Tower layer logging every request and response that passes through it.
///
/// Requests are logged as coming from another service (`[<-]`) before the inner service
/// runs, responses as going back to it (`[->]`) once the inner service answers. Both
/// happen inside the request's own future; nothing is spawned.
///
/// Logging a body buffers it completely, so a streamed response is only forwarded once
/// it has been fully produced.
#[derive(Clone, Debug)]
pub struct ExchangeLoggerLayer {
    config: ExchangeLoggerConfig,
    logger: Logger,
}

impl ExchangeLoggerLayer {
    /// Create a layer that logs through `logger`.
    pub fn new(config: ExchangeLoggerConfig, logger: Logger) -> Self {
        Self { config, logger }
    }
}

impl<S> Layer<S> for ExchangeLoggerLayer {
    type Service = ExchangeLoggerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ExchangeLoggerService {
            inner,
            config: self.config.clone(),
            logger: self.logger.clone(),
        }
    }
}

/// Tower service created by [`ExchangeLoggerLayer`].
#[derive(Clone, Debug)]
pub struct ExchangeLoggerService<S> {
    inner: S,
    config: ExchangeLoggerConfig,
    logger: Logger,
}

impl<S> Service<Request> for ExchangeLoggerService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        // The ready service is the one that must handle this request
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let config = self.config.clone();
        let logger = self.logger.clone();

        let line = RequestLine::from(&request);
        let span = debug_span!("exchange", method = %line.method, uri = %line.uri);

        Box::pin(
            async move {
                logger
                    .log_request(
                        &mut request,
                        config.log_request_body,
                        Direction::FromService,
                    )
                    .await;

                debug!("Awaiting inner service response");
                let mut response = inner.call(request).await?;
                debug!(status = %response.status(), "Inner service response received");

                logger
                    .log_response(
                        &line,
                        &mut response,
                        config.log_response_body,
                        Direction::ToService,
                    )
                    .await;
                Ok(response)
            }
            .instrument(span),
        )
    }
}
