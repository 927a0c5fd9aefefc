//! Request and response logging.
//!
//! Builds the human-readable line for an exchange, optionally with its body, and picks
//! the level from the exchange direction and status code. Reading the body never
//! consumes it: the exchange gets back an equivalent, unread body.

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Request, Response, StatusCode},
};
use std::fmt::Write as _;
use tracing::debug;

use crate::body_wrapper::duplicate_body;
use crate::logger::Logger;
use crate::types::{Direction, LogLevel, RequestLine};

/// True for statuses in `200..300`.
pub fn is_success(status: StatusCode) -> bool {
    (200..300).contains(&status.as_u16())
}

/// Renders every header as `[key:<Name> value:[<v1> <v2>]]`, separated by spaces.
///
/// Names are printed in canonical MIME case; values that are not UTF-8 are decoded
/// lossily.
pub fn flatten_headers(headers: &HeaderMap) -> String {
    let mut out = String::new();
    for name in headers.keys() {
        if !out.is_empty() {
            out.push(' ');
        }
        let values = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(
            out,
            "[key:{} value:[{}]]",
            canonical_header_name(name.as_str()),
            values
        );
    }
    out
}

/// `content-type` -> `Content-Type`
fn canonical_header_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper { c.to_ascii_uppercase() } else { c };
            upper = c == '-';
            out
        })
        .collect()
}

impl Logger {
    /// Log a request: method, URI, headers and, if `log_body` is set, the body text.
    ///
    /// The request body is replaced with an unread copy of itself before this returns.
    /// A body that cannot be read produces a separate Error line, and the request line is
    /// logged without a body.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use axum::body::Body;
    /// use axum::http::Request;
    /// use exchange_log::{Direction, Logger};
    /// use http_body_util::BodyExt;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let logger = Logger::new("client");
    /// let mut request = Request::post("https://api.example.com/items")
    ///     .header("content-type", "application/json")
    ///     .body(Body::from(r#"{"a":1}"#))?;
    ///
    /// logger.log_request(&mut request, true, Direction::ToService).await;
    ///
    /// // The body is still there for whoever sends the request
    /// let body = request.into_body().collect().await?.to_bytes();
    /// assert_eq!(body, r#"{"a":1}"#);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn log_request(
        &self,
        request: &mut Request<Body>,
        log_body: bool,
        direction: Direction,
    ) {
        let mut message = format!(
            "Request started: {} [{}]: Headers: {}.",
            request.method(),
            request.uri(),
            flatten_headers(request.headers())
        );
        if log_body {
            if let Some(body) = self.capture_body(request.body_mut(), "request").await {
                let _ = write!(message, " Body: {}", String::from_utf8_lossy(&body));
            }
        }
        self.log(self.exchange_level(direction), &message);
    }

    /// Log a response to the request described by `request`: method, URI, status,
    /// headers and, if `log_body` is set, the body text.
    ///
    /// Statuses outside `200..300` are logged at Error level whatever the direction.
    /// Body handling is the same as for [`Logger::log_request`].
    pub async fn log_response(
        &self,
        request: &RequestLine,
        response: &mut Response<Body>,
        log_body: bool,
        direction: Direction,
    ) {
        let mut message = format!(
            "Response for {request}: Status: {}. Headers: {}.",
            response.status().as_u16(),
            flatten_headers(response.headers())
        );
        if log_body {
            if let Some(body) = self.capture_body(response.body_mut(), "response").await {
                let _ = write!(message, " Body: {}", String::from_utf8_lossy(&body));
            }
        }
        let level = if is_success(response.status()) {
            self.exchange_level(direction)
        } else {
            LogLevel::Error
        };
        self.log(level, &message);
    }

    fn exchange_level(&self, direction: Direction) -> LogLevel {
        if self.config().directional {
            direction.into()
        } else {
            LogLevel::Default
        }
    }

    /// Drains `slot`, puts an unread replacement back, and returns the bytes read.
    async fn capture_body(&self, slot: &mut Body, kind: &str) -> Option<Bytes> {
        let body = std::mem::replace(slot, Body::empty());
        let (restored, captured) = duplicate_body(body).await;
        *slot = restored;

        match captured {
            Ok(captured) => captured,
            Err(e) => {
                debug!(error = %e, kind, "Logging exchange without its body");
                crate::logf!(self, LogLevel::Error, "Can't read {kind} body: {e}.");
                None
            }
        }
    }
}
