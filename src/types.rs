//! Data types shared by the logger and the exchange formatting.
//!
//! This module contains the severity levels, the direction of an exchange, and the
//! request line that a response is attributed to.

use axum::http::{Method, Request, Uri};
use std::fmt;

/// Severity of a log line. Only selects the tag printed in front of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Error,
    Default,
    /// Traffic arriving from another service
    FromService,
    /// Traffic sent to another service
    ToService,
}

/// Which side of an exchange is being logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    FromService,
    ToService,
}

impl From<Direction> for LogLevel {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::FromService => LogLevel::FromService,
            Direction::ToService => LogLevel::ToService,
        }
    }
}

/// Method and URI of the request a response belongs to.
///
/// `http::Response` does not keep a reference to its request, so callers capture this
/// before sending the request and hand it to [`Logger::log_response`](crate::Logger::log_response).
///
/// # Examples
///
/// ```rust
/// use axum::http::Request;
/// use exchange_log::RequestLine;
///
/// let request = Request::post("https://api.example.com/items").body(()).unwrap();
/// let line = RequestLine::from(&request);
/// assert_eq!(line.to_string(), "POST [https://api.example.com/items]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request URI as the client or server sees it
    pub uri: Uri,
}

impl RequestLine {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self { method, uri }
    }
}

impl<B> From<&Request<B>> for RequestLine {
    fn from(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
        }
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.method, self.uri)
    }
}
