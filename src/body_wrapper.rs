//! Body draining and duplication.
//!
//! This module reads an HTTP body to the end so it can be logged, and hands back a
//! replacement body that replays exactly what was read, so the real consumer still
//! sees an unread stream.

use axum::body::{Body, Bytes, HttpBody};
use axum::http::HeaderMap;
use bytes::BytesMut;
use http_body::Frame;
use http_body_util::{BodyExt, StreamBody};
use tracing::{debug, error};

/// Error type for body capture operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BodyCaptureError {
    #[error("Body stream error: {0}")]
    StreamError(String),
}

/// Result of reading a body for logging: `None` means the exchange has no body at all.
pub type CapturedBody = Result<Option<Bytes>, BodyCaptureError>;

/// Drains `body` and returns a replacement body together with the captured bytes.
///
/// - A body that is already at end-of-stream is the "no body" sentinel. It is returned
///   untouched and nothing is captured (`Ok(None)`). A body known to be empty up front,
///   such as `Body::from("")`, reports end-of-stream too and so counts as absent. A
///   streamed body that only turns out empty once read is captured as `Ok(Some(""))`.
/// - Otherwise all frames are read. The replacement replays the buffered data, followed
///   by the trailers if there were any. The captured bytes share that buffer.
/// - If a read fails, the replacement replays the data read so far and then fails with
///   the same message, so the downstream consumer observes the failure too. The error
///   is also returned to the caller.
///
/// The returned body must be put back into the exchange before anything else reads it.
///
/// # Examples
///
/// ```rust
/// use axum::body::Body;
/// use exchange_log::body_wrapper::duplicate_body;
/// use http_body_util::BodyExt;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (restored, captured) = duplicate_body(Body::from("Hello, World!")).await;
/// assert_eq!(captured?.unwrap(), "Hello, World!");
///
/// // The restored body still yields the full content
/// let bytes = restored.collect().await?.to_bytes();
/// assert_eq!(bytes, "Hello, World!");
/// # Ok(())
/// # }
/// ```
pub async fn duplicate_body(mut body: Body) -> (Body, CapturedBody) {
    if body.is_end_stream() {
        debug!("Body is absent, leaving it in place");
        return (body, Ok(None));
    }

    let mut data = BytesMut::new();
    let mut trailers = None;

    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => match frame.into_data() {
                Ok(chunk) => data.extend_from_slice(&chunk),
                Err(frame) => {
                    if let Ok(map) = frame.into_trailers() {
                        trailers = Some(map);
                    }
                }
            },
            Err(e) => {
                error!(error = %e, "Stream error during body capture");
                let err = BodyCaptureError::StreamError(e.to_string());
                let restored = replay(data.freeze(), None, Some(err.clone()));
                return (restored, Err(err));
            }
        }
    }

    let data = data.freeze();
    debug!(body_size = data.len(), "Body drained for capture");
    (replay(data.clone(), trailers, None), Ok(Some(data)))
}

/// Builds an unread body yielding `data`, then `trailers`, then `failure`.
fn replay(data: Bytes, trailers: Option<HeaderMap>, failure: Option<BodyCaptureError>) -> Body {
    if trailers.is_none() && failure.is_none() {
        return Body::from(data);
    }

    let mut frames: Vec<Result<Frame<Bytes>, axum::Error>> = Vec::with_capacity(3);
    if !data.is_empty() {
        frames.push(Ok(Frame::data(data)));
    }
    if let Some(trailers) = trailers {
        frames.push(Ok(Frame::trailers(trailers)));
    }
    if let Some(failure) = failure {
        frames.push(Err(axum::Error::new(failure)));
    }
    Body::new(StreamBody::new(futures::stream::iter(frames)))
}
