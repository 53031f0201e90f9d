//! HTTP access behind a trait, so the cache can be exercised without a
//! network.

mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::http::HttpTransport;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockTransport;
use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// Response body, delivered in chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;
/// Shared, type-erased transport.
pub type TransportHandle = Arc<dyn Transport>;

/// HTTP cache validators: sent as request conditions, received as response
/// headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    /// `ETag` / `If-None-Match`
    pub etag: Option<String>,
    /// `Last-Modified` / `If-Modified-Since`
    pub last_modified: Option<String>,
}

impl Validators {
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// The outcome of a conditional `GET`.
pub enum Response {
    /// `304 Not Modified`.
    NotModified,
    /// Any other successful status.
    Body { validators: Validators, body: BodyStream },
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Response::NotModified => f.write_str("NotModified"),
            Response::Body { validators, .. } => f.debug_struct("Body").field("validators", validators).finish_non_exhaustive(),
        }
    }
}

/// Performs conditional `GET` requests.
///
/// Implementations map non-success statuses to
/// [`HttpStatus`](crate::error::ErrorKind::HttpStatus) and connection
/// failures to [`Download`](crate::error::ErrorKind::Download). They never
/// retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, conditions: &Validators) -> Result<Response>;
}
