//! In-memory transport for testing.

use super::{Response, Transport, Validators};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Chunk size used when replaying bodies, so consumers see more than one chunk.
const CHUNK_SIZE: usize = 16;

/// In-memory [`Transport`] serving fixed bodies keyed by URL.
///
/// Every body gets an `ETag` derived from its content and the transport
/// answers `304 Not Modified` when the request carries a matching
/// `If-None-Match`. Unknown URLs answer `404`. Failures can be injected per
/// URL with [`fail_next`](Self::fail_next).
#[derive(Default)]
pub struct MockTransport {
    resources: RwLock<HashMap<String, Vec<u8>>>,
    failures: RwLock<HashMap<String, usize>>,
    requests: RwLock<HashMap<String, usize>>,
}

impl MockTransport {
    pub fn with_resources(resources: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>) -> Self {
        let resources = resources.into_iter().map(|(url, body)| (url.into(), body.into())).collect();
        Self { resources: RwLock::new(resources), ..Self::default() }
    }

    /// Serve `body` at `url` from now on, replacing any previous body.
    pub async fn set(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.resources.write().await.insert(url.into(), body.into());
    }

    /// Fail the next `times` requests for `url` with a download error.
    pub async fn fail_next(&self, url: impl Into<String>, times: usize) {
        self.failures.write().await.insert(url.into(), times);
    }

    /// Number of requests received for `url`, including failed ones.
    pub async fn requests(&self, url: &str) -> usize {
        self.requests.read().await.get(url).copied().unwrap_or_default()
    }

    /// The `ETag` served for a body.
    pub fn etag(body: &[u8]) -> String {
        format!("\"{}\"", blake3::hash(body).to_hex())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, conditions: &Validators) -> Result<Response> {
        *self.requests.write().await.entry(url.to_string()).or_default() += 1;
        if let Some(remaining) = self.failures.write().await.get_mut(url)
            && *remaining > 0
        {
            *remaining -= 1;
            exn::bail!(ErrorKind::Download(url.to_string()));
        }
        let Some(body) = self.resources.read().await.get(url).cloned() else {
            exn::bail!(ErrorKind::HttpStatus { url: url.to_string(), status: 404 });
        };
        let etag = Self::etag(&body);
        if conditions.etag.as_deref() == Some(etag.as_str()) {
            return Ok(Response::NotModified);
        }
        let chunks: Vec<Result<Vec<u8>>> = body.chunks(CHUNK_SIZE).map(|chunk| Ok(chunk.to_vec())).collect();
        Ok(Response::Body {
            validators: Validators { etag: Some(etag), last_modified: None },
            body: Box::pin(futures::stream::iter(chunks)),
        })
    }
}
