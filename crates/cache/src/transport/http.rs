use super::{Response, Transport, Validators};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use futures::StreamExt;
use reqwest::header::{ETAG, HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::instrument;

const USER_AGENT: &str = concat!("mongodl/", env!("CARGO_PKG_VERSION"));

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client; `timeout` bounds each whole request, body included.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { client: builder.build().or_raise(|| ErrorKind::Client)? })
    }
}

fn header(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, conditions), fields(conditional = !conditions.is_empty()))]
    async fn get(&self, url: &str, conditions: &Validators) -> Result<Response> {
        let mut request = self.client.get(url);
        if let Some(etag) = &conditions.etag {
            request = request.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = &conditions.last_modified {
            request = request.header(IF_MODIFIED_SINCE, last_modified);
        }
        let response = request.send().await.or_raise(|| ErrorKind::Download(url.to_string()))?;
        let status = response.status();
        tracing::debug!(%status, "received response");
        if status == StatusCode::NOT_MODIFIED {
            return Ok(Response::NotModified);
        }
        if !status.is_success() {
            exn::bail!(ErrorKind::HttpStatus { url: url.to_string(), status: status.as_u16() });
        }
        let validators = Validators {
            etag: header(response.headers(), ETAG),
            last_modified: header(response.headers(), LAST_MODIFIED),
        };
        let url = url.to_string();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map(|bytes| bytes.to_vec()).or_raise(|| ErrorKind::Download(url.clone())));
        Ok(Response::Body { validators, body: Box::pin(body) })
    }
}
