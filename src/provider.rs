use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use reqwest::StatusCode;
use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::models::chutes::ChutesRequest;

/// Type alias for a streaming response body from the backend
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Type alias for the futures returned by [`Upstream`] methods
pub type UpstreamFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Status plus a not-yet-consumed body of one forwarded request
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: ByteStream,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, body: ByteStream) -> Self {
        Self { status, body }
    }

    /// Build a response whose body is delivered as the given chunks
    pub fn from_chunks<I, B>(status: StatusCode, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks: Vec<std::io::Result<Bytes>> =
            chunks.into_iter().map(|c| Ok(c.into())).collect();
        Self::new(status, Box::pin(stream::iter(chunks)))
    }

    /// Drain the body into a lossy UTF-8 string, stopping at the first read error
    pub async fn text(mut self) -> String {
        let mut buf = Vec::new();
        while let Some(Ok(chunk)) = self.body.next().await {
            buf.extend_from_slice(&chunk);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// The chat backend as seen by the retry loop
pub trait Upstream: Send + Sync {
    /// Forward one envelope with a freshly built client carrying `clearance`
    ///
    /// Any HTTP status is an `Ok`; only transport failures are errors.
    fn post_chat<'a>(
        &'a self,
        request: &'a ChutesRequest,
        clearance: Option<&'a str>,
    ) -> UpstreamFuture<'a, Result<UpstreamResponse>>;

    /// Try to obtain a new clearance from the backend landing page
    fn fetch_clearance<'a>(&'a self, clearance: Option<&'a str>)
    -> UpstreamFuture<'a, Option<String>>;

    /// Whether a challenge rejection may trigger [`Upstream::fetch_clearance`]
    fn supports_refresh(&self) -> bool;

    /// Get the upstream name for logging
    fn name(&self) -> &str;
}
