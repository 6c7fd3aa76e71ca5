//! HTTP client capability used for AIA fetches and OCSP queries.
//!
//! The engine never talks to `reqwest` directly; it goes through the
//! [`HttpClient`] trait so tests can inject canned responders and the
//! service can share one pooled client.

use crate::TppvError;
use async_trait::async_trait;
use std::time::Duration;

/// Hard cap on response bodies. CA certificates and OCSP responses are
/// a few kilobytes; anything near this limit is hostile or misconfigured.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default per-call timeout, kept below the per-request deadline so a
/// slow upstream fails one step rather than the whole verification.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Minimal HTTP capability: one GET, one POST with explicit content
/// negotiation. Mirrors the narrow client interface the verification
/// flow actually consumes.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TppvError>;

    async fn post(
        &self,
        url: &str,
        content_type: &str,
        accept: &str,
        body: Vec<u8>,
    ) -> Result<HttpResponse, TppvError>;
}

/// Production [`HttpClient`] backed by a pooled `reqwest` client.
pub struct NetClient {
    http: reqwest::Client,
}

impl NetClient {
    pub fn new() -> Result<Self, TppvError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TppvError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TppvError::UpstreamFetch(format!("building HTTP client: {}", e)))?;
        Ok(NetClient { http })
    }

    async fn read_capped(response: reqwest::Response) -> Result<HttpResponse, TppvError> {
        let status = response.status().as_u16();
        let mut body = Vec::new();
        let mut stream = response;
        while let Some(chunk) = stream
            .chunk()
            .await
            .map_err(|e| TppvError::UpstreamFetch(format!("reading body: {}", e)))?
        {
            if body.len() + chunk.len() > MAX_BODY_BYTES {
                return Err(TppvError::UpstreamFetch(format!(
                    "response body exceeds {} bytes",
                    MAX_BODY_BYTES
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for NetClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TppvError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TppvError::UpstreamFetch(format!("GET {}: {}", url, e)))?;
        Self::read_capped(response).await
    }

    async fn post(
        &self,
        url: &str,
        content_type: &str,
        accept: &str,
        body: Vec<u8>,
    ) -> Result<HttpResponse, TppvError> {
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::ACCEPT, accept)
            .body(body)
            .send()
            .await
            .map_err(|e| TppvError::UpstreamFetch(format!("POST {}: {}", url, e)))?;
        Self::read_capped(response).await
    }
}
