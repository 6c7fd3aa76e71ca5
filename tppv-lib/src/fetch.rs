//! Lazy fetch-and-cache of issuing CA chains over AIA.

use crate::cert::ParsedCert;
use crate::decode::decode_certs;
use crate::http::HttpClient;
use crate::trust::TrustStore;
use crate::TppvError;
use std::sync::Arc;
use tracing::{debug, info};

/// Upper bound on fetch rounds per chain walk. CA trees top out around
/// depth 5; a fetch round is a network call so the cap sits well below
/// the path builder's depth limit.
const MAX_FETCH_ROUNDS: usize = 8;

/// Result of walking a leaf's caIssuers URLs upward.
pub struct FetchedChain {
    /// Certificates in retrieval order, fresh-to-root; the first entry
    /// is the certificate served at the start URL.
    pub chain: Vec<Arc<ParsedCert>>,
    /// The subset that was new to the trust store in this walk, kept
    /// for post-verification persistence.
    pub fresh: Vec<Arc<ParsedCert>>,
}

/// Walks `caIssuers` URLs through an injected HTTP client, decoding
/// whatever format each URL serves and pooling new CA certificates in
/// the shared [`TrustStore`].
pub struct ChainFetcher {
    http: Arc<dyn HttpClient>,
    store: Arc<TrustStore>,
}

impl ChainFetcher {
    pub fn new(http: Arc<dyn HttpClient>, store: Arc<TrustStore>) -> Self {
        ChainFetcher { http, store }
    }

    /// Retrieve the CA certificate at `start_url` and transitively its
    /// issuers, stopping when a certificate already known to the store
    /// is reached (its parents are assumed known too), when a
    /// certificate has no `caIssuers` URL, on a repeated URL, or at the
    /// round cap.
    ///
    /// A URL that was already fetched successfully short-circuits
    /// without a network call; the pooled certificates cover it.
    pub async fn fetch_chain(&self, start_url: &str) -> Result<FetchedChain, TppvError> {
        let mut chain: Vec<Arc<ParsedCert>> = Vec::new();
        let mut fresh: Vec<Arc<ParsedCert>> = Vec::new();
        let mut url = start_url.to_string();
        let mut prev_url: Option<String> = None;

        for _ in 0..MAX_FETCH_ROUNDS {
            if self.store.url_fetched(&url) {
                debug!(url = %url, "issuer URL already fetched, using pooled certificates");
                break;
            }

            let response = self.http.get(&url).await?;
            if response.status != 200 {
                return Err(TppvError::UpstreamFetch(format!(
                    "GET {} returned status {}",
                    url, response.status
                )));
            }

            // The body may be PEM, raw base64, DER, or a PKCS#7 bundle
            // carrying several certificates in order.
            let certs = decode_certs(&response.body).map_err(|e| {
                TppvError::UpstreamFetch(format!("decoding body from {}: {}", url, e))
            })?;
            self.store.mark_url_fetched(&url);

            let mut reached_known = false;
            for cert in certs {
                let cert = Arc::new(cert);
                if self.store.is_known(cert.sha256()) {
                    reached_known = true;
                } else if self.store.add_intermediate(Arc::clone(&cert)) {
                    info!(
                        sha256 = cert.sha256(),
                        subject = cert.subject(),
                        "cached new intermediate CA"
                    );
                    fresh.push(Arc::clone(&cert));
                }
                chain.push(cert);
            }

            if reached_known {
                break;
            }

            let last = match chain.last() {
                Some(last) => Arc::clone(last),
                None => break,
            };
            match last.parent_links().first() {
                None => break,
                Some(next) => {
                    if *next == url || Some(next) == prev_url.as_ref() {
                        debug!(url = %next, "issuer URL cycle, stopping walk");
                        break;
                    }
                    prev_url = Some(std::mem::replace(&mut url, next.clone()));
                }
            }
        }

        Ok(FetchedChain { chain, fresh })
    }
}
