//! Verification coordinator: one request in, one verdict out.
//!
//! Orchestrates the full flow:
//! parse → TPP lookup → usage check → chain fetch → path verification
//! → revocation check → scope intersection. Verification outcomes are
//! data (a 200 envelope with `valid`/`reason`); only malformed input
//! and infrastructure failures surface as errors.

use crate::cert::{ParsedCert, Usage};
use crate::decode::decode_certs;
use crate::directory::Directory;
use crate::fetch::ChainFetcher;
use crate::http::HttpClient;
use crate::models::{normalize_ob_id, Service, Tpp};
use crate::ocsp::RevocationChecker;
use crate::qc::Nca;
use crate::scope::resolve_scopes;
use crate::trust::TrustStore;
use crate::verify::verify_path;
use crate::TppvError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Summary of the presented leaf certificate, as returned to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertSummary {
    pub serial: String,
    pub sha256: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub company_id: String,
    pub usage: Usage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nca: Option<Nca>,
    /// PSD2 role names in certificate order, reserved roles included.
    pub scopes: Vec<String>,
    pub parent_links: Vec<String>,
    pub crls: Vec<String>,
    pub ocsps: Vec<String>,
}

impl CertSummary {
    fn from_cert(cert: &ParsedCert) -> Self {
        CertSummary {
            serial: cert.serial().to_string(),
            sha256: cert.sha256().to_string(),
            company_id: cert.company_id().to_string(),
            usage: cert.usage(),
            nca: cert.nca().cloned(),
            scopes: cert.roles().iter().map(|r| r.name.clone()).collect(),
            parent_links: cert.parent_links().to_vec(),
            crls: cert.crls().to_vec(),
            ocsps: cert.ocsps().to_vec(),
        }
    }
}

/// The verification envelope.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    pub cert: CertSummary,
    pub tpp: Option<Tpp>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub scopes: BTreeMap<String, Vec<Service>>,
}

/// Coordinates one verification request end to end.
///
/// The trust store is shared across concurrent requests; the directory
/// and HTTP client are injected capabilities.
pub struct VerifyService {
    directory: Arc<dyn Directory>,
    store: Arc<TrustStore>,
    fetcher: ChainFetcher,
    revocation: RevocationChecker,
    at_time: Option<i64>,
}

impl VerifyService {
    pub fn new(directory: Arc<dyn Directory>, http: Arc<dyn HttpClient>) -> Self {
        let store = Arc::new(TrustStore::new());
        VerifyService {
            fetcher: ChainFetcher::new(Arc::clone(&http), Arc::clone(&store)),
            revocation: RevocationChecker::new(http),
            directory,
            store,
            at_time: None,
        }
    }

    /// Pin the verification clock to a fixed Unix timestamp. Tests use
    /// this to keep validity windows deterministic.
    pub fn with_fixed_clock(mut self, ts: i64) -> Self {
        self.at_time = Some(ts);
        self
    }

    pub fn trust_store(&self) -> &Arc<TrustStore> {
        &self.store
    }

    /// Seed one trusted root.
    pub fn add_root(&self, cert: ParsedCert) {
        self.store.seed_root(Arc::new(cert));
    }

    /// Rehydrate the roots pool from the directory. Rows that fail to
    /// decode are skipped with a warning; the count of seeded roots is
    /// returned.
    pub async fn load_roots(&self) -> Result<usize, TppvError> {
        let rows = self.directory.list_roots().await?;
        let mut seeded = 0;
        for row in rows {
            match decode_certs(&row) {
                Ok(certs) => {
                    for cert in certs {
                        if self.store.seed_root(Arc::new(cert)) {
                            seeded += 1;
                        }
                    }
                }
                Err(e) => warn!(error = %e, "skipping undecodable root certificate row"),
            }
        }
        info!(count = seeded, "seeded trusted roots from directory");
        Ok(seeded)
    }

    /// Verify an opaque certificate payload and assemble the envelope.
    ///
    /// Errors returned here are request-level faults (bad input, empty
    /// scope intersection, directory outage); every verification
    /// outcome comes back as `Ok` with `valid` and `reason` set.
    pub async fn verify(&self, cert_bytes: &[u8]) -> Result<VerifyResult, TppvError> {
        let now = self.now();

        let certs = decode_certs(cert_bytes)?;
        let leaf = match certs.into_iter().next() {
            Some(leaf) => Arc::new(leaf),
            None => return Err(TppvError::Empty),
        };
        let summary = CertSummary::from_cert(&leaf);
        debug!(
            sha256 = leaf.sha256(),
            subject = leaf.subject(),
            usage = %leaf.usage(),
            "verifying certificate"
        );

        let tpp = self.lookup_tpp(&leaf).await?;

        if let Err(e) = self.validate(&leaf, now).await {
            debug!(sha256 = leaf.sha256(), error = %e, "verification verdict");
            return Ok(VerifyResult {
                cert: summary,
                tpp,
                valid: false,
                reason: Some(verdict_reason(&e).to_string()),
                scopes: BTreeMap::new(),
            });
        }

        let scopes = match &tpp {
            Some(tpp) => resolve_scopes(&leaf, tpp),
            None => BTreeMap::new(),
        };
        if scopes.is_empty() {
            return Err(TppvError::NoScopes);
        }

        Ok(VerifyResult {
            cert: summary,
            tpp,
            valid: true,
            reason: None,
            scopes,
        })
    }

    /// Usage, chain fetch, path verification, revocation: every step
    /// whose failure is a verdict rather than a fault.
    async fn validate(&self, leaf: &Arc<ParsedCert>, now: i64) -> Result<(), TppvError> {
        if leaf.usage() == Usage::Unknown {
            return Err(TppvError::UnknownUsage);
        }

        let start_url = leaf
            .parent_links()
            .first()
            .cloned()
            .ok_or(TppvError::MissingAia)?;
        let fetched = self.fetcher.fetch_chain(&start_url).await?;

        let (roots, pool) = self.store.snapshot(&fetched.chain);
        let chain = verify_path(leaf, &roots, &pool, now)?;

        // The chain is good; persist what this walk discovered. A
        // persistence failure downgrades nothing.
        for cert in &fetched.fresh {
            if let Err(e) = self.directory.save_intermediate(cert).await {
                warn!(sha256 = cert.sha256(), error = %e, "persisting intermediate failed");
            }
        }

        if leaf.ocsps().is_empty() {
            warn!(
                sha256 = leaf.sha256(),
                "no OCSP responder URL, skipping revocation check"
            );
            return Ok(());
        }
        let issuer = chain.get(1).unwrap_or(leaf);
        if self.revocation.is_revoked(leaf, issuer).await? {
            return Err(TppvError::Revoked);
        }
        Ok(())
    }

    /// Resolve the TPP record behind the leaf's companyId, if any.
    async fn lookup_tpp(&self, leaf: &ParsedCert) -> Result<Option<Tpp>, TppvError> {
        if leaf.company_id().is_empty() {
            debug!(
                sha256 = leaf.sha256(),
                "certificate carries no organizationIdentifier"
            );
            return Ok(None);
        }
        let ob_id = normalize_ob_id(leaf.company_id());
        let tpp = self.directory.get_tpp(&ob_id).await?;
        if tpp.is_none() {
            debug!(ob_id = %ob_id, "TPP not found in directory");
        }
        Ok(tpp)
    }

    fn now(&self) -> i64 {
        self.at_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as i64
        })
    }
}

/// Human-readable reason for an absorbed verification failure.
fn verdict_reason(e: &TppvError) -> &'static str {
    match e {
        TppvError::UnknownUsage => "Unknown certificate usage",
        TppvError::MissingAia | TppvError::UpstreamFetch(_) => {
            "Error loading certificate chain"
        }
        TppvError::Untrusted(_) => "Certificate is not trusted",
        TppvError::Revoked => "Certificate is revoked",
        TppvError::Revocation(_) => "Error checking certificate revocation",
        _ => "Error verifying certificate",
    }
}
