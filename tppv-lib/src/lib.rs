//! tppv-lib: PSD2 TPP certificate verification engine.
//!
//! Provides the building blocks for verifying qualified certificates
//! presented by Third-Party Payment Service Providers: multi-format
//! certificate decoding (PEM, raw base64, DER, PKCS#7), PSD2
//! qcStatements extraction, an accumulating trust store, lazy
//! fetch-and-cache of issuing CA chains over AIA, X.509 path
//! validation, OCSP revocation checking, and intersection of
//! certificate roles with a TPP's registered services.

mod cert;
mod decode;
mod der;
mod directory;
mod fetch;
mod http;
mod models;
mod ocsp;
pub mod oid;
mod pkcs7;
mod qc;
mod scope;
mod svc;
mod trust;
mod util;
pub mod verify;

pub use cert::{ParsedCert, Position, Usage};
pub use decode::decode_certs;
pub use directory::{Directory, MemoryDirectory};
pub use fetch::{ChainFetcher, FetchedChain};
pub use http::{HttpClient, HttpResponse, NetClient, MAX_BODY_BYTES};
pub use models::{normalize_ob_id, Service, Tpp};
pub use ocsp::{CertStatus, RevocationChecker};
pub use qc::{policy_urls, Nca, PolicyUrl, Psd2Attributes, PspRole};
pub use scope::resolve_scopes;
pub use svc::{CertSummary, VerifyResult, VerifyService};
pub use trust::TrustStore;
pub use util::normalize_armor;

/// Errors returned by tppv-lib.
#[derive(Debug, thiserror::Error)]
pub enum TppvError {
    /// Input is not a certificate in any accepted encoding.
    #[error("unrecognized certificate format: {0}")]
    BadFormat(String),

    /// PEM armor present but the block label is not CERTIFICATE.
    #[error("unexpected PEM label: {0}")]
    BadPemType(String),

    /// The selected decoding path produced zero certificates.
    #[error("no certificates found in input")]
    Empty,

    /// The leaf carries no caIssuers URL to walk.
    #[error("certificate has no caIssuers URL")]
    MissingAia,

    /// Network, status, or body failure while fetching an issuer certificate.
    #[error("failed to fetch issuer certificate: {0}")]
    UpstreamFetch(String),

    /// Path building could not reach a trusted root.
    #[error("certificate chain does not reach a trusted root: {0}")]
    Untrusted(String),

    /// OCSP transport or parse failure.
    #[error("revocation check failed: {0}")]
    Revocation(String),

    /// The OCSP responder reports the certificate revoked.
    #[error("certificate is revoked")]
    Revoked,

    /// Key usage identifies neither QWAC nor QSEAL.
    #[error("unknown certificate usage")]
    UnknownUsage,

    /// Certificate roles and TPP services do not intersect.
    #[error("certificate roles do not match any registered service")]
    NoScopes,

    /// Directory repository call failure.
    #[error("directory error: {0}")]
    Directory(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
