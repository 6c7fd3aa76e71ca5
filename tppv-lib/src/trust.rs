//! In-memory trust store shared across concurrent verifications.

use crate::cert::ParsedCert;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Two pools of CA certificates plus a dedup guard.
///
/// Roots are seeded at startup from the directory; intermediates
/// accumulate at runtime as AIA chains are fetched. Additions are
/// monotonic for the process lifetime and idempotent on fingerprint,
/// so a verification racing another to discover the same intermediate
/// may observe its counterpart's insertion without harm.
///
/// A single read-write lock is enough at the access rates involved;
/// path building works on a point-in-time snapshot.
#[derive(Default)]
pub struct TrustStore {
    inner: RwLock<Pools>,
}

#[derive(Default)]
struct Pools {
    roots: Vec<Arc<ParsedCert>>,
    intermediates: Vec<Arc<ParsedCert>>,
    /// Fingerprints of every certificate in either pool.
    known: HashSet<String>,
    /// AIA URLs that have already been fetched successfully.
    fetched_urls: HashSet<String>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a certificate to the roots pool. Idempotent on fingerprint.
    pub fn seed_root(&self, cert: Arc<ParsedCert>) -> bool {
        let mut pools = self.inner.write().expect("trust store lock poisoned");
        if !pools.known.insert(cert.sha256().to_string()) {
            return false;
        }
        pools.roots.push(cert);
        true
    }

    /// Add a certificate to the intermediates pool. Returns `false`
    /// when the fingerprint was already known, in which case nothing
    /// is added.
    pub fn add_intermediate(&self, cert: Arc<ParsedCert>) -> bool {
        let mut pools = self.inner.write().expect("trust store lock poisoned");
        if !pools.known.insert(cert.sha256().to_string()) {
            return false;
        }
        pools.intermediates.push(cert);
        true
    }

    /// Whether a certificate with this fingerprint is in either pool.
    pub fn is_known(&self, sha256: &str) -> bool {
        self.inner
            .read()
            .expect("trust store lock poisoned")
            .known
            .contains(sha256)
    }

    /// Record that an AIA URL has been fetched and decoded successfully.
    pub fn mark_url_fetched(&self, url: &str) {
        self.inner
            .write()
            .expect("trust store lock poisoned")
            .fetched_urls
            .insert(url.to_string());
    }

    /// Whether an AIA URL has already been fetched successfully.
    pub fn url_fetched(&self, url: &str) -> bool {
        self.inner
            .read()
            .expect("trust store lock poisoned")
            .fetched_urls
            .contains(url)
    }

    /// Point-in-time snapshot for path building: the root anchors and
    /// the intermediates pool extended with per-request extras. The
    /// pool itself is not mutated.
    pub fn snapshot(
        &self,
        extra: &[Arc<ParsedCert>],
    ) -> (Vec<Arc<ParsedCert>>, Vec<Arc<ParsedCert>>) {
        let pools = self.inner.read().expect("trust store lock poisoned");
        let roots = pools.roots.clone();
        let mut intermediates = pools.intermediates.clone();
        for cert in extra {
            if !intermediates
                .iter()
                .any(|c| c.sha256() == cert.sha256())
            {
                intermediates.push(Arc::clone(cert));
            }
        }
        (roots, intermediates)
    }

    /// Number of certificates across both pools.
    pub fn len(&self) -> usize {
        let pools = self.inner.read().expect("trust store lock poisoned");
        pools.roots.len() + pools.intermediates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of intermediates currently pooled.
    pub fn intermediate_count(&self) -> usize {
        self.inner
            .read()
            .expect("trust store lock poisoned")
            .intermediates
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::ParsedCert;

    fn self_signed(cn: &str) -> Arc<ParsedCert> {
        let key = rcgen::KeyPair::generate().unwrap();
        let mut dn = rcgen::DistinguishedName::new();
        dn.push(rcgen::DnType::CommonName, cn);
        let mut params = rcgen::CertificateParams::default();
        params.distinguished_name = dn;
        let cert = params.self_signed(&key).unwrap();
        Arc::new(ParsedCert::from_der(cert.der()).unwrap())
    }

    #[test]
    fn duplicate_intermediates_pool_once() {
        let store = TrustStore::new();
        let a = self_signed("A");
        let b = self_signed("B");

        assert!(store.add_intermediate(Arc::clone(&a)));
        assert!(!store.add_intermediate(Arc::clone(&a)));
        assert!(store.add_intermediate(Arc::clone(&b)));
        assert!(!store.add_intermediate(Arc::clone(&b)));
        assert!(!store.add_intermediate(Arc::clone(&a)));

        assert_eq!(store.intermediate_count(), 2);
        assert!(store.is_known(a.sha256()));
        assert!(store.is_known(b.sha256()));
    }

    #[test]
    fn seeding_a_root_blocks_it_from_the_intermediate_pool() {
        let store = TrustStore::new();
        let root = self_signed("Root");
        assert!(store.seed_root(Arc::clone(&root)));
        assert!(!store.add_intermediate(Arc::clone(&root)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.intermediate_count(), 0);
    }

    #[test]
    fn snapshot_appends_extras_without_mutating_the_pool() {
        let store = TrustStore::new();
        let root = self_signed("Root");
        let pooled = self_signed("Pooled");
        let extra = self_signed("Extra");
        store.seed_root(Arc::clone(&root));
        store.add_intermediate(Arc::clone(&pooled));

        let (roots, pool) =
            store.snapshot(&[Arc::clone(&extra), Arc::clone(&pooled)]);
        assert_eq!(roots.len(), 1);
        assert_eq!(pool.len(), 2);
        assert_eq!(store.intermediate_count(), 1);
        assert!(!store.is_known(extra.sha256()));
    }

    #[test]
    fn url_guard_only_marks_fetched_urls() {
        let store = TrustStore::new();
        assert!(!store.url_fetched("http://ca.test/a.crt"));
        store.mark_url_fetched("http://ca.test/a.crt");
        assert!(store.url_fetched("http://ca.test/a.crt"));
        assert!(!store.url_fetched("http://ca.test/b.crt"));
    }
}
