//! Directory repository capability.
//!
//! The regulatory directory lives outside this crate (document store
//! or embedded relational store); the engine only consumes this narrow
//! capability set, injected into the coordinator and chain fetcher.

use crate::cert::ParsedCert;
use crate::models::Tpp;
use crate::TppvError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// The narrow directory interface the verification core consumes.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up a TPP by normalized open banking ID. `Ok(None)` means
    /// "not registered", which is not a failure.
    async fn get_tpp(&self, ob_id: &str) -> Result<Option<Tpp>, TppvError>;

    /// All active root certificates, each in a decodable encoding.
    async fn list_roots(&self) -> Result<Vec<Vec<u8>>, TppvError>;

    /// Persist a newly discovered intermediate CA. Idempotent by
    /// fingerprint.
    async fn save_intermediate(&self, cert: &ParsedCert) -> Result<(), TppvError>;
}

/// In-memory [`Directory`] for tests and local development.
#[derive(Default)]
pub struct MemoryDirectory {
    tpps: Mutex<HashMap<String, Tpp>>,
    roots: Mutex<Vec<Vec<u8>>>,
    intermediates: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tpp(&self, tpp: Tpp) {
        self.tpps
            .lock()
            .expect("directory lock poisoned")
            .insert(tpp.ob_id.clone(), tpp);
    }

    pub fn insert_root(&self, encoded: Vec<u8>) {
        self.roots
            .lock()
            .expect("directory lock poisoned")
            .push(encoded);
    }

    /// Fingerprints of intermediates persisted so far, for assertions.
    pub fn saved_intermediates(&self) -> Vec<String> {
        self.intermediates
            .lock()
            .expect("directory lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn get_tpp(&self, ob_id: &str) -> Result<Option<Tpp>, TppvError> {
        Ok(self
            .tpps
            .lock()
            .expect("directory lock poisoned")
            .get(ob_id)
            .cloned())
    }

    async fn list_roots(&self) -> Result<Vec<Vec<u8>>, TppvError> {
        Ok(self.roots.lock().expect("directory lock poisoned").clone())
    }

    async fn save_intermediate(&self, cert: &ParsedCert) -> Result<(), TppvError> {
        self.intermediates
            .lock()
            .expect("directory lock poisoned")
            .insert(cert.sha256().to_string(), cert.raw().to_vec());
        Ok(())
    }
}
