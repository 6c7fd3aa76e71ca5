//! File-backed directory store.
//!
//! A small document store on disk: a `tpps.json` collection keyed by
//! open banking ID and a `certs/` collection with one JSON document
//! per certificate, keyed by SHA-256 fingerprint. Registry ingestion
//! tools own the content; the service only reads TPPs and roots and
//! appends intermediates.

use crate::error::ServerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tppv_lib::{Directory, ParsedCert, Position, Tpp, TppvError};
use tracing::{debug, warn};

/// One row of the `certs` collection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CertRow {
    pem: String,
    sha256: String,
    serial: String,
    subject: String,
    position: Position,
    is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

/// [`Directory`] implementation over JSON files.
pub struct FileDirectory {
    tpps_path: PathBuf,
    certs_dir: PathBuf,
}

impl FileDirectory {
    /// Open (and create, if needed) the store at `root`.
    pub fn open(root: &Path) -> Result<Self, ServerError> {
        let certs_dir = root.join("certs");
        std::fs::create_dir_all(&certs_dir)
            .map_err(|e| ServerError::Store(format!("creating {}: {}", certs_dir.display(), e)))?;
        Ok(FileDirectory {
            tpps_path: root.join("tpps.json"),
            certs_dir,
        })
    }

    /// Read the whole TPP collection. A missing file is an empty
    /// collection, not an error.
    async fn read_tpps(&self) -> Result<HashMap<String, Tpp>, TppvError> {
        let raw = match tokio::fs::read(&self.tpps_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(TppvError::Directory(format!(
                    "reading {}: {}",
                    self.tpps_path.display(),
                    e
                )))
            }
        };
        serde_json::from_slice(&raw).map_err(|e| {
            TppvError::Directory(format!("parsing {}: {}", self.tpps_path.display(), e))
        })
    }

    /// Overwrite the TPP collection. Used by seeding and tests;
    /// ingestion tools normally write this file.
    pub async fn write_tpps(&self, tpps: &HashMap<String, Tpp>) -> Result<(), TppvError> {
        let raw = serde_json::to_vec_pretty(tpps)?;
        tokio::fs::write(&self.tpps_path, raw).await.map_err(|e| {
            TppvError::Directory(format!("writing {}: {}", self.tpps_path.display(), e))
        })
    }

    fn cert_path(&self, sha256: &str) -> PathBuf {
        self.certs_dir.join(format!("{}.json", sha256))
    }

    /// Store a certificate row. Existing rows win: the write is
    /// skipped when the fingerprint is already present.
    pub async fn save_cert(
        &self,
        cert: &ParsedCert,
        position: Position,
    ) -> Result<(), TppvError> {
        let path = self.cert_path(cert.sha256());
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(sha256 = cert.sha256(), "certificate row already present");
            return Ok(());
        }
        let row = CertRow {
            pem: cert.to_pem(),
            sha256: cert.sha256().to_string(),
            serial: cert.serial().to_string(),
            subject: cert.subject().to_string(),
            position,
            is_active: true,
            updated_at: OffsetDateTime::now_utc(),
        };
        let raw = serde_json::to_vec_pretty(&row)?;
        tokio::fs::write(&path, raw)
            .await
            .map_err(|e| TppvError::Directory(format!("writing {}: {}", path.display(), e)))
    }
}

#[async_trait]
impl Directory for FileDirectory {
    async fn get_tpp(&self, ob_id: &str) -> Result<Option<Tpp>, TppvError> {
        let mut tpps = self.read_tpps().await?;
        Ok(tpps.remove(ob_id))
    }

    async fn list_roots(&self) -> Result<Vec<Vec<u8>>, TppvError> {
        let mut entries = tokio::fs::read_dir(&self.certs_dir).await.map_err(|e| {
            TppvError::Directory(format!("reading {}: {}", self.certs_dir.display(), e))
        })?;

        let mut roots = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TppvError::Directory(format!("listing certs: {}", e)))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = match tokio::fs::read(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable cert row");
                    continue;
                }
            };
            // Corrupt rows are skipped, not fatal; the trust store can
            // live without one root until ingestion repairs it.
            let row: CertRow = match serde_json::from_slice(&raw) {
                Ok(row) => row,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping corrupt cert row");
                    continue;
                }
            };
            if row.position == Position::Root && row.is_active {
                roots.push(row.pem.into_bytes());
            }
        }
        Ok(roots)
    }

    async fn save_intermediate(&self, cert: &ParsedCert) -> Result<(), TppvError> {
        self.save_cert(cert, Position::Intermediate).await
    }
}
