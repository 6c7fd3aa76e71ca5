//! Service configuration from environment variables.

use crate::error::ServerError;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration for the verification service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory-store location (`TPPV_DB`).
    pub db_path: PathBuf,
    /// Shared-secret header name (`AUTH_HEADER_NAME`).
    pub auth_header_name: String,
    /// Expected shared-secret header value (`AUTH_HEADER_VALUE`).
    pub auth_header_value: String,
    /// Bind address (`TPPV_ADDR`, default `0.0.0.0:8080`).
    pub addr: SocketAddr,
}

fn required(name: &str) -> Result<String, ServerError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::Config(format!("{} must be set", name)))
}

impl Config {
    pub fn from_env() -> Result<Self, ServerError> {
        let addr = match std::env::var("TPPV_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| ServerError::Config(format!("TPPV_ADDR {:?}: {}", raw, e)))?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };
        Ok(Config {
            db_path: PathBuf::from(required("TPPV_DB")?),
            auth_header_name: required("AUTH_HEADER_NAME")?,
            auth_header_value: required("AUTH_HEADER_VALUE")?,
            addr,
        })
    }
}
