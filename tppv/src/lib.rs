//! tppv: HTTP service wrapping the PSD2 verification engine.
//!
//! Exposes `POST /tpp/verify` and `GET /health`, reads its
//! configuration from the environment, seeds the trust store from the
//! directory at startup, and shares one verification service across
//! requests.

pub mod config;
pub mod error;
pub mod server;
pub mod store;

pub use config::Config;
pub use error::ServerError;

use anyhow::{Context, Result};
use std::sync::Arc;
use tppv_lib::{NetClient, VerifyService};
use tracing::info;

/// Service entry point: configure, wire, listen.
pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tppv=info,tppv_lib=info")),
        )
        .init();

    let config = Config::from_env().context("reading configuration")?;

    let directory = Arc::new(
        store::FileDirectory::open(&config.db_path).context("opening directory store")?,
    );
    let http = Arc::new(NetClient::new().context("building HTTP client")?);

    let svc = VerifyService::new(directory, http);
    let seeded = svc
        .load_roots()
        .await
        .context("seeding trust store roots")?;
    info!(roots = seeded, "trust store ready");

    let app = server::router(Arc::new(svc), &config);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    info!(addr = %config.addr, "tppv listening");

    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
