//! HTTP surface: router, auth middleware, handlers.

use crate::config::Config;
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tppv_lib::{TppvError, VerifyService};
use tracing::{error, info};

/// Per-request deadline. HTTP calls inside the engine time out well
/// before this, so a request can fail one upstream step and still
/// produce a verdict.
const REQUEST_DEADLINE: Duration = Duration::from_secs(15);

/// Shared application state.
pub struct AppState {
    svc: Arc<VerifyService>,
    auth_header_name: String,
    auth_header_value: String,
}

/// Build the service router. Every `/tpp` route sits behind the
/// shared-secret header check; `/health` stays open for probes.
pub fn router(svc: Arc<VerifyService>, config: &Config) -> Router {
    let state = Arc::new(AppState {
        svc,
        auth_header_name: config.auth_header_name.clone(),
        auth_header_value: config.auth_header_value.clone(),
    });

    Router::new()
        .route("/tpp/verify", post(verify))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_auth,
        ))
        .route("/health", get(health))
        .with_state(state)
}

/// Shared-secret header check: name and expected value come from the
/// environment; mismatch or absence is a 403.
async fn require_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(&state.auth_header_name)
        .and_then(|v| v.to_str().ok());
    if presented != Some(state.auth_header_value.as_str()) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Invalid or missing header"})),
        )
            .into_response();
    }
    next.run(request).await
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    cert: String,
}

/// `POST /tpp/verify`: verify one certificate payload.
async fn verify(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: VerifyRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("invalid request body: {}", e)})),
            )
                .into_response()
        }
    };

    let verdict = tokio::time::timeout(
        REQUEST_DEADLINE,
        state.svc.verify(request.cert.as_bytes()),
    )
    .await;

    match verdict {
        Ok(Ok(result)) => {
            info!(
                sha256 = %result.cert.sha256,
                valid = result.valid,
                reason = result.reason.as_deref().unwrap_or(""),
                "verification complete"
            );
            (StatusCode::OK, Json(result)).into_response()
        }
        Ok(Err(e)) => {
            let status = error_status(&e);
            if status.is_server_error() {
                error!(error = %e, "verification failed");
            }
            (status, Json(json!({"error": e.to_string()}))).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "request deadline exceeded"})),
        )
            .into_response(),
    }
}

/// Map engine faults to HTTP statuses. Verification outcomes never
/// reach this: they come back inside a 200 envelope.
fn error_status(e: &TppvError) -> StatusCode {
    match e {
        TppvError::BadFormat(_)
        | TppvError::BadPemType(_)
        | TppvError::Empty
        | TppvError::NoScopes => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
