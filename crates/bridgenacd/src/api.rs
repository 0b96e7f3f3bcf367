//! Portal control API: JSON over HTTP.
//!
//! All request validation happens at this boundary. MAC addresses arrive in
//! whatever format the portal sends and are normalized by the `MacAddress`
//! parser; role names are matched case-insensitively. Error responses carry
//! a short message with `success: false` and never echo raw gateway payloads.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use nac_access::{AccessError, AccessStats};
use nac_gateway::RuleId;
use nac_types::{AccessRole, MacAddress};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ── Request / response DTOs ───────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub mac: String,
    pub username: Option<String>,
    /// Explicit pre-authorized role. Omitted means "no role requested": an
    /// existing session keeps its current role, a new one starts as guest.
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub success: bool,
    pub mac: String,
    pub role: String,
    pub filter_rules: Vec<RuleId>,
    pub nat_rules: Vec<RuleId>,
    pub mangle_rules: Vec<RuleId>,
}

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub mac: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user_role: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub cleaned_count: usize,
}

// ── Error mapping ─────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// API-level error: an HTTP status plus a short message.
///
/// Gateway and resolver failures are reduced to fixed strings here so device
/// error payloads never leak to portal clients.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                success: false,
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match &err {
            AccessError::InvalidMac(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            AccessError::RecordNotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            AccessError::InvalidCredential => {
                Self::new(StatusCode::UNAUTHORIZED, "invalid credential")
            }
            AccessError::ResolverUnavailable(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "authentication service unavailable",
            ),
            AccessError::Gateway(g) if g.is_retryable() => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "bridge gateway unavailable")
            }
            AccessError::Gateway(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "bridge gateway error")
            }
        }
    }
}

fn parse_mac(raw: &str) -> Result<MacAddress, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid MAC address: {raw}")))
}

fn parse_role(raw: Option<&str>) -> Result<Option<AccessRole>, ApiError> {
    raw.map(|s| {
        s.parse()
            .map_err(|_| ApiError::bad_request(format!("unknown access role: {s}")))
    })
    .transpose()
}

// ── Handlers ──────────────────────────────────────────────────────

pub async fn connect(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let mac = parse_mac(&req.mac)?;
    let role = parse_role(req.role.as_deref())?;

    let outcome = state.manager.connect(mac, req.username, role).await?;
    Ok(Json(ConnectResponse {
        success: true,
        mac: outcome.mac.to_string(),
        role: outcome.role.to_string(),
        filter_rules: outcome.filter_rules,
        nat_rules: outcome.nat_rules,
        mangle_rules: outcome.mangle_rules,
    }))
}

pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mac = parse_mac(&req.mac)?;

    let outcome = state
        .manager
        .authenticate(mac, &req.username, &req.password)
        .await?;
    Ok(Json(AuthResponse {
        success: true,
        user_role: outcome.role.to_string(),
        message: outcome.message,
    }))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<AccessStats>, ApiError> {
    Ok(Json(state.manager.stats().await?))
}

pub async fn cleanup(State(state): State<Arc<AppState>>) -> Json<CleanupResponse> {
    let cleaned = state.manager.sweep().await;
    state.manager.purge_expired();
    Json(CleanupResponse {
        success: true,
        cleaned_count: cleaned,
    })
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Builds the portal control router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/access/connect", post(connect))
        .route("/api/v1/access/authenticate", post(authenticate))
        .route("/api/v1/access/stats", get(stats))
        .route("/api/v1/access/cleanup", post(cleanup))
        .with_state(state)
}
