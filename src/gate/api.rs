use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::config::RoomSecrets;
use crate::errors::GateError;

use super::grant::{self, SyncAuthorizer};
use super::validate::JoinRequest;

pub const AUTH_ROUTE: &str = "/api/liveblocks-auth";

/// Shared state for all gate handlers.
pub struct AppState {
    pub secrets: RoomSecrets,
    /// `None` when no Sync Service secret is configured; joins then fail
    /// with a server error after the room key checks out.
    pub authorizer: Option<Arc<dyn SyncAuthorizer>>,
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Failure {
    success: bool,
    message: String,
}

pub struct ApiError(GateError);

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            GateError::Validation => StatusCode::BAD_REQUEST,
            GateError::Authorization { .. } => StatusCode::FORBIDDEN,
            GateError::SyncRejected { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            GateError::SyncRejected { .. } => "Authorization failed".to_string(),
            GateError::Internal(_) => "Server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let GateError::Internal(e) = &self.0 {
            tracing::error!(error = %format!("{:#}", e), "session gate failed");
        }
        let body = Failure {
            success: false,
            message: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route(AUTH_ROUTE, post(liveblocks_auth))
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "ok"
}

/// Exchange a room key for a session grant.
///
/// A body that is not valid JSON is treated like one with every field blank.
async fn liveblocks_auth(
    State(state): State<SharedState>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let join = match payload {
        Ok(Json(join)) => join,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable join request");
            JoinRequest::default()
        }
    };

    let request = match join.authorize(&state.secrets, grant::random_avatar()) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(room_id = %join.room_id, email = %join.email, error = %e, "join refused");
            return Err(e.into());
        }
    };

    let authorizer = state.authorizer.as_ref().ok_or_else(|| {
        GateError::Internal(anyhow::anyhow!(
            "{} is not set; cannot mint session grants",
            crate::config::SYNC_SECRET_ENV
        ))
    })?;

    let resp = authorizer
        .authorize(&request)
        .await
        .map_err(GateError::Internal)?;

    if resp.status != 200 {
        tracing::warn!(
            room_id = %request.room_id,
            status = resp.status,
            "sync service refused session"
        );
        return Err(GateError::SyncRejected {
            status: resp.status,
        }
        .into());
    }

    tracing::info!(room_id = %request.room_id, email = %request.user_id, "session granted");
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        resp.body,
    )
        .into_response())
}

// ── Tests ─────────────────────────────────────────────────────────────
