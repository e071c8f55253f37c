/// Request/response endpoints

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::{short_id, AppState};
use crate::config::AuthMode;
use crate::error::CoordinatorError;
use crate::session::Session;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub user_id: String,
    pub session_id: String,
    /// Empty when `answered` is false.
    pub response: String,
    pub answered: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    kind: String,
}

/// A client-visible failure
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    kind: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
            kind: "bad_request".to_string(),
        }
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        let status = match &err {
            CoordinatorError::NotFound(_) => StatusCode::NOT_FOUND,
            CoordinatorError::InvalidPhoneNumber(_) => StatusCode::BAD_REQUEST,
            CoordinatorError::IdentityProvider(_) | CoordinatorError::Policy(_) => StatusCode::BAD_GATEWAY,
            CoordinatorError::ToolInvocation { .. } => StatusCode::BAD_GATEWAY,
            CoordinatorError::DispatchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CoordinatorError::Session(_) | CoordinatorError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!("[HTTP] {} ({}): {}", self.status, self.kind, self.message);
        let body = ErrorBody {
            success: false,
            error: self.message,
            kind: self.kind,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn query(
    Extension(state): Extension<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if payload.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }

    let user_id = resolve_user(&state, &payload).await?;
    let session_id = non_empty(payload.session_id.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("session_{}", short_id()));

    let key = state.dispatcher.session_key(&user_id, &session_id);
    state.dispatcher.sessions().get_or_create(&key)?;

    let result = state
        .dispatcher
        .dispatch(&user_id, &session_id, &payload.query)
        .await?;

    Ok(Json(QueryResponse {
        user_id,
        session_id,
        answered: result.is_answered(),
        response: result.text().unwrap_or_default().to_string(),
    }))
}

/// A phone number always wins over a supplied user id; it is required in phone mode.
async fn resolve_user(state: &AppState, payload: &QueryRequest) -> Result<String, ApiError> {
    match non_empty(payload.phone_number.as_deref()) {
        Some(phone_number) => {
            let resolver = state
                .identity
                .as_ref()
                .ok_or_else(|| ApiError::bad_request("phone authentication is not enabled"))?;
            Ok(resolver.resolve(phone_number).await?)
        }
        None if state.auth_mode == AuthMode::Phone => {
            Err(ApiError::bad_request("phone_number is required"))
        }
        None => Ok(non_empty(payload.user_id.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("user_{}", short_id()))),
    }
}

pub async fn session_history(
    Extension(state): Extension<AppState>,
    Path((user_id, session_id)): Path<(String, String)>,
) -> Result<Json<Session>, ApiError> {
    let key = state.dispatcher.session_key(&user_id, &session_id);
    match state.dispatcher.sessions().get(&key).await? {
        Some(session) => Ok(Json(session)),
        None => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: format!("no session {} for user {}", session_id, user_id),
            kind: "not_found".to_string(),
        }),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
