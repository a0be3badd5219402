use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use agora_types::api::{Claims, DeleteUserRequest, LoginRequest, LoginResponse, RegisterRequest};

use crate::attachments::UploadStore;
use crate::content::ContentService;
use crate::error::{ForumError, run_blocking};
use crate::identity::IdentityService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub identity: IdentityService,
    pub content: ContentService,
    pub uploads: UploadStore,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ForumError> {
    let st = state.clone();
    run_blocking(move || st.identity.register(&req.username, &req.password)).await?;

    Ok((StatusCode::CREATED, "User registered"))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ForumError> {
    let st = state.clone();
    let session = run_blocking(move || st.identity.login(&req.username, &req.password)).await?;

    Ok(Json(LoginResponse {
        token: session.token,
        username: session.user.username,
        user_id: session.user.id,
    }))
}

/// POST /api/auth/logout. Tokens are stateless; the client discards its own.
pub async fn logout() -> &'static str {
    "Logged out"
}

/// DELETE /api/auth/delete
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DeleteUserRequest>,
) -> Response {
    if req.user_id != claims.sub {
        warn!("{} tried to delete account {}", claims.username, req.user_id);
        return ForumError::Forbidden("You are not authorized to delete this user").into_response();
    }

    let st = state.clone();
    match run_blocking(move || st.identity.delete_identity(req.user_id)).await {
        Ok(()) => "User deleted successfully".into_response(),
        Err(e) => {
            error!("Error deleting user: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error deleting user").into_response()
        }
    }
}
