use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use agora_types::api::{Claims, CreateCommentRequest};

use crate::auth::AppState;
use crate::error::{ForumError, run_blocking};

/// Comment endpoints answer store faults with `{"message": ...}` rather than
/// the `{"error": ...}` shape the post endpoints use.
fn comment_failure(e: ForumError, message: &'static str) -> Response {
    match e {
        ForumError::Store(inner) => {
            error!("{}: {:#}", message, inner);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "message": message })),
            )
                .into_response()
        }
        other => other.into_response(),
    }
}

/// GET /api/posts/{id}/comments
pub async fn list_comments(State(state): State<AppState>, Path(post_id): Path<String>) -> Response {
    let st = state.clone();
    match run_blocking(move || st.content.list_comments(&post_id)).await {
        Ok(comments) => Json(comments).into_response(),
        Err(e) => comment_failure(e, "Failed to fetch comments"),
    }
}

/// POST /api/posts/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> Response {
    let st = state.clone();
    let result =
        run_blocking(move || st.content.add_comment(&post_id, &claims.username, &req.content)).await;

    match result {
        Ok(comment) => (StatusCode::CREATED, Json(comment)).into_response(),
        Err(e) => comment_failure(e, "Failed to add comment"),
    }
}
