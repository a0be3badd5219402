use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::attachments::UPLOADS_ROUTE;
use crate::auth::{self, AppState};
use crate::comments;
use crate::middleware::require_auth;
use crate::posts;

/// Room for the non-file multipart fields on top of the upload limit.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the full HTTP surface. Reads go through unauthenticated; every write
/// requires a bearer token.
pub fn router(state: AppState) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.clone(), require_auth);
    let body_limit = state.uploads.max_bytes() + FORM_OVERHEAD_BYTES;
    let uploads = ServeDir::new(state.uploads.dir());

    Router::new()
        .route(
            "/api/posts",
            get(posts::list_posts).merge(post(posts::create_post).route_layer(auth_layer.clone())),
        )
        .route(
            "/api/posts/{id}",
            get(posts::get_post).merge(
                put(posts::update_post)
                    .delete(posts::delete_post)
                    .route_layer(auth_layer.clone()),
            ),
        )
        .route(
            "/api/posts/{id}/comments",
            get(comments::list_comments)
                .merge(post(comments::add_comment).route_layer(auth_layer.clone())),
        )
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/delete", delete(auth::delete_user).route_layer(auth_layer))
        .route("/health", get(health))
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
