use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, warn};

use agora_types::api::{Claims, CreatePostResponse, UpdatePostRequest};
use agora_types::models::Post;

use crate::auth::AppState;
use crate::content::PostChanges;
use crate::error::{ForumError, run_blocking};

/// Parsed multipart body of a post creation request.
#[derive(Default)]
struct PostForm {
    title: String,
    content: String,
    claimed_username: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

async fn read_post_form(mut multipart: Multipart) -> Result<PostForm, ForumError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => form.title = field.text().await?,
            "content" => form.content = field.text().await?,
            "username" => form.claimed_username = Some(field.text().await?),
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await?;
                // Browsers submit an empty part when no file was picked.
                if !(file_name.is_empty() && bytes.is_empty()) {
                    form.file = Some((file_name, bytes.to_vec()));
                }
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    Ok(form)
}

fn note_ignored_username(claimed: Option<&str>, claims: &Claims) {
    if let Some(claimed) = claimed.filter(|c| *c != claims.username) {
        warn!(
            "Body username '{}' ignored; acting as token identity '{}'",
            claimed, claims.username
        );
    }
}

/// GET /api/posts
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ForumError> {
    let st = state.clone();
    let posts = run_blocking(move || st.content.list_posts()).await?;
    Ok(Json(posts))
}

/// GET /api/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Post>, ForumError> {
    let st = state.clone();
    let post = run_blocking(move || st.content.get_post(&id)).await?;
    Ok(Json(post))
}

/// POST /api/posts: multipart `title`, `content` and an optional `file`.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ForumError> {
    let form = read_post_form(multipart).await?;
    note_ignored_username(form.claimed_username.as_deref(), &claims);

    if form.title.trim().is_empty() || form.content.trim().is_empty() {
        return Err(ForumError::Invalid("Title and content are required".into()));
    }

    let upload = match &form.file {
        Some((file_name, bytes)) => Some(state.uploads.save(file_name, bytes).await?),
        None => None,
    };

    let st = state.clone();
    let attachment = upload.clone();
    let result = run_blocking(move || {
        st.content
            .create_post(&form.title, &form.content, &claims.username, attachment.as_ref())
    })
    .await;

    let post = match result {
        Ok(post) => post,
        Err(e) => {
            if let Some(upload) = &upload {
                if let Err(cleanup) = state.uploads.remove(&upload.stored_name).await {
                    warn!("Failed to remove orphaned upload {}: {}", upload.stored_name, cleanup);
                }
            }
            return Err(e);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            message: "Post created successfully".into(),
            file_url: post.file_url.clone(),
            post,
        }),
    ))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ForumError> {
    note_ignored_username(req.username.as_deref(), &claims);

    let changes = PostChanges {
        title: req.title,
        content: req.content,
        file_url: req.file_url,
    };

    let st = state.clone();
    let post = run_blocking(move || st.content.update_post(&id, &claims.username, changes)).await?;
    Ok(Json(post))
}

/// DELETE /api/posts/{id}. Any request body is ignored; the token decides.
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<&'static str, ForumError> {
    let st = state.clone();
    run_blocking(move || st.content.delete_post(&id, &claims.username)).await?;
    Ok("Post deleted successfully")
}
