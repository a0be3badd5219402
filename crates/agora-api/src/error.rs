use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Failures of the identity and content services.
///
/// Store faults render as JSON `{"error": ...}`; everything else is a plain
/// text body, which is what existing clients of these endpoints parse.
#[derive(Debug, thiserror::Error)]
pub enum ForumError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    /// Same error whether the user is unknown or the password is wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already exists")]
    DuplicateIdentity,

    #[error("{0}")]
    Invalid(String),

    #[error("File too large")]
    PayloadTooLarge,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ForumError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidCredentials | Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateIdentity => StatusCode::CONFLICT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for ForumError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::Invalid(e.body_text())
        }
    }
}

impl IntoResponse for ForumError {
    fn into_response(self) -> Response {
        match self {
            Self::Store(e) => {
                error!("Store failure: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
            other => (other.status(), other.to_string()).into_response(),
        }
    }
}

/// Run blocking store or hashing work off the async runtime.
pub async fn run_blocking<F, T>(f: F) -> Result<T, ForumError>
where
    F: FnOnce() -> Result<T, ForumError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ForumError::Store(anyhow::anyhow!("worker task failed: {}", e))
    })?
}
