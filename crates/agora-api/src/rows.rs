use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use agora_db::models::{CommentRow, PostRow, UserRow};
use agora_types::models::{Comment, Post, User};

use crate::error::ForumError;

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Ids key ownership and lookups, so a corrupt one is a store fault rather
/// than something to paper over.
fn parse_id(raw: &str, what: &str) -> Result<Uuid, ForumError> {
    raw.parse()
        .map_err(|e| ForumError::Store(anyhow::anyhow!("corrupt {} id '{}': {}", what, raw, e)))
}

fn parse_timestamp(raw: &str, owner: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through the sqlite shell use datetime('now').
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on '{}': {}", raw, owner, e);
            DateTime::default()
        })
}

pub(crate) fn user_from_row(row: &UserRow) -> Result<User, ForumError> {
    Ok(User {
        id: parse_id(&row.id, "user")?,
        username: row.username.clone(),
        created_at: parse_timestamp(&row.created_at, &row.id),
    })
}

pub(crate) fn post_from_row(row: PostRow) -> Result<Post, ForumError> {
    Ok(Post {
        id: parse_id(&row.id, "post")?,
        created_at: parse_timestamp(&row.created_at, &row.id),
        title: row.title,
        content: row.content,
        username: row.username,
        file_url: row.file_url,
    })
}

pub(crate) fn comment_from_row(row: CommentRow) -> Result<Comment, ForumError> {
    Ok(Comment {
        id: parse_id(&row.id, "comment")?,
        created_at: parse_timestamp(&row.created_at, &row.id),
        post_id: row.post_id,
        username: row.username,
        content: row.content,
    })
}
