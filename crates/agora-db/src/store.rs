use anyhow::Result;

use crate::models::{CommentRow, PostRow, UserRow};

/// Persistent `{identity, password hash}` records.
pub trait CredentialStore: Send + Sync {
    /// Inserts a user. Returns `false` without writing anything when the
    /// username is already taken.
    fn insert_user(&self, user: &UserRow) -> Result<bool>;

    fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>>;

    /// Returns whether a row was removed.
    fn delete_user(&self, id: &str) -> Result<bool>;
}

/// Persistent posts and comments.
pub trait ContentStore: Send + Sync {
    fn insert_post(&self, post: &PostRow) -> Result<()>;

    fn get_post(&self, id: &str) -> Result<Option<PostRow>>;

    /// All posts in insertion order.
    fn list_posts(&self) -> Result<Vec<PostRow>>;

    /// Overwrites `title`, `content` and `file_url` of the post with
    /// `post.id`. `username` and `created_at` are never written.
    fn update_post(&self, post: &PostRow) -> Result<bool>;

    fn delete_post(&self, id: &str) -> Result<bool>;

    fn insert_comment(&self, comment: &CommentRow) -> Result<()>;

    /// Comments whose `post_id` matches exactly, in insertion order.
    fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRow>>;

    fn delete_comments_for_post(&self, post_id: &str) -> Result<usize>;
}
