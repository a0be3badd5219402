/// Database row types. These map directly to SQLite rows.
/// Distinct from agora-types API models to keep the DB layer independent.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub username: String,
    pub file_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub username: String,
    pub content: String,
    pub created_at: String,
}
