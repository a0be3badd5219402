//! In-memory stores for exercising the services without SQLite.

use std::sync::Mutex;

use anyhow::Result;

use agora_db::models::{CommentRow, PostRow, UserRow};
use agora_db::{ContentStore, CredentialStore};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserRow>>,
    posts: Mutex<Vec<PostRow>>,
    comments: Mutex<Vec<CommentRow>>,
    blind_lookup: bool,
}

impl MemoryStore {
    /// Username lookups always miss while inserts still enforce uniqueness,
    /// as when a concurrent registration lands between lookup and insert.
    pub fn with_blind_lookup() -> Self {
        Self {
            blind_lookup: true,
            ..Self::default()
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn stored_user(&self, username: &str) -> Option<UserRow> {
        self.users.lock().unwrap().iter().find(|u| u.username == username).cloned()
    }
}

impl CredentialStore for MemoryStore {
    fn insert_user(&self, user: &UserRow) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Ok(false);
        }
        users.push(user.clone());
        Ok(true)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        if self.blind_lookup {
            return Ok(None);
        }
        Ok(self.stored_user(username))
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}

impl ContentStore for MemoryStore {
    fn insert_post(&self, post: &PostRow) -> Result<()> {
        self.posts.lock().unwrap().push(post.clone());
        Ok(())
    }

    fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        Ok(self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    fn list_posts(&self) -> Result<Vec<PostRow>> {
        Ok(self.posts.lock().unwrap().clone())
    }

    fn update_post(&self, post: &PostRow) -> Result<bool> {
        let mut posts = self.posts.lock().unwrap();
        match posts.iter_mut().find(|p| p.id == post.id) {
            Some(stored) => {
                stored.title = post.title.clone();
                stored.content = post.content.clone();
                stored.file_url = post.file_url.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_post(&self, id: &str) -> Result<bool> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() != before)
    }

    fn insert_comment(&self, comment: &CommentRow) -> Result<()> {
        self.comments.lock().unwrap().push(comment.clone());
        Ok(())
    }

    fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRow>> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    fn delete_comments_for_post(&self, post_id: &str) -> Result<usize> {
        let mut comments = self.comments.lock().unwrap();
        let before = comments.len();
        comments.retain(|c| c.post_id != post_id);
        Ok(before - comments.len())
    }
}

/// A store whose every call fails, for checking fault propagation.
pub struct FailingStore;

impl ContentStore for FailingStore {
    fn insert_post(&self, _: &PostRow) -> Result<()> {
        anyhow::bail!("store offline")
    }
    fn get_post(&self, _: &str) -> Result<Option<PostRow>> {
        anyhow::bail!("store offline")
    }
    fn list_posts(&self) -> Result<Vec<PostRow>> {
        anyhow::bail!("store offline")
    }
    fn update_post(&self, _: &PostRow) -> Result<bool> {
        anyhow::bail!("store offline")
    }
    fn delete_post(&self, _: &str) -> Result<bool> {
        anyhow::bail!("store offline")
    }
    fn insert_comment(&self, _: &CommentRow) -> Result<()> {
        anyhow::bail!("store offline")
    }
    fn list_comments(&self, _: &str) -> Result<Vec<CommentRow>> {
        anyhow::bail!("store offline")
    }
    fn delete_comments_for_post(&self, _: &str) -> Result<usize> {
        anyhow::bail!("store offline")
    }
}
