use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use agora_db::ContentStore;
use agora_db::models::{CommentRow, PostRow};
use agora_types::models::{Comment, Post};

use crate::attachments::{AttachmentResolver, UploadDescriptor};
use crate::error::ForumError;
use crate::rows::{comment_from_row, now_timestamp, post_from_row};

/// Behaviour switches for the edges of the content model.
///
/// Both default to off: comments are orphaned rather than deleted with
/// their post, and may be attached to post ids that do not exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentPolicy {
    pub cascade_delete_comments: bool,
    pub require_existing_post: bool,
}

/// Fields an update may replace. `None` leaves the stored value alone.
#[derive(Debug, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Edit,
    Delete,
}

/// Posts and comments, with update and delete gated on the post's creator.
///
/// Update and delete read the post, check ownership, then write. There is no
/// lock across those steps: two concurrent updates by the owner can both pass
/// the check and the later write wins.
pub struct ContentService {
    store: Arc<dyn ContentStore>,
    resolver: AttachmentResolver,
    policy: ContentPolicy,
}

impl ContentService {
    pub fn new(store: Arc<dyn ContentStore>, resolver: AttachmentResolver, policy: ContentPolicy) -> Self {
        Self { store, resolver, policy }
    }

    pub fn create_post(
        &self,
        title: &str,
        content: &str,
        creator: &str,
        attachment: Option<&UploadDescriptor>,
    ) -> Result<Post, ForumError> {
        require_text(title, "Title")?;
        require_text(content, "Content")?;

        let row = PostRow {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            username: creator.to_string(),
            file_url: self.resolver.resolve(attachment),
            created_at: now_timestamp(),
        };
        self.store.insert_post(&row)?;

        info!("Post {} created by {}", row.id, row.username);
        post_from_row(row)
    }

    pub fn get_post(&self, id: &str) -> Result<Post, ForumError> {
        post_from_row(self.find_post(id)?)
    }

    pub fn list_posts(&self) -> Result<Vec<Post>, ForumError> {
        self.store.list_posts()?.into_iter().map(post_from_row).collect()
    }

    pub fn update_post(&self, id: &str, actor: &str, changes: PostChanges) -> Result<Post, ForumError> {
        let mut row = self.find_post(id)?;
        authorize(&row, actor, Action::Edit)?;

        if let Some(title) = changes.title {
            require_text(&title, "Title")?;
            row.title = title;
        }
        if let Some(content) = changes.content {
            require_text(&content, "Content")?;
            row.content = content;
        }
        if let Some(file_url) = changes.file_url {
            if row.file_url.is_none() {
                return Err(ForumError::Invalid(
                    "Attachments can only be added when a post is created".into(),
                ));
            }
            require_text(&file_url, "File URL")?;
            row.file_url = Some(file_url);
        }

        // Deleted between the read and the write.
        if !self.store.update_post(&row)? {
            return Err(ForumError::NotFound("Post not found"));
        }

        info!("Post {} updated by {}", row.id, actor);
        post_from_row(row)
    }

    pub fn delete_post(&self, id: &str, actor: &str) -> Result<(), ForumError> {
        let row = self.find_post(id)?;
        authorize(&row, actor, Action::Delete)?;

        self.store.delete_post(&row.id)?;
        if self.policy.cascade_delete_comments {
            let removed = self.store.delete_comments_for_post(&row.id)?;
            info!("Post {} deleted by {} with {} comments", row.id, actor, removed);
        } else {
            info!("Post {} deleted by {}", row.id, actor);
        }
        Ok(())
    }

    pub fn add_comment(&self, post_id: &str, creator: &str, content: &str) -> Result<Comment, ForumError> {
        require_text(content, "Content")?;
        if self.policy.require_existing_post {
            self.find_post(post_id)?;
        }

        let row = CommentRow {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            username: creator.to_string(),
            content: content.to_string(),
            created_at: now_timestamp(),
        };
        self.store.insert_comment(&row)?;
        comment_from_row(row)
    }

    pub fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, ForumError> {
        self.store.list_comments(post_id)?.into_iter().map(comment_from_row).collect()
    }

    fn find_post(&self, id: &str) -> Result<PostRow, ForumError> {
        self.store.get_post(id)?.ok_or(ForumError::NotFound("Post not found"))
    }
}

/// The ownership guard: only the recorded creator may mutate a post.
fn authorize(post: &PostRow, actor: &str, action: Action) -> Result<(), ForumError> {
    if post.username == actor {
        return Ok(());
    }

    warn!("{} tried to {:?} post {} owned by {}", actor, action, post.id, post.username);
    Err(ForumError::Forbidden(match action {
        Action::Edit => "You are not authorized to edit this post",
        Action::Delete => "You are not authorized to delete this post",
    }))
}

fn require_text(value: &str, field: &str) -> Result<(), ForumError> {
    if value.trim().is_empty() {
        return Err(ForumError::Invalid(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingStore, MemoryStore};

    fn service_with(policy: ContentPolicy) -> ContentService {
        ContentService::new(
            Arc::new(MemoryStore::default()),
            AttachmentResolver::new("http://localhost:5000"),
            policy,
        )
    }

    fn service() -> ContentService {
        service_with(ContentPolicy::default())
    }

    #[test]
    fn created_post_reads_back_identically() {
        let svc = service();
        let created = svc.create_post("t", "c", "alice", None).unwrap();

        let fetched = svc.get_post(&created.id.to_string()).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.title, "t");
        assert_eq!(fetched.content, "c");
        assert_eq!(fetched.username, "alice");
        assert_ne!(fetched.id, Uuid::nil());
        assert_eq!(fetched.file_url, None);
    }

    #[test]
    fn attachment_is_resolved_on_creation() {
        let svc = service();
        let upload = UploadDescriptor {
            original_name: "cat.jpg".into(),
            stored_name: "17-ab.jpg".into(),
        };

        let post = svc.create_post("t", "c", "alice", Some(&upload)).unwrap();
        assert_eq!(post.file_url.as_deref(), Some("http://localhost:5000/uploads/17-ab.jpg"));
    }

    #[test]
    fn missing_title_or_content_is_invalid() {
        let svc = service();
        assert!(matches!(svc.create_post("", "c", "alice", None), Err(ForumError::Invalid(_))));
        assert!(matches!(svc.create_post("t", "  ", "alice", None), Err(ForumError::Invalid(_))));
    }

    #[test]
    fn non_owner_cannot_update_or_delete() {
        let svc = service();
        let post = svc.create_post("t", "c", "alice", None).unwrap();
        let id = post.id.to_string();

        let changes = PostChanges {
            title: Some("hijacked".into()),
            ..Default::default()
        };
        assert!(matches!(svc.update_post(&id, "bob", changes), Err(ForumError::Forbidden(_))));
        assert!(matches!(svc.delete_post(&id, "bob"), Err(ForumError::Forbidden(_))));

        assert_eq!(svc.get_post(&id).unwrap(), post);
    }

    #[test]
    fn owner_update_changes_fields_but_never_creator() {
        let svc = service();
        let post = svc.create_post("t", "c", "alice", None).unwrap();
        let id = post.id.to_string();

        let updated = svc
            .update_post(&id, "alice", PostChanges {
                title: Some("T".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(updated.title, "T");
        assert_eq!(updated.content, "c");
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.created_at, post.created_at);
        assert_eq!(svc.get_post(&id).unwrap(), updated);
    }

    #[test]
    fn unknown_post_is_not_found() {
        let svc = service();
        assert!(matches!(svc.get_post("missing"), Err(ForumError::NotFound(_))));
        assert!(matches!(
            svc.update_post("missing", "alice", PostChanges::default()),
            Err(ForumError::NotFound(_))
        ));
        assert!(matches!(svc.delete_post("missing", "alice"), Err(ForumError::NotFound(_))));
    }

    #[test]
    fn file_url_can_replace_but_not_add_an_attachment() {
        let svc = service();
        let upload = UploadDescriptor {
            original_name: "a.png".into(),
            stored_name: "1-a.png".into(),
        };
        let with_file = svc.create_post("t", "c", "alice", Some(&upload)).unwrap();
        let without = svc.create_post("t", "c", "alice", None).unwrap();

        let replaced = svc
            .update_post(&with_file.id.to_string(), "alice", PostChanges {
                file_url: Some("http://localhost:5000/uploads/2-b.png".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(replaced.file_url.as_deref(), Some("http://localhost:5000/uploads/2-b.png"));

        let err = svc
            .update_post(&without.id.to_string(), "alice", PostChanges {
                file_url: Some("http://elsewhere/x".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ForumError::Invalid(_)));
    }

    #[test]
    fn comments_on_unknown_posts_are_accepted_by_default() {
        let svc = service();
        let comment = svc.add_comment("no-such-post", "carol", "hello").unwrap();

        let listed = svc.list_comments("no-such-post").unwrap();
        assert_eq!(listed, vec![comment]);
    }

    #[test]
    fn comments_on_unknown_posts_rejected_when_required() {
        let svc = service_with(ContentPolicy {
            require_existing_post: true,
            ..Default::default()
        });
        assert!(matches!(
            svc.add_comment("no-such-post", "carol", "hello"),
            Err(ForumError::NotFound(_))
        ));
    }

    #[test]
    fn deleting_post_keeps_comments_by_default() {
        let svc = service();
        let post = svc.create_post("t", "c", "alice", None).unwrap();
        let id = post.id.to_string();
        svc.add_comment(&id, "bob", "first").unwrap();

        svc.delete_post(&id, "alice").unwrap();
        assert!(matches!(svc.get_post(&id), Err(ForumError::NotFound(_))));
        assert_eq!(svc.list_comments(&id).unwrap().len(), 1);
    }

    #[test]
    fn cascade_policy_removes_comments_with_post() {
        let svc = service_with(ContentPolicy {
            cascade_delete_comments: true,
            ..Default::default()
        });
        let post = svc.create_post("t", "c", "alice", None).unwrap();
        let id = post.id.to_string();
        svc.add_comment(&id, "bob", "first").unwrap();

        svc.delete_post(&id, "alice").unwrap();
        assert!(svc.list_comments(&id).unwrap().is_empty());
    }

    #[test]
    fn store_faults_surface_as_store_errors() {
        let svc = ContentService::new(
            Arc::new(FailingStore),
            AttachmentResolver::new("http://localhost"),
            ContentPolicy::default(),
        );
        assert!(matches!(svc.list_posts(), Err(ForumError::Store(_))));
        assert!(matches!(svc.create_post("t", "c", "a", None), Err(ForumError::Store(_))));
    }

    #[test]
    fn corrupt_post_id_in_store_fails_listing() {
        let store = Arc::new(MemoryStore::default());
        store
            .insert_post(&PostRow {
                id: "bad".into(),
                title: "t".into(),
                content: "c".into(),
                username: "alice".into(),
                file_url: None,
                created_at: now_timestamp(),
            })
            .unwrap();
        let svc = ContentService::new(store, AttachmentResolver::new("http://localhost"), ContentPolicy::default());

        assert!(matches!(svc.list_posts(), Err(ForumError::Store(_))));
        assert!(matches!(svc.get_post("bad"), Err(ForumError::Store(_))));
    }
}
