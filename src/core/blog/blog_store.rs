// Storage traits (ports) for posts and comments.
//
// The core only talks to these traits; `infra::blog` provides SQLite and
// in-memory implementations. PostStore has no delete: a post only goes away
// through CascadeStore, together with its comments.

use super::blog_models::{Comment, PageRequest, Post, PostCounts};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    StorageError(String),

    /// The post/comments unit of work stopped half way.
    #[error("Cascade for post {post_id} incomplete: {reason}")]
    CascadeIncomplete { post_id: String, reason: String },
}

/// Outcome of a cascade delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub post_removed: bool,
    pub comments_removed: u64,
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: Post) -> Result<Post, StoreError>;

    async fn get_post(&self, id: &str) -> Result<Option<Post>, StoreError>;

    /// Published posts, newest first.
    async fn list_published(&self, page: PageRequest) -> Result<Vec<Post>, StoreError>;

    /// All posts including drafts, newest first.
    async fn list_posts(&self, page: PageRequest) -> Result<Vec<Post>, StoreError>;

    /// Flip `is_published`. Returns None when the id does not resolve.
    async fn toggle_published(&self, id: &str) -> Result<Option<Post>, StoreError>;

    async fn post_counts(&self) -> Result<PostCounts, StoreError>;

    /// The `limit` most recently created posts.
    async fn recent_posts(&self, limit: u32) -> Result<Vec<Post>, StoreError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Persist a pending comment. Returns None when the owning post does not exist.
    async fn insert_comment(&self, comment: Comment) -> Result<Option<Comment>, StoreError>;

    /// Approved comments of one post, newest first.
    async fn list_approved(
        &self,
        post_id: &str,
        page: PageRequest,
    ) -> Result<Vec<Comment>, StoreError>;

    /// Every comment regardless of state, newest first.
    async fn list_comments(&self, page: PageRequest) -> Result<Vec<Comment>, StoreError>;

    /// Mark a comment approved. Returns the comment and whether it changed,
    /// or None when the id does not resolve.
    async fn approve_comment(&self, id: &str) -> Result<Option<(Comment, bool)>, StoreError>;

    /// Returns false when the id does not resolve.
    async fn delete_comment(&self, id: &str) -> Result<bool, StoreError>;

    /// Remove every comment owned by `post_id`. Only the cascade calls this.
    async fn delete_comments_for_post(&self, post_id: &str) -> Result<u64, StoreError>;

    async fn comment_count(&self) -> Result<u64, StoreError>;
}

/// Unit of work removing a post and all of its comments.
///
/// Implementations with transactions run both deletes in one. Others must
/// remove the comments first, then the post. Comments for `post_id` are
/// always swept, even if the post is already gone, so retrying after a
/// partial failure converges.
#[async_trait]
pub trait CascadeStore: Send + Sync {
    async fn delete_post_cascade(&self, post_id: &str) -> Result<CascadeOutcome, StoreError>;
}

/// Everything the services need from a single backing store.
pub trait BlogStore: PostStore + CommentStore + CascadeStore {}

impl<T: PostStore + CommentStore + CascadeStore> BlogStore for T {}
