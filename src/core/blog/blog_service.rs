// Post and comment services - validation and query rules on top of the stores.
//
// - PostService: create (validated), public/admin listings, lookup, publish toggle
// - CommentService: pending submissions and the two comment listings
//
// Approval, comment deletion and post deletion live in the moderation module.

use super::blog_models::{Comment, PageRequest, Post, PostFields, PostSummary};
use super::blog_store::{CommentStore, PostStore, StoreError};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("Missing required fields: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The post may be gone while some of its comments survived.
    #[error("Cascade delete of post {post_id} did not complete")]
    CascadeIncomplete { post_id: String },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for BlogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CascadeIncomplete { post_id, .. } => BlogError::CascadeIncomplete { post_id },
            other => BlogError::Store(other),
        }
    }
}

// ============================================================================
// POSTS
// ============================================================================

pub struct PostService<S: PostStore + ?Sized> {
    store: Arc<S>,
}

impl<S: PostStore + ?Sized> PostService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check the admin-supplied fields. Callers run this before uploading the image
    /// so an invalid post never costs an upload.
    pub fn validate(&self, fields: &PostFields) -> Result<(), BlogError> {
        let missing = fields.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BlogError::Validation(missing.join(", ")))
        }
    }

    /// Create a post. It starts as a draft unless the fields say otherwise.
    pub async fn create(&self, fields: PostFields, image: String) -> Result<Post, BlogError> {
        self.validate(&fields)?;
        if image.trim().is_empty() {
            return Err(BlogError::Validation("image".to_string()));
        }

        let post = self.store.insert_post(Post::new(fields, image)).await?;
        tracing::info!(post_id = %post.id, published = post.is_published, "Post created");
        Ok(post)
    }

    pub async fn list_published(&self, page: PageRequest) -> Result<Vec<PostSummary>, BlogError> {
        let posts = self.store.list_published(page).await?;
        Ok(posts.iter().map(Post::summary).collect())
    }

    pub async fn list_all(&self, page: PageRequest) -> Result<Vec<Post>, BlogError> {
        Ok(self.store.list_posts(page).await?)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Post, BlogError> {
        self.store
            .get_post(id)
            .await?
            .ok_or(BlogError::NotFound("Blog"))
    }

    pub async fn toggle_publish(&self, id: &str) -> Result<Post, BlogError> {
        let post = self
            .store
            .toggle_published(id)
            .await?
            .ok_or(BlogError::NotFound("Blog"))?;

        tracing::info!(post_id = %post.id, published = post.is_published, "Publish state toggled");
        Ok(post)
    }
}

// ============================================================================
// COMMENTS
// ============================================================================

pub struct CommentService<S: CommentStore + ?Sized> {
    store: Arc<S>,
}

impl<S: CommentStore + ?Sized> CommentService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Submit a comment. It enters the moderation queue as pending.
    pub async fn submit(
        &self,
        post_id: &str,
        name: &str,
        content: &str,
    ) -> Result<Comment, BlogError> {
        let mut missing = Vec::new();
        if post_id.trim().is_empty() {
            missing.push("blog");
        }
        if name.trim().is_empty() {
            missing.push("name");
        }
        if content.trim().is_empty() {
            missing.push("content");
        }
        if !missing.is_empty() {
            return Err(BlogError::Validation(missing.join(", ")));
        }

        let comment = self
            .store
            .insert_comment(Comment::pending(post_id, name, content))
            .await?
            .ok_or(BlogError::NotFound("Blog"))?;

        tracing::debug!(comment_id = %comment.id, post_id = %comment.post_id, "Comment queued for review");
        Ok(comment)
    }

    pub async fn list_approved_for_post(
        &self,
        post_id: &str,
        page: PageRequest,
    ) -> Result<Vec<Comment>, BlogError> {
        Ok(self.store.list_approved(post_id, page).await?)
    }

    pub async fn list_all_for_admin(&self, page: PageRequest) -> Result<Vec<Comment>, BlogError> {
        Ok(self.store.list_comments(page).await?)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::blog::InMemoryBlogStore;

    fn fields(title: &str) -> PostFields {
        PostFields {
            title: title.to_string(),
            subtitle: None,
            description: "d".to_string(),
            category: "c".to_string(),
            is_published: false,
        }
    }

    fn services() -> (PostService<InMemoryBlogStore>, CommentService<InMemoryBlogStore>) {
        let store = Arc::new(InMemoryBlogStore::new());
        (PostService::new(store.clone()), CommentService::new(store))
    }

    #[tokio::test]
    async fn test_create_with_title_only_fails_and_persists_nothing() {
        let (posts, _) = services();
        let only_title = PostFields {
            title: "t".to_string(),
            ..Default::default()
        };

        let result = posts.create(only_title, "i".to_string()).await;
        assert!(matches!(result, Err(BlogError::Validation(_))));
        assert!(posts.list_all(PageRequest::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_image() {
        let (posts, _) = services();
        let result = posts.create(fields("t"), "  ".to_string()).await;
        assert!(matches!(result, Err(BlogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_post_hidden_until_published() {
        let (posts, _) = services();
        let post = posts.create(fields("t"), "i".to_string()).await.unwrap();
        assert!(!post.is_published);

        let listed = posts.list_published(PageRequest::default()).await.unwrap();
        assert!(listed.is_empty());

        let toggled = posts.toggle_publish(&post.id).await.unwrap();
        assert!(toggled.is_published);

        let listed = posts.list_published(PageRequest::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, post.id);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_draft() {
        let (posts, _) = services();
        let post = posts.create(fields("t"), "i".to_string()).await.unwrap();
        posts.toggle_publish(&post.id).await.unwrap();
        let post = posts.toggle_publish(&post.id).await.unwrap();
        assert!(!post.is_published);
    }

    #[tokio::test]
    async fn test_unknown_post_is_not_found() {
        let (posts, _) = services();
        assert!(matches!(
            posts.toggle_publish("missing").await,
            Err(BlogError::NotFound(_))
        ));
        assert!(matches!(
            posts.get_by_id("missing").await,
            Err(BlogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_listing_paginates_newest_first() {
        let (posts, _) = services();
        for i in 0..15 {
            let mut f = fields(&format!("t{}", i));
            f.is_published = i % 2 == 0;
            posts.create(f, "i".to_string()).await.unwrap();
        }

        let first = posts
            .list_published(PageRequest::new(Some(1), Some(5)))
            .await
            .unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(first[0].title, "t14");
        assert_eq!(first[4].title, "t6");

        let second = posts
            .list_published(PageRequest::new(Some(2), Some(5)))
            .await
            .unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(second[2].title, "t0");

        let admin = posts.list_all(PageRequest::new(Some(1), Some(50))).await.unwrap();
        assert_eq!(admin.len(), 15);
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_is_not_found() {
        let (_, comments) = services();
        let result = comments.submit("nope", "n", "c").await;
        assert!(matches!(result, Err(BlogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_comment_requires_name_and_content() {
        let (posts, comments) = services();
        let post = posts.create(fields("t"), "i".to_string()).await.unwrap();
        let result = comments.submit(&post.id, " ", "").await;
        match result {
            Err(BlogError::Validation(msg)) => assert_eq!(msg, "name, content"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_new_comments_are_pending_and_hidden() {
        let (posts, comments) = services();
        let post = posts.create(fields("t"), "i".to_string()).await.unwrap();
        let comment = comments.submit(&post.id, "n", "c").await.unwrap();
        assert!(!comment.is_approved);

        let public = comments
            .list_approved_for_post(&post.id, PageRequest::default())
            .await
            .unwrap();
        assert!(public.is_empty());

        let queue = comments.list_all_for_admin(PageRequest::default()).await.unwrap();
        assert_eq!(queue.len(), 1);
    }
}
