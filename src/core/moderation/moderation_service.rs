// Moderation engine - comment lifecycle and cascade deletes.
//
// Comment states: Pending -> Approved (one way). Rejecting a comment means
// deleting it; a comment can be deleted from either state.
//
// Deleting a post goes through the store's cascade unit of work so no
// comment outlives its post. Authorization happens before this layer.

use crate::core::blog::{
    BlogError, BlogStore, CascadeOutcome, Comment, CommentState, DashboardData,
};
use std::sync::Arc;

/// How many posts the dashboard shows.
pub const DASHBOARD_RECENT_POSTS: u32 = 5;

/// Result of an approve request.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub comment: Comment,
    /// False when the comment was already approved.
    pub newly_approved: bool,
}

pub struct ModerationService<S: BlogStore + ?Sized> {
    store: Arc<S>,
}

impl<S: BlogStore + ?Sized> ModerationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Approve a comment. Approving an approved comment succeeds without changes.
    pub async fn approve_comment(&self, id: &str) -> Result<ApprovalOutcome, BlogError> {
        let (comment, changed) = self
            .store
            .approve_comment(id)
            .await?
            .ok_or(BlogError::NotFound("Comment"))?;

        debug_assert_eq!(comment.state(), CommentState::Approved);
        if changed {
            tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "Comment approved");
        } else {
            tracing::debug!(comment_id = %comment.id, "Comment already approved");
        }

        Ok(ApprovalOutcome {
            comment,
            newly_approved: changed,
        })
    }

    /// Delete (or reject) a comment in any state.
    pub async fn delete_comment(&self, id: &str) -> Result<(), BlogError> {
        if !self.store.delete_comment(id).await? {
            return Err(BlogError::NotFound("Comment"));
        }
        tracing::info!(comment_id = %id, "Comment deleted");
        Ok(())
    }

    /// Delete a post together with all of its comments.
    ///
    /// Returns how many comments went with it. Comments left behind by an
    /// earlier interrupted cascade are swept even when the post is already
    /// gone; that case still reports `NotFound`.
    pub async fn delete_post(&self, post_id: &str) -> Result<u64, BlogError> {
        let outcome = match self.store.delete_post_cascade(post_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let err = BlogError::from(err);
                if let BlogError::CascadeIncomplete { .. } = err {
                    tracing::error!(
                        post_id = %post_id,
                        "Cascade delete interrupted, post and comments may be inconsistent"
                    );
                }
                return Err(err);
            }
        };

        let CascadeOutcome {
            post_removed,
            comments_removed,
        } = outcome;

        if !post_removed {
            if comments_removed > 0 {
                tracing::warn!(
                    post_id = %post_id,
                    comments_removed,
                    "Swept orphaned comments of a missing post"
                );
            }
            return Err(BlogError::NotFound("Blog"));
        }

        tracing::info!(post_id = %post_id, comments_removed, "Post deleted with its comments");
        Ok(comments_removed)
    }

    /// Counters and latest posts for the admin dashboard.
    pub async fn dashboard(&self) -> Result<DashboardData, BlogError> {
        let counts = self.store.post_counts().await?;
        let comments = self.store.comment_count().await?;
        let recent_blogs = self.store.recent_posts(DASHBOARD_RECENT_POSTS).await?;

        Ok(DashboardData {
            blogs: counts.total,
            comments,
            drafts: counts.drafts,
            recent_blogs,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
