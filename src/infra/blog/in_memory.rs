// In-memory implementation of the blog stores.
//
// Used by the tests and for ephemeral runs (DATABASE_URL=memory). Listings
// sort by creation time with an insertion sequence as tie-breaker, the same
// order the SQLite store gets from `created_at DESC, rowid DESC`.
//
// Lock order is always posts then comments. Comment inserts hold a read
// guard on the owning post, the cascade holds the post's entry while it
// sweeps, so a comment can never slip in between the sweep and the removal.

use crate::core::blog::{
    now_micros, CascadeOutcome, CascadeStore, Comment, CommentStore, PageRequest, Post, PostCounts,
    PostStore, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug)]
struct Stored<T> {
    seq: u64,
    value: T,
}

pub struct InMemoryBlogStore {
    posts: DashMap<String, Stored<Post>>,
    comments: DashMap<String, Stored<Comment>>,
    seq: AtomicU64,
}

impl InMemoryBlogStore {
    pub fn new() -> Self {
        Self {
            posts: DashMap::new(),
            comments: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn sweep_comments(&self, post_id: &str) -> u64 {
        let mut removed = 0;
        self.comments.retain(|_, stored| {
            if stored.value.post_id == post_id {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }
}

impl Default for InMemoryBlogStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort newest first and cut out one page.
fn newest_first<T>(
    mut rows: Vec<(DateTime<Utc>, u64, T)>,
    page: Option<PageRequest>,
) -> Vec<T> {
    rows.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
    let rows = rows.into_iter().map(|(_, _, value)| value);
    match page {
        Some(page) => rows
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect(),
        None => rows.collect(),
    }
}

fn collect_posts(
    store: &InMemoryBlogStore,
    keep: impl Fn(&Post) -> bool,
) -> Vec<(DateTime<Utc>, u64, Post)> {
    store
        .posts
        .iter()
        .filter(|entry| keep(&entry.value().value))
        .map(|entry| {
            let stored = entry.value();
            (stored.value.created_at, stored.seq, stored.value.clone())
        })
        .collect()
}

fn collect_comments(
    store: &InMemoryBlogStore,
    keep: impl Fn(&Comment) -> bool,
) -> Vec<(DateTime<Utc>, u64, Comment)> {
    store
        .comments
        .iter()
        .filter(|entry| keep(&entry.value().value))
        .map(|entry| {
            let stored = entry.value();
            (stored.value.created_at, stored.seq, stored.value.clone())
        })
        .collect()
}

#[async_trait]
impl PostStore for InMemoryBlogStore {
    async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
        let stored = Stored {
            seq: self.next_seq(),
            value: post.clone(),
        };
        self.posts.insert(post.id.clone(), stored);
        Ok(post)
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.get(id).map(|entry| entry.value.clone()))
    }

    async fn list_published(&self, page: PageRequest) -> Result<Vec<Post>, StoreError> {
        Ok(newest_first(collect_posts(self, |p| p.is_published), Some(page)))
    }

    async fn list_posts(&self, page: PageRequest) -> Result<Vec<Post>, StoreError> {
        Ok(newest_first(collect_posts(self, |_| true), Some(page)))
    }

    async fn toggle_published(&self, id: &str) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.get_mut(id).map(|mut entry| {
            let post = &mut entry.value;
            post.is_published = !post.is_published;
            post.updated_at = now_micros();
            post.clone()
        }))
    }

    async fn post_counts(&self) -> Result<PostCounts, StoreError> {
        let mut counts = PostCounts::default();
        for entry in self.posts.iter() {
            counts.total += 1;
            if !entry.value.is_published {
                counts.drafts += 1;
            }
        }
        Ok(counts)
    }

    async fn recent_posts(&self, limit: u32) -> Result<Vec<Post>, StoreError> {
        let mut posts = newest_first(collect_posts(self, |_| true), None);
        posts.truncate(limit as usize);
        Ok(posts)
    }
}

#[async_trait]
impl CommentStore for InMemoryBlogStore {
    async fn insert_comment(&self, comment: Comment) -> Result<Option<Comment>, StoreError> {
        // Held until the comment is in, see the lock order note above
        let Some(_post) = self.posts.get(&comment.post_id) else {
            return Ok(None);
        };

        let stored = Stored {
            seq: self.next_seq(),
            value: comment.clone(),
        };
        self.comments.insert(comment.id.clone(), stored);
        Ok(Some(comment))
    }

    async fn list_approved(
        &self,
        post_id: &str,
        page: PageRequest,
    ) -> Result<Vec<Comment>, StoreError> {
        let rows = collect_comments(self, |c| c.is_approved && c.post_id == post_id);
        Ok(newest_first(rows, Some(page)))
    }

    async fn list_comments(&self, page: PageRequest) -> Result<Vec<Comment>, StoreError> {
        Ok(newest_first(collect_comments(self, |_| true), Some(page)))
    }

    async fn approve_comment(&self, id: &str) -> Result<Option<(Comment, bool)>, StoreError> {
        Ok(self.comments.get_mut(id).map(|mut entry| {
            let comment = &mut entry.value;
            let changed = !comment.is_approved;
            comment.is_approved = true;
            (comment.clone(), changed)
        }))
    }

    async fn delete_comment(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.comments.remove(id).is_some())
    }

    async fn delete_comments_for_post(&self, post_id: &str) -> Result<u64, StoreError> {
        Ok(self.sweep_comments(post_id))
    }

    async fn comment_count(&self) -> Result<u64, StoreError> {
        Ok(self.comments.len() as u64)
    }
}

#[async_trait]
impl CascadeStore for InMemoryBlogStore {
    async fn delete_post_cascade(&self, post_id: &str) -> Result<CascadeOutcome, StoreError> {
        match self.posts.entry(post_id.to_string()) {
            Entry::Occupied(entry) => {
                // Comments first, then the post, while nobody can comment on it.
                // The sweep never yields, so the entry is not held across a suspension.
                let comments_removed = self.delete_comments_for_post(post_id).await?;
                entry.remove();
                Ok(CascadeOutcome {
                    post_removed: true,
                    comments_removed,
                })
            }
            Entry::Vacant(entry) => {
                drop(entry);
                Ok(CascadeOutcome {
                    post_removed: false,
                    comments_removed: self.delete_comments_for_post(post_id).await?,
                })
            }
        }
    }
}
