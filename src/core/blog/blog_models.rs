// Blog domain models - posts, comments and paging.
//
// Pure data types shared by the services and the stores.
// Field names on the wire follow the public API (`_id`, `subTitle`, `isPublished`, ...).

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current time at the precision the stores keep (microseconds).
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 50;
/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A publishable content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(rename = "subTitle")]
    pub subtitle: Option<String>,
    pub description: String,
    pub category: String,
    pub image: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Build a draft post from validated fields.
    pub fn new(fields: PostFields, image: String) -> Self {
        let now = now_micros();
        Self {
            id: Uuid::new_v4().to_string(),
            title: fields.title.trim().to_string(),
            subtitle: fields
                .subtitle
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            description: fields.description,
            category: fields.category.trim().to_string(),
            image,
            is_published: fields.is_published,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            category: self.category.clone(),
            image: self.image.clone(),
            created_at: self.created_at,
        }
    }
}

/// Admin-supplied fields for a new post (the `blog` part of the upload form).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFields {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "subTitle")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_published: bool,
}

impl PostFields {
    /// Names of required fields that are missing or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        missing
    }
}

/// Projection returned by the public listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(rename = "subTitle")]
    pub subtitle: Option<String>,
    pub category: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// Moderation state of a comment. `Approved` is terminal; rejection is deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentState {
    Pending,
    Approved,
}

/// A reader-submitted comment on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning post id.
    #[serde(rename = "blog")]
    pub post_id: String,
    pub name: String,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn pending(post_id: &str, name: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            name: name.trim().to_string(),
            content: content.trim().to_string(),
            is_approved: false,
            created_at: now_micros(),
        }
    }

    pub fn state(&self) -> CommentState {
        if self.is_approved {
            CommentState::Approved
        } else {
            CommentState::Pending
        }
    }
}

/// 1-indexed page request, already clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Clamp raw query values: page >= 1, 1 <= limit <= MAX_PAGE_SIZE.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Post counters used by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostCounts {
    pub total: u64,
    pub drafts: u64,
}

/// Aggregate for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub blogs: u64,
    pub comments: u64,
    pub drafts: u64,
    pub recent_blogs: Vec<Post>,
}
