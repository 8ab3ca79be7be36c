use crate::core::blog::{
    now_micros, CascadeOutcome, CascadeStore, Comment, CommentStore, PageRequest, Post, PostCounts,
    PostStore, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Pool, Row, Sqlite};
use std::path::Path;

const POST_COLUMNS: &str =
    "id, title, subtitle, description, category, image, is_published, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, post_id, name, content, is_approved, created_at";

pub struct SqliteBlogStore {
    pool: Pool<Sqlite>,
}

impl SqliteBlogStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !in_memory && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        // Every new connection to :memory: is a fresh database, so keep exactly one alive
        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = options.connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                subtitle TEXT,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                image TEXT NOT NULL,
                is_published BOOLEAN NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL,
                name TEXT NOT NULL,
                content TEXT NOT NULL,
                is_approved BOOLEAN NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn storage_error(e: sqlx::Error) -> StoreError {
    StoreError::StorageError(e.to_string())
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::StorageError(format!("Invalid timestamp: {}", micros)))
}

/// Remove every comment of a post. Runs on the pool or inside the cascade transaction.
async fn delete_comments_of<'e, E>(executor: E, post_id: &str) -> Result<u64, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM comments WHERE post_id = ?")
        .bind(post_id)
        .execute(executor)
        .await
        .map_err(storage_error)?;

    Ok(result.rows_affected())
}

fn post_from_row(row: &SqliteRow) -> Result<Post, StoreError> {
    Ok(Post {
        id: row.get("id"),
        title: row.get("title"),
        subtitle: row.get("subtitle"),
        description: row.get("description"),
        category: row.get("category"),
        image: row.get("image"),
        is_published: row.get("is_published"),
        created_at: from_micros(row.get("created_at"))?,
        updated_at: from_micros(row.get("updated_at"))?,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment, StoreError> {
    Ok(Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        name: row.get("name"),
        content: row.get("content"),
        is_approved: row.get("is_approved"),
        created_at: from_micros(row.get("created_at"))?,
    })
}

#[async_trait]
impl PostStore for SqliteBlogStore {
    async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
        sqlx::query(&format!(
            "INSERT INTO posts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            POST_COLUMNS
        ))
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.subtitle)
        .bind(&post.description)
        .bind(&post.category)
        .bind(&post.image)
        .bind(post.is_published)
        .bind(post.created_at.timestamp_micros())
        .bind(post.updated_at.timestamp_micros())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(post)
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref().map(post_from_row).transpose()
    }

    async fn list_published(&self, page: PageRequest) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE is_published = 1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            POST_COLUMNS
        ))
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(post_from_row).collect()
    }

    async fn list_posts(&self, page: PageRequest) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            POST_COLUMNS
        ))
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(post_from_row).collect()
    }

    async fn toggle_published(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let result = sqlx::query(
            "UPDATE posts SET is_published = NOT is_published, updated_at = ? WHERE id = ?",
        )
        .bind(now_micros().timestamp_micros())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_post(id).await
    }

    async fn post_counts(&self) -> Result<PostCounts, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, \
             COALESCE(SUM(CASE WHEN is_published = 0 THEN 1 ELSE 0 END), 0) AS drafts \
             FROM posts",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(PostCounts {
            total: row.get::<i64, _>("total") as u64,
            drafts: row.get::<i64, _>("drafts") as u64,
        })
    }

    async fn recent_posts(&self, limit: u32) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts ORDER BY created_at DESC, rowid DESC LIMIT ?",
            POST_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(post_from_row).collect()
    }
}

#[async_trait]
impl CommentStore for SqliteBlogStore {
    async fn insert_comment(&self, comment: Comment) -> Result<Option<Comment>, StoreError> {
        // Existence check and insert in one statement
        let result = sqlx::query(&format!(
            "INSERT INTO comments ({}) SELECT ?, ?, ?, ?, ?, ? \
             WHERE EXISTS (SELECT 1 FROM posts WHERE id = ?)",
            COMMENT_COLUMNS
        ))
        .bind(&comment.id)
        .bind(&comment.post_id)
        .bind(&comment.name)
        .bind(&comment.content)
        .bind(comment.is_approved)
        .bind(comment.created_at.timestamp_micros())
        .bind(&comment.post_id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok((result.rows_affected() == 1).then_some(comment))
    }

    async fn list_approved(
        &self,
        post_id: &str,
        page: PageRequest,
    ) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM comments WHERE post_id = ? AND is_approved = 1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            COMMENT_COLUMNS
        ))
        .bind(post_id)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(comment_from_row).collect()
    }

    async fn list_comments(&self, page: PageRequest) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM comments ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            COMMENT_COLUMNS
        ))
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(comment_from_row).collect()
    }

    async fn approve_comment(&self, id: &str) -> Result<Option<(Comment, bool)>, StoreError> {
        let result =
            sqlx::query("UPDATE comments SET is_approved = 1 WHERE id = ? AND is_approved = 0")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;
        let changed = result.rows_affected() == 1;

        let row = sqlx::query(&format!("SELECT {} FROM comments WHERE id = ?", COMMENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        match row {
            Some(row) => Ok(Some((comment_from_row(&row)?, changed))),
            None => Ok(None),
        }
    }

    async fn delete_comment(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_comments_for_post(&self, post_id: &str) -> Result<u64, StoreError> {
        delete_comments_of(&self.pool, post_id).await
    }

    async fn comment_count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(count as u64)
    }
}

#[async_trait]
impl CascadeStore for SqliteBlogStore {
    async fn delete_post_cascade(&self, post_id: &str) -> Result<CascadeOutcome, StoreError> {
        // Both deletes commit together or not at all; the transaction rolls back on drop
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let comments_removed = delete_comments_of(&mut *tx, post_id).await?;

        let post = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        // A failed commit leaves the outcome unknown to us
        tx.commit()
            .await
            .map_err(|e| StoreError::CascadeIncomplete {
                post_id: post_id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(CascadeOutcome {
            post_removed: post.rows_affected() == 1,
            comments_removed,
        })
    }
}
