// Public blog endpoints plus the admin-only post management under /api/blog.

use super::api_error::ApiError;
use super::{AppState, IdBody, PageQuery};
use crate::core::auth::AdminIdentity;
use crate::core::blog::PostFields;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsBody {
    #[serde(default)]
    pub blog_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentBody {
    #[serde(default)]
    pub blog: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub prompt: String,
}

pub async fn list_published(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let blogs = state.posts.list_published(query.page_request()).await?;
    Ok(Json(json!({ "success": true, "blogs": blogs })))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let blog = state.posts.get_by_id(&id).await?;
    Ok(Json(json!({ "success": true, "blog": blog })))
}

pub async fn list_comments(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
    body: Result<Json<CommentsBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let Json(body) = body?;
    if body.blog_id.trim().is_empty() {
        return Err(ApiError::Validation("blogId is required".to_string()));
    }

    let comments = state
        .comments
        .list_approved_for_post(&body.blog_id, query.page_request())
        .await?;
    Ok(Json(json!({ "success": true, "comments": comments })))
}

pub async fn add_comment(
    State(state): State<AppState>,
    body: Result<Json<AddCommentBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    state
        .comments
        .submit(&body.blog, &body.name, &body.content)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Comment added for review" })))
}

/// Multipart upload: a `blog` field with the post JSON and an `image` file.
pub async fn add_post(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut fields: Option<PostFields> = None;
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "blog" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(e.body_text()))?;
                let parsed = serde_json::from_str(&text)
                    .map_err(|e| ApiError::Validation(format!("Invalid blog data: {}", e)))?;
                fields = Some(parsed);
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(e.body_text()))?;
                image = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let fields =
        fields.ok_or_else(|| ApiError::Validation("Missing required fields: blog".into()))?;
    state.posts.validate(&fields)?;
    let (file_name, bytes) =
        image.ok_or_else(|| ApiError::Validation("Missing required fields: image".into()))?;

    let image_url = state.images.upload(&file_name, bytes).await?;
    state.posts.create(fields, image_url).await?;

    Ok(Json(json!({ "success": true, "message": "Blog added successfully" })))
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    body: Result<Json<IdBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    state.posts.toggle_publish(body.id()?).await?;
    Ok(Json(json!({ "success": true, "message": "Blog status updated" })))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    body: Result<Json<IdBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let id = body.id()?;
    let comments_removed = state.moderation.delete_post(id).await?;
    tracing::info!(admin = %admin.email, post_id = %id, comments_removed, "Post removed by admin");
    Ok(Json(json!({ "success": true, "message": "Blog deleted successfully" })))
}

pub async fn generate_content(
    State(state): State<AppState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let content = state.ai.generate(&body.prompt).await?;
    Ok(Json(json!({ "success": true, "content": content })))
}
