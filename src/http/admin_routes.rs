// Admin endpoints under /api/admin.

use super::api_error::ApiError;
use super::{AppState, IdBody, PageQuery};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::{Extension, Json};
use crate::core::auth::AdminIdentity;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let token = state.auth.authenticate(&body.email, &body.password)?;
    Ok(Json(json!({ "success": true, "token": token })))
}

pub async fn list_comments(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let comments = state
        .comments
        .list_all_for_admin(query.page_request())
        .await?;
    Ok(Json(json!({ "success": true, "comments": comments })))
}

pub async fn list_posts(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let blogs = state.posts.list_all(query.page_request()).await?;
    Ok(Json(json!({ "success": true, "blogs": blogs })))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    body: Result<Json<IdBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let id = body.id()?;
    state.moderation.delete_comment(id).await?;
    tracing::info!(admin = %admin.email, comment_id = %id, "Comment removed by admin");
    Ok(Json(json!({ "success": true, "message": "Comment deleted successfully" })))
}

pub async fn approve_comment(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    body: Result<Json<IdBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let outcome = state.moderation.approve_comment(body.id()?).await?;
    tracing::info!(
        admin = %admin.email,
        comment_id = %outcome.comment.id,
        post_id = %outcome.comment.post_id,
        newly_approved = outcome.newly_approved,
        "Comment approval requested by admin"
    );
    Ok(Json(json!({ "success": true, "message": "Comment approved successfully" })))
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let dashboard_data = state.moderation.dashboard().await?;
    Ok(Json(json!({ "success": true, "dashboardData": dashboard_data })))
}
