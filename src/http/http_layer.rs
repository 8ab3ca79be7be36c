// The http module adapts the core services to the REST API.
//
// - gateway: rate limit and admin auth middleware
// - blog_routes / admin_routes: handlers
// - api_error: error to status/JSON mapping

#[path = "admin_routes.rs"]
pub mod admin_routes;
#[path = "api_error.rs"]
pub mod api_error;
#[path = "blog_routes.rs"]
pub mod blog_routes;
#[path = "gateway.rs"]
pub mod gateway;

use crate::core::ai::{AiProvider, AiService};
use crate::core::auth::AuthService;
use crate::core::blog::{BlogStore, CommentService, PageRequest, PostService};
use crate::core::media::ImageHost;
use crate::core::moderation::ModerationService;
use crate::core::rate_limit::{CounterStore, RateBucket, RateLimitService};
use api_error::ApiError;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use gateway::{enforce_rate_limit, require_admin, BucketGuard};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Largest accepted post upload (JSON fields plus image).
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared handles for every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService<dyn BlogStore>>,
    pub comments: Arc<CommentService<dyn BlogStore>>,
    pub moderation: Arc<ModerationService<dyn BlogStore>>,
    pub auth: Arc<AuthService>,
    pub limiter: Arc<RateLimitService<dyn CounterStore>>,
    pub ai: Arc<AiService<Box<dyn AiProvider>>>,
    pub images: Arc<dyn ImageHost>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn BlogStore>,
        counters: Arc<dyn CounterStore>,
        auth: AuthService,
        ai: AiService<Box<dyn AiProvider>>,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        Self {
            posts: Arc::new(PostService::new(store.clone())),
            comments: Arc::new(CommentService::new(store.clone())),
            moderation: Arc::new(ModerationService::new(store)),
            auth: Arc::new(auth),
            limiter: Arc::new(RateLimitService::new(counters)),
            ai: Arc::new(ai),
            images,
        }
    }
}

/// `?page=&limit=` on listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// `{id}` body of the admin actions.
#[derive(Debug, Deserialize)]
pub struct IdBody {
    #[serde(default)]
    id: String,
}

impl IdBody {
    pub fn id(&self) -> Result<&str, ApiError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(ApiError::Validation("id is required".to_string()));
        }
        Ok(id)
    }
}

async fn root() -> &'static str {
    "API is running"
}

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "status": "healthy", "version": env!("CARGO_PKG_VERSION") }))
}

pub fn router(state: AppState) -> Router {
    let admin = middleware::from_fn_with_state(state.clone(), require_admin);

    let admin_login = Router::new()
        .route("/login", post(admin_routes::login))
        .layer(middleware::from_fn_with_state(
            BucketGuard::new(&state, RateBucket::AdminLogin),
            enforce_rate_limit,
        ));

    let admin_actions = Router::new()
        .route("/comments", get(admin_routes::list_comments))
        .route("/blogs", get(admin_routes::list_posts))
        .route("/delete-comment", post(admin_routes::delete_comment))
        .route("/approve-comment", post(admin_routes::approve_comment))
        .route("/dashboard", get(admin_routes::dashboard))
        .layer(admin.clone());

    let blog_public = Router::new()
        .route("/all", get(blog_routes::list_published))
        .route("/:id", get(blog_routes::get_post))
        .route("/comments", post(blog_routes::list_comments))
        .layer(middleware::from_fn_with_state(
            BucketGuard::new(&state, RateBucket::General),
            enforce_rate_limit,
        ));

    let blog_comment = Router::new()
        .route("/add-comment", post(blog_routes::add_comment))
        .layer(middleware::from_fn_with_state(
            BucketGuard::new(&state, RateBucket::CommentSubmission),
            enforce_rate_limit,
        ));

    let blog_admin = Router::new()
        .route(
            "/add",
            post(blog_routes::add_post).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/toggle-publish", post(blog_routes::toggle_publish))
        .route("/delete", post(blog_routes::delete_post))
        .layer(admin.clone());

    let blog_generate = Router::new()
        .route("/generate-content", post(blog_routes::generate_content))
        .layer(admin)
        .layer(middleware::from_fn_with_state(
            BucketGuard::new(&state, RateBucket::ContentGeneration),
            enforce_rate_limit,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/admin", admin_login.merge(admin_actions))
        .nest(
            "/api/blog",
            blog_public
                .merge(blog_comment)
                .merge(blog_admin)
                .merge(blog_generate),
        )
        .with_state(state)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::{AiConfig, AiMessage, AiProviderResponse};
    use crate::core::blog::{PageRequest, PostFields};
    use crate::core::media::MediaError;
    use crate::infra::blog::InMemoryBlogStore;
    use crate::infra::rate_limit::InMemoryCounterStore;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    const EMAIL: &str = "admin@example.com";
    const PASSWORD: &str = "hunter2";

    struct StubProvider;

    #[async_trait]
    impl AiProvider for StubProvider {
        async fn chat_complete(
            &self,
            messages: &[AiMessage],
            _config: &AiConfig,
        ) -> Result<AiProviderResponse, Box<dyn std::error::Error + Send + Sync>> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(AiProviderResponse {
                content: format!("Draft: {}", last),
            })
        }
    }

    struct StubImageHost;

    #[async_trait]
    impl ImageHost for StubImageHost {
        async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, MediaError> {
            if bytes.is_empty() {
                return Err(MediaError::EmptyFile);
            }
            Ok(format!("https://cdn.test/blogs/{}", file_name))
        }
    }

    fn test_state() -> AppState {
        let provider: Box<dyn AiProvider> = Box::new(StubProvider);
        AppState::new(
            Arc::new(InMemoryBlogStore::new()),
            Arc::new(InMemoryCounterStore::new()),
            AuthService::new(
                EMAIL.to_string(),
                PASSWORD.to_string(),
                "test-secret",
                chrono::Duration::hours(24),
            ),
            AiService::new(provider, "system".to_string(), AiConfig::new("test-model")),
            Arc::new(StubImageHost),
        )
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn login(app: &Router) -> String {
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/admin/login",
                None,
                json!({ "email": EMAIL, "password": PASSWORD }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn seed_post(state: &AppState, published: bool) -> String {
        state
            .posts
            .create(
                PostFields {
                    title: "Seeded".to_string(),
                    description: "<p>d</p>".to_string(),
                    category: "tech".to_string(),
                    is_published: published,
                    ..Default::default()
                },
                "https://cdn.test/blogs/seed.png".to_string(),
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(test_state());
        let (status, body) = send(&app, get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_admin_routes_require_token() {
        let app = router(test_state());

        let (status, body) = send(&app, get_request("/api/admin/dashboard", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, get_request("/api/admin/dashboard", Some("garbage"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = login(&app).await;
        let (status, body) = send(&app, get_request("/api/admin/dashboard", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dashboardData"]["blogs"], 0);

        let bearer = format!("Bearer {}", token);
        let (status, _) = send(&app, get_request("/api/admin/blogs", Some(&bearer))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_password_is_401() {
        let app = router(test_state());
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/login",
                None,
                json!({ "email": EMAIL, "password": "nope" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid Credentials");
    }

    #[tokio::test]
    async fn test_failed_logins_throttled_on_sixth() {
        let app = router(test_state());
        let bad = || {
            json_request(
                "POST",
                "/api/admin/login",
                None,
                json!({ "email": EMAIL, "password": "nope" }),
            )
        };

        for _ in 0..5 {
            let (status, _) = send(&app, bad()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        let (status, body) = send(&app, bad()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body["message"],
            "Too many login attempts, please try again later."
        );
    }

    #[tokio::test]
    async fn test_successful_logins_do_not_count() {
        let app = router(test_state());
        for _ in 0..8 {
            login(&app).await;
        }
    }

    fn login_request(password: &str) -> Request<Body> {
        json_request(
            "POST",
            "/api/admin/login",
            None,
            json!({ "email": EMAIL, "password": password }),
        )
    }

    #[tokio::test]
    async fn test_correct_login_refused_once_budget_spent() {
        let app = router(test_state());
        for _ in 0..5 {
            let (status, _) = send(&app, login_request("nope")).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let (status, body) = send(&app, login_request(PASSWORD)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["success"], false);
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_success_between_failures_is_not_counted() {
        let app = router(test_state());
        for _ in 0..4 {
            let (status, _) = send(&app, login_request("nope")).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        let (status, _) = send(&app, login_request(PASSWORD)).await;
        assert_eq!(status, StatusCode::OK);

        // Fifth failure still fits in the budget
        let (status, _) = send(&app, login_request("nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, login_request(PASSWORD)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_rate_limit_headers() {
        let app = router(test_state());

        let response = app
            .clone()
            .oneshot(get_request("/api/blog/all", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["ratelimit-limit"], "100");
        assert_eq!(headers["ratelimit-remaining"], "99");
        assert_eq!(headers["ratelimit-reset"], "900");
        assert!(headers.get(header::RETRY_AFTER).is_none());

        for _ in 0..5 {
            send(&app, login_request("nope")).await;
        }
        let response = app.clone().oneshot(login_request("nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers();
        assert_eq!(headers["ratelimit-limit"], "5");
        assert_eq!(headers["ratelimit-remaining"], "0");
        let retry_after: u64 = headers[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!(retry_after > 0 && retry_after <= 900);
    }

    #[tokio::test]
    async fn test_comment_moderation_flow() {
        let state = test_state();
        let app = router(state.clone());
        let post_id = seed_post(&state, true).await;

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/blog/add-comment",
                None,
                json!({ "blog": post_id, "name": "Ann", "content": "Nice post" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let public = || {
            json_request(
                "POST",
                "/api/blog/comments",
                None,
                json!({ "blogId": post_id }),
            )
        };
        let (_, body) = send(&app, public()).await;
        assert_eq!(body["comments"].as_array().unwrap().len(), 0);

        let token = login(&app).await;
        let (_, body) = send(&app, get_request("/api/admin/comments", Some(&token))).await;
        let comment_id = body["comments"][0]["_id"].as_str().unwrap().to_string();
        assert_eq!(body["comments"][0]["isApproved"], false);

        let approve = || {
            json_request(
                "POST",
                "/api/admin/approve-comment",
                Some(&token),
                json!({ "id": comment_id }),
            )
        };
        let (status, _) = send(&app, approve()).await;
        assert_eq!(status, StatusCode::OK);

        // Approving again is a no-op that still succeeds
        let (status, body) = send(&app, approve()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Comment approved successfully");

        let (_, body) = send(&app, public()).await;
        assert_eq!(body["comments"].as_array().unwrap().len(), 1);
        assert_eq!(body["comments"][0]["name"], "Ann");
    }

    #[tokio::test]
    async fn test_comment_on_unknown_post_is_404() {
        let app = router(test_state());
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/blog/add-comment",
                None,
                json!({ "blog": "missing", "name": "n", "content": "c" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_comment_submission_throttled_after_twenty() {
        let state = test_state();
        let app = router(state.clone());
        let post_id = seed_post(&state, true).await;

        for _ in 0..20 {
            let (status, _) = send(
                &app,
                json_request(
                    "POST",
                    "/api/blog/add-comment",
                    None,
                    json!({ "blog": post_id, "name": "n", "content": "c" }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/blog/add-comment",
                None,
                json!({ "blog": post_id, "name": "n", "content": "c" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body["message"],
            "Too many comments submitted, please try again later."
        );

        let stored = state
            .comments
            .list_all_for_admin(PageRequest::new(Some(1), Some(50)))
            .await
            .unwrap();
        assert_eq!(stored.len(), 20);
    }

    #[tokio::test]
    async fn test_delete_post_removes_comments() {
        let state = test_state();
        let app = router(state.clone());
        let post_id = seed_post(&state, true).await;
        for _ in 0..3 {
            state.comments.submit(&post_id, "n", "c").await.unwrap();
        }
        let token = login(&app).await;

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/blog/delete",
                Some(&token),
                json!({ "id": post_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, get_request("/api/admin/comments", Some(&token))).await;
        assert!(body["comments"].as_array().unwrap().is_empty());

        let (status, _) = send(&app, get_request(&format!("/api/blog/{}", post_id), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_post_multipart_then_publish() {
        let state = test_state();
        let app = router(state.clone());
        let token = login(&app).await;

        let boundary = "XBOUNDARYX";
        let blog = json!({
            "title": "Hello",
            "subTitle": "World",
            "description": "<p>Body</p>",
            "category": "tech",
            "isPublished": false
        });
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"blog\"\r\n\r\n{blog}\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"cover.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary,
            blog = blog
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/blog/add")
            .header(header::AUTHORIZATION, token.as_str())
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK, "{}", body);

        // Drafts stay out of the public listing
        let (_, body) = send(&app, get_request("/api/blog/all", None)).await;
        assert!(body["blogs"].as_array().unwrap().is_empty());

        let (_, body) = send(&app, get_request("/api/admin/blogs", Some(&token))).await;
        let post = &body["blogs"][0];
        assert_eq!(post["image"], "https://cdn.test/blogs/cover.png");
        let id = post["_id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/blog/toggle-publish",
                Some(&token),
                json!({ "id": id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, get_request("/api/blog/all?page=1&limit=5", None)).await;
        assert_eq!(body["blogs"][0]["title"], "Hello");
    }

    #[tokio::test]
    async fn test_add_post_with_missing_fields_is_400() {
        let app = router(test_state());
        let token = login(&app).await;

        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"blog\"\r\n\r\n{{\"title\":\"t\"}}\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/blog/add")
            .header(header::AUTHORIZATION, token.as_str())
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_generate_content() {
        let app = router(test_state());
        let token = login(&app).await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/blog/generate-content",
                Some(&token),
                json!({ "prompt": "Rust" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["content"].as_str().unwrap().starts_with("Draft: Rust"));

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/blog/generate-content",
                Some(&token),
                json!({ "prompt": "" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generation_throttle_runs_before_auth() {
        let app = router(test_state());
        for _ in 0..10 {
            let (status, _) = send(
                &app,
                json_request("POST", "/api/blog/generate-content", None, json!({ "prompt": "x" })),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        let (status, _) = send(
            &app,
            json_request("POST", "/api/blog/generate-content", None, json!({ "prompt": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_missing_id_is_400() {
        let app = router(test_state());
        let token = login(&app).await;
        let (status, _) = send(
            &app,
            json_request("POST", "/api/blog/toggle-publish", Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/blog/toggle-publish",
                Some(&token),
                json!({ "id": "missing" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
