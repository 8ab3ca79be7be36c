// Runtime configuration, read once from the environment at startup.

use anyhow::{bail, Context};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/blog.db";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
/// One year. Longer lifetimes are rejected at startup.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;
const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";
const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful writing assistant for a blog. Answer with the article text only.";

/// `DATABASE_URL` value that selects the in-memory store.
pub const MEMORY_DATABASE: &str = "memory";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_email: String,
    pub admin_password: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub system_prompt: String,
    pub imagekit_private_key: String,
    pub imagekit_url_endpoint: String,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            optional(key).with_context(|| format!("Missing required environment variable {}", key))
        };

        let port = match optional("PORT") {
            Some(v) => v.parse::<u16>().with_context(|| format!("Invalid PORT: {}", v))?,
            None => DEFAULT_PORT,
        };

        let token_ttl_hours = match optional("TOKEN_TTL_HOURS") {
            Some(v) => v
                .parse::<i64>()
                .with_context(|| format!("Invalid TOKEN_TTL_HOURS: {}", v))?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            bail!(
                "TOKEN_TTL_HOURS must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_HOURS,
                token_ttl_hours
            );
        }

        let allowed_origins = optional("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port,
            database_url: optional("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            admin_email: required("ADMIN_EMAIL")?,
            admin_password: required("ADMIN_PASSWORD")?,
            jwt_secret: required("JWT_SECRET")?,
            token_ttl_hours,
            openrouter_api_key: required("OPENROUTER_API_KEY")?,
            openrouter_model: optional("OPENROUTER_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            system_prompt: optional("OPENROUTER_SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            imagekit_private_key: required("IMAGEKIT_PRIVATE_KEY")?,
            imagekit_url_endpoint: required("IMAGEKIT_URL_ENDPOINT")?,
            allowed_origins,
        })
    }
}
