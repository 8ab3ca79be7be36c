// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "blog/mod.rs"]
pub mod blog;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "auth/mod.rs"]
pub mod auth;

#[path = "rate_limit/mod.rs"]
pub mod rate_limit;

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "media/mod.rs"]
pub mod media;
