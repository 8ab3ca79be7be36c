// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "blog/mod.rs"]
pub mod blog;

#[path = "rate_limit/mod.rs"]
pub mod rate_limit;

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "media/mod.rs"]
pub mod media;
