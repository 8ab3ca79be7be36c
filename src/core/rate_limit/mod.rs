// Core rate limit module - per-client request budgets.

pub mod rate_limit_models;
pub mod rate_limit_service;

pub use rate_limit_models::*;
pub use rate_limit_service::*;
