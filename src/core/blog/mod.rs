// Core blog module - posts, comments and the storage ports behind them.

pub mod blog_models;
pub mod blog_service;
pub mod blog_store;

pub use blog_models::*;
pub use blog_service::*;
pub use blog_store::*;
