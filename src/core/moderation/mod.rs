// Core moderation module - comment approval, deletion and the post cascade.

pub mod moderation_service;

pub use moderation_service::*;
