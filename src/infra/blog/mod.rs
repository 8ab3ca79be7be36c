// Implementations of the blog stores.

pub mod in_memory;
pub mod sqlite_store;

pub use in_memory::InMemoryBlogStore;
pub use sqlite_store::SqliteBlogStore;
