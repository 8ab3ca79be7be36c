pub mod imagekit_client;
pub mod traced;

pub use imagekit_client::ImageKitClient;
pub use traced::TracedImageHost;
