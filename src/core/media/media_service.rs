// Image host port - where post cover images are stored.
//
// Uploads return a reference (a delivery URL) that is saved on the post.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Image file is empty")]
    EmptyFile,

    #[error("Image upload failed: {0}")]
    Upload(String),
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Store the image and return its delivery URL.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, MediaError>;
}

#[async_trait]
impl ImageHost for Box<dyn ImageHost> {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, MediaError> {
        (**self).upload(file_name, bytes).await
    }
}
