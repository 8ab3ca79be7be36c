// Tracing decorator for any image host.

use crate::core::media::{ImageHost, MediaError};
use async_trait::async_trait;
use std::time::Instant;

pub struct TracedImageHost<H: ImageHost> {
    inner: H,
}

impl<H: ImageHost> TracedImageHost<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: ImageHost> ImageHost for TracedImageHost<H> {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, MediaError> {
        let size = bytes.len();
        let started = Instant::now();
        let result = self.inner.upload(file_name, bytes).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(url) => {
                tracing::info!(file_name, size, elapsed_ms, url = %url, "Image uploaded")
            }
            Err(e) => {
                tracing::error!(file_name, size, elapsed_ms, error = %e, "Image upload failed")
            }
        }
        result
    }
}
