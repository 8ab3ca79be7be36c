// ImageKit adapter - uploads post images and builds optimized delivery URLs.

use crate::core::media::{ImageHost, MediaError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::multipart::Form;
use reqwest::Client;
use serde::Deserialize;

const UPLOAD_URL: &str = "https://upload.imagekit.io/api/v1/files/upload";
const UPLOAD_FOLDER: &str = "/blogs";
/// Auto quality, webp, 1280px wide.
const DELIVERY_TRANSFORMATION: &str = "q-auto,f-webp,w-1280";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_path: String,
}

pub struct ImageKitClient {
    client: Client,
    private_key: String,
    url_endpoint: String,
}

impl ImageKitClient {
    pub fn new(private_key: String, url_endpoint: String) -> Self {
        Self {
            client: Client::new(),
            private_key,
            url_endpoint: url_endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Delivery URL for an uploaded file path.
    fn delivery_url(&self, file_path: &str) -> String {
        format!(
            "{}/{}?tr={}",
            self.url_endpoint,
            file_path.trim_start_matches('/'),
            DELIVERY_TRANSFORMATION
        )
    }
}

#[async_trait]
impl ImageHost for ImageKitClient {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::EmptyFile);
        }

        let form = Form::new()
            .text("file", STANDARD.encode(&bytes))
            .text("fileName", file_name.to_string())
            .text("folder", UPLOAD_FOLDER);

        let response = self
            .client
            .post(UPLOAD_URL)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(MediaError::Upload(format!("ImageKit error: {} - {}", status, text)));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        Ok(self.delivery_url(&uploaded.file_path))
    }
}
