//! Client for the external media host that stores uploaded product images.
//!
//! The service never persists image bytes itself; it forwards them to the
//! host and keeps only the returned URL.

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::MediaConfig;
use crate::models::ImageUpload;

/// Errors that can occur when interacting with the media host
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Credentials are missing from the configuration.
    #[error("Media host credentials are not configured")]
    NotConfigured,
}

/// Successful upload response; only the hosted URL is retained
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Media host API client
#[derive(Clone)]
pub struct MediaClient {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
}

impl MediaClient {
    /// Create a new media host client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let upload_url = format!(
            "{}/{}/image/upload",
            config.base_url.trim_end_matches('/'),
            config.cloud_name
        );

        Ok(Self {
            client,
            upload_url,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    /// Upload an image and return the hosted URL.
    ///
    /// # Errors
    ///
    /// Returns error if credentials are missing, the request fails, or the
    /// host rejects the upload.
    #[instrument(skip(self, image), fields(file_name = %image.file_name, bytes = image.data.len()))]
    pub async fn upload_image(&self, image: &ImageUpload) -> Result<String, MediaError> {
        if self.api_key.is_empty() {
            return Err(MediaError::NotConfigured);
        }

        info!("Uploading image to media host");

        let part = reqwest::multipart::Part::bytes(image.data.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;

        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Parse(e.to_string()))?;

        info!("Image uploaded successfully");
        Ok(upload.secure_url)
    }
}
