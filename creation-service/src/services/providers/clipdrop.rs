//! ClipDrop text-to-image provider.

use super::{check_status, GeneratedImage, ImageProvider, ProviderError};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, multipart::Form, Client};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

pub const CLIPDROP_API_BASE: &str = "https://clipdrop-api.co";

#[derive(Debug, Clone)]
pub struct ClipdropConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

pub struct ClipdropImageProvider {
    config: ClipdropConfig,
    client: Client,
}

impl ClipdropImageProvider {
    pub fn new(config: ClipdropConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl ImageProvider for ClipdropImageProvider {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ProviderError> {
        let url = format!(
            "{}/text-to-image/v1",
            self.config.base_url.trim_end_matches('/')
        );
        let form = Form::new().text("prompt", prompt.to_string());

        tracing::debug!(prompt_len = prompt.len(), "Sending request to ClipDrop API");

        let response = self
            .client
            .post(url)
            .header("x-api-key", self.config.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        let response = check_status(response, "ClipDrop").await?;

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or("image/png")
            .to_string();

        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "ClipDrop returned an empty image".to_string(),
            ));
        }

        Ok(GeneratedImage { bytes, mime_type })
    }
}
