//! Cloudinary asset host.
//!
//! Uploads go through the signed upload API. Signatures are SHA-256 over the
//! alphabetically sorted parameters followed by the API secret.

use super::{check_status, AssetHost, ProviderError, Transformation, UploadedAsset};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

pub const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";
pub const CLOUDINARY_DELIVERY_BASE: &str = "https://res.cloudinary.com";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: Secret<String>,
    pub api_base_url: String,
    pub delivery_base_url: String,
    pub timeout: Duration,
}

pub struct CloudinaryAssetHost {
    config: CloudinaryConfig,
    client: Client,
}

impl CloudinaryAssetHost {
    pub fn new(config: CloudinaryConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }
}

/// Transformation directive in Cloudinary URL syntax.
pub fn directive(transformation: &Transformation) -> String {
    match transformation {
        Transformation::BackgroundRemoval => "e_background_removal".to_string(),
        Transformation::GenerativeRemove(object) => {
            format!("e_gen_remove:{}", urlencoding::encode(object.as_str()))
        }
    }
}

/// Sign upload parameters: `sha256("k1=v1&k2=v2" + secret)`, keys sorted.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl AssetHost for CloudinaryAssetHost {
    async fn upload(
        &self,
        data_url: &str,
        transformation: Option<&Transformation>,
    ) -> Result<UploadedAsset, ProviderError> {
        let mut signed: Vec<(&str, String)> =
            vec![("timestamp", chrono::Utc::now().timestamp().to_string())];
        if let Some(t) = transformation {
            signed.push(("transformation", directive(t)));
        }

        let signature = sign(&signed, self.config.api_secret.expose_secret());

        let mut form: Vec<(&str, String)> = signed;
        form.push(("file", data_url.to_string()));
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));
        form.push(("signature_algorithm", "sha256".to_string()));

        tracing::debug!(
            cloud = %self.config.cloud_name,
            transformation = ?transformation,
            "Uploading asset to Cloudinary"
        );

        let response = self
            .client
            .post(self.upload_url())
            .form(&form)
            .send()
            .await?;

        let response = check_status(response, "Cloudinary").await?;

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Cloudinary response: {}", e)))?;

        Ok(UploadedAsset {
            public_id: uploaded.public_id,
            secure_url: uploaded.secure_url,
        })
    }

    fn transformed_url(&self, public_id: &str, transformation: &Transformation) -> String {
        format!(
            "{}/{}/image/upload/{}/{}",
            self.config.delivery_base_url.trim_end_matches('/'),
            self.config.cloud_name,
            directive(transformation),
            public_id
        )
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.cloud_name.is_empty() || self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Cloudinary credentials not configured".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::ObjectDescription;

    fn host() -> CloudinaryAssetHost {
        CloudinaryAssetHost::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: Secret::new("secret".to_string()),
            api_base_url: CLOUDINARY_API_BASE.to_string(),
            delivery_base_url: CLOUDINARY_DELIVERY_BASE.to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn signature_sorts_parameters() {
        let a = sign(
            &[
                ("timestamp", "1700000000".to_string()),
                ("transformation", "e_background_removal".to_string()),
            ],
            "secret",
        );
        let b = sign(
            &[
                ("transformation", "e_background_removal".to_string()),
                ("timestamp", "1700000000".to_string()),
            ],
            "secret",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let expected = hex::encode(Sha256::digest(
            b"timestamp=1700000000&transformation=e_background_removalsecret",
        ));
        assert_eq!(a, expected);
    }

    #[test]
    fn removal_url_embeds_encoded_object() {
        let object = ObjectDescription::parse("red car").unwrap();
        let url = host().transformed_url("folder/abc", &Transformation::GenerativeRemove(object));
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_gen_remove:red%20car/folder/abc"
        );
    }

    #[tokio::test]
    async fn health_check_requires_credentials() {
        assert!(host().health_check().await.is_ok());

        let unconfigured = CloudinaryAssetHost::new(CloudinaryConfig {
            cloud_name: String::new(),
            ..host().config
        })
        .unwrap();
        let err = unconfigured.health_check().await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn background_removal_directive() {
        assert_eq!(
            directive(&Transformation::BackgroundRemoval),
            "e_background_removal"
        );
    }
}
