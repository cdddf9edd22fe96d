//! Mock provider implementations for testing.
//!
//! Each mock counts its calls so tests can assert that rejected requests
//! never reach a provider.

use super::cloudinary::directive;
use super::{
    AssetHost, DocumentParser, GeneratedImage, ImageProvider, ProviderError, TextProvider,
    Transformation, UploadedAsset,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock text provider.
#[derive(Default)]
pub struct MockTextProvider {
    fail: bool,
    calls: AtomicUsize,
    last_request: Mutex<Option<(String, u32)>>,
}

impl MockTextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every call fails with an API error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt and token budget of the most recent call.
    pub fn last_request(&self) -> Option<(String, u32)> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some((prompt.to_string(), max_tokens));
        }

        if self.fail {
            return Err(ProviderError::ApiError(
                "Mock text provider failure".to_string(),
            ));
        }

        Ok(format!("Mock response for: {}", prompt))
    }
}

/// Mock text-to-image provider returning a tiny fake PNG.
#[derive(Default)]
pub struct MockImageProvider {
    fail: bool,
    calls: AtomicUsize,
}

impl MockImageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(ProviderError::Upstream(
                "Mock image provider failure".to_string(),
            ));
        }

        Ok(GeneratedImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            mime_type: "image/png".to_string(),
        })
    }
}

/// Mock asset host. Uploaded assets get sequential public ids.
#[derive(Default)]
pub struct MockAssetHost {
    uploads: Mutex<Vec<(String, Option<Transformation>)>>,
    unconfigured: AtomicBool,
}

impl MockAssetHost {
    pub const BASE_URL: &'static str = "https://assets.test/demo/image/upload";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().map(|u| u.len()).unwrap_or(0)
    }

    /// Make `health_check` report missing credentials.
    pub fn set_unconfigured(&self, unconfigured: bool) {
        self.unconfigured.store(unconfigured, Ordering::SeqCst);
    }

    /// Data URLs and transformations passed to `upload`, in call order.
    pub fn uploads(&self) -> Vec<(String, Option<Transformation>)> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AssetHost for MockAssetHost {
    async fn upload(
        &self,
        data_url: &str,
        transformation: Option<&Transformation>,
    ) -> Result<UploadedAsset, ProviderError> {
        let mut uploads = self
            .uploads
            .lock()
            .map_err(|_| ProviderError::ApiError("Mock asset host poisoned".to_string()))?;
        uploads.push((data_url.to_string(), transformation.cloned()));

        let public_id = format!("asset-{}", uploads.len());
        let secure_url = match transformation {
            Some(t) => format!("{}/{}/{}", Self::BASE_URL, directive(t), public_id),
            None => format!("{}/{}", Self::BASE_URL, public_id),
        };

        Ok(UploadedAsset {
            public_id,
            secure_url,
        })
    }

    fn transformed_url(&self, public_id: &str, transformation: &Transformation) -> String {
        format!(
            "{}/{}/{}",
            Self::BASE_URL,
            directive(transformation),
            public_id
        )
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.unconfigured.load(Ordering::SeqCst) {
            return Err(ProviderError::NotConfigured(
                "Mock asset host not configured".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mock document parser that returns fixed text for any non-empty input.
#[derive(Default)]
pub struct MockDocumentParser {
    calls: AtomicUsize,
}

impl MockDocumentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentParser for MockDocumentParser {
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if bytes.is_empty() {
            return Err(ProviderError::InvalidInput("Empty document".to_string()));
        }
        Ok("Jane Doe - Senior Rust Engineer".to_string())
    }
}
