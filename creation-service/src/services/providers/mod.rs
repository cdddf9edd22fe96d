//! External provider abstractions and implementations.
//!
//! Each capability drives one of these traits. Production implementations
//! talk to Groq (chat completion), ClipDrop (text-to-image), Cloudinary
//! (asset hosting and transformations) and `pdf-extract`; the mocks are
//! used by tests.

pub mod clipdrop;
pub mod cloudinary;
pub mod groq;
pub mod mock;
pub mod pdf;

use async_trait::async_trait;
use reqwest::Response;
use service_core::retry::Retryable;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The caller's input was rejected (bad document, bad object description).
    #[error("{0}")]
    InvalidInput(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api",
            ProviderError::Upstream(_) => "upstream",
            ProviderError::InvalidResponse(_) => "invalid_response",
            ProviderError::InvalidInput(_) => "invalid_input",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::Timeout => "timeout",
            ProviderError::NetworkError(_) => "network",
        }
    }
}

impl Retryable for ProviderError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Upstream(_)
                | ProviderError::RateLimited
                | ProviderError::Timeout
                | ProviderError::NetworkError(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::NetworkError(err.to_string())
        }
    }
}

/// Map a non-success HTTP status to a [`ProviderError`].
pub(crate) async fn check_status(
    response: Response,
    provider: &str,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 {
        return Err(ProviderError::RateLimited);
    }

    let message = format!("{} returned {}: {}", provider, status, body);
    if status.is_server_error() {
        Err(ProviderError::Upstream(message))
    } else {
        Err(ProviderError::ApiError(message))
    }
}

/// Raw image returned by a text-to-image provider.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    /// Encode as a `data:` URL suitable for the asset host.
    pub fn to_data_url(&self) -> String {
        to_data_url(&self.mime_type, &self.bytes)
    }
}

/// Encode bytes as a base64 `data:` URL.
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    use base64::Engine;
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Asset stored on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub public_id: String,
    pub secure_url: String,
}

/// Longest object description accepted for generative removal.
pub const MAX_OBJECT_DESCRIPTION_LEN: usize = 64;

/// A validated description of the object to remove from an image.
///
/// The value ends up inside a transformation directive, so only letters,
/// digits, spaces, `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescription(String);

impl ObjectDescription {
    pub fn parse(raw: &str) -> Result<Self, ProviderError> {
        let value = raw.trim();

        if value.is_empty() {
            return Err(ProviderError::InvalidInput(
                "Object description is required".to_string(),
            ));
        }

        if value.chars().count() > MAX_OBJECT_DESCRIPTION_LEN {
            return Err(ProviderError::InvalidInput(format!(
                "Object description must be at most {} characters",
                MAX_OBJECT_DESCRIPTION_LEN
            )));
        }

        let allowed = |c: char| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '_';
        if !value.chars().all(allowed) {
            return Err(ProviderError::InvalidInput(
                "Object description may only contain letters, digits, spaces, '-' and '_'"
                    .to_string(),
            ));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Server-side transformation applied by the asset host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformation {
    BackgroundRemoval,
    GenerativeRemove(ObjectDescription),
}

/// Chat-style text completion.
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError>;
}

/// Text-to-image synthesis.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ProviderError>;
}

/// Image hosting with server-side transformations.
#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Upload a `data:` URL, optionally applying a transformation eagerly.
    async fn upload(
        &self,
        data_url: &str,
        transformation: Option<&Transformation>,
    ) -> Result<UploadedAsset, ProviderError>;

    /// Delivery URL that applies `transformation` lazily when fetched.
    fn transformed_url(&self, public_id: &str, transformation: &Transformation) -> String;

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Plain-text extraction from uploaded documents.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Corrupt or unsupported documents fail with [`ProviderError::InvalidInput`].
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, ProviderError>;
}
