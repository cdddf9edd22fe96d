//! The shared request pipeline behind every capability.
//!
//! gate -> provider -> ledger append -> (metering) -> content
//!
//! Nothing after the gate runs for a rejected request, and the ledger append
//! is the last step that can fail before content is returned, apart from
//! metering of free-tier calls.

use crate::capability::{AdapterKind, Capability, CapabilityDescriptor, EntitlementGate};
use crate::error::CreationError;
use crate::models::{Creation, EntitlementContext};
use crate::services::identity::IdentityStore;
use crate::services::ledger::CreationLedger;
use crate::services::metrics;
use crate::services::providers::{
    to_data_url, AssetHost, DocumentParser, ImageProvider, ObjectDescription, ProviderError,
    TextProvider, Transformation,
};
use service_core::retry::{retry_async, RetryConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Upper bound for a caller-supplied article length.
pub const MAX_ARTICLE_TOKENS: u32 = 4096;

pub const RESUME_REVIEW_PROMPT: &str = "Review this resume and provide detailed feedback:";

/// A file received in a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Request input for one capability.
///
/// Uploads are optional here so that the entitlement decision is made
/// before a missing file is reported.
#[derive(Debug, Clone)]
pub enum CapabilityInput {
    Article {
        prompt: String,
        length: Option<u32>,
    },
    BlogTitle {
        prompt: String,
    },
    Image {
        prompt: String,
        publish: bool,
    },
    BackgroundRemoval {
        image: Option<UploadedFile>,
    },
    ObjectRemoval {
        image: Option<UploadedFile>,
        object: String,
    },
    ResumeReview {
        resume: Option<UploadedFile>,
    },
}

impl CapabilityInput {
    pub fn capability(&self) -> Capability {
        match self {
            CapabilityInput::Article { .. } => Capability::Article,
            CapabilityInput::BlogTitle { .. } => Capability::BlogTitle,
            CapabilityInput::Image { .. } => Capability::ImageSynthesis,
            CapabilityInput::BackgroundRemoval { .. } => Capability::BackgroundRemoval,
            CapabilityInput::ObjectRemoval { .. } => Capability::ObjectRemoval,
            CapabilityInput::ResumeReview { .. } => Capability::ResumeReview,
        }
    }
}

/// What a provider produced, ready to be recorded.
#[derive(Debug)]
struct Generated {
    prompt: String,
    content: String,
    publish: bool,
}

pub struct CreationPipeline {
    gate: EntitlementGate,
    text: Arc<dyn TextProvider>,
    images: Arc<dyn ImageProvider>,
    assets: Arc<dyn AssetHost>,
    documents: Arc<dyn DocumentParser>,
    ledger: Arc<dyn CreationLedger>,
    identity: Arc<dyn IdentityStore>,
    retry: RetryConfig,
}

impl CreationPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gate: EntitlementGate,
        text: Arc<dyn TextProvider>,
        images: Arc<dyn ImageProvider>,
        assets: Arc<dyn AssetHost>,
        documents: Arc<dyn DocumentParser>,
        ledger: Arc<dyn CreationLedger>,
        identity: Arc<dyn IdentityStore>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            gate,
            text,
            images,
            assets,
            documents,
            ledger,
            identity,
            retry,
        }
    }

    pub fn gate(&self) -> &EntitlementGate {
        &self.gate
    }

    /// Run one capability request to completion.
    #[tracing::instrument(
        skip(self, ctx, input),
        fields(user_id = %ctx.user_id, capability = %input.capability())
    )]
    pub async fn run(
        &self,
        ctx: &EntitlementContext,
        input: CapabilityInput,
    ) -> Result<String, CreationError> {
        let capability = input.capability();
        let descriptor = capability.descriptor();

        let result = self.execute(ctx, descriptor, input).await;

        match &result {
            Ok(_) => {
                metrics::record_request(descriptor.name, "success");
                tracing::info!(plan = ?ctx.plan, "Creation completed");
            }
            Err(e) if e.is_expected() => {
                metrics::record_request(descriptor.name, e.kind());
                tracing::info!(reason = %e, "Creation rejected");
            }
            Err(e) => {
                metrics::record_request(descriptor.name, e.kind());
                tracing::error!(error = %e, kind = e.kind(), "Creation failed");
            }
        }

        result
    }

    async fn execute(
        &self,
        ctx: &EntitlementContext,
        descriptor: &'static CapabilityDescriptor,
        input: CapabilityInput,
    ) -> Result<String, CreationError> {
        let capability = input.capability();
        self.gate.check(ctx, capability)?;

        let generated = self.invoke(descriptor, input).await?;

        let creation = Creation::new(
            ctx.user_id.clone(),
            generated.prompt,
            generated.content,
            descriptor.creation_type,
            generated.publish,
        );

        self.ledger
            .append(&creation)
            .await
            .map_err(|e| CreationError::Persistence(e.to_string()))?;

        if descriptor.metered && !ctx.plan.is_premium() {
            let free_usage = self.identity.record_usage(ctx).await?;
            tracing::debug!(free_usage, "Free-tier usage incremented");
        }

        Ok(creation.content)
    }

    /// Dispatch to the provider adapter named by the descriptor.
    async fn invoke(
        &self,
        descriptor: &'static CapabilityDescriptor,
        input: CapabilityInput,
    ) -> Result<Generated, CreationError> {
        match (descriptor.adapter, input) {
            (AdapterKind::TextCompletion, CapabilityInput::Article { prompt, length }) => {
                let prompt = require_prompt(prompt)?;
                let budget = length
                    .or(descriptor.default_token_budget)
                    .unwrap_or(MAX_ARTICLE_TOKENS)
                    .clamp(1, MAX_ARTICLE_TOKENS);
                let content = self.complete(descriptor, &prompt, budget).await?;
                Ok(Generated {
                    prompt,
                    content,
                    publish: false,
                })
            }
            (AdapterKind::TextCompletion, CapabilityInput::BlogTitle { prompt }) => {
                let prompt = require_prompt(prompt)?;
                let budget = descriptor.default_token_budget.unwrap_or(100);
                let content = self.complete(descriptor, &prompt, budget).await?;
                Ok(Generated {
                    prompt,
                    content,
                    publish: false,
                })
            }
            (AdapterKind::ImageSynthesis, CapabilityInput::Image { prompt, publish }) => {
                let prompt = require_prompt(prompt)?;
                let content = self
                    .timed(descriptor, async {
                        let image = retry_async(&self.retry, "text_to_image", || {
                            self.images.generate(&prompt)
                        })
                        .await?;
                        let uploaded = self.assets.upload(&image.to_data_url(), None).await?;
                        Ok::<_, ProviderError>(uploaded.secure_url)
                    })
                    .await?;
                Ok(Generated {
                    prompt,
                    content,
                    publish,
                })
            }
            (AdapterKind::BackgroundRemoval, CapabilityInput::BackgroundRemoval { image }) => {
                let image = require_image(image)?;
                let data_url = to_data_url(&image.content_type, &image.bytes);
                let content = self
                    .timed(descriptor, async {
                        let uploaded = self
                            .assets
                            .upload(&data_url, Some(&Transformation::BackgroundRemoval))
                            .await?;
                        Ok::<_, ProviderError>(uploaded.secure_url)
                    })
                    .await?;
                Ok(Generated {
                    prompt: "Remove background".to_string(),
                    content,
                    publish: false,
                })
            }
            (AdapterKind::ObjectRemoval, CapabilityInput::ObjectRemoval { image, object }) => {
                let image = require_image(image)?;
                let object = ObjectDescription::parse(&object)?;
                let data_url = to_data_url(&image.content_type, &image.bytes);
                let transformation = Transformation::GenerativeRemove(object.clone());
                let content = self
                    .timed(descriptor, async {
                        let uploaded = self.assets.upload(&data_url, None).await?;
                        Ok::<_, ProviderError>(
                            self.assets
                                .transformed_url(&uploaded.public_id, &transformation),
                        )
                    })
                    .await?;
                Ok(Generated {
                    prompt: format!("Removed {}", object.as_str()),
                    content,
                    publish: false,
                })
            }
            (AdapterKind::DocumentReview, CapabilityInput::ResumeReview { resume }) => {
                let resume =
                    resume.ok_or_else(|| CreationError::Input("No file uploaded".to_string()))?;
                tracing::debug!(
                    file_name = %resume.file_name,
                    size = resume.bytes.len(),
                    "Received resume upload"
                );
                let text = self.documents.extract_text(resume.bytes).await?;
                let prompt = format!("{}\n\n{}", RESUME_REVIEW_PROMPT, text);
                let budget = descriptor.default_token_budget.unwrap_or(1000);
                let content = self.complete(descriptor, &prompt, budget).await?;
                Ok(Generated {
                    prompt: "Resume review".to_string(),
                    content,
                    publish: false,
                })
            }
            (adapter, input) => Err(CreationError::Input(format!(
                "Input for {} cannot drive the {:?} adapter",
                input.capability(),
                adapter
            ))),
        }
    }

    async fn complete(
        &self,
        descriptor: &'static CapabilityDescriptor,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, CreationError> {
        self.timed(descriptor, async {
            retry_async(&self.retry, "chat_completion", || {
                self.text.complete(prompt, max_tokens)
            })
            .await
        })
        .await
    }

    /// Await a provider call, recording latency and error metrics.
    async fn timed<T, F>(
        &self,
        descriptor: &'static CapabilityDescriptor,
        call: F,
    ) -> Result<T, CreationError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        let started = Instant::now();
        let result = call.await;
        metrics::observe_provider_latency(descriptor.name, started.elapsed().as_secs_f64());

        result.map_err(|e| {
            metrics::record_provider_error(descriptor.name, e.kind());
            CreationError::from(e)
        })
    }
}

fn require_prompt(prompt: String) -> Result<String, CreationError> {
    if prompt.trim().is_empty() {
        return Err(CreationError::Input("Prompt is required".to_string()));
    }
    Ok(prompt)
}

fn require_image(image: Option<UploadedFile>) -> Result<UploadedFile, CreationError> {
    let image = image.ok_or_else(|| CreationError::Input("No image uploaded".to_string()))?;
    if image.bytes.is_empty() {
        return Err(CreationError::Input("Uploaded image is empty".to_string()));
    }
    if !image.content_type.starts_with("image/") {
        return Err(CreationError::Input(format!(
            "Unsupported image type: {}",
            image.content_type
        )));
    }
    tracing::debug!(
        file_name = %image.file_name,
        size = image.bytes.len(),
        content_type = %image.content_type,
        "Received image upload"
    );
    Ok(image)
}
