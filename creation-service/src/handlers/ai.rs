//! Capability endpoints. Every handler answers with an [`ApiResponse`].

use crate::capability::Capability;
use crate::dtos::{ApiResponse, ArticleRequest, BlogTitleRequest, ImageRequest};
use crate::error::CreationError;
use crate::models::EntitlementContext;
use crate::pipeline::{CapabilityInput, UploadedFile};
use crate::startup::AppState;
use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
        State,
    },
    Json,
};
use std::collections::HashMap;
use validator::Validate;

pub async fn generate_article(
    State(state): State<AppState>,
    ctx: EntitlementContext,
    body: Result<Json<ArticleRequest>, JsonRejection>,
) -> ApiResponse {
    let req = match parse_json(&state, &ctx, Capability::Article, body) {
        Ok(req) => req,
        Err(e) => return e.into(),
    };

    run(
        &state,
        &ctx,
        CapabilityInput::Article {
            prompt: req.prompt,
            length: req.length,
        },
    )
    .await
}

pub async fn generate_blog_title(
    State(state): State<AppState>,
    ctx: EntitlementContext,
    body: Result<Json<BlogTitleRequest>, JsonRejection>,
) -> ApiResponse {
    let req = match parse_json(&state, &ctx, Capability::BlogTitle, body) {
        Ok(req) => req,
        Err(e) => return e.into(),
    };

    run(&state, &ctx, CapabilityInput::BlogTitle { prompt: req.prompt }).await
}

pub async fn generate_image(
    State(state): State<AppState>,
    ctx: EntitlementContext,
    body: Result<Json<ImageRequest>, JsonRejection>,
) -> ApiResponse {
    let req = match parse_json(&state, &ctx, Capability::ImageSynthesis, body) {
        Ok(req) => req,
        Err(e) => return e.into(),
    };

    run(
        &state,
        &ctx,
        CapabilityInput::Image {
            prompt: req.prompt,
            publish: req.publish,
        },
    )
    .await
}

pub async fn remove_image_background(
    State(state): State<AppState>,
    ctx: EntitlementContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResponse {
    let mut form =
        match parse_multipart(&state, &ctx, Capability::BackgroundRemoval, multipart).await {
            Ok(form) => form,
            Err(e) => return e.into(),
        };

    run(
        &state,
        &ctx,
        CapabilityInput::BackgroundRemoval {
            image: form.files.remove("image"),
        },
    )
    .await
}

pub async fn remove_image_object(
    State(state): State<AppState>,
    ctx: EntitlementContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResponse {
    let mut form = match parse_multipart(&state, &ctx, Capability::ObjectRemoval, multipart).await {
        Ok(form) => form,
        Err(e) => return e.into(),
    };

    run(
        &state,
        &ctx,
        CapabilityInput::ObjectRemoval {
            image: form.files.remove("image"),
            object: form.fields.remove("object").unwrap_or_default(),
        },
    )
    .await
}

pub async fn resume_review(
    State(state): State<AppState>,
    ctx: EntitlementContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResponse {
    let mut form = match parse_multipart(&state, &ctx, Capability::ResumeReview, multipart).await {
        Ok(form) => form,
        Err(e) => return e.into(),
    };

    run(
        &state,
        &ctx,
        CapabilityInput::ResumeReview {
            resume: form.files.remove("resume"),
        },
    )
    .await
}

async fn run(state: &AppState, ctx: &EntitlementContext, input: CapabilityInput) -> ApiResponse {
    state.pipeline.run(ctx, input).await.into()
}

/// Report a request-body problem, unless the caller is not entitled to the
/// capability at all.
fn reject(
    state: &AppState,
    ctx: &EntitlementContext,
    capability: Capability,
    err: CreationError,
) -> CreationError {
    match state.pipeline.gate().check(ctx, capability) {
        Err(denied) => denied,
        Ok(()) => {
            tracing::info!(
                user_id = %ctx.user_id,
                capability = %capability,
                reason = %err,
                "Rejected request body"
            );
            err
        }
    }
}

fn parse_json<T: Validate>(
    state: &AppState,
    ctx: &EntitlementContext,
    capability: Capability,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, CreationError> {
    let Json(req) = body.map_err(|e| {
        reject(
            state,
            ctx,
            capability,
            CreationError::Input(e.body_text()),
        )
    })?;

    req.validate()
        .map_err(|e| reject(state, ctx, capability, e.into()))?;

    Ok(req)
}

/// Multipart body split into file parts and plain text fields.
#[derive(Debug, Default)]
struct MultipartForm {
    files: HashMap<String, UploadedFile>,
    fields: HashMap<String, String>,
}

async fn parse_multipart(
    state: &AppState,
    ctx: &EntitlementContext,
    capability: Capability,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<MultipartForm, CreationError> {
    let result = match multipart {
        Ok(multipart) => read_multipart(multipart).await,
        Err(e) => Err(CreationError::Input(e.body_text())),
    };

    result.map_err(|e| reject(state, ctx, capability, e))
}

async fn read_multipart(mut multipart: Multipart) -> Result<MultipartForm, CreationError> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        CreationError::Input(format!("Failed to read multipart field: {}", e.body_text()))
    })? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    CreationError::Input(format!("Failed to read file bytes: {}", e.body_text()))
                })?;
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    },
                );
            }
            None => {
                let value = field.text().await.map_err(|e| {
                    CreationError::Input(format!(
                        "Failed to read field {}: {}",
                        name,
                        e.body_text()
                    ))
                })?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}
