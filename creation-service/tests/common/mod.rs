#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use creation_service::capability::EntitlementGate;
use creation_service::models::Plan;
use creation_service::pipeline::CreationPipeline;
use creation_service::services::mock::{MemoryIdentityStore, MemoryLedger};
use creation_service::services::providers::mock::{
    MockAssetHost, MockDocumentParser, MockImageProvider, MockTextProvider,
};
use creation_service::startup::{build_router, AppState};
use service_core::retry::RetryConfig;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const FREE_USER: &str = "user_free";
pub const PREMIUM_USER: &str = "user_premium";
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

const BOUNDARY: &str = "creation-test-boundary";

/// Router wired to in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub text: Arc<MockTextProvider>,
    pub images: Arc<MockImageProvider>,
    pub assets: Arc<MockAssetHost>,
    pub documents: Arc<MockDocumentParser>,
    pub ledger: Arc<MemoryLedger>,
    pub identity: Arc<MemoryIdentityStore>,
}

/// One part of a multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

impl TestApp {
    /// Free user with `free_usage` metered calls used, plus a premium user.
    pub fn spawn(free_usage: u32) -> Self {
        Self::with_ledger(free_usage, MemoryLedger::new())
    }

    pub fn with_ledger(free_usage: u32, ledger: MemoryLedger) -> Self {
        let identity = MemoryIdentityStore::new()
            .with_user(FREE_USER, Plan::Free, free_usage)
            .with_user(PREMIUM_USER, Plan::Premium, 0);

        let text = Arc::new(MockTextProvider::new());
        let images = Arc::new(MockImageProvider::new());
        let assets = Arc::new(MockAssetHost::new());
        let documents = Arc::new(MockDocumentParser::new());
        let ledger = Arc::new(ledger);
        let identity = Arc::new(identity);

        let pipeline = CreationPipeline::new(
            EntitlementGate::default(),
            text.clone(),
            images.clone(),
            assets.clone(),
            documents.clone(),
            ledger.clone(),
            identity.clone(),
            RetryConfig::no_retry(),
        );

        let state = AppState {
            pipeline: Arc::new(pipeline),
            ledger: ledger.clone(),
            identity: identity.clone(),
            assets: assets.clone(),
        };

        TestApp {
            router: build_router(state, MAX_UPLOAD_BYTES),
            text,
            images,
            assets,
            documents,
            ledger,
            identity,
        }
    }

    pub async fn post_json(
        &self,
        path: &str,
        user_id: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .header("x-user-id", user_id)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_raw(
        &self,
        path: &str,
        user_id: &str,
        content_type: &str,
        body: impl Into<Body>,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", content_type)
            .header("x-user-id", user_id)
            .body(body.into())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        user_id: &str,
        parts: &[Part<'_>],
    ) -> (StatusCode, serde_json::Value) {
        self.post_raw(
            path,
            user_id,
            &format!("multipart/form-data; boundary={}", BOUNDARY),
            multipart_body(parts),
        )
        .await
    }

    pub async fn get(&self, path: &str, user_id: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(user_id) = user_id {
            builder = builder.header("x-user-id", user_id);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub fn provider_calls(&self) -> usize {
        self.text.calls()
            + self.images.calls()
            + self.assets.upload_count()
            + self.documents.calls()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }
}

pub fn png_part(bytes: &[u8]) -> Part<'_> {
    Part::File {
        name: "image",
        file_name: "photo.png",
        content_type: "image/png",
        bytes,
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
