use crate::capability::EntitlementGate;
use crate::config::CreationConfig;
use crate::handlers;
use crate::pipeline::CreationPipeline;
use crate::services::ledger::CreationLedger;
use crate::services::providers::AssetHost;
use crate::services::providers::clipdrop::ClipdropImageProvider;
use crate::services::providers::cloudinary::CloudinaryAssetHost;
use crate::services::providers::groq::GroqTextProvider;
use crate::services::providers::pdf::PdfTextExtractor;
use crate::services::{ClerkIdentityStore, CreationDb, IdentityStore};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method, Request},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, REQUEST_ID_HEADER};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CreationPipeline>,
    pub ledger: Arc<dyn CreationLedger>,
    pub identity: Arc<dyn IdentityStore>,
    pub assets: Arc<dyn AssetHost>,
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let ai = Router::new()
        .route("/generate-article", post(handlers::generate_article))
        .route("/generate-blog-title", post(handlers::generate_blog_title))
        .route("/generate-image", post(handlers::generate_image))
        .route(
            "/remove-image-background",
            post(handlers::remove_image_background),
        )
        .route("/remove-image-object", post(handlers::remove_image_object))
        .route("/resume-review", post(handlers::resume_review));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest("/api/ai", ai)
        .route("/api/user/creations", get(handlers::list_user_creations))
        .route(
            "/api/creations/published",
            get(handlers::list_published_creations),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static("x-user-id"),
                    HeaderName::from_static(REQUEST_ID_HEADER),
                ]),
        )
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: CreationConfig) -> Result<Self, AppError> {
        let db = CreationDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let text = GroqTextProvider::new(config.groq.clone()).map_err(provider_init_error)?;
        let images =
            ClipdropImageProvider::new(config.clipdrop.clone()).map_err(provider_init_error)?;
        let assets =
            CloudinaryAssetHost::new(config.cloudinary.clone()).map_err(provider_init_error)?;
        let identity = ClerkIdentityStore::new(config.clerk.clone())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let ledger: Arc<dyn CreationLedger> = Arc::new(db);
        let identity: Arc<dyn IdentityStore> = Arc::new(identity);
        let assets: Arc<dyn AssetHost> = Arc::new(assets);

        let pipeline = CreationPipeline::new(
            EntitlementGate::new(config.limits.free_usage_limit),
            Arc::new(text),
            Arc::new(images),
            assets.clone(),
            Arc::new(PdfTextExtractor::new(config.limits.provider_timeout)),
            ledger.clone(),
            identity.clone(),
            config.limits.retry(),
        );

        let state = AppState {
            pipeline: Arc::new(pipeline),
            ledger,
            identity,
            assets,
        };

        let app = build_router(state, config.limits.max_upload_bytes);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

fn provider_init_error(e: crate::services::providers::ProviderError) -> AppError {
    tracing::error!("Failed to initialize provider client: {}", e);
    AppError::ConfigError(anyhow::anyhow!(e))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
