//! MongoDB-backed creation ledger.

use crate::models::Creation;
use crate::services::ledger::CreationLedger;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct CreationDb {
    client: MongoClient,
    db: Database,
}

impl CreationDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for creation-service");

        let indexes = [
            ("id_idx", doc! { "id": 1 }, true),
            ("user_created_idx", doc! { "user_id": 1, "created_at": -1 }, false),
            ("publish_created_idx", doc! { "publish": 1, "created_at": -1 }, false),
        ];

        for (name, keys, unique) in indexes {
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(name.to_string())
                        .unique(unique)
                        .build(),
                )
                .build();

            self.creations()
                .create_index(index, None)
                .await
                .map_err(|e| {
                    tracing::error!(index = name, "Failed to create index: {}", e);
                    AppError::from(e)
                })?;
        }

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub fn creations(&self) -> Collection<Creation> {
        self.db.collection("creations")
    }

    async fn find_newest_first(
        &self,
        filter: Document,
        limit: Option<i64>,
    ) -> Result<Vec<Creation>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .build();

        let cursor = self
            .creations()
            .find(filter, options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to query creations: {}", e);
                AppError::from(e)
            })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect creations: {}", e);
            AppError::from(e)
        })
    }
}

#[async_trait]
impl CreationLedger for CreationDb {
    async fn append(&self, creation: &Creation) -> Result<(), AppError> {
        self.creations()
            .insert_one(creation, None)
            .await
            .map_err(|e| {
                tracing::error!(creation_id = %creation.id, "Failed to insert creation: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Creation>, AppError> {
        self.find_newest_first(doc! { "user_id": user_id }, None)
            .await
    }

    async fn list_published(&self, limit: i64) -> Result<Vec<Creation>, AppError> {
        self.find_newest_first(doc! { "publish": true }, Some(limit))
            .await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}
