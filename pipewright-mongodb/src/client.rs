//! MongoDB client wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::{Client, Collection, Database};
use pipewright_query::{Entity, EntitySchema, SchemaRegistry};
use tracing::{debug, info};

use crate::aggregation::{AggregateOptions, Aggregation};
use crate::config::MongoConfig;
use crate::error::{MongoError, MongoResult};
use crate::executor::PipelineExecutor;

/// A MongoDB client that runs typed pipelines.
///
/// The driver pools connections internally; cloning is cheap and clones
/// share the pool and the schema registry.
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    database: Database,
    config: Arc<MongoConfig>,
    schemas: Arc<SchemaRegistry>,
}

impl MongoClient {
    /// Create a client from configuration.
    pub async fn new(config: MongoConfig) -> MongoResult<Self> {
        let options = config.to_client_options().await?;

        let client = Client::with_options(options)
            .map_err(|e| MongoError::connection(format!("failed to create client: {}", e)))?;

        let database = client.database(&config.database);

        info!(
            uri = %config.uri,
            database = %config.database,
            "MongoDB client created"
        );

        Ok(Self {
            client,
            database,
            config: Arc::new(config),
            schemas: Arc::new(SchemaRegistry::new()),
        })
    }

    /// Create a client from `PIPEWRIGHT_MONGODB_URI` and
    /// `PIPEWRIGHT_MONGODB_DATABASE`.
    pub async fn from_env() -> MongoResult<Self> {
        Self::new(MongoConfig::from_env()?).await
    }

    /// Create a builder for the client.
    pub fn builder() -> MongoClientBuilder {
        MongoClientBuilder::new()
    }

    /// Get a collection with BSON documents.
    pub fn collection_doc(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Get the underlying driver client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &MongoConfig {
        &self.config
    }

    /// The schema registry shared by every clone of this client.
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Describe and cache `T`'s schema ahead of its first aggregation.
    pub fn register<T: Entity>(&self) -> Arc<EntitySchema> {
        self.schemas.register::<T>()
    }

    /// Check if the server answers a ping.
    pub async fn is_healthy(&self) -> bool {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .is_ok()
    }

    /// Run a database command.
    pub async fn run_command(&self, command: Document) -> MongoResult<Document> {
        debug!(command = ?command.keys().next(), "Running command");
        Ok(self.database.run_command(command, None).await?)
    }

    /// Start an aggregation over a collection, without field mapping.
    pub fn aggregate(&self, collection: impl Into<String>) -> Aggregation<'_, Self> {
        Aggregation::new(self, collection)
    }

    /// Start an aggregation over `T`'s collection, mapping field names
    /// through its schema.
    pub fn aggregate_entity<T: Entity>(&self) -> Aggregation<'_, Self> {
        Aggregation::new(self, T::COLLECTION).with_context(self.schemas.context_for::<T>())
    }
}

#[async_trait]
impl PipelineExecutor for MongoClient {
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        options: &AggregateOptions,
    ) -> MongoResult<Vec<Document>> {
        let cursor = self
            .collection_doc(collection)
            .aggregate(pipeline, options.to_driver())
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

/// Builder for [`MongoClient`].
#[derive(Debug, Default)]
pub struct MongoClientBuilder {
    config: crate::config::MongoConfigBuilder,
}

impl MongoClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the MongoDB URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.config = self.config.uri(uri);
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config = self.config.database(database);
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.app_name(name);
        self
    }

    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.config = self.config.max_pool_size(size);
        self
    }

    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.config = self.config.min_pool_size(size);
        self
    }

    pub fn connect_timeout(mut self, duration: std::time::Duration) -> Self {
        self.config = self.config.connect_timeout(duration);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.config = self.config.direct_connection(enabled);
        self
    }

    /// Build the client.
    pub async fn build(self) -> MongoResult<MongoClient> {
        MongoClient::new(self.config.build()?).await
    }
}

#[cfg(test)]
mod tests {
    use pipewright_query::FieldSchema;

    use super::*;

    struct Sale;

    impl Entity for Sale {
        const COLLECTION: &'static str = "sales";

        fn describe() -> Vec<FieldSchema> {
            vec![FieldSchema::new("orderDate").stored_as("order_date")]
        }
    }

    async fn lazy_client() -> MongoClient {
        // The driver connects lazily, so no server is needed to build one.
        MongoClient::builder()
            .uri("mongodb://localhost:27017")
            .database("test")
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_builder_requires_database() {
        let err = MongoClient::builder()
            .uri("mongodb://localhost:27017")
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, MongoError::Config(_)));
    }

    #[tokio::test]
    async fn test_aggregate_entity_maps_fields() {
        let client = lazy_client().await;
        assert_eq!(client.config().database, "test");

        let aggregation = client
            .aggregate_entity::<Sale>()
            .sort(pipewright_query::Sort::new().ascending("orderDate"));
        assert_eq!(aggregation.collection(), "sales");
        assert_eq!(
            aggregation.to_documents().unwrap(),
            vec![doc! { "$sort": { "order_date": 1 } }]
        );
        assert_eq!(client.schemas().len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_registry() {
        let client = lazy_client().await;
        let clone = client.clone();
        client.register::<Sale>();
        assert!(clone.schemas().get::<Sale>().is_some());
    }
}
