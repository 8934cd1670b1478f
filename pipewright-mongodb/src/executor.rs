//! The seam between encoded pipelines and a server.

use async_trait::async_trait;
use bson::Document;

use crate::aggregation::AggregateOptions;
use crate::error::MongoResult;

/// Runs encoded aggregation pipelines.
///
/// [`MongoClient`](crate::MongoClient) implements this against a live
/// deployment; tests can substitute an in-memory implementation.
#[async_trait]
pub trait PipelineExecutor: Send + Sync {
    /// Run `pipeline` against `collection` and collect every result document.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        options: &AggregateOptions,
    ) -> MongoResult<Vec<Document>>;
}

#[async_trait]
impl<E: PipelineExecutor + ?Sized> PipelineExecutor for &E {
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        options: &AggregateOptions,
    ) -> MongoResult<Vec<Document>> {
        (**self).aggregate(collection, pipeline, options).await
    }
}

#[async_trait]
impl<E: PipelineExecutor + ?Sized> PipelineExecutor for std::sync::Arc<E> {
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        options: &AggregateOptions,
    ) -> MongoResult<Vec<Document>> {
        (**self).aggregate(collection, pipeline, options).await
    }
}
