//! Views defined by typed pipelines.
//!
//! A view is a read-only collection computed from a source collection by an
//! aggregation pipeline. A materialized view stores the results instead: its
//! pipeline ends in `$out` or `$merge` and is re-run to refresh it.
//!
//! ```rust
//! use pipewright_mongodb::view::AggregationView;
//! use pipewright_query::stage::Projection;
//! use pipewright_query::Filter;
//!
//! let view = AggregationView::builder("active_users")
//!     .source_collection("users")
//!     .stage(Filter::new().eq("status", "active"))
//!     .stage(Projection::new().include("name").include("email"))
//!     .build()
//!     .unwrap();
//!
//! let cmd = view.to_create_command().unwrap();
//! assert_eq!(cmd.get_str("viewOn").unwrap(), "users");
//! ```

use std::time::Duration;

use bson::{Bson, Document, doc};
use pipewright_query::stage::{Merge, Out, Stage};
use pipewright_query::{EncodeContext, Pipeline};
use tracing::info;

use crate::aggregation::AggregateOptions;
use crate::client::MongoClient;
use crate::error::{MongoError, MongoResult};
use crate::executor::PipelineExecutor;

fn encode_pipeline(pipeline: &Pipeline, ctx: &EncodeContext) -> MongoResult<Vec<Bson>> {
    Ok(pipeline
        .encode(ctx)?
        .into_iter()
        .map(Bson::Document)
        .collect())
}

/// A view over another collection.
#[derive(Debug, Clone)]
pub struct AggregationView {
    /// The name of the view.
    pub name: String,
    /// The collection the pipeline reads.
    pub source_collection: String,
    pub pipeline: Pipeline,
    /// Optional collation for string comparisons.
    pub collation: Option<Document>,
    /// Context the pipeline is encoded with.
    pub context: EncodeContext,
}

impl AggregationView {
    pub fn new(
        name: impl Into<String>,
        source_collection: impl Into<String>,
        pipeline: Pipeline,
    ) -> Self {
        Self {
            name: name.into(),
            source_collection: source_collection.into(),
            pipeline,
            collation: None,
            context: EncodeContext::new(),
        }
    }

    pub fn builder(name: impl Into<String>) -> AggregationViewBuilder {
        AggregationViewBuilder::new(name)
    }

    pub fn with_collation(mut self, collation: Document) -> Self {
        self.collation = Some(collation);
        self
    }

    /// Encode the `create` command for this view.
    pub fn to_create_command(&self) -> MongoResult<Document> {
        let mut cmd = doc! {
            "create": self.name.as_str(),
            "viewOn": self.source_collection.as_str(),
            "pipeline": encode_pipeline(&self.pipeline, &self.context)?,
        };
        if let Some(ref collation) = self.collation {
            cmd.insert("collation", collation.clone());
        }
        Ok(cmd)
    }
}

/// Builder for [`AggregationView`].
#[derive(Debug, Default)]
pub struct AggregationViewBuilder {
    name: String,
    source_collection: Option<String>,
    pipeline: Pipeline,
    collation: Option<Document>,
    context: EncodeContext,
}

impl AggregationViewBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn source_collection(mut self, collection: impl Into<String>) -> Self {
        self.source_collection = Some(collection.into());
        self
    }

    /// Replace the pipeline.
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Append a stage.
    pub fn stage(mut self, stage: impl Into<Stage>) -> Self {
        self.pipeline.push(stage);
        self
    }

    pub fn collation(mut self, collation: Document) -> Self {
        self.collation = Some(collation);
        self
    }

    /// Encode with `ctx`, typically the source entity's context.
    pub fn context(mut self, ctx: EncodeContext) -> Self {
        self.context = ctx;
        self
    }

    /// Build the view; the name and source collection are required.
    pub fn build(self) -> MongoResult<AggregationView> {
        if self.name.is_empty() {
            return Err(MongoError::config("view name is required"));
        }
        let source_collection = self
            .source_collection
            .filter(|s| !s.is_empty())
            .ok_or_else(|| MongoError::config("view source collection is required"))?;
        Ok(AggregationView {
            name: self.name,
            source_collection,
            pipeline: self.pipeline,
            collation: self.collation,
            context: self.context,
        })
    }
}

/// Where a materialized view writes its results.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterializeTarget {
    /// Replace the target collection.
    Out(Out),
    /// Merge into the target collection.
    Merge(Merge),
}

/// A view whose results are persisted and refreshed on demand.
#[derive(Debug, Clone)]
pub struct MaterializedView {
    pub source_collection: String,
    pub pipeline: Pipeline,
    pub target: MaterializeTarget,
    /// Refresh interval for application-level scheduling.
    pub refresh_interval: Option<Duration>,
    pub context: EncodeContext,
}

impl MaterializedView {
    /// Replace `target` with the results on every refresh.
    pub fn with_out(
        source_collection: impl Into<String>,
        pipeline: Pipeline,
        target: impl Into<Out>,
    ) -> Self {
        Self::new(source_collection, pipeline, MaterializeTarget::Out(target.into()))
    }

    /// Merge the results into an existing collection on every refresh.
    pub fn with_merge(
        source_collection: impl Into<String>,
        pipeline: Pipeline,
        merge: Merge,
    ) -> Self {
        Self::new(source_collection, pipeline, MaterializeTarget::Merge(merge))
    }

    fn new(
        source_collection: impl Into<String>,
        pipeline: Pipeline,
        target: MaterializeTarget,
    ) -> Self {
        Self {
            source_collection: source_collection.into(),
            pipeline,
            target,
            refresh_interval: None,
            context: EncodeContext::new(),
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    pub fn with_context(mut self, ctx: EncodeContext) -> Self {
        self.context = ctx;
        self
    }

    /// The pipeline followed by its `$out` or `$merge` stage.
    pub fn to_pipeline(&self) -> Pipeline {
        let last = match &self.target {
            MaterializeTarget::Out(out) => Stage::from(out.clone()),
            MaterializeTarget::Merge(merge) => Stage::from(merge.clone()),
        };
        self.pipeline.clone().stage(last)
    }

    /// Encode the full pipeline.
    pub fn to_documents(&self) -> MongoResult<Vec<Document>> {
        Ok(self.to_pipeline().encode(&self.context)?)
    }

    /// Run the pipeline once through `executor`.
    pub async fn refresh<E>(&self, executor: &E) -> MongoResult<()>
    where
        E: PipelineExecutor + ?Sized,
    {
        let stages = self.to_documents()?;
        executor
            .aggregate(&self.source_collection, stages, &AggregateOptions::default())
            .await?;
        info!(source = %self.source_collection, "Materialized view refreshed");
        Ok(())
    }
}

impl MongoClient {
    /// Create a view in the database.
    pub async fn create_view(&self, view: &AggregationView) -> MongoResult<()> {
        self.run_command(view.to_create_command()?).await?;
        info!(view = %view.name, source = %view.source_collection, "View created");
        Ok(())
    }

    /// Drop a view.
    pub async fn drop_view(&self, name: &str) -> MongoResult<()> {
        self.run_command(doc! { "drop": name }).await?;
        Ok(())
    }

    /// List the views in the database.
    pub async fn list_views(&self) -> MongoResult<Vec<String>> {
        Ok(self
            .database()
            .list_collection_names(doc! { "type": "view" })
            .await?)
    }

    /// Re-run a materialized view's pipeline.
    pub async fn refresh_materialized_view(&self, view: &MaterializedView) -> MongoResult<()> {
        view.refresh(self).await
    }
}
