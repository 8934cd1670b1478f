//! Typed aggregation runner.
//!
//! ```rust,ignore
//! use pipewright_mongodb::MongoClient;
//! use pipewright_query::expr::{accumulator::sum, field};
//! use pipewright_query::stage::Group;
//! use pipewright_query::Filter;
//!
//! let totals: Vec<Total> = client
//!     .aggregate("orders")
//!     .match_(Filter::new().eq("status", "A"))
//!     .group(Group::new(field("customer")).field("total", sum(field("amount"))))
//!     .allow_disk_use(true)
//!     .execute()
//!     .await?;
//! ```

use std::time::Duration;

use bson::Document;
use mongodb::options::{AggregateOptions as DriverAggregateOptions, Hint};
use pipewright_query::stage::{Group, Projection, Stage};
use pipewright_query::{EncodeContext, Filter, Pipeline, Sort};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::codec;
use crate::error::MongoResult;
use crate::executor::PipelineExecutor;

/// Index hint for an aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexHint {
    /// Index by key pattern.
    Keys(Document),
    /// Index by name.
    Name(String),
}

/// Options sent with the `aggregate` command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateOptions {
    pub allow_disk_use: Option<bool>,
    pub batch_size: Option<u32>,
    pub bypass_document_validation: Option<bool>,
    /// Server-side time limit.
    pub max_time: Option<Duration>,
    pub hint: Option<IndexHint>,
    /// Variables visible to every stage as `$$name`.
    pub let_vars: Option<Document>,
}

impl AggregateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_disk_use(mut self, allow: bool) -> Self {
        self.allow_disk_use = Some(allow);
        self
    }

    pub fn batch_size(mut self, size: u32) -> Self {
        self.batch_size = Some(size);
        self
    }

    pub fn bypass_document_validation(mut self, bypass: bool) -> Self {
        self.bypass_document_validation = Some(bypass);
        self
    }

    pub fn max_time(mut self, duration: Duration) -> Self {
        self.max_time = Some(duration);
        self
    }

    pub fn hint(mut self, hint: IndexHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn let_vars(mut self, vars: Document) -> Self {
        self.let_vars = Some(vars);
        self
    }

    /// Convert to driver options.
    pub fn to_driver(&self) -> DriverAggregateOptions {
        let mut options = DriverAggregateOptions::default();
        options.allow_disk_use = self.allow_disk_use;
        options.batch_size = self.batch_size;
        options.bypass_document_validation = self.bypass_document_validation;
        options.max_time = self.max_time;
        options.hint = self.hint.clone().map(|hint| match hint {
            IndexHint::Keys(keys) => Hint::Keys(keys),
            IndexHint::Name(name) => Hint::Name(name),
        });
        options.let_vars = self.let_vars.clone();
        options
    }
}

/// A pipeline bound to a collection and an executor.
///
/// Stages are encoded with the aggregation's context when the pipeline runs;
/// an encoding error is returned before anything is sent.
pub struct Aggregation<'a, E: ?Sized> {
    executor: &'a E,
    collection: String,
    ctx: EncodeContext,
    pipeline: Pipeline,
    options: AggregateOptions,
}

impl<'a, E> Aggregation<'a, E>
where
    E: PipelineExecutor + ?Sized,
{
    /// Start an empty aggregation over `collection`.
    pub fn new(executor: &'a E, collection: impl Into<String>) -> Self {
        Self {
            executor,
            collection: collection.into(),
            ctx: EncodeContext::new(),
            pipeline: Pipeline::new(),
            options: AggregateOptions::default(),
        }
    }

    /// Encode with `ctx`, typically one carrying an entity schema.
    pub fn with_context(mut self, ctx: EncodeContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Replace the pipeline.
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn stage(mut self, stage: impl Into<Stage>) -> Self {
        self.pipeline.push(stage);
        self
    }

    pub fn match_(self, filter: impl Into<Filter>) -> Self {
        self.stage(Stage::match_(filter))
    }

    pub fn group(self, group: Group) -> Self {
        self.stage(group)
    }

    pub fn project(self, projection: Projection) -> Self {
        self.stage(projection)
    }

    pub fn sort(self, sort: Sort) -> Self {
        self.stage(sort)
    }

    pub fn skip(self, n: i64) -> Self {
        self.stage(Stage::skip(n))
    }

    pub fn limit(self, n: i64) -> Self {
        self.stage(Stage::limit(n))
    }

    pub fn options(mut self, options: AggregateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn allow_disk_use(mut self, allow: bool) -> Self {
        self.options.allow_disk_use = Some(allow);
        self
    }

    pub fn batch_size(mut self, size: u32) -> Self {
        self.options.batch_size = Some(size);
        self
    }

    pub fn max_time(mut self, duration: Duration) -> Self {
        self.options.max_time = Some(duration);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn stages(&self) -> &[Stage] {
        self.pipeline.stages()
    }

    /// Encode the pipeline without running it.
    pub fn to_documents(&self) -> MongoResult<Vec<Document>> {
        Ok(self.pipeline.encode(&self.ctx)?)
    }

    /// Run and return the raw result documents.
    pub async fn execute_raw(self) -> MongoResult<Vec<Document>> {
        let stages = self.to_documents()?;
        debug!(
            collection = %self.collection,
            stages = stages.len(),
            "Executing aggregation"
        );
        let docs = self
            .executor
            .aggregate(&self.collection, stages, &self.options)
            .await?;
        debug!(collection = %self.collection, results = docs.len(), "Aggregation finished");
        Ok(docs)
    }

    /// Run and decode every result into `T`.
    pub async fn execute<T: DeserializeOwned>(self) -> MongoResult<Vec<T>> {
        codec::decode_all(self.execute_raw().await?)
    }

    /// Run with an extra `$limit: 1` and decode the first result.
    pub async fn first<T: DeserializeOwned>(self) -> MongoResult<Option<T>> {
        let docs = self.limit(1).execute_raw().await?;
        docs.into_iter()
            .next()
            .map(codec::from_document)
            .transpose()
    }
}
