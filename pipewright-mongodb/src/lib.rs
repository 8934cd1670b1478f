//! # pipewright-mongodb
//!
//! Runs `pipewright-query` pipelines against MongoDB.
//!
//! This crate provides:
//! - Connection configuration, from code or the environment
//! - A client wrapper with a shared entity schema registry
//! - The [`PipelineExecutor`] seam, implemented by [`MongoClient`]
//! - A typed aggregation runner with driver options
//! - Views and materialized views defined by typed pipelines
//!
//! ## Example
//!
//! ```rust,ignore
//! use pipewright_mongodb::MongoClient;
//! use pipewright_query::{Filter, Sort};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MongoClient::builder()
//!         .uri("mongodb://localhost:27017")
//!         .database("shop")
//!         .build()
//!         .await?;
//!
//!     let orders: Vec<Order> = client
//!         .aggregate("orders")
//!         .match_(Filter::new().eq("status", "A"))
//!         .sort(Sort::new().descending("amount"))
//!         .limit(10)
//!         .execute()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod executor;
pub mod view;

pub use aggregation::{AggregateOptions, Aggregation, IndexHint};
pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use client::{MongoClient, MongoClientBuilder};
pub use config::{MongoConfig, MongoConfigBuilder, ReadPreference};
pub use error::{MongoError, MongoResult};
pub use executor::PipelineExecutor;
pub use view::{AggregationView, AggregationViewBuilder, MaterializeTarget, MaterializedView};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::aggregation::{AggregateOptions, Aggregation};
    pub use crate::client::{MongoClient, MongoClientBuilder};
    pub use crate::config::{MongoConfig, MongoConfigBuilder};
    pub use crate::error::{MongoError, MongoResult};
    pub use crate::executor::PipelineExecutor;
    pub use crate::view::{AggregationView, MaterializedView};
    pub use bson::oid::ObjectId;
    pub use bson::{Bson, Document, doc};
}
