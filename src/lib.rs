//! # Pipewright
//!
//! A typed MongoDB aggregation pipeline ODM for Rust.
//!
//! Pipewright provides:
//! - Composable, strongly typed aggregation expressions for every operator
//!   family
//! - Pipeline stages that encode to the exact BSON shapes the server expects
//! - Entity schemas that map application field names to stored names
//! - Async execution through the official MongoDB driver
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pipewright::prelude::*;
//! use pipewright::query::expr::{accumulator::sum, date::day_of_year};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pipewright::mongodb::MongoError> {
//!     let client = MongoClient::from_env().await?;
//!
//!     let per_day = client
//!         .aggregate("sales")
//!         .group(
//!             Group::new(document([("day", day_of_year(field("date")))]))
//!                 .field("total", sum(field("amount"))),
//!         )
//!         .execute_raw()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Expressions, stages, pipelines and schema mapping.
pub mod query {
    pub use pipewright_query::*;
}

/// MongoDB execution.
#[cfg(feature = "mongodb")]
#[cfg_attr(docsrs, doc(cfg(feature = "mongodb")))]
pub mod mongodb {
    pub use pipewright_mongodb::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use pipewright_query::prelude::*;

    #[cfg(feature = "mongodb")]
    pub use pipewright_mongodb::prelude::{
        AggregateOptions, Aggregation, MongoClient, MongoConfig, MongoError, MongoResult,
        PipelineExecutor,
    };
}

// Re-export key types at the crate root
pub use pipewright_query::{EncodeContext, EncodeError, EncodeResult, Pipeline, Stage};
