//! # pipewright-query
//!
//! Typed MongoDB aggregation pipelines for the Pipewright ODM.
//!
//! This crate turns strongly typed builders into the exact BSON documents the
//! aggregation framework expects:
//! - Expressions over every operator family (`expr`)
//! - Query filters for `$match` and `$graphLookup`
//! - Sort specifications and `$setWindowFields` window frames
//! - Pipeline stages and the pipeline assembler
//! - Entity schemas that translate field names to their stored names
//!
//! Nothing here performs I/O. Running a pipeline is the job of
//! `pipewright-mongodb`.
//!
//! ## Expressions
//!
//! ```rust
//! use pipewright_query::expr::{array::filter, boolean::and, comparison::{gte, lte}};
//! use pipewright_query::expr::{array, variable, value};
//! use pipewright_query::EncodeContext;
//! use bson::bson;
//!
//! let numbers = filter(
//!     array([value(1), value("a"), value(2)]),
//!     and([gte(variable("num"), value(0)), lte(variable("num"), value(10))]),
//! )
//! .as_("num");
//!
//! let encoded = pipewright_query::Expression::from(numbers)
//!     .encode(&EncodeContext::new())
//!     .unwrap();
//! assert_eq!(
//!     encoded,
//!     bson!({
//!         "$filter": {
//!             "input": [1, "a", 2],
//!             "cond": { "$and": [{ "$gte": ["$$num", 0] }, { "$lte": ["$$num", 10] }] },
//!             "as": "num"
//!         }
//!     })
//! );
//! ```
//!
//! ## Pipelines
//!
//! ```rust
//! use pipewright_query::expr::{accumulator::sum, field, value};
//! use pipewright_query::stage::Group;
//! use pipewright_query::{EncodeContext, Filter, Pipeline, Sort};
//! use bson::doc;
//!
//! let pipeline = Pipeline::new()
//!     .match_(Filter::new().gte("qty", 10))
//!     .group(Group::new(field("item")).field("count", sum(value(1))))
//!     .sort(Sort::new().descending("count"));
//!
//! let stages = pipeline.encode(&EncodeContext::new()).unwrap();
//! assert_eq!(stages[1], doc! { "$group": { "_id": "$item", "count": { "$sum": 1 } } });
//! ```
//!
//! ## Errors
//!
//! Builders never fail; every check happens in `encode`:
//!
//! ```rust
//! use pipewright_query::stage::Projection;
//! use pipewright_query::{EncodeContext, Pipeline};
//!
//! let err = Pipeline::new()
//!     .project(Projection::new().include("name").exclude("secret"))
//!     .encode(&EncodeContext::new())
//!     .unwrap_err();
//! assert!(err.is_mixed_projection());
//! ```

pub mod context;
pub mod error;
pub mod expr;
pub mod filter;
pub mod logging;
pub mod pipeline;
pub mod schema;
pub mod sort;
pub mod stage;
pub mod window;

pub use context::EncodeContext;
pub use error::{EncodeError, EncodeResult};
pub use expr::{Call, Expression, Op};
pub use filter::{Condition, Filter, TextSearch};
pub use pipeline::Pipeline;
pub use schema::{Entity, EntitySchema, FieldSchema, SchemaRegistry};
pub use sort::{Sort, SortOrder};
pub use stage::Stage;
pub use window::{Bound, TimeUnit, Window, WindowKind};

// Re-export logging utilities
pub use logging::{LogFormat, init as init_logging, is_debug_enabled};

// Re-export bson for macros and downstream crates
pub use bson;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::context::EncodeContext;
    pub use crate::error::{EncodeError, EncodeResult};
    pub use crate::expr::{Expression, array, document, field, literal, null, value, variable};
    pub use crate::filter::Filter;
    pub use crate::pipeline::Pipeline;
    pub use crate::schema::{Entity, FieldSchema, SchemaRegistry};
    pub use crate::sort::{Sort, SortOrder};
    pub use crate::stage::{
        Bucket, BucketAuto, Densify, Facet, Fields, Fill, GraphLookup, Group, Lookup, Merge,
        Out, Projection, SetWindowFields, Stage, UnionWith, Unwind,
    };
    pub use crate::window::{Bound, TimeUnit, Window};
}
