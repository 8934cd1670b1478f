//! Integration tests for running pipelines through an executor.
//!
//! A recording executor stands in for the server so these tests need no
//! running MongoDB instance.

use std::time::Duration;

use async_trait::async_trait;
use bson::{Document, doc};
use parking_lot::Mutex;
use pipewright_mongodb::view::{AggregationView, MaterializedView};
use pipewright_mongodb::{AggregateOptions, Aggregation, MongoResult, PipelineExecutor};
use pipewright_query::expr::accumulator::sum;
use pipewright_query::expr::{field, value};
use pipewright_query::stage::{Group, Merge, Projection, WhenMatched};
use pipewright_query::{Entity, FieldSchema, Filter, Pipeline, SchemaRegistry, Sort};
use pretty_assertions::assert_eq;
use serde::Deserialize;

#[derive(Default)]
struct RecordingExecutor {
    calls: Mutex<Vec<(String, Vec<Document>)>>,
    reply: Vec<Document>,
}

impl RecordingExecutor {
    fn replying(reply: Vec<Document>) -> Self {
        Self {
            reply,
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<(String, Vec<Document>)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PipelineExecutor for RecordingExecutor {
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        _options: &AggregateOptions,
    ) -> MongoResult<Vec<Document>> {
        self.calls.lock().push((collection.to_string(), pipeline));
        Ok(self.reply.clone())
    }
}

struct Sale;

impl Entity for Sale {
    const COLLECTION: &'static str = "sales";

    fn describe() -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("storeId").stored_as("store_id"),
            FieldSchema::new("amount"),
        ]
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct StoreTotal {
    #[serde(rename = "_id")]
    store: i32,
    total: f64,
}

#[tokio::test]
async fn test_typed_aggregation_over_entity() {
    let executor = RecordingExecutor::replying(vec![
        doc! { "_id": 1, "total": 120.5 },
        doc! { "_id": 2, "total": 80.0 },
    ]);
    let registry = SchemaRegistry::new();
    registry.register::<Sale>();

    let totals: Vec<StoreTotal> = Aggregation::new(&executor, Sale::COLLECTION)
        .with_context(registry.context_for::<Sale>())
        .match_(Filter::new().gt("amount", 0))
        .group(Group::new(field("storeId")).field("total", sum(field("amount"))))
        .sort(Sort::new().descending("total"))
        .execute()
        .await
        .unwrap();

    assert_eq!(
        totals,
        vec![
            StoreTotal { store: 1, total: 120.5 },
            StoreTotal { store: 2, total: 80.0 },
        ]
    );

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "sales");
    assert_eq!(
        calls[0].1,
        vec![
            doc! { "$match": { "amount": { "$gt": 0 } } },
            doc! { "$group": { "_id": "$store_id", "total": { "$sum": "$amount" } } },
            doc! { "$sort": { "total": -1 } },
        ]
    );
}

#[tokio::test]
async fn test_invalid_pipeline_is_not_sent() {
    let executor = RecordingExecutor::default();
    let err = Aggregation::new(&executor, "sales")
        .project(Projection::new().include("a").exclude("b"))
        .execute_raw()
        .await
        .unwrap_err();

    assert!(err.is_encode_error());
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_first_appends_limit() {
    let executor = RecordingExecutor::replying(vec![doc! { "_id": 3, "total": 9.5 }]);
    let top: Option<StoreTotal> = Aggregation::new(&executor, "sales")
        .sort(Sort::new().descending("total"))
        .first()
        .await
        .unwrap();

    assert_eq!(top, Some(StoreTotal { store: 3, total: 9.5 }));
    assert_eq!(executor.calls()[0].1.last(), Some(&doc! { "$limit": 1 }));
}

#[tokio::test]
async fn test_materialized_view_refresh() {
    let executor = RecordingExecutor::default();
    let pipeline = Pipeline::new()
        .group(Group::new(field("storeId")).field("count", sum(value(1))));
    let view = MaterializedView::with_merge(
        "sales",
        pipeline,
        Merge::new("store_counts").when_matched(WhenMatched::Replace),
    )
    .with_refresh_interval(Duration::from_secs(60));

    view.refresh(&executor).await.unwrap();

    let calls = executor.calls();
    assert_eq!(calls[0].0, "sales");
    assert_eq!(
        calls[0].1.last(),
        Some(&doc! { "$merge": { "into": "store_counts", "whenMatched": "replace" } })
    );
    assert_eq!(view.refresh_interval, Some(Duration::from_secs(60)));
}

#[test]
fn test_view_create_command() {
    let view = AggregationView::builder("large_sales")
        .source_collection("sales")
        .pipeline(Pipeline::new().match_(Filter::new().gte("amount", 100)))
        .build()
        .unwrap();

    assert_eq!(
        view.to_create_command().unwrap(),
        doc! {
            "create": "large_sales",
            "viewOn": "sales",
            "pipeline": [{ "$match": { "amount": { "$gte": 100 } } }]
        }
    );
}
