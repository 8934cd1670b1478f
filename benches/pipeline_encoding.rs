//! Benchmarks for expression and pipeline encoding.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pipewright_query::expr::accumulator::{add_to_set, avg, sum};
use pipewright_query::expr::arithmetic::{add, multiply};
use pipewright_query::expr::array::filter;
use pipewright_query::expr::boolean::and;
use pipewright_query::expr::comparison::{gte, lte};
use pipewright_query::expr::date::day_of_year;
use pipewright_query::expr::{array, document, field, value, variable};
use pipewright_query::stage::{Group, Projection, SetWindowFields};
use pipewright_query::{
    EncodeContext, EntitySchema, Expression, FieldSchema, Filter, Pipeline, Sort, Window,
};

fn report_pipeline() -> Pipeline {
    Pipeline::new()
        .match_(Filter::new().gte("quantity", 1).eq("status", "A"))
        .group(
            Group::new(document([("day", day_of_year(field("orderDate")))]))
                .field("items", add_to_set(field("item")))
                .field("revenue", sum(multiply([field("price"), field("quantity")])))
                .field("avgQty", avg(field("quantity"))),
        )
        .sort(Sort::new().descending("revenue"))
        .set_window_fields(
            SetWindowFields::new()
                .sort_by(Sort::new().ascending("_id"))
                .output_over("running", sum(field("revenue")), Window::to_current()),
        )
        .project(Projection::new().exclude("avgQty"))
        .limit(100)
}

/// Benchmark encoding single expressions.
fn bench_expressions(c: &mut Criterion) {
    let mut group = c.benchmark_group("expression_encoding");
    let ctx = EncodeContext::new();

    group.bench_function("add_three", |b| {
        let expr = add([field("a"), field("b"), value(1)]);
        b.iter(|| black_box(expr.encode(&ctx)))
    });

    group.bench_function("filter_mixed_array", |b| {
        let expr: Expression = filter(
            array([value(1), value("a"), value(2), value(3.1), value(4i64)]),
            and([
                gte(variable("num"), value(-9_223_372_036_854_775_807i64)),
                lte(variable("num"), value(9_223_372_036_854_775_807i64)),
            ]),
        )
        .as_("num")
        .into();
        b.iter(|| black_box(expr.encode(&ctx)))
    });

    for depth in [4usize, 16, 64] {
        let mut expr = field("x");
        for i in 0..depth {
            expr = add([expr, value(i as i64)]);
        }
        group.bench_with_input(BenchmarkId::new("nested_add", depth), &expr, |b, expr| {
            b.iter(|| black_box(expr.encode(&ctx)))
        });
    }

    group.finish();
}

/// Benchmark encoding whole pipelines.
fn bench_pipelines(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_encoding");
    let pipeline = report_pipeline();
    group.throughput(Throughput::Elements(pipeline.len() as u64));

    group.bench_function("report_unmapped", |b| {
        let ctx = EncodeContext::new();
        b.iter(|| black_box(pipeline.encode(&ctx)))
    });

    group.bench_function("report_mapped", |b| {
        let ctx = EncodeContext::for_schema(Arc::new(EntitySchema::new(
            "Order",
            "orders",
            vec![
                FieldSchema::new("orderDate").stored_as("order_date"),
                FieldSchema::new("quantity").stored_as("qty"),
            ],
        )));
        b.iter(|| black_box(pipeline.encode(&ctx)))
    });

    group.bench_function("report_relaxed_json", |b| {
        let ctx = EncodeContext::new();
        b.iter(|| black_box(pipeline.to_relaxed_json(&ctx)))
    });

    group.finish();
}

criterion_group!(benches, bench_expressions, bench_pipelines);
criterion_main!(benches);
