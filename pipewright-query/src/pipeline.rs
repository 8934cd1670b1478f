//! Aggregation pipelines.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s. It performs no
//! cross-stage validation and never reorders anything: the encoded array
//! holds one document per stage, in insertion order.
//!
//! ```rust
//! use pipewright_query::{EncodeContext, Filter, Pipeline, Sort};
//! use bson::doc;
//!
//! let pipeline = Pipeline::new()
//!     .match_(Filter::new().eq("status", "A"))
//!     .sort(Sort::new().descending("amount"))
//!     .limit(10);
//!
//! assert_eq!(
//!     pipeline.encode(&EncodeContext::new()).unwrap(),
//!     vec![
//!         doc! { "$match": { "status": "A" } },
//!         doc! { "$sort": { "amount": -1 } },
//!         doc! { "$limit": 10 },
//!     ]
//! );
//! ```

use bson::{Bson, Document};
use tracing::debug;

use crate::context::EncodeContext;
use crate::error::EncodeResult;
use crate::expr::Expression;
use crate::filter::Filter;
use crate::sort::Sort;
use crate::stage::{
    Bucket, BucketAuto, Densify, Facet, Fields, Fill, GraphLookup, Group, Lookup, Merge, Out,
    Projection, SetWindowFields, Stage, UnionWith, Unwind,
};

/// An ordered sequence of stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append any stage.
    pub fn stage(mut self, stage: impl Into<Stage>) -> Self {
        self.stages.push(stage.into());
        self
    }

    /// Append a stage in place.
    pub fn push(&mut self, stage: impl Into<Stage>) {
        self.stages.push(stage.into());
    }

    pub fn add_fields(self, fields: Fields) -> Self {
        self.stage(Stage::add_fields(fields))
    }

    pub fn set(self, fields: Fields) -> Self {
        self.stage(Stage::set(fields))
    }

    pub fn bucket(self, bucket: Bucket) -> Self {
        self.stage(bucket)
    }

    pub fn bucket_auto(self, bucket: BucketAuto) -> Self {
        self.stage(bucket)
    }

    pub fn count(self, name: impl Into<String>) -> Self {
        self.stage(Stage::count(name))
    }

    pub fn densify(self, densify: Densify) -> Self {
        self.stage(densify)
    }

    pub fn documents<I, E>(self, docs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expression>,
    {
        self.stage(Stage::documents(docs))
    }

    pub fn facet(self, facet: Facet) -> Self {
        self.stage(facet)
    }

    pub fn fill(self, fill: Fill) -> Self {
        self.stage(fill)
    }

    pub fn graph_lookup(self, lookup: GraphLookup) -> Self {
        self.stage(lookup)
    }

    pub fn group(self, group: Group) -> Self {
        self.stage(group)
    }

    pub fn limit(self, n: i64) -> Self {
        self.stage(Stage::limit(n))
    }

    pub fn lookup(self, lookup: Lookup) -> Self {
        self.stage(lookup)
    }

    pub fn match_(self, filter: impl Into<Filter>) -> Self {
        self.stage(Stage::match_(filter))
    }

    /// `$match` on an aggregation expression.
    pub fn match_expr(self, expr: impl Into<Expression>) -> Self {
        self.stage(Stage::match_expr(expr))
    }

    pub fn merge(self, merge: Merge) -> Self {
        self.stage(merge)
    }

    pub fn out(self, out: impl Into<Out>) -> Self {
        self.stage(out.into())
    }

    pub fn project(self, projection: Projection) -> Self {
        self.stage(projection)
    }

    pub fn redact(self, expr: impl Into<Expression>) -> Self {
        self.stage(Stage::redact(expr))
    }

    pub fn replace_root(self, new_root: impl Into<Expression>) -> Self {
        self.stage(Stage::replace_root(new_root))
    }

    pub fn replace_with(self, replacement: impl Into<Expression>) -> Self {
        self.stage(Stage::replace_with(replacement))
    }

    pub fn sample(self, size: i64) -> Self {
        self.stage(Stage::sample(size))
    }

    pub fn set_window_fields(self, stage: SetWindowFields) -> Self {
        self.stage(stage)
    }

    pub fn skip(self, n: i64) -> Self {
        self.stage(Stage::skip(n))
    }

    pub fn sort(self, sort: Sort) -> Self {
        self.stage(sort)
    }

    pub fn sort_by_count(self, expr: impl Into<Expression>) -> Self {
        self.stage(Stage::sort_by_count(expr))
    }

    pub fn union_with(self, union: UnionWith) -> Self {
        self.stage(union)
    }

    pub fn unset<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stage(Stage::unset(paths))
    }

    pub fn unwind(self, unwind: impl Into<Unwind>) -> Self {
        self.stage(unwind.into())
    }

    /// Append a stage document as-is.
    pub fn raw(self, stage: Document) -> Self {
        self.stage(stage)
    }

    /// Append every stage of another pipeline.
    pub fn extend_from(mut self, other: Pipeline) -> Self {
        self.stages.extend(other.stages);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn first(&self) -> Option<&Stage> {
        self.stages.first()
    }

    pub fn last(&self) -> Option<&Stage> {
        self.stages.last()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Encode every stage in order.
    pub fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Vec<Document>> {
        let docs = self
            .stages
            .iter()
            .map(|stage| stage.encode(ctx))
            .collect::<EncodeResult<Vec<_>>>()?;
        debug!(
            stages = docs.len(),
            collection = ctx.schema().map(|s| s.collection()),
            "Encoded aggregation pipeline"
        );
        crate::pipewright_debug!(
            pipeline = %Bson::Array(docs.iter().cloned().map(Bson::Document).collect())
                .into_relaxed_extjson(),
            "Pipeline stages"
        );
        Ok(docs)
    }

    /// Encode and render as canonical Extended JSON.
    pub fn to_canonical_json(&self, ctx: &EncodeContext) -> EncodeResult<serde_json::Value> {
        Ok(self.to_bson(ctx)?.into_canonical_extjson())
    }

    /// Encode and render as relaxed Extended JSON.
    pub fn to_relaxed_json(&self, ctx: &EncodeContext) -> EncodeResult<serde_json::Value> {
        Ok(self.to_bson(ctx)?.into_relaxed_extjson())
    }

    fn to_bson(&self, ctx: &EncodeContext) -> EncodeResult<Bson> {
        Ok(Bson::Array(
            self.encode(ctx)?.into_iter().map(Bson::Document).collect(),
        ))
    }
}

impl From<Vec<Stage>> for Pipeline {
    fn from(stages: Vec<Stage>) -> Self {
        Self { stages }
    }
}

impl<S: Into<Stage>> FromIterator<S> for Pipeline {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<Stage>> Extend<S> for Pipeline {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.stages.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for Pipeline {
    type Item = Stage;
    type IntoIter = std::vec::IntoIter<Stage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.into_iter()
    }
}

impl<'a> IntoIterator for &'a Pipeline {
    type Item = &'a Stage;
    type IntoIter = std::slice::Iter<'a, Stage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter()
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::expr::accumulator::sum;
    use crate::expr::{field, value};

    #[test]
    fn test_stages_keep_insertion_order() {
        let pipeline = Pipeline::new()
            .skip(5)
            .limit(2)
            .group(Group::new(field("item")).field("total", sum(value(1))))
            .unset(["total"]);
        let names: Vec<_> = pipeline.stages().iter().map(Stage::name).collect();
        assert_eq!(names, ["$skip", "$limit", "$group", "$unset"]);

        let encoded = pipeline.encode(&EncodeContext::new()).unwrap();
        assert_eq!(encoded.len(), 4);
        assert_eq!(encoded[0], doc! { "$skip": 5 });
        assert_eq!(encoded[3], doc! { "$unset": "total" });
    }

    #[test]
    fn test_empty_pipeline_encodes_empty() {
        let pipeline = Pipeline::new();
        assert!(pipeline.is_empty());
        assert!(pipeline.encode(&EncodeContext::new()).unwrap().is_empty());
    }

    #[test]
    fn test_first_failing_stage_aborts() {
        let err = Pipeline::new()
            .limit(1)
            .skip(-3)
            .limit(0)
            .encode(&EncodeContext::new())
            .unwrap_err();
        assert_eq!(
            err,
            crate::error::EncodeError::stage("$skip", "skip cannot be negative")
        );
    }

    #[test]
    fn test_extended_json() {
        let pipeline = Pipeline::new().match_(Filter::new().eq("qty", 5_000_000_000i64));
        let ctx = EncodeContext::new();
        assert_eq!(
            pipeline.to_canonical_json(&ctx).unwrap(),
            serde_json::json!([{ "$match": { "qty": { "$numberLong": "5000000000" } } }])
        );
        assert_eq!(
            pipeline.to_relaxed_json(&ctx).unwrap(),
            serde_json::json!([{ "$match": { "qty": 5000000000i64 } }])
        );
    }

    #[test]
    fn test_collect_from_stages() {
        let pipeline: Pipeline = vec![Stage::limit(1), Stage::skip(1)].into_iter().collect();
        assert_eq!(pipeline.len(), 2);
        let merged = Pipeline::new().count("n").extend_from(pipeline);
        assert_eq!(merged.first().map(Stage::name), Some("$count"));
        assert_eq!(merged.last().map(Stage::name), Some("$skip"));
    }
}
