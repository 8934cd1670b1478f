//! Pipeline stages.
//!
//! A [`Stage`] is one step of an aggregation pipeline. Stages with several
//! settings have their own builder types in the submodules; the simple ones
//! are built directly through the constructors on `Stage`. Every stage is
//! validated when it is encoded, never when it is built.
//!
//! ```rust
//! use pipewright_query::expr::{accumulator::add_to_set, date::day_of_year, document, field};
//! use pipewright_query::stage::{Group, Stage};
//! use pipewright_query::EncodeContext;
//! use bson::doc;
//!
//! let stage: Stage = Group::new(document([("day", day_of_year(field("date")))]))
//!     .field("itemsSold", add_to_set(field("item")))
//!     .into();
//!
//! assert_eq!(
//!     stage.encode(&EncodeContext::new()).unwrap(),
//!     doc! {
//!         "$group": {
//!             "_id": { "day": { "$dayOfYear": "$date" } },
//!             "itemsSold": { "$addToSet": "$item" }
//!         }
//!     }
//! );
//! ```

use bson::{Bson, Document, doc};

use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult};
use crate::expr::Expression;
use crate::filter::Filter;
use crate::sort::Sort;

mod bucket;
mod densify;
mod facet;
mod fields;
mod group;
mod lookup;
mod merge;
mod projection;
mod set_window_fields;
mod unwind;

pub use bucket::{Bucket, BucketAuto, Granularity};
pub use densify::{Densify, DensifyBounds, Fill, FillMethod};
pub use facet::Facet;
pub use fields::{Fields, Unset};
pub use group::Group;
pub use lookup::{GraphLookup, Lookup, UnionWith};
pub use merge::{Merge, MergeTarget, Out, WhenMatched, WhenNotMatched};
pub use projection::{Projection, ProjectionItem};
pub use set_window_fields::{SetWindowFields, WindowOutput};
pub use unwind::Unwind;

/// One aggregation pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    AddFields(Fields),
    Bucket(Bucket),
    BucketAuto(BucketAuto),
    Count(String),
    Densify(Densify),
    Documents(Vec<Expression>),
    Facet(Facet),
    Fill(Fill),
    GraphLookup(GraphLookup),
    Group(Group),
    Limit(i64),
    Lookup(Lookup),
    Match(Filter),
    Merge(Merge),
    Out(Out),
    Project(Projection),
    Redact(Expression),
    ReplaceRoot(Expression),
    ReplaceWith(Expression),
    Sample(i64),
    Set(Fields),
    SetWindowFields(SetWindowFields),
    Skip(i64),
    Sort(Sort),
    SortByCount(Expression),
    UnionWith(UnionWith),
    Unset(Unset),
    Unwind(Unwind),
    /// A stage document passed through unchanged.
    Raw(Document),
}

impl Stage {
    /// `$addFields`
    pub fn add_fields(fields: Fields) -> Self {
        Self::AddFields(fields)
    }

    /// `$set`, an alias of `$addFields`.
    pub fn set(fields: Fields) -> Self {
        Self::Set(fields)
    }

    /// `$count`: a single document holding the number of inputs under `name`.
    pub fn count(name: impl Into<String>) -> Self {
        Self::Count(name.into())
    }

    /// `$documents`: literal input documents.
    pub fn documents<I, E>(docs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expression>,
    {
        Self::Documents(docs.into_iter().map(Into::into).collect())
    }

    /// `$limit`
    pub fn limit(n: i64) -> Self {
        Self::Limit(n)
    }

    /// `$match`
    pub fn match_(filter: impl Into<Filter>) -> Self {
        Self::Match(filter.into())
    }

    /// `$match` on an aggregation expression.
    pub fn match_expr(expr: impl Into<Expression>) -> Self {
        Self::Match(Filter::from_expr(expr))
    }

    /// `$redact`: evaluates to `$$DESCEND`, `$$PRUNE` or `$$KEEP`.
    pub fn redact(expr: impl Into<Expression>) -> Self {
        Self::Redact(expr.into())
    }

    /// `$replaceRoot`
    pub fn replace_root(new_root: impl Into<Expression>) -> Self {
        Self::ReplaceRoot(new_root.into())
    }

    /// `$replaceWith`
    pub fn replace_with(replacement: impl Into<Expression>) -> Self {
        Self::ReplaceWith(replacement.into())
    }

    /// `$sample`
    pub fn sample(size: i64) -> Self {
        Self::Sample(size)
    }

    /// `$skip`
    pub fn skip(n: i64) -> Self {
        Self::Skip(n)
    }

    /// `$sort`
    pub fn sort(sort: Sort) -> Self {
        Self::Sort(sort)
    }

    /// `$sortByCount`
    pub fn sort_by_count(expr: impl Into<Expression>) -> Self {
        Self::SortByCount(expr.into())
    }

    /// `$unwind` with no options.
    pub fn unwind(path: impl Into<String>) -> Self {
        Self::Unwind(Unwind::new(path))
    }

    /// `$unset`
    pub fn unset<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Unset(Unset::new(paths))
    }

    /// `$out` to a collection of the current database.
    pub fn out(collection: impl Into<String>) -> Self {
        Self::Out(Out::new(collection))
    }

    /// The stage operator name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddFields(_) => "$addFields",
            Self::Bucket(_) => "$bucket",
            Self::BucketAuto(_) => "$bucketAuto",
            Self::Count(_) => "$count",
            Self::Densify(_) => "$densify",
            Self::Documents(_) => "$documents",
            Self::Facet(_) => "$facet",
            Self::Fill(_) => "$fill",
            Self::GraphLookup(_) => "$graphLookup",
            Self::Group(_) => "$group",
            Self::Limit(_) => "$limit",
            Self::Lookup(_) => "$lookup",
            Self::Match(_) => "$match",
            Self::Merge(_) => "$merge",
            Self::Out(_) => "$out",
            Self::Project(_) => "$project",
            Self::Redact(_) => "$redact",
            Self::ReplaceRoot(_) => "$replaceRoot",
            Self::ReplaceWith(_) => "$replaceWith",
            Self::Sample(_) => "$sample",
            Self::Set(_) => "$set",
            Self::SetWindowFields(_) => "$setWindowFields",
            Self::Skip(_) => "$skip",
            Self::Sort(_) => "$sort",
            Self::SortByCount(_) => "$sortByCount",
            Self::UnionWith(_) => "$unionWith",
            Self::Unset(_) => "$unset",
            Self::Unwind(_) => "$unwind",
            Self::Raw(_) => "raw",
        }
    }

    /// Encode the stage document.
    pub fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        let name = self.name();
        let body: Bson = match self {
            Self::AddFields(fields) | Self::Set(fields) => fields.encode(name, ctx)?.into(),
            Self::Bucket(bucket) => bucket.encode(ctx)?.into(),
            Self::BucketAuto(bucket) => bucket.encode(ctx)?.into(),
            Self::Count(field) => {
                if field.is_empty() || field.starts_with('$') || field.contains('.') {
                    return Err(EncodeError::stage(
                        name,
                        format!("'{}' is not a valid output field name", field),
                    ));
                }
                Bson::String(field.clone())
            }
            Self::Densify(densify) => densify.encode(ctx)?.into(),
            Self::Documents(docs) => docs
                .iter()
                .map(|d| d.encode(ctx))
                .collect::<EncodeResult<Vec<_>>>()?
                .into(),
            Self::Facet(facet) => facet.encode(ctx)?.into(),
            Self::Fill(fill) => fill.encode(ctx)?.into(),
            Self::GraphLookup(lookup) => lookup.encode(ctx)?.into(),
            Self::Group(group) => group.encode(ctx)?.into(),
            Self::Limit(n) => positive(name, "limit", *n)?,
            Self::Lookup(lookup) => lookup.encode(ctx)?.into(),
            Self::Match(filter) => filter.encode(ctx)?.into(),
            Self::Merge(merge) => merge.encode()?,
            Self::Out(out) => out.encode(),
            Self::Project(projection) => projection.encode(ctx)?.into(),
            Self::Redact(expr) | Self::ReplaceWith(expr) | Self::SortByCount(expr) => {
                expr.encode(ctx)?
            }
            Self::ReplaceRoot(expr) => doc! { "newRoot": expr.encode(ctx)? }.into(),
            Self::Sample(size) => doc! { "size": positive(name, "size", *size)? }.into(),
            Self::SetWindowFields(stage) => stage.encode(ctx)?.into(),
            Self::Skip(n) => {
                if *n < 0 {
                    return Err(EncodeError::stage(name, "skip cannot be negative"));
                }
                int(*n)
            }
            Self::Sort(sort) => sort.encode(ctx)?.into(),
            Self::UnionWith(union) => union.encode()?,
            Self::Unset(unset) => unset.encode(ctx)?,
            Self::Unwind(unwind) => unwind.encode(ctx),
            Self::Raw(doc) => return Ok(doc.clone()),
        };

        let mut out = Document::new();
        out.insert(name, body);
        Ok(out)
    }
}

/// An integer as Int32 when it fits, Int64 otherwise.
pub(crate) fn int(n: i64) -> Bson {
    match i32::try_from(n) {
        Ok(small) => Bson::Int32(small),
        Err(_) => Bson::Int64(n),
    }
}

fn positive(stage: &'static str, what: &str, n: i64) -> EncodeResult<Bson> {
    if n <= 0 {
        return Err(EncodeError::stage(stage, format!("{} must be positive", what)));
    }
    Ok(int(n))
}

macro_rules! stage_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Stage {
                fn from(stage: $ty) -> Self {
                    Stage::$variant(stage)
                }
            }
        )*
    };
}

stage_from! {
    Bucket => Bucket,
    BucketAuto => BucketAuto,
    Densify => Densify,
    Facet => Facet,
    Fill => Fill,
    GraphLookup => GraphLookup,
    Group => Group,
    Lookup => Lookup,
    Filter => Match,
    Merge => Merge,
    Out => Out,
    Projection => Project,
    SetWindowFields => SetWindowFields,
    Sort => Sort,
    UnionWith => UnionWith,
    Unset => Unset,
    Unwind => Unwind,
    Document => Raw,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::expr::comparison::gt;
    use crate::expr::variables::{descend, prune};
    use crate::expr::{conditional::cond, field, value};

    fn enc(stage: impl Into<Stage>) -> EncodeResult<Document> {
        stage.into().encode(&EncodeContext::new())
    }

    #[test]
    fn test_numeric_stages() {
        assert_eq!(enc(Stage::limit(5)).unwrap(), doc! { "$limit": 5 });
        assert_eq!(enc(Stage::skip(0)).unwrap(), doc! { "$skip": 0 });
        assert_eq!(
            enc(Stage::limit(10_000_000_000)).unwrap(),
            doc! { "$limit": 10_000_000_000i64 }
        );
        assert_eq!(enc(Stage::sample(3)).unwrap(), doc! { "$sample": { "size": 3 } });

        assert!(enc(Stage::limit(0)).unwrap_err().is_invalid_stage());
        assert!(enc(Stage::skip(-1)).unwrap_err().is_invalid_stage());
        assert!(enc(Stage::sample(0)).unwrap_err().is_invalid_stage());
    }

    #[test]
    fn test_count() {
        assert_eq!(
            enc(Stage::count("passing_scores")).unwrap(),
            doc! { "$count": "passing_scores" }
        );
        for bad in ["", "$total", "a.b"] {
            assert!(enc(Stage::count(bad)).unwrap_err().is_invalid_stage(), "{}", bad);
        }
    }

    #[test]
    fn test_expression_stages() {
        assert_eq!(
            enc(Stage::replace_root(field("name"))).unwrap(),
            doc! { "$replaceRoot": { "newRoot": "$name" } }
        );
        assert_eq!(
            enc(Stage::replace_with(field("name"))).unwrap(),
            doc! { "$replaceWith": "$name" }
        );
        assert_eq!(
            enc(Stage::sort_by_count(field("tags"))).unwrap(),
            doc! { "$sortByCount": "$tags" }
        );
        assert_eq!(
            enc(Stage::redact(cond(gt(field("level"), value(5)), prune(), descend()))).unwrap(),
            doc! {
                "$redact": {
                    "$cond": { "if": { "$gt": ["$level", 5] }, "then": "$$PRUNE", "else": "$$DESCEND" }
                }
            }
        );
    }

    #[test]
    fn test_match_and_sort() {
        assert_eq!(
            enc(Filter::new().eq("author", "dave")).unwrap(),
            doc! { "$match": { "author": "dave" } }
        );
        assert_eq!(
            enc(Stage::match_expr(gt(field("spent"), field("budget")))).unwrap(),
            doc! { "$match": { "$expr": { "$gt": ["$spent", "$budget"] } } }
        );
        assert_eq!(
            enc(Sort::new().descending("age").ascending("posts")).unwrap(),
            doc! { "$sort": { "age": -1, "posts": 1 } }
        );
    }

    #[test]
    fn test_documents() {
        let stage = Stage::documents([doc! { "x": 10 }, doc! { "x": 2 }]);
        assert_eq!(
            enc(stage).unwrap(),
            doc! { "$documents": [{ "x": 10 }, { "x": 2 }] }
        );
    }

    #[test]
    fn test_raw_stage_passes_through() {
        let raw = doc! { "$collStats": { "count": {} } };
        assert_eq!(enc(raw.clone()).unwrap(), raw);
        assert_eq!(Stage::Raw(raw).name(), "raw");
    }
}
