//! Query filters for `$match`.
//!
//! A [`Filter`] collects per-field conditions, logical combinators, `$expr`
//! and `$text` clauses in the order they are added. Several conditions on the
//! same field merge into one operator document; a field with a single
//! equality encodes bare unless the value would read as an operator document
//! or a pattern.
//!
//! ```rust
//! use pipewright_query::filter::Filter;
//! use pipewright_query::EncodeContext;
//! use bson::doc;
//!
//! let filter = Filter::new()
//!     .eq("status", "active")
//!     .gte("age", 18)
//!     .lt("age", 65);
//!
//! assert_eq!(
//!     filter.encode(&EncodeContext::new()).unwrap(),
//!     doc! { "status": "active", "age": { "$gte": 18, "$lt": 65 } }
//! );
//! ```

use bson::{Bson, Document, Regex, doc, oid::ObjectId};

use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult, ensure_unique};
use crate::expr::Expression;

/// A condition on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Bson),
    Ne(Bson),
    Gt(Bson),
    Gte(Bson),
    Lt(Bson),
    Lte(Bson),
    In(Vec<Bson>),
    Nin(Vec<Bson>),
    Exists(bool),
    /// BSON type alias (`"string"`) or numeric code.
    Type(Bson),
    Regex(Regex),
    Size(i64),
    All(Vec<Bson>),
    /// Array elements matching a filter; paths are relative to the element.
    ElemMatch(Box<Filter>),
    Mod { divisor: i64, remainder: i64 },
    /// Negation of the listed conditions.
    Not(Vec<Condition>),
}

impl Condition {
    fn operator(&self) -> &'static str {
        match self {
            Self::Eq(_) => "$eq",
            Self::Ne(_) => "$ne",
            Self::Gt(_) => "$gt",
            Self::Gte(_) => "$gte",
            Self::Lt(_) => "$lt",
            Self::Lte(_) => "$lte",
            Self::In(_) => "$in",
            Self::Nin(_) => "$nin",
            Self::Exists(_) => "$exists",
            Self::Type(_) => "$type",
            Self::Regex(_) => "$regex",
            Self::Size(_) => "$size",
            Self::All(_) => "$all",
            Self::ElemMatch(_) => "$elemMatch",
            Self::Mod { .. } => "$mod",
            Self::Not(_) => "$not",
        }
    }

    fn operand(&self, ctx: &EncodeContext) -> EncodeResult<Bson> {
        Ok(match self {
            Self::Eq(v)
            | Self::Ne(v)
            | Self::Gt(v)
            | Self::Gte(v)
            | Self::Lt(v)
            | Self::Lte(v)
            | Self::Type(v) => v.clone(),
            Self::In(vs) | Self::Nin(vs) | Self::All(vs) => Bson::Array(vs.clone()),
            Self::Exists(b) => Bson::Boolean(*b),
            Self::Regex(re) => Bson::RegularExpression(re.clone()),
            Self::Size(n) => int(*n),
            Self::ElemMatch(filter) => Bson::Document(filter.encode(&ctx.unmapped())?),
            Self::Mod { divisor, remainder } => {
                Bson::Array(vec![int(*divisor), int(*remainder)])
            }
            Self::Not(conditions) => Bson::Document(encode_conditions(conditions, ctx)?),
        })
    }
}

fn int(n: i64) -> Bson {
    match i32::try_from(n) {
        Ok(small) => Bson::Int32(small),
        Err(_) => Bson::Int64(n),
    }
}

/// Whether a bare value would not be read as plain equality.
fn needs_explicit_eq(v: &Bson) -> bool {
    match v {
        Bson::Document(doc) => doc.keys().next().is_some_and(|k| k.starts_with('$')),
        Bson::RegularExpression(_) => true,
        _ => false,
    }
}

fn encode_conditions(conditions: &[Condition], ctx: &EncodeContext) -> EncodeResult<Document> {
    ensure_unique("$match", conditions.iter().map(Condition::operator))?;
    let mut out = Document::new();
    for condition in conditions {
        out.insert(condition.operator(), condition.operand(ctx)?);
    }
    Ok(out)
}

/// Options for a `$text` search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSearch {
    pub search: String,
    pub language: Option<String>,
    pub case_sensitive: Option<bool>,
    pub diacritic_sensitive: Option<bool>,
}

impl TextSearch {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..Self::default()
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = Some(yes);
        self
    }

    pub fn diacritic_sensitive(mut self, yes: bool) -> Self {
        self.diacritic_sensitive = Some(yes);
        self
    }

    fn to_document(&self) -> Document {
        let mut out = doc! { "$search": self.search.as_str() };
        if let Some(language) = &self.language {
            out.insert("$language", language.as_str());
        }
        if let Some(yes) = self.case_sensitive {
            out.insert("$caseSensitive", yes);
        }
        if let Some(yes) = self.diacritic_sensitive {
            out.insert("$diacriticSensitive", yes);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Field {
        path: String,
        conditions: Vec<Condition>,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
    Expr(Expression),
    Text(TextSearch),
    Raw(Document),
}

/// A `$match` query filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Create an empty filter, matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter taken verbatim from a document. Its keys are not mapped.
    pub fn raw(doc: Document) -> Self {
        Self {
            clauses: vec![Clause::Raw(doc)],
        }
    }

    /// A filter consisting of a single `$expr` clause.
    pub fn from_expr(expr: impl Into<Expression>) -> Self {
        Self::new().expr(expr)
    }

    /// Whether no clause has been added.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Add a condition on `path`, merging with earlier conditions on it.
    pub fn condition(mut self, path: impl Into<String>, condition: Condition) -> Self {
        let path = path.into();
        let existing = self.clauses.iter_mut().find_map(|c| match c {
            Clause::Field { path: p, conditions } if *p == path => Some(conditions),
            _ => None,
        });
        match existing {
            Some(conditions) => conditions.push(condition),
            None => self.clauses.push(Clause::Field {
                path,
                conditions: vec![condition],
            }),
        }
        self
    }

    pub fn eq(self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.condition(path, Condition::Eq(value.into()))
    }

    pub fn ne(self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.condition(path, Condition::Ne(value.into()))
    }

    pub fn gt(self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.condition(path, Condition::Gt(value.into()))
    }

    pub fn gte(self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.condition(path, Condition::Gte(value.into()))
    }

    pub fn lt(self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.condition(path, Condition::Lt(value.into()))
    }

    pub fn lte(self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.condition(path, Condition::Lte(value.into()))
    }

    /// The field equals one of `values`.
    pub fn in_<I, V>(self, path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        self.condition(path, Condition::In(values.into_iter().map(Into::into).collect()))
    }

    /// The field equals none of `values`.
    pub fn nin<I, V>(self, path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        self.condition(path, Condition::Nin(values.into_iter().map(Into::into).collect()))
    }

    pub fn exists(self, path: impl Into<String>, exists: bool) -> Self {
        self.condition(path, Condition::Exists(exists))
    }

    pub fn type_is(self, path: impl Into<String>, bson_type: impl Into<Bson>) -> Self {
        self.condition(path, Condition::Type(bson_type.into()))
    }

    pub fn regex(self, path: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.regex_with_options(path, pattern, "")
    }

    pub fn regex_with_options(
        self,
        path: impl Into<String>,
        pattern: impl Into<String>,
        options: impl Into<String>,
    ) -> Self {
        let re = Regex {
            pattern: pattern.into(),
            options: options.into(),
        };
        self.condition(path, Condition::Regex(re))
    }

    /// The array field has exactly `size` elements.
    pub fn size(self, path: impl Into<String>, size: i64) -> Self {
        self.condition(path, Condition::Size(size))
    }

    /// The array field contains every one of `values`.
    pub fn all<I, V>(self, path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        self.condition(path, Condition::All(values.into_iter().map(Into::into).collect()))
    }

    /// Some element of the array field matches `filter`.
    pub fn elem_match(self, path: impl Into<String>, filter: Filter) -> Self {
        self.condition(path, Condition::ElemMatch(Box::new(filter)))
    }

    /// `field % divisor == remainder`.
    pub fn modulo(self, path: impl Into<String>, divisor: i64, remainder: i64) -> Self {
        self.condition(path, Condition::Mod { divisor, remainder })
    }

    /// The field does not satisfy `conditions`.
    pub fn not(self, path: impl Into<String>, conditions: Vec<Condition>) -> Self {
        self.condition(path, Condition::Not(conditions))
    }

    /// Match a document by `_id`.
    pub fn by_id(self, id: ObjectId) -> Self {
        self.eq("_id", id)
    }

    /// Every filter matches.
    pub fn and(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.clauses.push(Clause::And(filters.into_iter().collect()));
        self
    }

    /// At least one filter matches.
    pub fn or(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.clauses.push(Clause::Or(filters.into_iter().collect()));
        self
    }

    /// No filter matches.
    pub fn nor(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.clauses.push(Clause::Nor(filters.into_iter().collect()));
        self
    }

    /// An aggregation expression that must evaluate to true.
    pub fn expr(mut self, expr: impl Into<Expression>) -> Self {
        self.clauses.push(Clause::Expr(expr.into()));
        self
    }

    /// A `$text` search on the collection's text index.
    pub fn text(mut self, search: TextSearch) -> Self {
        self.clauses.push(Clause::Text(search));
        self
    }

    /// Encode the filter document.
    pub fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        let mut entries: Vec<(String, Bson)> = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            match clause {
                Clause::Field { path, conditions } => {
                    let value = match conditions.as_slice() {
                        [Condition::Eq(v)] if !needs_explicit_eq(v) => v.clone(),
                        _ => Bson::Document(encode_conditions(conditions, ctx)?),
                    };
                    entries.push((ctx.map_path(path).into_owned(), value));
                }
                Clause::And(filters) => {
                    entries.push(("$and".into(), encode_list("$and", filters, ctx)?))
                }
                Clause::Or(filters) => {
                    entries.push(("$or".into(), encode_list("$or", filters, ctx)?))
                }
                Clause::Nor(filters) => {
                    entries.push(("$nor".into(), encode_list("$nor", filters, ctx)?))
                }
                Clause::Expr(expr) => entries.push(("$expr".into(), expr.encode(ctx)?)),
                Clause::Text(search) => {
                    entries.push(("$text".into(), Bson::Document(search.to_document())))
                }
                Clause::Raw(doc) => {
                    entries.extend(doc.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        ensure_unique("$match", entries.iter().map(|(k, _)| k.as_str()))?;
        Ok(entries.into_iter().collect())
    }
}

fn encode_list(
    operator: &'static str,
    filters: &[Filter],
    ctx: &EncodeContext,
) -> EncodeResult<Bson> {
    if filters.is_empty() {
        return Err(EncodeError::shape(operator, "requires at least one filter"));
    }
    filters
        .iter()
        .map(|f| f.encode(ctx).map(Bson::Document))
        .collect::<EncodeResult<Vec<_>>>()
        .map(Bson::Array)
}

impl From<Document> for Filter {
    fn from(doc: Document) -> Self {
        Self::raw(doc)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::expr::comparison::gt;
    use crate::expr::field;
    use crate::schema::{EntitySchema, FieldSchema};

    fn enc(filter: Filter) -> Document {
        filter.encode(&EncodeContext::new()).unwrap()
    }

    #[test]
    fn test_lone_equality_is_bare() {
        assert_eq!(enc(Filter::new().eq("status", "A")), doc! { "status": "A" });
        assert_eq!(enc(Filter::new()), doc! {});
    }

    #[test]
    fn test_operator_like_equality_is_explicit() {
        assert_eq!(
            enc(Filter::new().eq("meta", doc! { "$gt": 5 })),
            doc! { "meta": { "$eq": { "$gt": 5 } } }
        );

        let re = Regex {
            pattern: "^a".into(),
            options: String::new(),
        };
        assert_eq!(
            enc(Filter::new().eq("name", re.clone())),
            doc! { "name": { "$eq": Bson::RegularExpression(re) } }
        );

        assert_eq!(
            enc(Filter::new().eq("meta", doc! { "kind": "a" })),
            doc! { "meta": { "kind": "a" } }
        );
    }

    #[test]
    fn test_empty_combinators_rejected() {
        let ctx = EncodeContext::new();
        for f in [
            Filter::new().and([]),
            Filter::new().or([]),
            Filter::new().nor([]),
        ] {
            assert!(f.encode(&ctx).unwrap_err().is_invalid_shape());
        }
    }

    #[test]
    fn test_conditions_on_one_field_merge() {
        let f = Filter::new().eq("qty", 5).gte("qty", 1).lt("qty", 10);
        assert_eq!(enc(f), doc! { "qty": { "$eq": 5, "$gte": 1, "$lt": 10 } });
    }

    #[test]
    fn test_array_conditions() {
        let f = Filter::new()
            .in_("status", ["A", "D"])
            .all("tags", ["red", "blank"])
            .size("dims", 2)
            .elem_match("results", Filter::new().gte("score", 80).lt("score", 85));
        assert_eq!(
            enc(f),
            doc! {
                "status": { "$in": ["A", "D"] },
                "tags": { "$all": ["red", "blank"] },
                "dims": { "$size": 2 },
                "results": { "$elemMatch": { "score": { "$gte": 80, "$lt": 85 } } },
            }
        );
    }

    #[test]
    fn test_logical_combinators() {
        let f = Filter::new()
            .eq("status", "A")
            .or([Filter::new().lt("qty", 30), Filter::new().regex("item", "^p")]);
        let re = Bson::RegularExpression(Regex {
            pattern: "^p".into(),
            options: String::new(),
        });
        assert_eq!(
            enc(f),
            doc! {
                "status": "A",
                "$or": [
                    { "qty": { "$lt": 30 } },
                    { "item": { "$regex": re } },
                ]
            }
        );
    }

    #[test]
    fn test_not_and_mod() {
        let f = Filter::new()
            .not("price", vec![Condition::Gt(Bson::Double(1.99))])
            .modulo("qty", 4, 0);
        assert_eq!(
            enc(f),
            doc! { "price": { "$not": { "$gt": 1.99 } }, "qty": { "$mod": [4, 0] } }
        );
    }

    #[test]
    fn test_expr_and_text() {
        let f = Filter::from_expr(gt(field("spent"), field("budget")))
            .text(TextSearch::new("coffee").language("en").case_sensitive(false));
        assert_eq!(
            enc(f),
            doc! {
                "$expr": { "$gt": ["$spent", "$budget"] },
                "$text": { "$search": "coffee", "$language": "en", "$caseSensitive": false },
            }
        );
    }

    #[test]
    fn test_duplicates_rejected() {
        let ctx = EncodeContext::new();
        let f = Filter::new().gt("qty", 1).gt("qty", 2);
        assert!(f.encode(&ctx).unwrap_err().is_duplicate_field());

        let f = Filter::new().expr(gt(field("a"), 1)).expr(gt(field("b"), 1));
        assert!(f.encode(&ctx).unwrap_err().is_duplicate_field());
    }

    #[test]
    fn test_paths_are_mapped() {
        let ctx = EncodeContext::for_schema(Arc::new(EntitySchema::new(
            "Order",
            "orders",
            vec![FieldSchema::new("id").stored_as("_id")],
        )));
        let oid = ObjectId::new();
        let f = Filter::new().eq("id", oid).exists("tags", true);
        assert_eq!(
            f.encode(&ctx).unwrap(),
            doc! { "_id": oid, "tags": { "$exists": true } }
        );
    }

    #[test]
    fn test_paths_colliding_after_mapping_rejected() {
        let ctx = EncodeContext::for_schema(Arc::new(EntitySchema::new(
            "Order",
            "orders",
            vec![FieldSchema::new("orderDate").stored_as("order_date")],
        )));
        let f = Filter::new().eq("orderDate", 1).eq("order_date", 2);
        assert!(f.encode(&ctx).unwrap_err().is_duplicate_field());
    }

    #[test]
    fn test_raw_filter() {
        let f: Filter = doc! { "$where": "this.a > 1" }.into();
        assert_eq!(enc(f), doc! { "$where": "this.a > 1" });
    }
}
