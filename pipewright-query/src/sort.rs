//! Sort specifications.

use bson::{Bson, Document, doc};

use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult};
use crate::expr::Expression;

/// Sort direction for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Ascending (`1`).
    Ascending,
    /// Descending (`-1`).
    Descending,
    /// By text search relevance (`{ "$meta": "textScore" }`).
    TextScore,
}

impl SortOrder {
    fn to_bson(self) -> Bson {
        match self {
            Self::Ascending => Bson::Int32(1),
            Self::Descending => Bson::Int32(-1),
            Self::TextScore => Bson::Document(doc! { "$meta": "textScore" }),
        }
    }
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    keys: Vec<(String, SortOrder)>,
}

impl Sort {
    /// Create an empty sort.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by a single key.
    pub fn by(path: impl Into<String>, order: SortOrder) -> Self {
        Self::new().then(path, order)
    }

    /// Append a key.
    pub fn then(mut self, path: impl Into<String>, order: SortOrder) -> Self {
        self.keys.push((path.into(), order));
        self
    }

    /// Append an ascending key.
    pub fn ascending(self, path: impl Into<String>) -> Self {
        self.then(path, SortOrder::Ascending)
    }

    /// Append a descending key.
    pub fn descending(self, path: impl Into<String>) -> Self {
        self.then(path, SortOrder::Descending)
    }

    /// Append a text score key.
    pub fn text_score(self, path: impl Into<String>) -> Self {
        self.then(path, SortOrder::TextScore)
    }

    pub fn keys(&self) -> &[(String, SortOrder)] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Encode the sort document, mapping paths through the context.
    pub fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        if self.keys.is_empty() {
            return Err(EncodeError::stage("$sort", "at least one sort key is required"));
        }
        let paths = ctx.map_names("$sort", self.keys.iter().map(|(k, _)| k.as_str()))?;

        let mut out = Document::new();
        for (path, (_, order)) in paths.into_iter().zip(&self.keys) {
            out.insert(path, order.to_bson());
        }
        Ok(out)
    }
}

/// A sort over array elements (`sortBy` of `$sortArray`). Paths name element
/// fields, so they are written as given. Repeated keys fail at encode time.
impl From<Sort> for Expression {
    fn from(sort: Sort) -> Self {
        Expression::Document(
            sort.keys
                .into_iter()
                .map(|(k, order)| (k, Expression::Value(order.to_bson())))
                .collect(),
        )
    }
}
