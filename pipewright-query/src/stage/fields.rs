//! `$addFields`, `$set` and `$unset`.

use bson::{Bson, Document};

use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult};
use crate::expr::Expression;

/// Output fields of `$addFields` or `$set`, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    fields: Vec<(String, Expression)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite `name` with the value of `expr`.
    pub fn field(mut self, name: impl Into<String>, expr: impl Into<Expression>) -> Self {
        self.fields.push((name.into(), expr.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn encode(&self, stage: &'static str, ctx: &EncodeContext) -> EncodeResult<Document> {
        if self.fields.is_empty() {
            return Err(EncodeError::stage(stage, "at least one field is required"));
        }
        let names = ctx.map_names(stage, self.fields.iter().map(|(k, _)| k.as_str()))?;

        let mut out = Document::new();
        for (name, (_, expr)) in names.into_iter().zip(&self.fields) {
            out.insert(name, expr.encode(ctx)?);
        }
        Ok(out)
    }
}

impl<K, E> FromIterator<(K, E)> for Fields
where
    K: Into<String>,
    E: Into<Expression>,
{
    fn from_iter<I: IntoIterator<Item = (K, E)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Fields removed by `$unset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unset {
    paths: Vec<String>,
}

impl Unset {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// A single path encodes as a string, several as an array.
    pub(crate) fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Bson> {
        if self.paths.is_empty() {
            return Err(EncodeError::stage("$unset", "at least one field is required"));
        }
        let mut mapped: Vec<Bson> = ctx
            .map_names("$unset", self.paths.iter().map(String::as_str))?
            .into_iter()
            .map(Bson::String)
            .collect();
        Ok(if mapped.len() == 1 {
            mapped.remove(0)
        } else {
            Bson::Array(mapped)
        })
    }
}
