//! `$group`.

use bson::{Bson, Document};

use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult};
use crate::expr::Expression;

/// A `$group` stage: one output document per distinct `_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    id: Option<Expression>,
    fields: Vec<(String, Expression)>,
}

impl Group {
    /// Group by the value of `id`.
    pub fn new(id: impl Into<Expression>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Vec::new(),
        }
    }

    /// Group every input document together (`_id: null`).
    pub fn all() -> Self {
        Self {
            id: None,
            fields: Vec::new(),
        }
    }

    /// Add an output field computed by an accumulator.
    pub fn field(mut self, name: impl Into<String>, accumulator: impl Into<Expression>) -> Self {
        self.fields.push((name.into(), accumulator.into()));
        self
    }

    pub(crate) fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        let names = output_names("$group", &self.fields, ctx)?;

        let mut out = Document::new();
        let id = match &self.id {
            Some(id) => id.encode(ctx)?,
            None => Bson::Null,
        };
        out.insert("_id", id);
        for (name, (_, accumulator)) in names.into_iter().zip(&self.fields) {
            out.insert(name, accumulator.encode(ctx)?);
        }
        Ok(out)
    }
}

/// Output names of grouping stages, mapped like every later reference to
/// them. Names must not be `_id` nor contain `.`, and stay unique once mapped.
pub(super) fn output_names(
    stage: &'static str,
    fields: &[(String, Expression)],
    ctx: &EncodeContext,
) -> EncodeResult<Vec<String>> {
    for (name, _) in fields {
        if name == "_id" {
            return Err(EncodeError::stage(stage, "'_id' is reserved for the group key"));
        }
        if name.is_empty() || name.contains('.') {
            return Err(EncodeError::stage(
                stage,
                format!("'{}' is not a valid output field name", name),
            ));
        }
    }
    ctx.map_names(stage, fields.iter().map(|(k, _)| k.as_str()))
}
