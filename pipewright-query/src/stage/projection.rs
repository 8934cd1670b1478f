//! `$project`.

use bson::{Bson, Document};

use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult};
use crate::expr::Expression;

/// What a projection does with one field.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionItem {
    /// Keep the field (`1`).
    Include,
    /// Drop the field (`0`).
    Exclude,
    /// Set the field to a computed value.
    Computed(Expression),
}

/// A `$project` stage.
///
/// Inclusions and computed fields cannot be combined with exclusions, except
/// for suppressing `_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    items: Vec<(String, ProjectionItem)>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(self, path: impl Into<String>) -> Self {
        self.item(path, ProjectionItem::Include)
    }

    pub fn exclude(self, path: impl Into<String>) -> Self {
        self.item(path, ProjectionItem::Exclude)
    }

    /// Shorthand for `exclude("_id")`.
    pub fn exclude_id(self) -> Self {
        self.exclude("_id")
    }

    pub fn compute(self, path: impl Into<String>, expr: impl Into<Expression>) -> Self {
        self.item(path, ProjectionItem::Computed(expr.into()))
    }

    pub fn item(mut self, path: impl Into<String>, item: ProjectionItem) -> Self {
        self.items.push((path.into(), item));
        self
    }

    pub fn items(&self) -> &[(String, ProjectionItem)] {
        &self.items
    }

    /// Reject mixed inclusion and exclusion.
    pub fn validate(&self) -> EncodeResult<()> {
        let mut included = None;
        let mut excluded = None;
        for (path, item) in &self.items {
            if path == "_id" {
                continue;
            }
            match item {
                ProjectionItem::Exclude => excluded = excluded.or(Some(path)),
                _ => included = included.or(Some(path)),
            }
        }
        if let (Some(included), Some(excluded)) = (included, excluded) {
            return Err(EncodeError::MixedProjection {
                included: included.clone(),
                excluded: excluded.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        if self.items.is_empty() {
            return Err(EncodeError::stage("$project", "at least one field is required"));
        }
        self.validate()?;
        let paths = ctx.map_names("$project", self.items.iter().map(|(k, _)| k.as_str()))?;

        let mut out = Document::new();
        for (path, (_, item)) in paths.into_iter().zip(&self.items) {
            let value = match item {
                ProjectionItem::Include => Bson::Int32(1),
                ProjectionItem::Exclude => Bson::Int32(0),
                ProjectionItem::Computed(Expression::Value(v)) if reads_as_flag(v) => {
                    Expression::Literal(v.clone()).encode(ctx)?
                }
                ProjectionItem::Computed(expr) => expr.encode(ctx)?,
            };
            out.insert(path, value);
        }
        Ok(out)
    }
}

/// Constants the server would read as an inclusion or exclusion flag.
fn reads_as_flag(v: &Bson) -> bool {
    matches!(
        v,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) | Bson::Boolean(_)
    )
}
