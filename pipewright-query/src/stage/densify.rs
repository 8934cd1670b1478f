//! `$densify` and `$fill`.

use bson::{Bson, Document, doc};

use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult};
use crate::expr::Expression;
use crate::sort::Sort;
use crate::window::TimeUnit;

/// Which values `$densify` fills in.
#[derive(Debug, Clone, PartialEq)]
pub enum DensifyBounds {
    /// Across the full range of the field in the collection.
    Full,
    /// Within each partition's own range.
    Partition,
    /// Within `[lower, upper)`.
    Range(Bson, Bson),
}

/// Create documents for missing values of a numeric or date field.
#[derive(Debug, Clone, PartialEq)]
pub struct Densify {
    field: String,
    partition_by_fields: Vec<String>,
    step: Bson,
    unit: Option<TimeUnit>,
    bounds: DensifyBounds,
}

impl Densify {
    /// Densify `field` in increments of `step`.
    pub fn new(field: impl Into<String>, step: impl Into<Bson>, bounds: DensifyBounds) -> Self {
        Self {
            field: field.into(),
            partition_by_fields: Vec::new(),
            step: step.into(),
            unit: None,
            bounds,
        }
    }

    /// Unit of `step`; required when the field holds dates.
    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn partition_by_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_by_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        let positive = match self.step {
            Bson::Int32(n) => n > 0,
            Bson::Int64(n) => n > 0,
            Bson::Double(n) => n > 0.0,
            _ => false,
        };
        if !positive {
            return Err(EncodeError::stage("$densify", "step must be a positive number"));
        }

        let mut range = doc! { "step": self.step.clone() };
        if let Some(unit) = self.unit {
            range.insert("unit", unit.as_str());
        }
        let bounds = match &self.bounds {
            DensifyBounds::Full => Bson::String("full".into()),
            DensifyBounds::Partition => Bson::String("partition".into()),
            DensifyBounds::Range(lower, upper) => Bson::Array(vec![lower.clone(), upper.clone()]),
        };
        range.insert("bounds", bounds);

        let mut out = Document::new();
        out.insert("field", ctx.map_path(&self.field).into_owned());
        if !self.partition_by_fields.is_empty() {
            let fields: Vec<Bson> = self
                .partition_by_fields
                .iter()
                .map(|f| Bson::String(ctx.map_path(f).into_owned()))
                .collect();
            out.insert("partitionByFields", fields);
        }
        out.insert("range", range);
        Ok(out)
    }
}

/// How `$fill` populates one output field.
#[derive(Debug, Clone, PartialEq)]
pub enum FillMethod {
    /// A fixed value or expression.
    Value(Expression),
    /// Last observation carried forward.
    Locf,
    /// Linear interpolation.
    Linear,
}

/// Populate null and missing field values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fill {
    partition_by: Option<Expression>,
    partition_by_fields: Vec<String>,
    sort_by: Option<Sort>,
    output: Vec<(String, FillMethod)>,
}

impl Fill {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition_by(mut self, expr: impl Into<Expression>) -> Self {
        self.partition_by = Some(expr.into());
        self
    }

    pub fn partition_by_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_by_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Order within each partition; required by `locf` and `linear`.
    pub fn sort_by(mut self, sort: Sort) -> Self {
        self.sort_by = Some(sort);
        self
    }

    pub fn output(mut self, field: impl Into<String>, method: FillMethod) -> Self {
        self.output.push((field.into(), method));
        self
    }

    /// Shorthand for a [`FillMethod::Value`] output.
    pub fn value(self, field: impl Into<String>, value: impl Into<Expression>) -> Self {
        self.output(field, FillMethod::Value(value.into()))
    }

    pub(crate) fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        if self.output.is_empty() {
            return Err(EncodeError::stage("$fill", "at least one output field is required"));
        }
        if self.partition_by.is_some() && !self.partition_by_fields.is_empty() {
            return Err(EncodeError::stage(
                "$fill",
                "partitionBy cannot be combined with partitionByFields",
            ));
        }
        let needs_sort = self
            .output
            .iter()
            .any(|(_, m)| matches!(m, FillMethod::Locf | FillMethod::Linear));
        if needs_sort && self.sort_by.is_none() {
            return Err(EncodeError::stage("$fill", "locf and linear fills require sortBy"));
        }
        let names = ctx.map_names("$fill", self.output.iter().map(|(k, _)| k.as_str()))?;

        let mut out = Document::new();
        if let Some(partition) = &self.partition_by {
            out.insert("partitionBy", partition.encode(ctx)?);
        }
        if !self.partition_by_fields.is_empty() {
            let fields: Vec<Bson> = self
                .partition_by_fields
                .iter()
                .map(|f| Bson::String(ctx.map_path(f).into_owned()))
                .collect();
            out.insert("partitionByFields", fields);
        }
        if let Some(sort) = &self.sort_by {
            out.insert("sortBy", sort.encode(ctx)?);
        }

        let mut output = Document::new();
        for (name, (_, method)) in names.into_iter().zip(&self.output) {
            let spec = match method {
                FillMethod::Value(expr) => doc! { "value": expr.encode(ctx)? },
                FillMethod::Locf => doc! { "method": "locf" },
                FillMethod::Linear => doc! { "method": "linear" },
            };
            output.insert(name, spec);
        }
        out.insert("output", output);
        Ok(out)
    }
}
