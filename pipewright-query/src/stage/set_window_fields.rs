//! `$setWindowFields`.

use bson::{Bson, Document};

use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult};
use crate::expr::Expression;
use crate::sort::Sort;
use crate::window::{Window, WindowKind};

const STAGE: &str = "$setWindowFields";

/// One output of `$setWindowFields`: a window or accumulator operator and
/// the frame it runs over.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOutput {
    function: Expression,
    window: Option<Window>,
}

impl WindowOutput {
    /// Run `function` over the whole partition.
    pub fn new(function: impl Into<Expression>) -> Self {
        Self {
            function: function.into(),
            window: None,
        }
    }

    pub fn window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    fn encode(
        &self,
        field: &str,
        sorted_by: Option<&Sort>,
        ctx: &EncodeContext,
    ) -> EncodeResult<Document> {
        let Some(op) = self.function.op() else {
            return Err(EncodeError::stage(
                STAGE,
                format!("output '{}' must be an operator expression", field),
            ));
        };
        if op.requires_sort_by() && sorted_by.is_none() {
            return Err(EncodeError::stage(
                STAGE,
                format!("{} in '{}' requires sortBy", op.name(), field),
            ));
        }

        let mut out = match self.function.encode(ctx)? {
            Bson::Document(doc) => doc,
            other => {
                return Err(EncodeError::stage(
                    STAGE,
                    format!("output '{}' encoded to {:?}, not a document", field, other),
                ));
            }
        };
        if let Some(window) = &self.window {
            if !op.accepts_window() {
                return Err(EncodeError::stage(
                    STAGE,
                    format!("{} in '{}' does not accept a window", op.name(), field),
                ));
            }
            if window.kind() == WindowKind::Range && sorted_by.is_none_or(|s| s.keys().len() != 1)
            {
                return Err(EncodeError::stage(
                    STAGE,
                    format!("range window in '{}' requires exactly one sortBy field", field),
                ));
            }
            out.insert("window", window.encode()?);
        }
        Ok(out)
    }
}

/// Compute fields from a window of neighbouring documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetWindowFields {
    partition_by: Option<Expression>,
    sort_by: Option<Sort>,
    output: Vec<(String, WindowOutput)>,
}

impl SetWindowFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group documents into partitions; one partition when unset.
    pub fn partition_by(mut self, expr: impl Into<Expression>) -> Self {
        self.partition_by = Some(expr.into());
        self
    }

    pub fn sort_by(mut self, sort: Sort) -> Self {
        self.sort_by = Some(sort);
        self
    }

    /// Add an output field computed over the whole partition.
    pub fn output(self, field: impl Into<String>, function: impl Into<Expression>) -> Self {
        self.output_spec(field, WindowOutput::new(function))
    }

    /// Add an output field computed over `window`.
    pub fn output_over(
        self,
        field: impl Into<String>,
        function: impl Into<Expression>,
        window: Window,
    ) -> Self {
        self.output_spec(field, WindowOutput::new(function).window(window))
    }

    pub fn output_spec(mut self, field: impl Into<String>, output: WindowOutput) -> Self {
        self.output.push((field.into(), output));
        self
    }

    pub(crate) fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        if self.output.is_empty() {
            return Err(EncodeError::stage(STAGE, "at least one output field is required"));
        }
        let names = ctx.map_names(STAGE, self.output.iter().map(|(k, _)| k.as_str()))?;

        let mut out = Document::new();
        if let Some(partition) = &self.partition_by {
            out.insert("partitionBy", partition.encode(ctx)?);
        }
        if let Some(sort) = &self.sort_by {
            out.insert("sortBy", sort.encode(ctx)?);
        }
        let mut output = Document::new();
        for (name, (field, spec)) in names.into_iter().zip(&self.output) {
            output.insert(name, spec.encode(field, self.sort_by.as_ref(), ctx)?);
        }
        out.insert("output", output);
        Ok(out)
    }
}
