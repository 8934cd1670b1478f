//! `$lookup`, `$graphLookup` and `$unionWith`.
//!
//! These stages read another collection, so their sub-pipelines and
//! foreign-side paths are encoded without the current entity's field
//! mapping. Only paths of the input documents (`localField`, `let`,
//! `startWith`) go through the context.

use bson::{Bson, Document};

use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult, ensure_unique};
use crate::expr::Expression;
use crate::filter::Filter;
use crate::pipeline::Pipeline;
use crate::stage::Stage;

fn encode_pipeline(pipeline: &Pipeline, ctx: &EncodeContext) -> EncodeResult<Bson> {
    Ok(Bson::Array(
        pipeline
            .encode(&ctx.unmapped())?
            .into_iter()
            .map(Bson::Document)
            .collect(),
    ))
}

/// A left outer join with another collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    from: Option<String>,
    local_field: Option<String>,
    foreign_field: Option<String>,
    let_vars: Vec<(String, Expression)>,
    pipeline: Option<Pipeline>,
    as_: String,
}

impl Lookup {
    /// Join `from` and store the matches in the array field `as_`.
    pub fn new(from: impl Into<String>, as_: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            local_field: None,
            foreign_field: None,
            let_vars: Vec::new(),
            pipeline: None,
            as_: as_.into(),
        }
    }

    /// A lookup whose pipeline produces its own input with `$documents`.
    pub fn without_collection(as_: impl Into<String>) -> Self {
        Self {
            from: None,
            ..Self::new(String::new(), as_)
        }
    }

    /// Equality match between a local and a foreign field.
    pub fn on(mut self, local_field: impl Into<String>, foreign_field: impl Into<String>) -> Self {
        self.local_field = Some(local_field.into());
        self.foreign_field = Some(foreign_field.into());
        self
    }

    /// Bind a variable visible to the sub-pipeline as `$$name`.
    pub fn let_var(mut self, name: impl Into<String>, value: impl Into<Expression>) -> Self {
        self.let_vars.push((name.into(), value.into()));
        self
    }

    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub(crate) fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        if self.as_.is_empty() {
            return Err(EncodeError::stage("$lookup", "'as' is required"));
        }
        if self.local_field.is_none() && self.pipeline.is_none() {
            return Err(EncodeError::stage(
                "$lookup",
                "either localField/foreignField or a pipeline is required",
            ));
        }
        if self.from.is_none() {
            let starts_with_documents = self
                .pipeline
                .as_ref()
                .and_then(Pipeline::first)
                .is_some_and(|s| matches!(s, Stage::Documents(_)));
            if !starts_with_documents {
                return Err(EncodeError::stage(
                    "$lookup",
                    "'from' may only be omitted when the pipeline starts with $documents",
                ));
            }
        }
        if !self.let_vars.is_empty() && self.pipeline.is_none() {
            return Err(EncodeError::stage("$lookup", "'let' requires a pipeline"));
        }

        let mut out = Document::new();
        if let Some(from) = &self.from {
            out.insert("from", from.as_str());
        }
        if let (Some(local), Some(foreign)) = (&self.local_field, &self.foreign_field) {
            out.insert("localField", ctx.map_path(local).into_owned());
            out.insert("foreignField", foreign.as_str());
        }
        if !self.let_vars.is_empty() {
            ensure_unique("$lookup", self.let_vars.iter().map(|(k, _)| k.as_str()))?;
            let mut vars = Document::new();
            for (name, value) in &self.let_vars {
                vars.insert(name.as_str(), value.encode(ctx)?);
            }
            out.insert("let", vars);
        }
        if let Some(pipeline) = &self.pipeline {
            out.insert("pipeline", encode_pipeline(pipeline, ctx)?);
        }
        out.insert("as", self.as_.as_str());
        Ok(out)
    }
}

/// A recursive search over a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphLookup {
    from: String,
    start_with: Expression,
    connect_from_field: String,
    connect_to_field: String,
    as_: String,
    max_depth: Option<i64>,
    depth_field: Option<String>,
    restrict_search_with_matches: Option<Filter>,
}

impl GraphLookup {
    pub fn new(
        from: impl Into<String>,
        start_with: impl Into<Expression>,
        connect_from_field: impl Into<String>,
        connect_to_field: impl Into<String>,
        as_: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            start_with: start_with.into(),
            connect_from_field: connect_from_field.into(),
            connect_to_field: connect_to_field.into(),
            as_: as_.into(),
            max_depth: None,
            depth_field: None,
            restrict_search_with_matches: None,
        }
    }

    /// Maximum recursion depth; 0 stops after the first match.
    pub fn max_depth(mut self, depth: i64) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn depth_field(mut self, field: impl Into<String>) -> Self {
        self.depth_field = Some(field.into());
        self
    }

    pub fn restrict_search_with_matches(mut self, filter: impl Into<Filter>) -> Self {
        self.restrict_search_with_matches = Some(filter.into());
        self
    }

    pub(crate) fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Document> {
        for (key, value) in [
            ("from", &self.from),
            ("connectFromField", &self.connect_from_field),
            ("connectToField", &self.connect_to_field),
            ("as", &self.as_),
        ] {
            if value.is_empty() {
                return Err(EncodeError::stage("$graphLookup", format!("'{}' is required", key)));
            }
        }

        let mut out = Document::new();
        out.insert("from", self.from.as_str());
        out.insert("startWith", self.start_with.encode(ctx)?);
        out.insert("connectFromField", self.connect_from_field.as_str());
        out.insert("connectToField", self.connect_to_field.as_str());
        out.insert("as", self.as_.as_str());
        if let Some(depth) = self.max_depth {
            if depth < 0 {
                return Err(EncodeError::stage("$graphLookup", "maxDepth cannot be negative"));
            }
            out.insert("maxDepth", super::int(depth));
        }
        if let Some(field) = &self.depth_field {
            out.insert("depthField", field.as_str());
        }
        if let Some(filter) = &self.restrict_search_with_matches {
            out.insert("restrictSearchWithMatches", filter.encode(&ctx.unmapped())?);
        }
        Ok(out)
    }
}

/// Append the documents of another collection.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionWith {
    collection: String,
    pipeline: Option<Pipeline>,
}

impl UnionWith {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            pipeline: None,
        }
    }

    /// Transform the other collection's documents before the union.
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// The collection name alone when there is no pipeline.
    pub(crate) fn encode(&self) -> EncodeResult<Bson> {
        if self.collection.is_empty() {
            return Err(EncodeError::stage("$unionWith", "a collection is required"));
        }
        match &self.pipeline {
            None => Ok(Bson::String(self.collection.clone())),
            Some(pipeline) => {
                let mut out = Document::new();
                out.insert("coll", self.collection.as_str());
                out.insert("pipeline", encode_pipeline(pipeline, &EncodeContext::new())?);
                Ok(Bson::Document(out))
            }
        }
    }
}
