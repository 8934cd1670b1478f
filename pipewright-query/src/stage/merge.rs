//! `$merge` and `$out`.

use bson::{Bson, Document, doc};

use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult, ensure_unique};
use crate::expr::Expression;
use crate::pipeline::Pipeline;

/// Target collection of `$merge`, optionally in another database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeTarget {
    db: Option<String>,
    collection: String,
}

impl MergeTarget {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            db: None,
            collection: collection.into(),
        }
    }

    pub fn in_db(db: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            db: Some(db.into()),
            collection: collection.into(),
        }
    }

    fn encode(&self) -> EncodeResult<Bson> {
        if self.collection.is_empty() {
            return Err(EncodeError::stage("$merge", "a target collection is required"));
        }
        Ok(match &self.db {
            None => Bson::String(self.collection.clone()),
            Some(db) => Bson::Document(doc! { "db": db.as_str(), "coll": self.collection.as_str() }),
        })
    }
}

impl From<&str> for MergeTarget {
    fn from(collection: &str) -> Self {
        Self::collection(collection)
    }
}

impl From<String> for MergeTarget {
    fn from(collection: String) -> Self {
        Self::collection(collection)
    }
}

/// What `$merge` does when a result matches an existing document.
#[derive(Debug, Clone, PartialEq)]
pub enum WhenMatched {
    Replace,
    KeepExisting,
    Merge,
    Fail,
    /// Update the existing document with a pipeline; `$$new` is the result.
    Pipeline(Pipeline),
}

/// What `$merge` does when a result matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenNotMatched {
    Insert,
    Discard,
    Fail,
}

impl WhenNotMatched {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Discard => "discard",
            Self::Fail => "fail",
        }
    }
}

/// Write the pipeline results into a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    into: MergeTarget,
    on: Vec<String>,
    let_vars: Vec<(String, Expression)>,
    when_matched: Option<WhenMatched>,
    when_not_matched: Option<WhenNotMatched>,
}

impl Merge {
    pub fn new(target: impl Into<MergeTarget>) -> Self {
        Self {
            into: target.into(),
            on: Vec::new(),
            let_vars: Vec::new(),
            when_matched: None,
            when_not_matched: None,
        }
    }

    /// Fields identifying a matching document; defaults to `_id`.
    pub fn on<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Bind a variable for a pipeline `whenMatched`.
    pub fn let_var(mut self, name: impl Into<String>, value: impl Into<Expression>) -> Self {
        self.let_vars.push((name.into(), value.into()));
        self
    }

    pub fn when_matched(mut self, action: WhenMatched) -> Self {
        self.when_matched = Some(action);
        self
    }

    pub fn when_not_matched(mut self, action: WhenNotMatched) -> Self {
        self.when_not_matched = Some(action);
        self
    }

    /// The target collection alone when nothing else is set.
    pub(crate) fn encode(&self) -> EncodeResult<Bson> {
        let into = self.into.encode()?;
        if self.on.is_empty()
            && self.let_vars.is_empty()
            && self.when_matched.is_none()
            && self.when_not_matched.is_none()
        {
            return Ok(into);
        }

        let pipeline_update = matches!(self.when_matched, Some(WhenMatched::Pipeline(_)));
        if !self.let_vars.is_empty() && !pipeline_update {
            return Err(EncodeError::stage(
                "$merge",
                "'let' is only allowed with a pipeline whenMatched",
            ));
        }
        ensure_unique("$merge", self.on.iter().map(String::as_str))?;

        // The output goes to another collection; nothing here reads the
        // current entity's fields.
        let ctx = EncodeContext::new();
        let mut out = Document::new();
        out.insert("into", into);
        match self.on.as_slice() {
            [] => {}
            [single] => {
                out.insert("on", single.as_str());
            }
            many => {
                out.insert("on", many.to_vec());
            }
        }
        if !self.let_vars.is_empty() {
            ensure_unique("$merge", self.let_vars.iter().map(|(k, _)| k.as_str()))?;
            let mut vars = Document::new();
            for (name, value) in &self.let_vars {
                vars.insert(name.as_str(), value.encode(&ctx)?);
            }
            out.insert("let", vars);
        }
        if let Some(action) = &self.when_matched {
            let action = match action {
                WhenMatched::Replace => Bson::String("replace".into()),
                WhenMatched::KeepExisting => Bson::String("keepExisting".into()),
                WhenMatched::Merge => Bson::String("merge".into()),
                WhenMatched::Fail => Bson::String("fail".into()),
                WhenMatched::Pipeline(pipeline) => Bson::Array(
                    pipeline
                        .encode(&ctx)?
                        .into_iter()
                        .map(Bson::Document)
                        .collect(),
                ),
            };
            out.insert("whenMatched", action);
        }
        if let Some(action) = self.when_not_matched {
            out.insert("whenNotMatched", action.as_str());
        }
        Ok(Bson::Document(out))
    }
}

/// Replace a collection with the pipeline results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Out {
    db: Option<String>,
    collection: String,
}

impl Out {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            db: None,
            collection: collection.into(),
        }
    }

    /// Write to a collection of another database.
    pub fn db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub(crate) fn encode(&self) -> Bson {
        match &self.db {
            None => Bson::String(self.collection.clone()),
            Some(db) => Bson::Document(doc! { "db": db.as_str(), "coll": self.collection.as_str() }),
        }
    }
}

impl From<&str> for Out {
    fn from(collection: &str) -> Self {
        Self::new(collection)
    }
}

impl From<String> for Out {
    fn from(collection: String) -> Self {
        Self::new(collection)
    }
}
