//! Encoding context.

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::{EncodeResult, ensure_unique};
use crate::schema::EntitySchema;

/// State carried through one encoding pass.
///
/// With an entity schema attached, the first segment of every field path
/// written by the encoder is translated to its stored name. Without one, paths
/// are written unchanged.
#[derive(Debug, Clone, Default)]
pub struct EncodeContext {
    schema: Option<Arc<EntitySchema>>,
}

impl EncodeContext {
    /// A context without field mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context mapping field paths through `schema`.
    pub fn for_schema(schema: Arc<EntitySchema>) -> Self {
        Self {
            schema: Some(schema),
        }
    }

    /// The active entity schema.
    pub fn schema(&self) -> Option<&EntitySchema> {
        self.schema.as_deref()
    }

    /// A context for sub-pipelines that read another collection.
    pub fn unmapped(&self) -> Self {
        Self::new()
    }

    /// Translate a field path to its stored form.
    pub fn map_path<'a>(&self, path: &'a str) -> Cow<'a, str> {
        let Some(schema) = &self.schema else {
            return Cow::Borrowed(path);
        };
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        match schema.stored_name(head) {
            Some(stored) if stored != head => match rest {
                Some(rest) => Cow::Owned(format!("{}.{}", stored, rest)),
                None => Cow::Owned(stored.to_string()),
            },
            _ => Cow::Borrowed(path),
        }
    }

    /// Map a stage's output names, rejecting names that collide once mapped.
    pub(crate) fn map_names<'a>(
        &self,
        stage: &'static str,
        names: impl IntoIterator<Item = &'a str>,
    ) -> EncodeResult<Vec<String>> {
        let mapped: Vec<String> = names
            .into_iter()
            .map(|name| self.map_path(name).into_owned())
            .collect();
        ensure_unique(stage, mapped.iter().map(String::as_str))?;
        Ok(mapped)
    }
}
