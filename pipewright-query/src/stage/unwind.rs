//! `$unwind`.

use bson::{Bson, Document};

use crate::context::EncodeContext;

/// Deconstruct an array field into one document per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unwind {
    path: String,
    include_array_index: Option<String>,
    preserve_null_and_empty_arrays: Option<bool>,
}

impl Unwind {
    /// Unwind `path`; a leading `$` is accepted.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: path.strip_prefix('$').map(str::to_string).unwrap_or(path),
            include_array_index: None,
            preserve_null_and_empty_arrays: None,
        }
    }

    /// Store each element's array index in this field.
    pub fn include_array_index(mut self, field: impl Into<String>) -> Self {
        self.include_array_index = Some(field.into());
        self
    }

    /// Emit a document even when the array is null, missing or empty.
    pub fn preserve_null_and_empty_arrays(mut self, preserve: bool) -> Self {
        self.preserve_null_and_empty_arrays = Some(preserve);
        self
    }

    /// Bare `"$path"` without options, the document form otherwise.
    pub(crate) fn encode(&self, ctx: &EncodeContext) -> Bson {
        let path = format!("${}", ctx.map_path(&self.path));
        if self.include_array_index.is_none() && self.preserve_null_and_empty_arrays.is_none() {
            return Bson::String(path);
        }

        let mut out = Document::new();
        out.insert("path", path);
        if let Some(index) = &self.include_array_index {
            out.insert("includeArrayIndex", index.as_str());
        }
        if let Some(preserve) = self.preserve_null_and_empty_arrays {
            out.insert("preserveNullAndEmptyArrays", preserve);
        }
        Bson::Document(out)
    }
}

impl From<&str> for Unwind {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Unwind {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}
