//! Errors raised while encoding expressions, stages and pipelines.
//!
//! Encoding is the only place these are produced: builders never fail, so a
//! malformed tree surfaces here, when the pipeline is turned into documents.

use thiserror::Error;

/// Result type for encoding operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Errors that can occur while encoding to BSON.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// An operator was given the wrong operands or conflicting options.
    #[error("invalid expression shape for {operator}: {reason}")]
    InvalidExpressionShape {
        /// Operator name, `$`-prefixed.
        operator: &'static str,
        /// What is wrong with the invocation.
        reason: String,
    },

    /// A projection both includes and excludes non-identifier fields.
    #[error("projection cannot mix inclusion ({included}) and exclusion ({excluded})")]
    MixedProjection {
        /// First included or computed field.
        included: String,
        /// First excluded field.
        excluded: String,
    },

    /// An output field name appears twice in one stage.
    #[error("duplicate field '{field}' in {stage}")]
    DuplicateField {
        /// Stage operator name.
        stage: &'static str,
        /// The repeated field.
        field: String,
    },

    /// A window's lower bound comes after its upper bound.
    #[error("invalid window bounds [{lower}, {upper}]")]
    InvalidWindowBounds {
        /// Lower bound as written.
        lower: String,
        /// Upper bound as written.
        upper: String,
    },

    /// A stage is missing required settings or holds invalid ones.
    #[error("invalid {stage} stage: {reason}")]
    InvalidStage {
        /// Stage operator name.
        stage: &'static str,
        /// What is wrong with the stage.
        reason: String,
    },

    /// A host value could not be converted to BSON.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl EncodeError {
    /// Create an invalid expression shape error.
    pub fn shape(operator: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidExpressionShape {
            operator,
            reason: reason.into(),
        }
    }

    /// Create an invalid stage error.
    pub fn stage(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidStage {
            stage,
            reason: reason.into(),
        }
    }

    /// Create a duplicate field error.
    pub fn duplicate(stage: &'static str, field: impl Into<String>) -> Self {
        Self::DuplicateField {
            stage,
            field: field.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this is an invalid expression shape error.
    pub fn is_invalid_shape(&self) -> bool {
        matches!(self, Self::InvalidExpressionShape { .. })
    }

    /// Check if this is a mixed projection error.
    pub fn is_mixed_projection(&self) -> bool {
        matches!(self, Self::MixedProjection { .. })
    }

    /// Check if this is a duplicate field error.
    pub fn is_duplicate_field(&self) -> bool {
        matches!(self, Self::DuplicateField { .. })
    }

    /// Check if this is an invalid stage error.
    pub fn is_invalid_stage(&self) -> bool {
        matches!(self, Self::InvalidStage { .. })
    }
}

impl From<bson::ser::Error> for EncodeError {
    fn from(err: bson::ser::Error) -> Self {
        EncodeError::Serialization(err.to_string())
    }
}

/// Reject repeated names in a stage's output mapping.
pub(crate) fn ensure_unique<'a>(
    stage: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> EncodeResult<()> {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(EncodeError::duplicate(stage, name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = EncodeError::shape("$filter", "missing 'cond'");
        assert!(err.is_invalid_shape());

        let err = EncodeError::stage("$limit", "limit must be positive");
        assert!(err.is_invalid_stage());

        let err = EncodeError::duplicate("$group", "total");
        assert!(err.is_duplicate_field());
    }

    #[test]
    fn test_error_display() {
        let err = EncodeError::shape("$subtract", "expected 2 operands, got 3");
        assert_eq!(
            err.to_string(),
            "invalid expression shape for $subtract: expected 2 operands, got 3"
        );

        let err = EncodeError::MixedProjection {
            included: "a".into(),
            excluded: "b".into(),
        };
        assert_eq!(
            err.to_string(),
            "projection cannot mix inclusion (a) and exclusion (b)"
        );
    }

    #[test]
    fn test_ensure_unique() {
        assert!(ensure_unique("$addFields", ["a", "b", "c"]).is_ok());

        let err = ensure_unique("$addFields", ["a", "b", "a"]).unwrap_err();
        assert_eq!(err, EncodeError::duplicate("$addFields", "a"));
    }
}
