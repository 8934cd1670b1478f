//! Window frames for `$setWindowFields`.
//!
//! A [`Window`] bounds the documents a window function sees, either by
//! position relative to the current document (`documents`) or by the value of
//! the `sortBy` field (`range`, optionally measured in a [`TimeUnit`]).
//!
//! ```rust
//! use pipewright_query::window::{Bound, TimeUnit, Window};
//! use bson::doc;
//!
//! let running = Window::documents(Bound::Unbounded, Bound::Current);
//! assert_eq!(
//!     running.encode().unwrap(),
//!     doc! { "documents": ["unbounded", "current"] }
//! );
//!
//! let weekly = Window::range(-7, 0).unit(TimeUnit::Day);
//! assert_eq!(
//!     weekly.encode().unwrap(),
//!     doc! { "range": [-7, 0], "unit": "day" }
//! );
//! ```

use std::fmt;

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, EncodeResult};
use crate::expr::Expression;

/// How a window's bounds are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Offsets count documents relative to the current one.
    Documents,
    /// Offsets are distances in the `sortBy` field's value.
    Range,
}

impl WindowKind {
    /// Key used in the encoded window.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Documents => "documents",
            Self::Range => "range",
        }
    }
}

/// One end of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    /// A signed offset from the current document.
    Offset(i64),
    /// No limit in this direction.
    Unbounded,
    /// The current document.
    Current,
}

impl Bound {
    /// Position used to order bounds; `unbounded` sorts lowest on the lower
    /// end and highest on the upper end.
    fn rank(self, upper: bool) -> i128 {
        match self {
            Bound::Offset(n) => n as i128,
            Bound::Current => 0,
            Bound::Unbounded if upper => i128::MAX,
            Bound::Unbounded => i128::MIN,
        }
    }

    fn to_bson(self) -> Bson {
        match self {
            Bound::Offset(n) => match i32::try_from(n) {
                Ok(small) => Bson::Int32(small),
                Err(_) => Bson::Int64(n),
            },
            Bound::Unbounded => Bson::String("unbounded".into()),
            Bound::Current => Bson::String("current".into()),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Offset(n) => write!(f, "{}", n),
            Bound::Unbounded => f.write_str("unbounded"),
            Bound::Current => f.write_str("current"),
        }
    }
}

impl From<i64> for Bound {
    fn from(n: i64) -> Self {
        Bound::Offset(n)
    }
}

impl From<i32> for Bound {
    fn from(n: i32) -> Self {
        Bound::Offset(n.into())
    }
}

/// Unit for range windows and date arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl TimeUnit {
    /// The unit name understood by the server.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Quarter => "quarter",
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Millisecond => "millisecond",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TimeUnit> for Expression {
    fn from(unit: TimeUnit) -> Self {
        Expression::Value(Bson::String(unit.as_str().to_string()))
    }
}

/// A window frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    kind: WindowKind,
    lower: Bound,
    upper: Bound,
    unit: Option<TimeUnit>,
}

impl Window {
    /// A window counted in documents.
    pub fn documents(lower: impl Into<Bound>, upper: impl Into<Bound>) -> Self {
        Self {
            kind: WindowKind::Documents,
            lower: lower.into(),
            upper: upper.into(),
            unit: None,
        }
    }

    /// A window over the `sortBy` field's value.
    pub fn range(lower: impl Into<Bound>, upper: impl Into<Bound>) -> Self {
        Self {
            kind: WindowKind::Range,
            lower: lower.into(),
            upper: upper.into(),
            unit: None,
        }
    }

    /// Every document in the partition.
    pub fn unbounded() -> Self {
        Self::documents(Bound::Unbounded, Bound::Unbounded)
    }

    /// From the start of the partition up to the current document.
    pub fn to_current() -> Self {
        Self::documents(Bound::Unbounded, Bound::Current)
    }

    /// Measure a range window in the given time unit.
    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn lower(&self) -> Bound {
        self.lower
    }

    pub fn upper(&self) -> Bound {
        self.upper
    }

    pub fn time_unit(&self) -> Option<TimeUnit> {
        self.unit
    }

    /// Check the bounds and render the `window` sub-document.
    pub fn encode(&self) -> EncodeResult<Document> {
        if self.lower.rank(false) > self.upper.rank(true) {
            return Err(EncodeError::InvalidWindowBounds {
                lower: self.lower.to_string(),
                upper: self.upper.to_string(),
            });
        }
        if self.kind == WindowKind::Documents && self.unit.is_some() {
            return Err(EncodeError::stage(
                "$setWindowFields",
                "a documents window cannot have a unit",
            ));
        }

        let mut out = Document::new();
        out.insert(
            self.kind.as_str(),
            Bson::Array(vec![self.lower.to_bson(), self.upper.to_bson()]),
        );
        if let Some(unit) = self.unit {
            out.insert("unit", unit.as_str());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_documents_window() {
        let w = Window::documents(-1, 1);
        assert_eq!(w.encode().unwrap(), doc! { "documents": [-1, 1] });
        assert_eq!(
            Window::unbounded().encode().unwrap(),
            doc! { "documents": ["unbounded", "unbounded"] }
        );
        assert_eq!(
            Window::to_current().encode().unwrap(),
            doc! { "documents": ["unbounded", "current"] }
        );
    }

    #[test]
    fn test_range_window_with_unit() {
        let w = Window::range(Bound::Offset(-10), Bound::Current).unit(TimeUnit::Hour);
        assert_eq!(
            w.encode().unwrap(),
            doc! { "range": [-10, "current"], "unit": "hour" }
        );
    }

    #[test]
    fn test_large_offsets_stay_int64() {
        let w = Window::range(Bound::Offset(-5_000_000_000), Bound::Unbounded);
        assert_eq!(
            w.encode().unwrap(),
            doc! { "range": [-5_000_000_000i64, "unbounded"] }
        );
    }

    #[test]
    fn test_bounds_out_of_order() {
        let err = Window::documents(2, 1).encode().unwrap_err();
        assert_eq!(
            err,
            EncodeError::InvalidWindowBounds {
                lower: "2".into(),
                upper: "1".into()
            }
        );

        assert!(Window::documents(Bound::Current, -1).encode().is_err());
        assert!(Window::documents(1, Bound::Current).encode().is_err());
        assert!(Window::documents(Bound::Current, Bound::Current).encode().is_ok());
        assert!(Window::documents(Bound::Unbounded, -3).encode().is_ok());
        assert!(Window::documents(3, Bound::Unbounded).encode().is_ok());
    }

    #[test]
    fn test_documents_window_rejects_unit() {
        let err = Window::documents(-1, 0)
            .unit(TimeUnit::Day)
            .encode()
            .unwrap_err();
        assert!(err.is_invalid_stage());
    }

    #[test]
    fn test_time_unit_names() {
        assert_eq!(TimeUnit::Millisecond.as_str(), "millisecond");
        assert_eq!(TimeUnit::Quarter.to_string(), "quarter");
        assert_eq!(
            serde_json::to_string(&TimeUnit::Week).unwrap(),
            "\"week\""
        );
    }
}
