//! Aggregation expressions.
//!
//! An [`Expression`] is an immutable tree: constants, field paths, variables,
//! array and document constructors, and operator invocations ([`Call`]).
//! Builders for the operators live in the family modules below; all of them
//! produce plain `Expression` values (or small builders that convert into
//! one) and never fail. Shape errors are reported by [`Expression::encode`].
//!
//! ```rust
//! use pipewright_query::expr::{arithmetic::add, field, value};
//! use pipewright_query::EncodeContext;
//! use bson::bson;
//!
//! let total = add([field("price"), field("fee"), value(5)]);
//! let encoded = total.encode(&EncodeContext::new()).unwrap();
//! assert_eq!(encoded, bson!({ "$add": ["$price", "$fee", 5] }));
//! ```

use bson::{Bson, Document};
use serde::Serialize;

use crate::context::EncodeContext;
use crate::error::EncodeResult;
use crate::sort::Sort;

pub mod accumulator;
pub mod arithmetic;
pub mod array;
pub mod boolean;
pub mod comparison;
pub mod conditional;
pub mod date;
mod encode;
pub mod object;
pub mod op;
pub mod set;
pub mod string;
pub mod trigonometry;
pub mod types;
pub mod variables;
pub mod window;

pub use op::{Form, NamedSpec, Op};

/// A composable aggregation expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A constant, encoded as-is.
    Value(Bson),
    /// A constant wrapped in `$literal` so it is never parsed as an expression.
    Literal(Bson),
    /// A field path, stored without the leading `$`.
    Field(String),
    /// A variable, stored without the leading `$$`.
    Variable(String),
    /// An array whose elements are expressions.
    Array(Vec<Expression>),
    /// A document whose values are expressions.
    Document(Vec<(String, Expression)>),
    /// An operator invocation.
    Call(Call),
    /// A sort specification whose paths map through the entity schema, as
    /// taken by the `sortBy` of `$top` and `$bottom`.
    Sort(Sort),
}

/// One operator invocation: positional operands plus named options.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    op: Op,
    args: Vec<Expression>,
    options: Vec<(&'static str, Expression)>,
}

impl Call {
    /// Create an invocation with no operands.
    pub fn new(op: Op) -> Self {
        Self {
            op,
            args: Vec::new(),
            options: Vec::new(),
        }
    }

    /// Create an invocation with the given operands.
    pub fn with_args<I, E>(op: Op, args: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expression>,
    {
        Self {
            op,
            args: args.into_iter().map(Into::into).collect(),
            options: Vec::new(),
        }
    }

    /// Append an operand.
    pub fn arg(mut self, arg: impl Into<Expression>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set a named option, replacing any earlier value for the same key.
    pub fn option(mut self, key: &'static str, value: impl Into<Expression>) -> Self {
        let value = value.into();
        match self.options.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.options.push((key, value)),
        }
        self
    }

    /// The operator being invoked.
    pub fn op(&self) -> Op {
        self.op
    }

    /// Positional operands.
    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    /// Named options, in the order they were set.
    pub fn options(&self) -> &[(&'static str, Expression)] {
        &self.options
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Expression> {
        self.options.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl From<Call> for Expression {
    fn from(call: Call) -> Self {
        Expression::Call(call)
    }
}

impl Expression {
    /// Encode this expression to its BSON operator form.
    pub fn encode(&self, ctx: &EncodeContext) -> EncodeResult<Bson> {
        encode::encode(self, ctx)
    }

    /// The operator this expression invokes, if it is a call.
    pub fn op(&self) -> Option<Op> {
        match self {
            Expression::Call(call) => Some(call.op),
            _ => None,
        }
    }

    /// The `null` constant.
    pub fn null() -> Self {
        Expression::Value(Bson::Null)
    }
}

/// Reference a field path. `"price"` and `"$price"` are equivalent; a
/// `$$`-prefixed name produces a variable reference.
pub fn field(path: impl AsRef<str>) -> Expression {
    let path = path.as_ref();
    match path.strip_prefix('$') {
        Some(rest) => match rest.strip_prefix('$') {
            Some(var) => Expression::Variable(var.to_string()),
            None => Expression::Field(rest.to_string()),
        },
        None => Expression::Field(path.to_string()),
    }
}

/// Reference a variable (`$$name`). A leading `$$` is accepted.
pub fn variable(name: impl AsRef<str>) -> Expression {
    let name = name.as_ref();
    Expression::Variable(name.trim_start_matches('$').to_string())
}

/// A constant value.
///
/// Strings starting with `$` are read by the server as field paths; use
/// [`literal`] to embed them verbatim.
pub fn value(v: impl Into<Bson>) -> Expression {
    Expression::Value(v.into())
}

/// A constant wrapped in `$literal`.
pub fn literal(v: impl Into<Bson>) -> Expression {
    Expression::Literal(v.into())
}

/// A constant converted from any serde-serializable value.
pub fn value_of<T: Serialize + ?Sized>(v: &T) -> EncodeResult<Expression> {
    let bson = bson::to_bson(v)?;
    Ok(Expression::Value(bson))
}

/// The `null` constant.
pub fn null() -> Expression {
    Expression::null()
}

/// An array of expressions.
pub fn array<I, E>(items: I) -> Expression
where
    I: IntoIterator<Item = E>,
    E: Into<Expression>,
{
    Expression::Array(items.into_iter().map(Into::into).collect())
}

/// A document of expressions.
pub fn document<I, K, E>(fields: I) -> Expression
where
    I: IntoIterator<Item = (K, E)>,
    K: Into<String>,
    E: Into<Expression>,
{
    Expression::Document(
        fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}

impl From<Bson> for Expression {
    fn from(v: Bson) -> Self {
        Expression::Value(v)
    }
}

impl From<Document> for Expression {
    fn from(v: Document) -> Self {
        Expression::Value(Bson::Document(v))
    }
}

macro_rules! value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expression {
                fn from(v: $ty) -> Self {
                    Expression::Value(Bson::from(v))
                }
            }
        )*
    };
}

value_from!(
    bool,
    i32,
    i64,
    f32,
    f64,
    &str,
    String,
    bson::oid::ObjectId,
    bson::DateTime,
    bson::Decimal128,
    bson::Regex,
    chrono::DateTime<chrono::Utc>,
);

impl<T: Into<Expression>> From<Option<T>> for Expression {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Expression::Value(Bson::Null))
    }
}

/// Declare a builder for an operator whose optional arguments are set by
/// name. The builder wraps a [`Call`] and converts into an [`Expression`].
macro_rules! options_builder {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$m:meta])* $method:ident => $key:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(pub(crate) $crate::expr::Call);

        impl $name {
            $(
                $(#[$m])*
                pub fn $method(self, value: impl Into<$crate::expr::Expression>) -> Self {
                    Self(self.0.option($key, value))
                }
            )*
        }

        impl From<$name> for $crate::expr::Expression {
            fn from(builder: $name) -> Self {
                $crate::expr::Expression::Call(builder.0)
            }
        }
    };
}

pub(crate) use options_builder;

#[cfg(test)]
mod tests {
    use bson::{bson, oid::ObjectId};
    use pretty_assertions::assert_eq;

    use super::*;

    fn enc(e: impl Into<Expression>) -> Bson {
        e.into().encode(&EncodeContext::new()).unwrap()
    }

    #[test]
    fn test_field_normalization() {
        assert_eq!(field("price"), Expression::Field("price".into()));
        assert_eq!(field("$price"), Expression::Field("price".into()));
        assert_eq!(field("$$num"), Expression::Variable("num".into()));
        assert_eq!(variable("$$this"), Expression::Variable("this".into()));
    }

    #[test]
    fn test_references_encode_with_prefixes() {
        assert_eq!(enc(field("a.b")), Bson::String("$a.b".into()));
        assert_eq!(enc(variable("ROOT")), Bson::String("$$ROOT".into()));
    }

    #[test]
    fn test_literal_always_wraps() {
        assert_eq!(enc(literal("$1")), bson!({ "$literal": "$1" }));
        assert_eq!(enc(literal("{x}")), bson!({ "$literal": "{x}" }));
        assert_eq!(enc(literal(5)), bson!({ "$literal": 5 }));
        assert_eq!(
            enc(literal(bson!({ "$add": [1, 2] }))),
            bson!({ "$literal": { "$add": [1, 2] } })
        );
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(enc(4i64), Bson::Int64(4));
        assert_eq!(enc(3.1), Bson::Double(3.1));
        assert_eq!(enc("a"), Bson::String("a".into()));
        assert_eq!(enc(None::<i32>), Bson::Null);
        let oid = ObjectId::new();
        assert_eq!(enc(oid), Bson::ObjectId(oid));
    }

    #[test]
    fn test_value_of_serializes() {
        #[derive(Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }

        let e = value_of(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(enc(e), bson!({ "x": 1, "y": 2 }));
    }

    #[test]
    fn test_array_and_document_constructors() {
        let arr = array([value(1), field("a"), null()]);
        assert_eq!(enc(arr), bson!([1, "$a", null]));

        let doc = document([("total", field("amount")), ("fixed", value(true))]);
        assert_eq!(enc(doc), bson!({ "total": "$amount", "fixed": true }));
    }

    #[test]
    fn test_call_option_replaces() {
        let call = Call::new(Op::Filter)
            .option("input", field("items"))
            .option("cond", value(true))
            .option("input", field("other"));
        assert_eq!(call.options().len(), 2);
        assert_eq!(call.get("input"), Some(&field("other")));
    }
}
