//! Type inspection and conversion expressions.

use super::arithmetic::unary;
use super::{Call, Expression, Op, options_builder};

unary! {
    /// `$isNumber`
    is_number => IsNumber,
    /// `$toBool`
    to_bool => ToBool,
    /// `$toDecimal`
    to_decimal => ToDecimal,
    /// `$toDouble`
    to_double => ToDouble,
    /// `$toInt`
    to_int => ToInt,
    /// `$toLong`
    to_long => ToLong,
    /// `$toObjectId`
    to_object_id => ToObjectId,
    /// `$toString`
    to_string => ToString,
    /// `$type`: the BSON type name of the value.
    type_of => Type,
}

options_builder! {
    /// Builder for `$convert`.
    Convert {
        /// Value returned when conversion fails.
        on_error => "onError",
        /// Value returned when the input is null or missing.
        on_null => "onNull",
    }
}

/// `$convert`: convert `input` to the type named by `to` (a type alias such
/// as `"int"` or a numeric type code).
pub fn convert(input: impl Into<Expression>, to: impl Into<Expression>) -> Convert {
    Convert(Call::new(Op::Convert).option("input", input).option("to", to))
}
