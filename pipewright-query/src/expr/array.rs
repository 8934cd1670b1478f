//! Array expressions.

use super::arithmetic::{binary, unary, variadic};
use super::{Call, Expression, Op, options_builder};
use crate::sort::Sort;

unary! {
    /// `$arrayToObject`
    array_to_object => ArrayToObject,
    /// `$first` of an array.
    first => First,
    /// `$isArray`
    is_array => IsArray,
    /// `$last` of an array.
    last => Last,
    /// `$objectToArray`
    object_to_array => ObjectToArray,
    /// `$reverseArray`
    reverse_array => ReverseArray,
    /// `$size`
    size => Size,
}

binary! {
    /// `$arrayElemAt`
    array_elem_at => ArrayElemAt,
    /// `$in`: whether `value` is an element of `array`.
    is_in => In,
}

variadic! {
    /// `$concatArrays`
    concat_arrays => ConcatArrays,
}

options_builder! {
    /// Builder for `$filter`.
    FilterExpression {
        /// Name of the variable bound to each element (default `this`).
        as_ => "as",
        /// Maximum number of matching elements to return.
        limit => "limit",
    }
}

/// `$filter`: elements of `input` for which `cond` holds.
pub fn filter(input: impl Into<Expression>, cond: impl Into<Expression>) -> FilterExpression {
    FilterExpression(
        Call::new(Op::Filter)
            .option("input", input)
            .option("cond", cond),
    )
}

options_builder! {
    /// Builder for `$map`.
    MapExpression {
        /// Name of the variable bound to each element (default `this`).
        as_ => "as",
    }
}

/// `$map`: apply `in_` to every element of `input`.
pub fn map(input: impl Into<Expression>, in_: impl Into<Expression>) -> MapExpression {
    MapExpression(Call::new(Op::Map).option("input", input).option("in", in_))
}

/// `$reduce`: fold `input` into a single value.
///
/// Within `in_`, `$$value` is the accumulated value and `$$this` the current
/// element.
pub fn reduce(
    input: impl Into<Expression>,
    initial_value: impl Into<Expression>,
    in_: impl Into<Expression>,
) -> Expression {
    Call::new(Op::Reduce)
        .option("input", input)
        .option("initialValue", initial_value)
        .option("in", in_)
        .into()
}

/// `$firstN` over an array.
pub fn first_n(n: impl Into<Expression>, input: impl Into<Expression>) -> Expression {
    Call::new(Op::FirstN).option("input", input).option("n", n).into()
}

/// `$lastN` over an array.
pub fn last_n(n: impl Into<Expression>, input: impl Into<Expression>) -> Expression {
    Call::new(Op::LastN).option("input", input).option("n", n).into()
}

/// `$maxN` over an array.
pub fn max_n(n: impl Into<Expression>, input: impl Into<Expression>) -> Expression {
    Call::new(Op::MaxN).option("input", input).option("n", n).into()
}

/// `$minN` over an array.
pub fn min_n(n: impl Into<Expression>, input: impl Into<Expression>) -> Expression {
    Call::new(Op::MinN).option("input", input).option("n", n).into()
}

/// `$range`: integers from `start` up to, not including, `end`.
pub fn range(start: impl Into<Expression>, end: impl Into<Expression>) -> RangeExpression {
    RangeExpression(Call::with_args(Op::Range, [start.into(), end.into()]))
}

/// Builder for `$range`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeExpression(Call);

impl RangeExpression {
    /// Increment between values (default 1).
    pub fn step(self, step: impl Into<Expression>) -> Self {
        Self(self.0.arg(step))
    }
}

impl From<RangeExpression> for Expression {
    fn from(r: RangeExpression) -> Self {
        Expression::Call(r.0)
    }
}

/// `$indexOfArray`: index of the first occurrence of `search`.
pub fn index_of_array(
    array: impl Into<Expression>,
    search: impl Into<Expression>,
) -> IndexOfExpression {
    IndexOfExpression(Call::with_args(Op::IndexOfArray, [array.into(), search.into()]))
}

/// Builder for `$indexOfArray`, `$indexOfBytes` and `$indexOfCP`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOfExpression(pub(crate) Call);

impl IndexOfExpression {
    /// Start searching at this index.
    pub fn start(self, start: impl Into<Expression>) -> Self {
        Self(self.0.arg(start))
    }

    /// Stop searching before this index. Requires a start index; without one
    /// the encoder reads it as the start.
    pub fn end(self, end: impl Into<Expression>) -> Self {
        Self(self.0.arg(end))
    }
}

impl From<IndexOfExpression> for Expression {
    fn from(e: IndexOfExpression) -> Self {
        Expression::Call(e.0)
    }
}

/// `$slice`: the first `n` elements, or the last `-n` when negative.
pub fn slice(array: impl Into<Expression>, n: impl Into<Expression>) -> Expression {
    Call::with_args(Op::Slice, [array.into(), n.into()]).into()
}

/// `$slice` starting at `position`.
pub fn slice_from(
    array: impl Into<Expression>,
    position: impl Into<Expression>,
    n: impl Into<Expression>,
) -> Expression {
    Call::with_args(Op::Slice, [array.into(), position.into(), n.into()]).into()
}

/// `$sortArray` ordered by the given fields of each element.
pub fn sort_array(input: impl Into<Expression>, sort_by: Sort) -> Expression {
    Call::new(Op::SortArray)
        .option("input", input)
        .option("sortBy", sort_by)
        .into()
}

/// `$sortArray` of scalar elements: `1` ascending, `-1` descending.
pub fn sort_array_by_value(input: impl Into<Expression>, direction: i32) -> Expression {
    Call::new(Op::SortArray)
        .option("input", input)
        .option("sortBy", direction)
        .into()
}

options_builder! {
    /// Builder for `$zip`.
    ZipExpression {
        /// Pad shorter inputs up to the longest one.
        use_longest_length => "useLongestLength",
        /// Padding values, one per input; requires `use_longest_length`.
        defaults => "defaults",
    }
}

/// `$zip`: transpose an array of arrays.
pub fn zip<I, E>(inputs: I) -> ZipExpression
where
    I: IntoIterator<Item = E>,
    E: Into<Expression>,
{
    ZipExpression(Call::new(Op::Zip).option("inputs", super::array(inputs)))
}
