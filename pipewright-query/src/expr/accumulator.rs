//! Accumulators for `$group`, `$bucket`, `$bucketAuto` and
//! `$setWindowFields`.
//!
//! Single-input accumulators take one expression; the `*_of` variants take
//! several operands and are meant for expression contexts such as
//! `$project`, where they act on the listed values.

use super::arithmetic::{unary, variadic};
use super::{Call, Expression, Op, options_builder};
use crate::sort::Sort;

pub use super::array::{first_n, last_n, max_n, min_n};
pub use super::object::merge_objects;

unary! {
    /// `$addToSet`: distinct values per group.
    add_to_set => AddToSet,
    /// `$first` value in group order.
    first => First,
    /// `$last` value in group order.
    last => Last,
    /// `$push`: every value per group.
    push => Push,
    /// `$avg`
    avg => Avg,
    /// `$max`
    max => Max,
    /// `$min`
    min => Min,
    /// `$stdDevPop`
    std_dev_pop => StdDevPop,
    /// `$stdDevSamp`
    std_dev_samp => StdDevSamp,
    /// `$sum`; `sum(1)` counts documents.
    sum => Sum,
}

variadic! {
    /// `$avg` over several operands.
    avg_of => Avg,
    /// `$max` over several operands.
    max_of => Max,
    /// `$min` over several operands.
    min_of => Min,
    /// `$stdDevPop` over several operands.
    std_dev_pop_of => StdDevPop,
    /// `$stdDevSamp` over several operands.
    std_dev_samp_of => StdDevSamp,
    /// `$sum` over several operands.
    sum_of => Sum,
}

/// `$count`: number of documents in the group.
pub fn count() -> Expression {
    Call::new(Op::Count).into()
}

/// `$top`: the first `output` by `sort_by`.
pub fn top(sort_by: Sort, output: impl Into<Expression>) -> Expression {
    Call::new(Op::Top)
        .option("sortBy", Expression::Sort(sort_by))
        .option("output", output)
        .into()
}

/// `$bottom`: the last `output` by `sort_by`.
pub fn bottom(sort_by: Sort, output: impl Into<Expression>) -> Expression {
    Call::new(Op::Bottom)
        .option("sortBy", Expression::Sort(sort_by))
        .option("output", output)
        .into()
}

/// `$topN`
pub fn top_n(n: impl Into<Expression>, sort_by: Sort, output: impl Into<Expression>) -> Expression {
    Call::new(Op::TopN)
        .option("n", n)
        .option("sortBy", Expression::Sort(sort_by))
        .option("output", output)
        .into()
}

/// `$bottomN`
pub fn bottom_n(
    n: impl Into<Expression>,
    sort_by: Sort,
    output: impl Into<Expression>,
) -> Expression {
    Call::new(Op::BottomN)
        .option("n", n)
        .option("sortBy", Expression::Sort(sort_by))
        .option("output", output)
        .into()
}

/// `$median`, computed with the `approximate` method.
pub fn median(input: impl Into<Expression>) -> Expression {
    Call::new(Op::Median)
        .option("input", input)
        .option("method", "approximate")
        .into()
}

/// `$percentile` for each of `p`, computed with the `approximate` method.
pub fn percentile<I, E>(input: impl Into<Expression>, p: I) -> Expression
where
    I: IntoIterator<Item = E>,
    E: Into<Expression>,
{
    Call::new(Op::Percentile)
        .option("input", input)
        .option("p", super::array(p))
        .option("method", "approximate")
        .into()
}

options_builder! {
    /// Builder for `$accumulator`.
    Accumulator {
        /// Arguments passed to `init`.
        init_args => "initArgs",
        /// Function applied to the final state.
        finalize => "finalize",
    }
}

/// `$accumulator`: a custom accumulator written in JavaScript.
pub fn accumulator<I, E>(
    init: impl Into<String>,
    accumulate: impl Into<String>,
    accumulate_args: I,
    merge: impl Into<String>,
) -> Accumulator
where
    I: IntoIterator<Item = E>,
    E: Into<Expression>,
{
    Accumulator(
        Call::new(Op::Accumulator)
            .option("init", init.into())
            .option("accumulate", accumulate.into())
            .option("accumulateArgs", super::array(accumulate_args))
            .option("merge", merge.into())
            .option("lang", "js"),
    )
}
