//! Window functions for `$setWindowFields`.
//!
//! Accumulators such as `$sum` and `$avg` also work as window functions; the
//! operators here exist only inside `$setWindowFields`.

use super::arithmetic::{binary, unary};
use super::{Call, Expression, Op, options_builder};

binary! {
    /// `$covariancePop`
    covariance_pop => CovariancePop,
    /// `$covarianceSamp`
    covariance_samp => CovarianceSamp,
}

unary! {
    /// `$linearFill`: interpolate nulls and missing values.
    linear_fill => LinearFill,
    /// `$locf`: carry the last non-null value forward.
    locf => Locf,
}

/// `$denseRank`: rank without gaps for ties.
pub fn dense_rank() -> Expression {
    Call::new(Op::DenseRank).into()
}

/// `$documentNumber`: position within the partition.
pub fn document_number() -> Expression {
    Call::new(Op::DocumentNumber).into()
}

/// `$rank`: rank with gaps after ties.
pub fn rank() -> Expression {
    Call::new(Op::Rank).into()
}

options_builder! {
    /// Builder for `$derivative` and `$integral`.
    RateOfChange {
        /// Time unit when sorting by a date.
        unit => "unit",
    }
}

/// `$derivative`: average rate of change across the window.
pub fn derivative(input: impl Into<Expression>) -> RateOfChange {
    RateOfChange(Call::new(Op::Derivative).option("input", input))
}

/// `$integral`: area under the curve across the window.
pub fn integral(input: impl Into<Expression>) -> RateOfChange {
    RateOfChange(Call::new(Op::Integral).option("input", input))
}

options_builder! {
    /// Builder for `$expMovingAvg`. Exactly one of `n` and `alpha` must be
    /// set.
    ExpMovingAvg {
        /// Number of historical documents with significant weight.
        n => "N",
        /// Decay factor between 0 and 1.
        alpha => "alpha",
    }
}

/// `$expMovingAvg`: exponential moving average.
pub fn exp_moving_avg(input: impl Into<Expression>) -> ExpMovingAvg {
    ExpMovingAvg(Call::new(Op::ExpMovingAvg).option("input", input))
}

options_builder! {
    /// Builder for `$shift`.
    Shift {
        /// Value when the shifted position is outside the partition.
        default => "default",
    }
}

/// `$shift`: evaluate `output` on the document `by` positions away.
pub fn shift(output: impl Into<Expression>, by: i32) -> Shift {
    Shift(Call::new(Op::Shift).option("output", output).option("by", by))
}
