//! Arithmetic expressions.

use super::{Call, Expression, Op};

macro_rules! unary {
    ($($(#[$doc:meta])* $fn:ident => $op:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $fn(value: impl Into<Expression>) -> Expression {
                Call::with_args(Op::$op, [value.into()]).into()
            }
        )*
    };
}

macro_rules! binary {
    ($($(#[$doc:meta])* $fn:ident => $op:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $fn(left: impl Into<Expression>, right: impl Into<Expression>) -> Expression {
                Call::with_args(Op::$op, [left.into(), right.into()]).into()
            }
        )*
    };
}

macro_rules! variadic {
    ($($(#[$doc:meta])* $fn:ident => $op:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $fn<I, E>(operands: I) -> Expression
            where
                I: IntoIterator<Item = E>,
                E: Into<Expression>,
            {
                Call::with_args(Op::$op, operands).into()
            }
        )*
    };
}

pub(crate) use binary;
pub(crate) use unary;
pub(crate) use variadic;

unary! {
    /// `$abs`
    abs => Abs,
    /// `$ceil`
    ceil => Ceil,
    /// `$exp`
    exp => Exp,
    /// `$floor`
    floor => Floor,
    /// `$ln`
    ln => Ln,
    /// `$log10`
    log10 => Log10,
    /// `$sqrt`
    sqrt => Sqrt,
}

binary! {
    /// `$divide`
    divide => Divide,
    /// `$log` with an explicit base.
    log => Log,
    /// `$mod`
    modulo => Mod,
    /// `$pow`
    pow => Pow,
    /// `$subtract`; also subtracts dates.
    subtract => Subtract,
}

variadic! {
    /// `$add`
    add => Add,
    /// `$multiply`
    multiply => Multiply,
}

/// `$round`, optionally to a number of decimal places.
pub fn round(value: impl Into<Expression>) -> Rounding {
    Rounding(Call::with_args(Op::Round, [value.into()]))
}

/// `$trunc`, optionally to a number of decimal places.
pub fn trunc(value: impl Into<Expression>) -> Rounding {
    Rounding(Call::with_args(Op::Trunc, [value.into()]))
}

/// Builder for `$round` and `$trunc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rounding(Call);

impl Rounding {
    /// Decimal place to round to; negative values round left of the point.
    pub fn place(self, place: impl Into<Expression>) -> Self {
        Self(self.0.arg(place))
    }
}

impl From<Rounding> for Expression {
    fn from(r: Rounding) -> Self {
        Expression::Call(r.0)
    }
}
