//! Trigonometric expressions. Angles are in radians.

use super::arithmetic::{binary, unary};
use super::{Call, Expression, Op};

unary! {
    /// `$sin`
    sin => Sin,
    /// `$cos`
    cos => Cos,
    /// `$tan`
    tan => Tan,
    /// `$asin`
    asin => Asin,
    /// `$acos`
    acos => Acos,
    /// `$atan`
    atan => Atan,
    /// `$asinh`
    asinh => Asinh,
    /// `$acosh`
    acosh => Acosh,
    /// `$atanh`
    atanh => Atanh,
    /// `$sinh`
    sinh => Sinh,
    /// `$cosh`
    cosh => Cosh,
    /// `$tanh`
    tanh => Tanh,
    /// `$degreesToRadians`
    degrees_to_radians => DegreesToRadians,
    /// `$radiansToDegrees`
    radians_to_degrees => RadiansToDegrees,
}

binary! {
    /// `$atan2`: angle of the point `(x, y)`, called as `atan2(y, x)`.
    atan2 => Atan2,
}

#[cfg(test)]
mod tests {
    use bson::{Bson, bson};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::EncodeContext;
    use crate::expr::field;

    fn enc(e: impl Into<Expression>) -> Bson {
        e.into().encode(&EncodeContext::new()).unwrap()
    }

    #[test]
    fn test_trigonometry() {
        assert_eq!(
            enc(sin(degrees_to_radians(field("angle")))),
            bson!({ "$sin": { "$degreesToRadians": "$angle" } })
        );
        assert_eq!(
            enc(radians_to_degrees(atan2(field("side_b"), field("side_a")))),
            bson!({ "$radiansToDegrees": { "$atan2": ["$side_b", "$side_a"] } })
        );
    }
}
