//! Comparison expressions.

use super::arithmetic::binary;
use super::{Call, Expression, Op};

binary! {
    /// `$cmp`: -1, 0 or 1.
    cmp => Cmp,
    /// `$eq`
    eq => Eq,
    /// `$gt`
    gt => Gt,
    /// `$gte`
    gte => Gte,
    /// `$lt`
    lt => Lt,
    /// `$lte`
    lte => Lte,
    /// `$ne`
    ne => Ne,
}
