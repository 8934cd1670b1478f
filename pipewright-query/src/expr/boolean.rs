//! Boolean expressions.

use super::arithmetic::{unary, variadic};
use super::{Call, Expression, Op};

variadic! {
    /// `$and`: true when every operand is true.
    and => And,
    /// `$or`: true when any operand is true.
    or => Or,
}

unary! {
    /// `$not`
    not => Not,
}

#[cfg(test)]
mod tests {
    use bson::{Bson, bson};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::EncodeContext;
    use crate::expr::comparison::{gt, lt};
    use crate::expr::{field, value};

    fn enc(e: impl Into<Expression>) -> Bson {
        e.into().encode(&EncodeContext::new()).unwrap()
    }

    #[test]
    fn test_and_or() {
        let e = and([gt(field("qty"), value(100)), lt(field("qty"), value(250))]);
        assert_eq!(
            enc(e),
            bson!({ "$and": [{ "$gt": ["$qty", 100] }, { "$lt": ["$qty", 250] }] })
        );
        assert_eq!(enc(or(Vec::<Expression>::new())), bson!({ "$or": [] }));
    }

    #[test]
    fn test_not() {
        assert_eq!(
            enc(not(gt(field("qty"), value(250)))),
            bson!({ "$not": { "$gt": ["$qty", 250] } })
        );
    }
}
