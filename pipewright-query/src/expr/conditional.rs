//! Conditional expressions.

use super::{Call, Expression, Op};

/// `$cond`: `then` when `if_` is true, `else_` otherwise.
pub fn cond(
    if_: impl Into<Expression>,
    then: impl Into<Expression>,
    else_: impl Into<Expression>,
) -> Expression {
    Call::new(Op::Cond)
        .option("if", if_)
        .option("then", then)
        .option("else", else_)
        .into()
}

/// `$ifNull`: the first operand that is neither null nor missing, falling
/// back to the last one.
pub fn if_null<I, E>(operands: I) -> Expression
where
    I: IntoIterator<Item = E>,
    E: Into<Expression>,
{
    Call::with_args(Op::IfNull, operands).into()
}

/// `$switch`: evaluate branches in order.
pub fn switch() -> Switch {
    Switch {
        branches: Vec::new(),
        default: None,
    }
}

/// Builder for `$switch`.
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    branches: Vec<(Expression, Expression)>,
    default: Option<Expression>,
}

impl Switch {
    /// Add a branch taken when `case` is true.
    pub fn branch(mut self, case: impl Into<Expression>, then: impl Into<Expression>) -> Self {
        self.branches.push((case.into(), then.into()));
        self
    }

    /// Value when no branch matches.
    pub fn default(mut self, default: impl Into<Expression>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl From<Switch> for Expression {
    fn from(s: Switch) -> Self {
        let branches = s.branches.into_iter().map(|(case, then)| {
            Expression::Document(vec![("case".to_string(), case), ("then".to_string(), then)])
        });
        let mut call = Call::new(Op::Switch).option("branches", super::array(branches));
        if let Some(default) = s.default {
            call = call.option("default", default);
        }
        Expression::Call(call)
    }
}

#[cfg(test)]
mod tests {
    use bson::{Bson, bson};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::EncodeContext;
    use crate::expr::comparison::{gte, lt};
    use crate::expr::{field, value};

    fn enc(e: impl Into<Expression>) -> Bson {
        e.into().encode(&EncodeContext::new()).unwrap()
    }

    #[test]
    fn test_cond() {
        let e = cond(gte(field("qty"), value(250)), value(30), value(20));
        assert_eq!(
            enc(e),
            bson!({ "$cond": { "if": { "$gte": ["$qty", 250] }, "then": 30, "else": 20 } })
        );
    }

    #[test]
    fn test_if_null() {
        assert_eq!(
            enc(if_null([field("description"), value("Unspecified")])),
            bson!({ "$ifNull": ["$description", "Unspecified"] })
        );
        let err = if_null([field("description")])
            .encode(&EncodeContext::new())
            .unwrap_err();
        assert!(err.is_invalid_shape());
    }

    #[test]
    fn test_switch() {
        let e = switch()
            .branch(gte(field("score"), value(90)), value("A"))
            .branch(lt(field("score"), value(90)), value("B"))
            .default("none");
        assert_eq!(
            enc(e),
            bson!({
                "$switch": {
                    "branches": [
                        { "case": { "$gte": ["$score", 90] }, "then": "A" },
                        { "case": { "$lt": ["$score", 90] }, "then": "B" },
                    ],
                    "default": "none"
                }
            })
        );
    }

    #[test]
    fn test_switch_without_branches_rejected() {
        let err = Expression::from(switch().default("none"))
            .encode(&EncodeContext::new())
            .unwrap_err();
        assert!(err.is_invalid_shape());
        assert_eq!(
            err,
            crate::error::EncodeError::shape("$switch", "'branches' requires at least one element")
        );
    }

    #[test]
    fn test_switch_without_default() {
        let e = switch().branch(value(true), value(1));
        assert_eq!(
            enc(e),
            bson!({ "$switch": { "branches": [{ "case": true, "then": 1 }] } })
        );
    }
}
