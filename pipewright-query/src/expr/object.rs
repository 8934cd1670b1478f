//! Object, data size and miscellaneous expressions.

use super::arithmetic::{unary, variadic};
use super::{Call, Expression, Op, options_builder};

variadic! {
    /// `$mergeObjects`: later documents override earlier ones.
    merge_objects => MergeObjects,
}

unary! {
    /// `$binarySize` of a string or binary value, in bytes.
    binary_size => BinarySize,
    /// `$bsonSize` of a document, in bytes.
    bson_size => BsonSize,
    /// `$sampleRate`: keep documents at random with the given probability.
    sample_rate => SampleRate,
}

options_builder! {
    /// Builder for `$getField`.
    GetField {
        /// Document to read from (default `$$CURRENT`).
        input => "input",
    }
}

/// `$getField`: read a field whose name may contain `.` or start with `$`.
pub fn get_field(field: impl Into<Expression>) -> GetField {
    GetField(Call::with_args(Op::GetField, [field.into()]))
}

/// `$setField`: add, update or (with `$$REMOVE`) drop a field of `input`.
pub fn set_field(
    field: impl Into<Expression>,
    input: impl Into<Expression>,
    value: impl Into<Expression>,
) -> Expression {
    Call::new(Op::SetField)
        .option("field", field)
        .option("input", input)
        .option("value", value)
        .into()
}

/// `$unsetField`
pub fn unset_field(field: impl Into<Expression>, input: impl Into<Expression>) -> Expression {
    Call::new(Op::UnsetField)
        .option("field", field)
        .option("input", input)
        .into()
}

/// `$let`: bind variables for use in `in_` as `$$name`.
pub fn let_<I, K, E>(vars: I, in_: impl Into<Expression>) -> Expression
where
    I: IntoIterator<Item = (K, E)>,
    K: Into<String>,
    E: Into<Expression>,
{
    Call::new(Op::Let)
        .option("vars", super::document(vars))
        .option("in", in_)
        .into()
}

/// `$meta`, e.g. `"textScore"` or `"indexKey"`.
pub fn meta(keyword: impl Into<String>) -> Expression {
    Call::with_args(Op::Meta, [Expression::from(keyword.into())]).into()
}

/// `$rand`: a float in `[0, 1)`.
pub fn rand() -> Expression {
    Call::new(Op::Rand).into()
}

/// `$function`: a server-side JavaScript function.
pub fn function<I, E>(body: impl Into<String>, args: I) -> Expression
where
    I: IntoIterator<Item = E>,
    E: Into<Expression>,
{
    Call::new(Op::Function)
        .option("body", body.into())
        .option("args", super::array(args))
        .option("lang", "js")
        .into()
}

#[cfg(test)]
mod tests {
    use bson::{Bson, bson};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::EncodeContext;
    use crate::expr::arithmetic::multiply;
    use crate::expr::variables::remove;
    use crate::expr::{field, literal, value, variable};

    fn enc(e: impl Into<Expression>) -> Bson {
        e.into().encode(&EncodeContext::new()).unwrap()
    }

    #[test]
    fn test_merge_objects() {
        assert_eq!(
            enc(merge_objects([field("defaults"), field("overrides")])),
            bson!({ "$mergeObjects": ["$defaults", "$overrides"] })
        );
        assert_eq!(enc(merge_objects([field("quantity")])), bson!({ "$mergeObjects": "$quantity" }));
    }

    #[test]
    fn test_get_field() {
        assert_eq!(enc(get_field("price.usd")), bson!({ "$getField": "price.usd" }));
        assert_eq!(
            enc(get_field(literal("$small")).input(field("quantity"))),
            bson!({ "$getField": { "field": { "$literal": "$small" }, "input": "$quantity" } })
        );
    }

    #[test]
    fn test_set_and_unset_field() {
        assert_eq!(
            enc(set_field("price.usd", variable("ROOT"), value(45))),
            bson!({ "$setField": { "field": "price.usd", "input": "$$ROOT", "value": 45 } })
        );
        assert_eq!(
            enc(set_field("price", variable("ROOT"), remove())),
            bson!({ "$setField": { "field": "price", "input": "$$ROOT", "value": "$$REMOVE" } })
        );
        assert_eq!(
            enc(unset_field("price", variable("ROOT"))),
            bson!({ "$unsetField": { "field": "price", "input": "$$ROOT" } })
        );
    }

    #[test]
    fn test_let() {
        let e = let_(
            [("total", field("price"))],
            multiply([variable("total"), value(2)]),
        );
        assert_eq!(
            enc(e),
            bson!({
                "$let": {
                    "vars": { "total": "$price" },
                    "in": { "$multiply": ["$$total", 2] }
                }
            })
        );
    }

    #[test]
    fn test_misc() {
        assert_eq!(enc(meta("textScore")), bson!({ "$meta": "textScore" }));
        assert_eq!(enc(rand()), bson!({ "$rand": {} }));
        assert_eq!(enc(sample_rate(0.33)), bson!({ "$sampleRate": 0.33 }));
        assert_eq!(enc(bson_size(variable("ROOT"))), bson!({ "$bsonSize": "$$ROOT" }));
        assert_eq!(
            enc(function("function(name) { return name.length }", [field("name")])),
            bson!({
                "$function": {
                    "body": "function(name) { return name.length }",
                    "args": ["$name"],
                    "lang": "js"
                }
            })
        );
    }
}
