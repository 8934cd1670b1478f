//! String expressions.

use super::arithmetic::{binary, unary, variadic};
use super::array::IndexOfExpression;
use super::{Call, Expression, Op, options_builder};

variadic! {
    /// `$concat`
    concat => Concat,
}

unary! {
    /// `$strLenBytes`
    str_len_bytes => StrLenBytes,
    /// `$strLenCP`: length in code points.
    str_len_cp => StrLenCP,
    /// `$toLower`
    to_lower => ToLower,
    /// `$toUpper`
    to_upper => ToUpper,
}

binary! {
    /// `$split` on a delimiter.
    split => Split,
    /// `$strcasecmp`: case-insensitive comparison, -1, 0 or 1.
    strcasecmp => Strcasecmp,
}

/// `$substr`, counted in bytes.
pub fn substr(
    input: impl Into<Expression>,
    start: impl Into<Expression>,
    length: impl Into<Expression>,
) -> Expression {
    Call::with_args(Op::Substr, [input.into(), start.into(), length.into()]).into()
}

/// `$substrBytes`
pub fn substr_bytes(
    input: impl Into<Expression>,
    start: impl Into<Expression>,
    length: impl Into<Expression>,
) -> Expression {
    Call::with_args(Op::SubstrBytes, [input.into(), start.into(), length.into()]).into()
}

/// `$substrCP`, counted in code points.
pub fn substr_cp(
    input: impl Into<Expression>,
    start: impl Into<Expression>,
    length: impl Into<Expression>,
) -> Expression {
    Call::with_args(Op::SubstrCP, [input.into(), start.into(), length.into()]).into()
}

/// `$indexOfBytes`: byte index of the first occurrence of `search`.
pub fn index_of_bytes(
    input: impl Into<Expression>,
    search: impl Into<Expression>,
) -> IndexOfExpression {
    IndexOfExpression(Call::with_args(Op::IndexOfBytes, [input.into(), search.into()]))
}

/// `$indexOfCP`: code point index of the first occurrence of `search`.
pub fn index_of_cp(
    input: impl Into<Expression>,
    search: impl Into<Expression>,
) -> IndexOfExpression {
    IndexOfExpression(Call::with_args(Op::IndexOfCP, [input.into(), search.into()]))
}

options_builder! {
    /// Builder for `$trim`, `$ltrim` and `$rtrim`.
    Trim {
        /// Characters to remove (default whitespace).
        chars => "chars",
    }
}

/// `$trim`: strip both ends.
pub fn trim(input: impl Into<Expression>) -> Trim {
    Trim(Call::new(Op::Trim).option("input", input))
}

/// `$ltrim`: strip the start.
pub fn ltrim(input: impl Into<Expression>) -> Trim {
    Trim(Call::new(Op::Ltrim).option("input", input))
}

/// `$rtrim`: strip the end.
pub fn rtrim(input: impl Into<Expression>) -> Trim {
    Trim(Call::new(Op::Rtrim).option("input", input))
}

options_builder! {
    /// Builder for the regex operators.
    RegexExpression {
        /// Flags such as `i`, `m`, `s` and `x`.
        options => "options",
    }
}

/// `$regexFind`: the first match, or null.
pub fn regex_find(input: impl Into<Expression>, regex: impl Into<Expression>) -> RegexExpression {
    RegexExpression(
        Call::new(Op::RegexFind)
            .option("input", input)
            .option("regex", regex),
    )
}

/// `$regexFindAll`: every match.
pub fn regex_find_all(
    input: impl Into<Expression>,
    regex: impl Into<Expression>,
) -> RegexExpression {
    RegexExpression(
        Call::new(Op::RegexFindAll)
            .option("input", input)
            .option("regex", regex),
    )
}

/// `$regexMatch`: whether the input matches.
pub fn regex_match(input: impl Into<Expression>, regex: impl Into<Expression>) -> RegexExpression {
    RegexExpression(
        Call::new(Op::RegexMatch)
            .option("input", input)
            .option("regex", regex),
    )
}

/// `$replaceOne`: replace the first occurrence of `find`.
pub fn replace_one(
    input: impl Into<Expression>,
    find: impl Into<Expression>,
    replacement: impl Into<Expression>,
) -> Expression {
    Call::new(Op::ReplaceOne)
        .option("input", input)
        .option("find", find)
        .option("replacement", replacement)
        .into()
}

/// `$replaceAll`: replace every occurrence of `find`.
pub fn replace_all(
    input: impl Into<Expression>,
    find: impl Into<Expression>,
    replacement: impl Into<Expression>,
) -> Expression {
    Call::new(Op::ReplaceAll)
        .option("input", input)
        .option("find", find)
        .option("replacement", replacement)
        .into()
}

#[cfg(test)]
mod tests {
    use bson::{Bson, bson};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::EncodeContext;
    use crate::expr::{field, value};

    fn enc(e: impl Into<Expression>) -> Bson {
        e.into().encode(&EncodeContext::new()).unwrap()
    }

    #[test]
    fn test_concat() {
        assert_eq!(
            enc(concat([field("item"), value(" - "), field("description")])),
            bson!({ "$concat": ["$item", " - ", "$description"] })
        );
    }

    #[test]
    fn test_substrings() {
        assert_eq!(
            enc(substr_cp(field("quarter"), value(0), value(2))),
            bson!({ "$substrCP": ["$quarter", 0, 2] })
        );
        assert_eq!(
            enc(index_of_cp(field("item"), value("foo")).start(3)),
            bson!({ "$indexOfCP": ["$item", "foo", 3] })
        );
        assert_eq!(
            enc(index_of_bytes(field("item"), value("foo"))),
            bson!({ "$indexOfBytes": ["$item", "foo"] })
        );
        assert_eq!(
            enc(split(field("city"), value(", "))),
            bson!({ "$split": ["$city", ", "] })
        );
    }

    #[test]
    fn test_trim() {
        assert_eq!(enc(trim(field("description"))), bson!({ "$trim": { "input": "$description" } }));
        assert_eq!(
            enc(ltrim(field("description")).chars(" ge")),
            bson!({ "$ltrim": { "input": "$description", "chars": " ge" } })
        );
    }

    #[test]
    fn test_regex() {
        assert_eq!(
            enc(regex_match(field("description"), value("line")).options("i")),
            bson!({ "$regexMatch": { "input": "$description", "regex": "line", "options": "i" } })
        );
        let re = bson::Regex {
            pattern: "^a".into(),
            options: "i".into(),
        };
        assert_eq!(
            enc(regex_find_all(field("name"), re.clone())),
            bson!({ "$regexFindAll": { "input": "$name", "regex": Bson::RegularExpression(re) } })
        );
    }

    #[test]
    fn test_replace() {
        assert_eq!(
            enc(replace_all(field("item"), value("blue paint"), value("red paint"))),
            bson!({
                "$replaceAll": { "input": "$item", "find": "blue paint", "replacement": "red paint" }
            })
        );
    }
}
