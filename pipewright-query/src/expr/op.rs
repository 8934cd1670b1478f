//! Operator registry.
//!
//! Every aggregation operator the builders can emit is listed here exactly
//! once, together with the argument form the encoder must use for it. The
//! encoder never special-cases an operator by name; everything it needs to
//! know about the document shape lives in [`Form`].

/// How an operator lays out its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    /// Takes no arguments: `{ "$op": {} }`.
    Nullary,
    /// Positional operands: bare value for a single operand, array otherwise.
    Positional {
        /// Minimum operand count.
        min: usize,
        /// Maximum operand count, `None` when unbounded.
        max: Option<usize>,
    },
    /// One operand, bare unless named options are present, in which case the
    /// operand moves under `key` inside an object.
    Unary {
        /// Key for the operand in object form.
        key: &'static str,
        /// Accepted option names, in emission order.
        options: &'static [&'static str],
    },
    /// Object form with named arguments.
    Named(&'static NamedSpec),
}

/// Argument layout of an object-form operator.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct NamedSpec {
    /// Every accepted key, in the order it is emitted.
    pub keys: &'static [&'static str],
    /// Keys that must be present.
    pub required: &'static [&'static str],
    /// Exactly one of these keys must be present (ignored when empty).
    pub one_of: &'static [&'static str],
    /// Pairs of keys that cannot be set together.
    pub conflicts: &'static [(&'static str, &'static str)],
    /// Keys whose array value must hold at least one element.
    pub non_empty: &'static [&'static str],
}

impl NamedSpec {
    const fn new(keys: &'static [&'static str], required: &'static [&'static str]) -> Self {
        Self {
            keys,
            required,
            one_of: &[],
            conflicts: &[],
            non_empty: &[],
        }
    }

    const fn one_of(self, one_of: &'static [&'static str]) -> Self {
        Self { one_of, ..self }
    }

    const fn conflicts(self, conflicts: &'static [(&'static str, &'static str)]) -> Self {
        Self { conflicts, ..self }
    }

    const fn non_empty(self, non_empty: &'static [&'static str]) -> Self {
        Self { non_empty, ..self }
    }
}

const fn fixed(n: usize) -> Form {
    Form::Positional {
        min: n,
        max: Some(n),
    }
}

const fn between(min: usize, max: usize) -> Form {
    Form::Positional {
        min,
        max: Some(max),
    }
}

const fn at_least(min: usize) -> Form {
    Form::Positional { min, max: None }
}

const DATE_PART: Form = Form::Unary {
    key: "date",
    options: &["timezone"],
};

static FILTER: NamedSpec = NamedSpec::new(&["input", "as", "cond", "limit"], &["input", "cond"]);
static MAP: NamedSpec = NamedSpec::new(&["input", "as", "in"], &["input", "in"]);
static REDUCE: NamedSpec = NamedSpec::new(
    &["input", "initialValue", "in"],
    &["input", "initialValue", "in"],
);
static N_OF_INPUT: NamedSpec = NamedSpec::new(&["input", "n"], &["input", "n"]);
static SORT_ARRAY: NamedSpec = NamedSpec::new(&["input", "sortBy"], &["input", "sortBy"]);
static ZIP: NamedSpec = NamedSpec::new(&["inputs", "useLongestLength", "defaults"], &["inputs"]);
static COND: NamedSpec = NamedSpec::new(&["if", "then", "else"], &["if", "then", "else"]);
static SWITCH: NamedSpec =
    NamedSpec::new(&["branches", "default"], &["branches"]).non_empty(&["branches"]);
static DATE_ARITHMETIC: NamedSpec = NamedSpec::new(
    &["startDate", "unit", "amount", "timezone"],
    &["startDate", "unit", "amount"],
);
static DATE_DIFF: NamedSpec = NamedSpec::new(
    &["startDate", "endDate", "unit", "timezone", "startOfWeek"],
    &["startDate", "endDate", "unit"],
);
static DATE_FROM_PARTS: NamedSpec = NamedSpec::new(
    &[
        "year",
        "isoWeekYear",
        "month",
        "isoWeek",
        "day",
        "isoDayOfWeek",
        "hour",
        "minute",
        "second",
        "millisecond",
        "timezone",
    ],
    &[],
)
.one_of(&["year", "isoWeekYear"])
.conflicts(&[
    ("year", "isoWeek"),
    ("year", "isoDayOfWeek"),
    ("isoWeekYear", "month"),
    ("isoWeekYear", "day"),
]);
static DATE_FROM_STRING: NamedSpec = NamedSpec::new(
    &["dateString", "format", "timezone", "onError", "onNull"],
    &["dateString"],
);
static DATE_TO_PARTS: NamedSpec = NamedSpec::new(&["date", "timezone", "iso8601"], &["date"]);
static DATE_TO_STRING: NamedSpec =
    NamedSpec::new(&["date", "format", "timezone", "onNull"], &["date"]);
static DATE_TRUNC: NamedSpec = NamedSpec::new(
    &["date", "unit", "binSize", "timezone", "startOfWeek"],
    &["date", "unit"],
);
static TRIM: NamedSpec = NamedSpec::new(&["input", "chars"], &["input"]);
static REGEX: NamedSpec = NamedSpec::new(&["input", "regex", "options"], &["input", "regex"]);
static REPLACE: NamedSpec = NamedSpec::new(
    &["input", "find", "replacement"],
    &["input", "find", "replacement"],
);
static CONVERT: NamedSpec = NamedSpec::new(&["input", "to", "onError", "onNull"], &["input", "to"]);
static SET_FIELD: NamedSpec =
    NamedSpec::new(&["field", "input", "value"], &["field", "input", "value"]);
static UNSET_FIELD: NamedSpec = NamedSpec::new(&["field", "input"], &["field", "input"]);
static LET: NamedSpec = NamedSpec::new(&["vars", "in"], &["vars", "in"]);
static FUNCTION: NamedSpec = NamedSpec::new(&["body", "args", "lang"], &["body", "args", "lang"]);
static ACCUMULATOR: NamedSpec = NamedSpec::new(
    &[
        "init",
        "initArgs",
        "accumulate",
        "accumulateArgs",
        "merge",
        "finalize",
        "lang",
    ],
    &["init", "accumulate", "accumulateArgs", "merge", "lang"],
);
static SORTED_PICK: NamedSpec = NamedSpec::new(&["sortBy", "output"], &["sortBy", "output"]);
static SORTED_PICK_N: NamedSpec =
    NamedSpec::new(&["n", "sortBy", "output"], &["n", "sortBy", "output"]);
static MEDIAN: NamedSpec = NamedSpec::new(&["input", "method"], &["input", "method"]);
static PERCENTILE: NamedSpec =
    NamedSpec::new(&["input", "p", "method"], &["input", "p", "method"]);
static DERIVATIVE: NamedSpec = NamedSpec::new(&["input", "unit"], &["input"]);
static EXP_MOVING_AVG: NamedSpec =
    NamedSpec::new(&["input", "N", "alpha"], &["input"]).one_of(&["N", "alpha"]);
static SHIFT: NamedSpec = NamedSpec::new(&["output", "by", "default"], &["output", "by"]);

macro_rules! operators {
    ($( $(#[$doc:meta])* $variant:ident => $name:literal, $form:expr; )*) => {
        /// An aggregation operator.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Op {
            $( $(#[$doc])* $variant, )*
        }

        impl Op {
            /// Every registered operator.
            pub const ALL: &'static [Op] = &[$(Op::$variant),*];

            /// The `$`-prefixed operator name.
            pub fn name(self) -> &'static str {
                match self {
                    $( Op::$variant => $name, )*
                }
            }

            /// The argument form used when encoding this operator.
            pub fn form(self) -> Form {
                match self {
                    $( Op::$variant => $form, )*
                }
            }
        }
    };
}

operators! {
    // arithmetic
    Abs => "$abs", fixed(1);
    Add => "$add", at_least(0);
    Ceil => "$ceil", fixed(1);
    Divide => "$divide", fixed(2);
    Exp => "$exp", fixed(1);
    Floor => "$floor", fixed(1);
    Ln => "$ln", fixed(1);
    Log => "$log", fixed(2);
    Log10 => "$log10", fixed(1);
    Mod => "$mod", fixed(2);
    Multiply => "$multiply", at_least(0);
    Pow => "$pow", fixed(2);
    Round => "$round", between(1, 2);
    Sqrt => "$sqrt", fixed(1);
    Subtract => "$subtract", fixed(2);
    Trunc => "$trunc", between(1, 2);

    // array
    ArrayElemAt => "$arrayElemAt", fixed(2);
    ArrayToObject => "$arrayToObject", fixed(1);
    ConcatArrays => "$concatArrays", at_least(0);
    Filter => "$filter", Form::Named(&FILTER);
    /// `$first`, both the array operator and the accumulator.
    First => "$first", fixed(1);
    FirstN => "$firstN", Form::Named(&N_OF_INPUT);
    In => "$in", fixed(2);
    IndexOfArray => "$indexOfArray", between(2, 4);
    IsArray => "$isArray", fixed(1);
    /// `$last`, both the array operator and the accumulator.
    Last => "$last", fixed(1);
    LastN => "$lastN", Form::Named(&N_OF_INPUT);
    Map => "$map", Form::Named(&MAP);
    MaxN => "$maxN", Form::Named(&N_OF_INPUT);
    MinN => "$minN", Form::Named(&N_OF_INPUT);
    ObjectToArray => "$objectToArray", fixed(1);
    Range => "$range", between(2, 3);
    Reduce => "$reduce", Form::Named(&REDUCE);
    ReverseArray => "$reverseArray", fixed(1);
    Size => "$size", fixed(1);
    Slice => "$slice", between(2, 3);
    SortArray => "$sortArray", Form::Named(&SORT_ARRAY);
    Zip => "$zip", Form::Named(&ZIP);

    // boolean
    And => "$and", at_least(0);
    Or => "$or", at_least(0);
    Not => "$not", fixed(1);

    // comparison
    Cmp => "$cmp", fixed(2);
    Eq => "$eq", fixed(2);
    Gt => "$gt", fixed(2);
    Gte => "$gte", fixed(2);
    Lt => "$lt", fixed(2);
    Lte => "$lte", fixed(2);
    Ne => "$ne", fixed(2);

    // conditional
    Cond => "$cond", Form::Named(&COND);
    IfNull => "$ifNull", at_least(2);
    Switch => "$switch", Form::Named(&SWITCH);

    // data size
    BinarySize => "$binarySize", fixed(1);
    BsonSize => "$bsonSize", fixed(1);

    // date
    DateAdd => "$dateAdd", Form::Named(&DATE_ARITHMETIC);
    DateDiff => "$dateDiff", Form::Named(&DATE_DIFF);
    DateFromParts => "$dateFromParts", Form::Named(&DATE_FROM_PARTS);
    DateFromString => "$dateFromString", Form::Named(&DATE_FROM_STRING);
    DateSubtract => "$dateSubtract", Form::Named(&DATE_ARITHMETIC);
    DateToParts => "$dateToParts", Form::Named(&DATE_TO_PARTS);
    DateToString => "$dateToString", Form::Named(&DATE_TO_STRING);
    DateTrunc => "$dateTrunc", Form::Named(&DATE_TRUNC);
    DayOfMonth => "$dayOfMonth", DATE_PART;
    DayOfWeek => "$dayOfWeek", DATE_PART;
    DayOfYear => "$dayOfYear", DATE_PART;
    Hour => "$hour", DATE_PART;
    IsoDayOfWeek => "$isoDayOfWeek", DATE_PART;
    IsoWeek => "$isoWeek", DATE_PART;
    IsoWeekYear => "$isoWeekYear", DATE_PART;
    Millisecond => "$millisecond", DATE_PART;
    Minute => "$minute", DATE_PART;
    Month => "$month", DATE_PART;
    Second => "$second", DATE_PART;
    Week => "$week", DATE_PART;
    Year => "$year", DATE_PART;
    ToDate => "$toDate", fixed(1);

    // trigonometry
    Sin => "$sin", fixed(1);
    Cos => "$cos", fixed(1);
    Tan => "$tan", fixed(1);
    Asin => "$asin", fixed(1);
    Acos => "$acos", fixed(1);
    Atan => "$atan", fixed(1);
    Atan2 => "$atan2", fixed(2);
    Asinh => "$asinh", fixed(1);
    Acosh => "$acosh", fixed(1);
    Atanh => "$atanh", fixed(1);
    Sinh => "$sinh", fixed(1);
    Cosh => "$cosh", fixed(1);
    Tanh => "$tanh", fixed(1);
    DegreesToRadians => "$degreesToRadians", fixed(1);
    RadiansToDegrees => "$radiansToDegrees", fixed(1);

    // string
    Concat => "$concat", at_least(0);
    IndexOfBytes => "$indexOfBytes", between(2, 4);
    IndexOfCP => "$indexOfCP", between(2, 4);
    Ltrim => "$ltrim", Form::Named(&TRIM);
    Rtrim => "$rtrim", Form::Named(&TRIM);
    Trim => "$trim", Form::Named(&TRIM);
    RegexFind => "$regexFind", Form::Named(&REGEX);
    RegexFindAll => "$regexFindAll", Form::Named(&REGEX);
    RegexMatch => "$regexMatch", Form::Named(&REGEX);
    ReplaceOne => "$replaceOne", Form::Named(&REPLACE);
    ReplaceAll => "$replaceAll", Form::Named(&REPLACE);
    Split => "$split", fixed(2);
    StrLenBytes => "$strLenBytes", fixed(1);
    StrLenCP => "$strLenCP", fixed(1);
    Strcasecmp => "$strcasecmp", fixed(2);
    Substr => "$substr", fixed(3);
    SubstrBytes => "$substrBytes", fixed(3);
    SubstrCP => "$substrCP", fixed(3);
    ToLower => "$toLower", fixed(1);
    ToUpper => "$toUpper", fixed(1);

    // set
    AllElementsTrue => "$allElementsTrue", fixed(1);
    AnyElementTrue => "$anyElementTrue", fixed(1);
    SetDifference => "$setDifference", fixed(2);
    SetEquals => "$setEquals", at_least(2);
    SetIntersection => "$setIntersection", at_least(0);
    SetIsSubset => "$setIsSubset", fixed(2);
    SetUnion => "$setUnion", at_least(0);

    // type
    Convert => "$convert", Form::Named(&CONVERT);
    IsNumber => "$isNumber", fixed(1);
    ToBool => "$toBool", fixed(1);
    ToDecimal => "$toDecimal", fixed(1);
    ToDouble => "$toDouble", fixed(1);
    ToInt => "$toInt", fixed(1);
    ToLong => "$toLong", fixed(1);
    ToObjectId => "$toObjectId", fixed(1);
    ToString => "$toString", fixed(1);
    Type => "$type", fixed(1);

    // object and miscellaneous
    /// `$mergeObjects`, both the expression and the accumulator.
    MergeObjects => "$mergeObjects", at_least(0);
    GetField => "$getField", Form::Unary { key: "field", options: &["input"] };
    SetField => "$setField", Form::Named(&SET_FIELD);
    UnsetField => "$unsetField", Form::Named(&UNSET_FIELD);
    Let => "$let", Form::Named(&LET);
    Meta => "$meta", fixed(1);
    Rand => "$rand", Form::Nullary;
    SampleRate => "$sampleRate", fixed(1);
    Function => "$function", Form::Named(&FUNCTION);

    // accumulators
    Accumulator => "$accumulator", Form::Named(&ACCUMULATOR);
    AddToSet => "$addToSet", fixed(1);
    Avg => "$avg", at_least(0);
    Bottom => "$bottom", Form::Named(&SORTED_PICK);
    BottomN => "$bottomN", Form::Named(&SORTED_PICK_N);
    Count => "$count", Form::Nullary;
    Max => "$max", at_least(0);
    Median => "$median", Form::Named(&MEDIAN);
    Min => "$min", at_least(0);
    Percentile => "$percentile", Form::Named(&PERCENTILE);
    Push => "$push", fixed(1);
    StdDevPop => "$stdDevPop", at_least(0);
    StdDevSamp => "$stdDevSamp", at_least(0);
    Sum => "$sum", at_least(0);
    Top => "$top", Form::Named(&SORTED_PICK);
    TopN => "$topN", Form::Named(&SORTED_PICK_N);

    // window functions
    CovariancePop => "$covariancePop", fixed(2);
    CovarianceSamp => "$covarianceSamp", fixed(2);
    DenseRank => "$denseRank", Form::Nullary;
    Derivative => "$derivative", Form::Named(&DERIVATIVE);
    DocumentNumber => "$documentNumber", Form::Nullary;
    ExpMovingAvg => "$expMovingAvg", Form::Named(&EXP_MOVING_AVG);
    Integral => "$integral", Form::Named(&DERIVATIVE);
    LinearFill => "$linearFill", fixed(1);
    Locf => "$locf", fixed(1);
    Rank => "$rank", Form::Nullary;
    Shift => "$shift", Form::Named(&SHIFT);
}

impl Op {
    /// Whether `$setWindowFields` accepts a `window` clause for this operator.
    pub fn accepts_window(self) -> bool {
        !matches!(
            self,
            Op::DenseRank
                | Op::DocumentNumber
                | Op::Rank
                | Op::Shift
                | Op::LinearFill
                | Op::Locf
                | Op::ExpMovingAvg
        )
    }

    /// Whether `$setWindowFields` must carry a `sortBy` for this operator.
    pub fn requires_sort_by(self) -> bool {
        matches!(
            self,
            Op::DenseRank
                | Op::DocumentNumber
                | Op::Rank
                | Op::Shift
                | Op::LinearFill
                | Op::Locf
                | Op::ExpMovingAvg
                | Op::Derivative
                | Op::Integral
        )
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_names_are_unique_and_prefixed() {
        let mut seen = HashSet::new();
        for op in Op::ALL {
            assert!(op.name().starts_with('$'), "{:?}", op);
            assert!(seen.insert(op.name()), "duplicate name {}", op.name());
        }
    }

    #[test]
    fn test_named_specs_are_consistent() {
        for op in Op::ALL {
            if let Form::Named(spec) = op.form() {
                for key in spec.required.iter().chain(spec.one_of) {
                    assert!(spec.keys.contains(key), "{} lists unknown key {}", op, key);
                }
                for (a, b) in spec.conflicts {
                    assert!(spec.keys.contains(a) && spec.keys.contains(b));
                }
            }
        }
    }

    #[test]
    fn test_window_capabilities() {
        assert!(Op::Sum.accepts_window());
        assert!(!Op::Sum.requires_sort_by());
        assert!(!Op::Rank.accepts_window());
        assert!(Op::Rank.requires_sort_by());
        assert!(Op::Derivative.accepts_window());
        assert!(Op::Derivative.requires_sort_by());
    }

    #[test]
    fn test_forms() {
        assert_eq!(Op::Subtract.form(), fixed(2));
        assert_eq!(Op::Rand.form(), Form::Nullary);
        assert!(matches!(Op::Year.form(), Form::Unary { key: "date", .. }));
        assert!(matches!(Op::Filter.form(), Form::Named(spec) if spec.keys[1] == "as"));
    }
}
