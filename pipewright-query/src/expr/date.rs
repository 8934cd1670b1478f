//! Date expressions.
//!
//! Part extractors (`year`, `month`, ...) encode bare unless a timezone is
//! set, in which case they switch to `{ date, timezone }`. The remaining
//! operators take named arguments; units accept a [`TimeUnit`] or any
//! expression that evaluates to a unit name.
//!
//! [`TimeUnit`]: crate::window::TimeUnit

use super::arithmetic::unary;
use super::{Call, Expression, Op, options_builder};

options_builder! {
    /// Builder for the date part extractors.
    DatePart {
        /// Olson timezone identifier or UTC offset.
        timezone => "timezone",
    }
}

macro_rules! date_part {
    ($($(#[$doc:meta])* $fn:ident => $op:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $fn(date: impl Into<Expression>) -> DatePart {
                DatePart(Call::with_args(Op::$op, [date.into()]))
            }
        )*
    };
}

date_part! {
    /// `$dayOfMonth` (1-31).
    day_of_month => DayOfMonth,
    /// `$dayOfWeek` (1 Sunday to 7 Saturday).
    day_of_week => DayOfWeek,
    /// `$dayOfYear` (1-366).
    day_of_year => DayOfYear,
    /// `$hour`
    hour => Hour,
    /// `$isoDayOfWeek` (1 Monday to 7 Sunday).
    iso_day_of_week => IsoDayOfWeek,
    /// `$isoWeek`
    iso_week => IsoWeek,
    /// `$isoWeekYear`
    iso_week_year => IsoWeekYear,
    /// `$millisecond`
    millisecond => Millisecond,
    /// `$minute`
    minute => Minute,
    /// `$month`
    month => Month,
    /// `$second`
    second => Second,
    /// `$week` (0-53).
    week => Week,
    /// `$year`
    year => Year,
}

unary! {
    /// `$toDate`
    to_date => ToDate,
}

options_builder! {
    /// Builder for `$dateAdd` and `$dateSubtract`.
    DateArithmetic {
        timezone => "timezone",
    }
}

/// `$dateAdd`: move `start_date` forward by `amount` units.
pub fn date_add(
    start_date: impl Into<Expression>,
    unit: impl Into<Expression>,
    amount: impl Into<Expression>,
) -> DateArithmetic {
    DateArithmetic(
        Call::new(Op::DateAdd)
            .option("startDate", start_date)
            .option("unit", unit)
            .option("amount", amount),
    )
}

/// `$dateSubtract`: move `start_date` back by `amount` units.
pub fn date_subtract(
    start_date: impl Into<Expression>,
    unit: impl Into<Expression>,
    amount: impl Into<Expression>,
) -> DateArithmetic {
    DateArithmetic(
        Call::new(Op::DateSubtract)
            .option("startDate", start_date)
            .option("unit", unit)
            .option("amount", amount),
    )
}

options_builder! {
    /// Builder for `$dateDiff`.
    DateDiff {
        timezone => "timezone",
        /// First day of the week when `unit` is `week`.
        start_of_week => "startOfWeek",
    }
}

/// `$dateDiff`: number of `unit` boundaries crossed between two dates.
pub fn date_diff(
    start_date: impl Into<Expression>,
    end_date: impl Into<Expression>,
    unit: impl Into<Expression>,
) -> DateDiff {
    DateDiff(
        Call::new(Op::DateDiff)
            .option("startDate", start_date)
            .option("endDate", end_date)
            .option("unit", unit),
    )
}

options_builder! {
    /// Builder for `$dateTrunc`.
    DateTrunc {
        /// Number of units per bin.
        bin_size => "binSize",
        timezone => "timezone",
        start_of_week => "startOfWeek",
    }
}

/// `$dateTrunc`: round `date` down to a `unit` boundary.
pub fn date_trunc(date: impl Into<Expression>, unit: impl Into<Expression>) -> DateTrunc {
    DateTrunc(Call::new(Op::DateTrunc).option("date", date).option("unit", unit))
}

options_builder! {
    /// Builder for `$dateFromParts`. Calendar and ISO week parts cannot be
    /// mixed.
    DateFromParts {
        year => "year",
        iso_week_year => "isoWeekYear",
        month => "month",
        iso_week => "isoWeek",
        day => "day",
        iso_day_of_week => "isoDayOfWeek",
        hour => "hour",
        minute => "minute",
        second => "second",
        millisecond => "millisecond",
        timezone => "timezone",
    }
}

/// `$dateFromParts` from calendar parts.
pub fn date_from_parts(year: impl Into<Expression>) -> DateFromParts {
    DateFromParts(Call::new(Op::DateFromParts).option("year", year))
}

/// `$dateFromParts` from ISO week-date parts.
pub fn iso_date_from_parts(iso_week_year: impl Into<Expression>) -> DateFromParts {
    DateFromParts(Call::new(Op::DateFromParts).option("isoWeekYear", iso_week_year))
}

options_builder! {
    /// Builder for `$dateFromString`.
    DateFromString {
        format => "format",
        timezone => "timezone",
        /// Value returned when parsing fails.
        on_error => "onError",
        /// Value returned when the input is null or missing.
        on_null => "onNull",
    }
}

/// `$dateFromString`
pub fn date_from_string(date_string: impl Into<Expression>) -> DateFromString {
    DateFromString(Call::new(Op::DateFromString).option("dateString", date_string))
}

options_builder! {
    /// Builder for `$dateToParts`.
    DateToParts {
        timezone => "timezone",
        /// Return ISO week-date parts instead of calendar parts.
        iso8601 => "iso8601",
    }
}

/// `$dateToParts`
pub fn date_to_parts(date: impl Into<Expression>) -> DateToParts {
    DateToParts(Call::new(Op::DateToParts).option("date", date))
}

options_builder! {
    /// Builder for `$dateToString`.
    DateToString {
        /// `strftime`-style format, e.g. `%Y-%m-%d`.
        format => "format",
        timezone => "timezone",
        on_null => "onNull",
    }
}

/// `$dateToString`
pub fn date_to_string(date: impl Into<Expression>) -> DateToString {
    DateToString(Call::new(Op::DateToString).option("date", date))
}

#[cfg(test)]
mod tests {
    use bson::{Bson, bson};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::EncodeContext;
    use crate::expr::{field, value};
    use crate::window::TimeUnit;

    fn enc(e: impl Into<Expression>) -> Bson {
        e.into().encode(&EncodeContext::new()).unwrap()
    }

    #[test]
    fn test_date_parts() {
        assert_eq!(enc(day_of_year(field("date"))), bson!({ "$dayOfYear": "$date" }));
        assert_eq!(
            enc(hour(field("date")).timezone("America/Chicago")),
            bson!({ "$hour": { "date": "$date", "timezone": "America/Chicago" } })
        );
    }

    #[test]
    fn test_date_add() {
        let e = date_add(field("purchaseDate"), TimeUnit::Day, value(3));
        assert_eq!(
            enc(e),
            bson!({ "$dateAdd": { "startDate": "$purchaseDate", "unit": "day", "amount": 3 } })
        );

        let e = date_subtract(field("logout"), "hour", value(3)).timezone("+05:00");
        assert_eq!(
            enc(e),
            bson!({
                "$dateSubtract": {
                    "startDate": "$logout",
                    "unit": "hour",
                    "amount": 3,
                    "timezone": "+05:00"
                }
            })
        );
    }

    #[test]
    fn test_date_diff_and_trunc() {
        let e = date_diff(field("purchased"), field("delivered"), TimeUnit::Week)
            .start_of_week("monday");
        assert_eq!(
            enc(e),
            bson!({
                "$dateDiff": {
                    "startDate": "$purchased",
                    "endDate": "$delivered",
                    "unit": "week",
                    "startOfWeek": "monday"
                }
            })
        );

        let e = date_trunc(field("orderDate"), TimeUnit::Month).bin_size(3);
        assert_eq!(
            enc(e),
            bson!({ "$dateTrunc": { "date": "$orderDate", "unit": "month", "binSize": 3 } })
        );
    }

    #[test]
    fn test_date_from_parts() {
        let e = date_from_parts(2017).month(2).day(8).hour(12);
        assert_eq!(
            enc(e),
            bson!({ "$dateFromParts": { "year": 2017, "month": 2, "day": 8, "hour": 12 } })
        );

        let e = iso_date_from_parts(2017).iso_week(6).iso_day_of_week(3);
        assert_eq!(
            enc(e),
            bson!({ "$dateFromParts": { "isoWeekYear": 2017, "isoWeek": 6, "isoDayOfWeek": 3 } })
        );

        let err = Expression::from(date_from_parts(2017).iso_week(6))
            .encode(&EncodeContext::new())
            .unwrap_err();
        assert!(err.is_invalid_shape());

        let err = Expression::from(date_from_parts(2017).iso_week_year(2017))
            .encode(&EncodeContext::new())
            .unwrap_err();
        assert!(err.is_invalid_shape());
    }

    #[test]
    fn test_date_string_conversions() {
        let e = date_to_string(field("date")).format("%Y-%m-%d");
        assert_eq!(
            enc(e),
            bson!({ "$dateToString": { "date": "$date", "format": "%Y-%m-%d" } })
        );

        let e = date_from_string(field("date"))
            .timezone(field("tz"))
            .on_error(field("date"));
        assert_eq!(
            enc(e),
            bson!({
                "$dateFromString": { "dateString": "$date", "timezone": "$tz", "onError": "$date" }
            })
        );

        let e = date_to_parts(field("date")).iso8601(true);
        assert_eq!(
            enc(e),
            bson!({ "$dateToParts": { "date": "$date", "iso8601": true } })
        );
    }
}
