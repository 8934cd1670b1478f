//! Set expressions.

use super::arithmetic::{binary, unary, variadic};
use super::{Call, Expression, Op};

unary! {
    /// `$allElementsTrue`
    all_elements_true => AllElementsTrue,
    /// `$anyElementTrue`
    any_element_true => AnyElementTrue,
}

binary! {
    /// `$setDifference`: elements of the first set missing from the second.
    set_difference => SetDifference,
    /// `$setIsSubset`
    set_is_subset => SetIsSubset,
}

variadic! {
    /// `$setEquals`; needs at least two sets.
    set_equals => SetEquals,
    /// `$setIntersection`
    set_intersection => SetIntersection,
    /// `$setUnion`
    set_union => SetUnion,
}
