//! System variables.

use super::Expression;

macro_rules! system_variables {
    ($($(#[$doc:meta])* $fn:ident => $name:literal),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $fn() -> Expression {
                Expression::Variable($name.to_string())
            }
        )*
    };
}

system_variables! {
    /// `$$ROOT`: the top-level document being processed.
    root => "ROOT",
    /// `$$CURRENT`: the start of field paths, `$$ROOT` unless rebound.
    current => "CURRENT",
    /// `$$REMOVE`: evaluating to it drops the field.
    remove => "REMOVE",
    /// `$$NOW`: the same instant for the whole pipeline.
    now => "NOW",
    /// `$$CLUSTER_TIME`, on replica sets and sharded clusters only.
    cluster_time => "CLUSTER_TIME",
    /// `$$DESCEND`, for `$redact`.
    descend => "DESCEND",
    /// `$$PRUNE`, for `$redact`.
    prune => "PRUNE",
    /// `$$KEEP`, for `$redact`.
    keep => "KEEP",
    /// `$$SEARCH_META`: Atlas Search metadata.
    search_meta => "SEARCH_META",
    /// `$$USER_ROLES`: roles of the current user.
    user_roles => "USER_ROLES",
    /// `$$this`: the current element inside `$map`, `$filter` and `$reduce`.
    this => "this",
}
