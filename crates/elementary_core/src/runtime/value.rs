//! Structural predicates over `JsValue`: the "runtime-checked value
//! categories" from §3 are distinguished by shape, not by a declared type, so
//! every check in [`super::checks`] goes through one of these.

use boa_engine::{Context, JsString, JsValue};

pub(super) fn is_sequence(value: &JsValue) -> bool {
    value
        .as_object()
        .map(|obj| obj.is_array())
        .unwrap_or(false)
}

/// §4.4 `dot`: "object-shaped" means object, string, boolean, number, or
/// callable — i.e. anything except `undefined`/`null`.
pub(super) fn is_object_shaped(value: &JsValue) -> bool {
    !value.is_undefined() && !value.is_null()
}

pub(super) fn is_numeric(value: &JsValue) -> bool {
    matches!(value, JsValue::Integer(_) | JsValue::Rational(_))
}

/// Renders a value the way the diagnostic strings in §4.4 expect: numbers and
/// booleans print bare, strings and everything else go through the engine's
/// display form (close enough to `String(v)` for the values this dialect
/// allows through).
pub(super) fn display_value(value: &JsValue, context: &mut Context) -> String {
    match value {
        JsValue::String(s) => s.to_std_string_escaped(),
        _ => value
            .to_string(context)
            .map(|s| s.to_std_string_escaped())
            .unwrap_or_else(|_| format!("{value:?}")),
    }
}

/// `o` has `name` as an *own* property (the checks never walk the prototype
/// chain: a freshly-constructed `{}` does not "have" `.toString`).
pub(super) fn has_own_property(
    value: &JsValue,
    name: &str,
    context: &mut Context,
) -> bool {
    value
        .as_object()
        .map(|obj| obj.has_own_property(JsString::from(name), context).unwrap_or(false))
        .unwrap_or(false)
}
