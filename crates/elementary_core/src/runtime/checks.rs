//! The named operations from §4.4, one function per table row. Each takes
//! the already-evaluated arguments (the rewriter has already spliced the
//! call; these are plain native functions, not part of the AST) and the
//! line number of the guarded operation, and either returns a value or
//! raises a [`JsNativeError`].
//!
//! In silent mode (`opts.ejsOff`) a failing check logs through `tracing`
//! and returns a sentinel (`undefined`) instead of raising, per §7 "Runtime
//! check failures... In silent mode, they are logged and the runtime
//! returns a sentinel so execution can continue."

use boa_engine::{Context, JsNativeError, JsResult, JsString, JsValue};

use super::value::{display_value, has_own_property, is_numeric, is_object_shaped, is_sequence};

/// Either raises `err` or logs it and returns `undefined`, depending on
/// silent mode. Centralizes the §7 "recover vs. surface" split so every
/// check below is a one-liner at the point of failure.
fn fail(silent: bool, err: JsNativeError) -> JsResult<JsValue> {
    if silent {
        tracing::warn!(message = %err, "runtime check failed (silent mode)");
        Ok(JsValue::undefined())
    } else {
        Err(err.into())
    }
}

fn length_of(o: &JsValue, context: &mut Context) -> JsResult<i64> {
    o.as_object()
        .expect("caller already checked is_sequence")
        .get(boa_engine::js_string!("length"), context)?
        .to_length(context)
        .map(|len| len as i64)
}

pub(super) fn array_bounds_check(
    silent: bool,
    o: &JsValue,
    index: &JsValue,
    line: u32,
    context: &mut Context,
) -> JsResult<JsValue> {
    if !is_sequence(o) {
        return fail(
            silent,
            JsNativeError::typ().with_message(format!("Line {line}: not an array.")),
        );
    }
    let i = index.to_number(context)?;
    if i < 0.0 || i.fract() != 0.0 {
        return fail(
            silent,
            JsNativeError::typ().with_message(format!(
                "Line {line}: Index '{}' is out of array bounds.",
                display_value(index, context)
            )),
        );
    }
    let len = length_of(o, context)?;
    if i as i64 >= len {
        return fail(
            silent,
            JsNativeError::typ().with_message(format!(
                "Line {line}: Index '{}' is out of array bounds.",
                display_value(index, context)
            )),
        );
    }
    o.as_object()
        .expect("checked above")
        .get(i as u32, context)
}

pub(super) fn dot(
    silent: bool,
    o: &JsValue,
    name: &str,
    line: u32,
    context: &mut Context,
) -> JsResult<JsValue> {
    if !is_object_shaped(o) {
        return fail(
            silent,
            JsNativeError::typ().with_message(format!(
                "Line {line}: Cannot read member '{name}' of {}.",
                display_value(o, context)
            )),
        );
    }
    if !has_own_property(o, name, context) {
        return fail(
            silent,
            JsNativeError::typ()
                .with_message(format!("Line {line}: Object does not have member '{name}'.")),
        );
    }
    o.as_object()
        .expect("checked above")
        .get(JsString::from(name), context)
}

pub(super) fn check_member(
    silent: bool,
    o: &JsValue,
    name: &str,
    v: JsValue,
    line: u32,
    context: &mut Context,
) -> JsResult<JsValue> {
    if is_sequence(o) {
        return fail(
            silent,
            JsNativeError::typ()
                .with_message(format!("Line {line}: Use checkArray for arrays.")),
        );
    }
    if !has_own_property(o, name, context) {
        return fail(
            silent,
            JsNativeError::typ()
                .with_message(format!("Line {line}: Object does not have member '{name}'.")),
        );
    }
    o.as_object()
        .expect("checked above")
        .set(JsString::from(name), v.clone(), true, context)?;
    Ok(v)
}

pub(super) fn check_array(
    silent: bool,
    o: &JsValue,
    index: &JsValue,
    v: JsValue,
    line: u32,
    context: &mut Context,
) -> JsResult<JsValue> {
    if !is_sequence(o) {
        return fail(
            silent,
            JsNativeError::typ().with_message(format!("Line {line}: not an array.")),
        );
    }
    let i = index.to_number(context)?;
    if i < 0.0 || i.fract() != 0.0 || i as i64 >= length_of(o, context)? {
        return fail(
            silent,
            JsNativeError::typ().with_message(format!(
                "Line {line}: Index '{}' is out of array bounds.",
                display_value(index, context)
            )),
        );
    }
    o.as_object()
        .expect("checked above")
        .set(i as u32, v.clone(), true, context)?;
    Ok(v)
}

pub(super) fn check_update_operand(
    silent: bool,
    op: &str,
    o: &JsValue,
    member: &JsValue,
    line: u32,
    context: &mut Context,
) -> JsResult<JsValue> {
    let current = if is_sequence(o) {
        let i = member.to_number(context)?;
        if i < 0.0 || i.fract() != 0.0 || i as i64 >= length_of(o, context)? {
            return fail(
                silent,
                JsNativeError::typ().with_message(format!(
                    "Line {line}: Index '{}' is out of array bounds.",
                    display_value(member, context)
                )),
            );
        }
        o.as_object().expect("checked above").get(i as u32, context)?
    } else {
        let name = member.to_string(context)?.to_std_string_escaped();
        if !has_own_property(o, &name, context) {
            return fail(
                silent,
                JsNativeError::typ()
                    .with_message(format!("Line {line}: object does not have member '{name}'.")),
            );
        }
        o.as_object()
            .expect("checked above")
            .get(JsString::from(name), context)?
    };

    if !is_numeric(&current) {
        return fail(
            silent,
            JsNativeError::typ().with_message(format!(
                "Line {line}: operand of '{op}' must be a number."
            )),
        );
    }
    let n = current.to_number(context)?;
    let updated = match op {
        "++" => n + 1.0,
        "--" => n - 1.0,
        _ => unreachable!("rewriter only emits '++'/'--'"),
    };
    let updated_value = JsValue::from(updated);
    if is_sequence(o) {
        let i = member.to_number(context)? as u32;
        o.as_object()
            .expect("checked above")
            .set(i, updated_value.clone(), true, context)?;
    } else {
        let name = member.to_string(context)?.to_std_string_escaped();
        o.as_object()
            .expect("checked above")
            .set(JsString::from(name), updated_value.clone(), true, context)?;
    }
    Ok(updated_value)
}

pub(super) fn update_only_numbers(
    silent: bool,
    op: &str,
    v: &JsValue,
    line: u32,
    context: &mut Context,
) -> JsResult<JsValue> {
    if !is_numeric(v) {
        return fail(
            silent,
            JsNativeError::typ().with_message(format!(
                "Line {line}: operand of '{op}' must be a number, received '{}'.",
                display_value(v, context)
            )),
        );
    }
    Ok(JsValue::undefined())
}

const NUMERIC_BINARY_OPS: &[&str] = &[
    "-", "*", "/", "%", "<<", ">>", ">>>", "&", "|", "^", "<", "<=", ">", ">=",
];

pub(super) fn apply_num_op(
    silent: bool,
    op: &str,
    l: &JsValue,
    r: &JsValue,
    line: u32,
    context: &mut Context,
) -> JsResult<JsValue> {
    debug_assert!(NUMERIC_BINARY_OPS.contains(&op));
    if !is_numeric(l) || !is_numeric(r) {
        return fail(
            silent,
            JsNativeError::typ().with_message(format!(
                "Line {line}: arguments of operator '{op}' must both be numbers."
            )),
        );
    }
    let a = l.to_number(context)?;
    let b = r.to_number(context)?;
    let result = match op {
        "-" => JsValue::from(a - b),
        "*" => JsValue::from(a * b),
        "/" => JsValue::from(a / b),
        "%" => JsValue::from(a % b),
        "<<" => JsValue::from((a as i32) << ((b as i32) & 31)),
        ">>" => JsValue::from((a as i32) >> ((b as i32) & 31)),
        ">>>" => JsValue::from((a as u32) >> ((b as i32) & 31)),
        "&" => JsValue::from((a as i32) & (b as i32)),
        "|" => JsValue::from((a as i32) | (b as i32)),
        "^" => JsValue::from((a as i32) ^ (b as i32)),
        "<" => JsValue::from(a < b),
        "<=" => JsValue::from(a <= b),
        ">" => JsValue::from(a > b),
        ">=" => JsValue::from(a >= b),
        _ => unreachable!("checked by debug_assert above"),
    };
    Ok(result)
}

pub(super) fn apply_num_or_string_op(
    silent: bool,
    l: &JsValue,
    r: &JsValue,
    line: u32,
    context: &mut Context,
) -> JsResult<JsValue> {
    if is_numeric(l) && is_numeric(r) {
        return Ok(JsValue::from(l.to_number(context)? + r.to_number(context)?));
    }
    if matches!(l, JsValue::String(_)) && matches!(r, JsValue::String(_)) {
        let left = l.to_string(context)?;
        let right = r.to_string(context)?;
        let mut joined = left.to_std_string_escaped();
        joined.push_str(&right.to_std_string_escaped());
        return Ok(JsValue::from(boa_engine::JsString::from(joined)));
    }
    fail(
        silent,
        JsNativeError::typ()
            .with_message(format!("Line {line}: arguments of operator '+' must both be numbers or strings.")),
    )
}

pub(super) fn check_if_boolean(
    silent: bool,
    v: &JsValue,
    op: Option<&str>,
    line: u32,
    context: &mut Context,
) -> JsResult<JsValue> {
    if let JsValue::Boolean(_) = v {
        return Ok(v.clone());
    }
    let rendered = display_value(v, context);
    let message = match op {
        None => format!("Line {line}: Expected a boolean expression, instead received '{rendered}'."),
        Some(operator) => format!(
            "Line {line}: Expected a boolean value for operator '{operator}', instead received '{rendered}'."
        ),
    };
    fail(silent, JsNativeError::typ().with_message(message))
}

pub(super) fn arity_check(
    silent: bool,
    name: &str,
    expected: i32,
    actual: i32,
    line: u32,
) -> JsResult<JsValue> {
    if expected == actual {
        return Ok(JsValue::undefined());
    }
    let expected_noun = if expected == 1 { "argument" } else { "arguments" };
    let actual_noun = if actual == 1 { "argument" } else { "arguments" };
    fail(
        silent,
        JsNativeError::typ().with_message(format!(
            "Line {line}: Function {name} expected {expected} {expected_noun} but received {actual} {actual_noun}."
        )),
    )
}

pub(crate) fn require(
    name: &str,
    whitelist: &std::collections::HashMap<String, JsValue>,
) -> JsResult<JsValue> {
    whitelist
        .get(name)
        .cloned()
        .ok_or_else(|| JsNativeError::typ().with_message(format!("'{name}' not found.")).into())
}

/// `arityCheck`'s `actual` argument is read from `arguments.length`; both
/// `expected`/`actual` arrive from the spliced call as JS numbers.
pub(super) fn as_i32(v: &JsValue, context: &mut Context) -> JsResult<i32> {
    Ok(v.to_number(context)? as i32)
}
