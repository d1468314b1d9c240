//! "Scheduler-aware sequences" (§4.4 `checkCall`, `Array.create`; §6
//! `JSON.parse`): ordinary JS arrays, marked with a hidden own property so
//! [`crate::scheduler`] knows every element access on them is a suspension
//! point (§5 "every call into a scheduler-aware primitive").

use boa_engine::object::builtins::JsArray;
use boa_engine::{Context, JsResult, JsValue};

/// Non-enumerable marker property name. Never surfaced to program code
/// (`for`/`in` is forbidden anyway, but `Object.keys` must not see it).
const MARKER: &str = "__elementary_sequence__";

pub fn make_sequence(values: Vec<JsValue>, context: &mut Context) -> JsResult<JsValue> {
    let array = JsArray::from_iter(values, context);
    mark_scheduler_aware(&array, context)?;
    Ok(array.into())
}

pub fn mark_scheduler_aware(array: &JsArray, context: &mut Context) -> JsResult<()> {
    array.set(
        boa_engine::js_string!(MARKER),
        JsValue::from(true),
        false,
        context,
    )
}

pub fn is_scheduler_aware(value: &JsValue, context: &mut Context) -> bool {
    value
        .as_object()
        .map(|obj| {
            obj.has_own_property(boa_engine::js_string!(MARKER), context)
                .unwrap_or(false)
        })
        .unwrap_or(false)
}

/// Recursively wraps every array encountered while walking a freshly-parsed
/// `JSON.parse` result, per §6 "`JSON.parse` (returns scheduler-aware
/// sequences recursively)".
pub fn mark_recursively(value: &JsValue, context: &mut Context) -> JsResult<()> {
    let Some(obj) = value.as_object() else {
        return Ok(());
    };
    if let Ok(array) = JsArray::from_object(obj.clone()) {
        mark_scheduler_aware(&array, context)?;
        let len = array.length(context)?;
        for i in 0..len {
            let element = array.get(i, context)?;
            mark_recursively(&element, context)?;
        }
        return Ok(());
    }
    let keys = obj.own_property_keys(context)?;
    for key in keys {
        let value = obj.get(key, context)?;
        mark_recursively(&value, context)?;
    }
    Ok(())
}
