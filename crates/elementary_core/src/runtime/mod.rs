//! The runtime check library (C4): the `rts` object every rewritten program
//! is given a local alias to (see [`crate::rewrite::synth::RTS_LOCAL_NAME`]).
//! Each method corresponds to one row of §4.4's table; the heavy lifting
//! lives in [`checks`], this module is just the `NativeFunction` plumbing
//! and the silent-mode flag the checks all consult.

mod checks;
pub mod sequence;
mod value;

pub(crate) use checks::require;

use boa_engine::object::{Object, ObjectInitializer};
use boa_engine::{
    Context, JsArgs, JsError, JsNativeError, JsObject, JsResult, JsString, JsValue, NativeFunction,
};
use boa_gc::{empty_trace, Finalize, GcRefMut, Trace};

use crate::deadline::Deadline;

/// Backing state for the `rts` object: the silent-mode flag from
/// `CompileOpts::ejs_off` (§6), and the shared per-test deadline cell the
/// harness (C6) arms around a `test` body. Holds no GC-managed data, so
/// tracing is a no-op, matching the pattern used for other native objects in
/// this crate.
pub struct RuntimeChecks {
    silent: bool,
    deadline: Deadline,
}

impl Finalize for RuntimeChecks {}
unsafe impl Trace for RuntimeChecks {
    empty_trace!();
}

impl RuntimeChecks {
    fn extract<'a>(this: &'a JsValue) -> JsResult<GcRefMut<'a, Object, Self>> {
        this.as_object()
            .and_then(|obj| obj.downcast_mut::<Self>())
            .ok_or_else(|| JsError::from_native(JsNativeError::typ().with_message("not an rts object")))
    }

    fn line_arg(args: &[JsValue], index: usize, context: &mut Context) -> JsResult<u32> {
        Ok(args.get_or_undefined(index).to_number(context)? as u32)
    }

    fn array_bounds_check(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let silent = Self::extract(this)?.silent;
        let line = Self::line_arg(args, 2, context)?;
        checks::array_bounds_check(silent, args.get_or_undefined(0), args.get_or_undefined(1), line, context)
    }

    fn dot(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let silent = Self::extract(this)?.silent;
        let name = args.get_or_undefined(1).to_string(context)?.to_std_string_escaped();
        let line = Self::line_arg(args, 2, context)?;
        checks::dot(silent, args.get_or_undefined(0), &name, line, context)
    }

    fn check_member(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let silent = Self::extract(this)?.silent;
        let name = args.get_or_undefined(1).to_string(context)?.to_std_string_escaped();
        let line = Self::line_arg(args, 3, context)?;
        checks::check_member(
            silent,
            args.get_or_undefined(0),
            &name,
            args.get_or_undefined(2).clone(),
            line,
            context,
        )
    }

    fn check_array(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let silent = Self::extract(this)?.silent;
        let line = Self::line_arg(args, 3, context)?;
        checks::check_array(
            silent,
            args.get_or_undefined(0),
            args.get_or_undefined(1),
            args.get_or_undefined(2).clone(),
            line,
            context,
        )
    }

    fn check_update_operand(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let silent = Self::extract(this)?.silent;
        let op = args.get_or_undefined(0).to_string(context)?.to_std_string_escaped();
        let line = Self::line_arg(args, 3, context)?;
        checks::check_update_operand(
            silent,
            &op,
            args.get_or_undefined(1),
            args.get_or_undefined(2),
            line,
            context,
        )
    }

    fn update_only_numbers(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let silent = Self::extract(this)?.silent;
        let op = args.get_or_undefined(0).to_string(context)?.to_std_string_escaped();
        let line = Self::line_arg(args, 2, context)?;
        checks::update_only_numbers(silent, &op, args.get_or_undefined(1), line, context)
    }

    fn apply_num_op(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let silent = Self::extract(this)?.silent;
        let op = args.get_or_undefined(0).to_string(context)?.to_std_string_escaped();
        let line = Self::line_arg(args, 3, context)?;
        checks::apply_num_op(silent, &op, args.get_or_undefined(1), args.get_or_undefined(2), line, context)
    }

    fn apply_num_or_string_op(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let silent = Self::extract(this)?.silent;
        let line = Self::line_arg(args, 3, context)?;
        checks::apply_num_or_string_op(silent, args.get_or_undefined(1), args.get_or_undefined(2), line, context)
    }

    fn check_if_boolean(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let state = Self::extract(this)?;
        if crate::deadline::exceeded(&state.deadline) {
            return Err(JsNativeError::error()
                .with_message(crate::deadline::TIME_LIMIT_EXCEEDED)
                .into());
        }
        let silent = state.silent;
        drop(state);
        let op = args.get_or_undefined(1);
        let op = if op.is_null_or_undefined() {
            None
        } else {
            Some(op.to_string(context)?.to_std_string_escaped())
        };
        let line = Self::line_arg(args, 2, context)?;
        checks::check_if_boolean(silent, args.get_or_undefined(0), op.as_deref(), line, context)
    }

    fn arity_check(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let silent = Self::extract(this)?.silent;
        let name = args.get_or_undefined(0).to_string(context)?.to_std_string_escaped();
        let expected = checks::as_i32(args.get_or_undefined(1), context)?;
        let actual = checks::as_i32(args.get_or_undefined(2), context)?;
        let line = Self::line_arg(args, 3, context)?;
        checks::arity_check(silent, &name, expected, actual, line)
    }

    /// `rts.sequence(a, b, ...)`: the comma-operator desugaring (see
    /// `rewrite::expr::comma_sequence`) — evaluates every argument (already
    /// done by ordinary call semantics) and returns the last one.
    fn sequence(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
        Ok(args.last().cloned().unwrap_or_else(JsValue::undefined))
    }

    /// `rts.checkCall(o, fieldName, args)`: re-invokes `o[fieldName](...args)`
    /// and, for the enumerated sequence-producing idioms (§4.3 "Call
    /// expression"), wraps a resulting array as scheduler-aware.
    fn check_call(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let silent = Self::extract(this)?.silent;
        let object = args.get_or_undefined(0).clone();
        let field = args.get_or_undefined(1).to_string(context)?.to_std_string_escaped();
        let call_args = match args
            .get_or_undefined(2)
            .as_object()
            .and_then(|arr| boa_engine::object::builtins::JsArray::from_object(arr.clone()).ok())
        {
            Some(arr) => {
                let len = arr.length(context)?;
                let mut values = Vec::with_capacity(len as usize);
                for i in 0..len {
                    values.push(arr.get(i, context)?);
                }
                values
            }
            None => Vec::new(),
        };

        if !value::is_object_shaped(&object) {
            return if silent {
                tracing::warn!(field, "checkCall target is not object-shaped (silent mode)");
                Ok(JsValue::undefined())
            } else {
                Err(JsNativeError::typ()
                    .with_message(format!("Object does not have member '{field}'."))
                    .into())
            };
        }
        let method = object
            .as_object()
            .expect("checked above")
            .get(JsString::from(field.clone()), context)?;
        let Some(callable) = method.as_object().cloned() else {
            return Err(JsNativeError::typ()
                .with_message(format!("'{field}' is not a function."))
                .into());
        };
        let result = callable.call(&object, &call_args, context)?;
        if let Some(result_obj) = result.as_object() {
            if result_obj.is_array() {
                if let Ok(array) = boa_engine::object::builtins::JsArray::from_object(result_obj.clone()) {
                    sequence::mark_scheduler_aware(&array, context)?;
                }
            }
        }
        Ok(result)
    }

    fn build(self, context: &mut Context) -> JsObject {
        ObjectInitializer::with_native(self, context)
            .function(NativeFunction::from_fn_ptr(Self::array_bounds_check), "arrayBoundsCheck", 3)
            .function(NativeFunction::from_fn_ptr(Self::dot), "dot", 3)
            .function(NativeFunction::from_fn_ptr(Self::check_member), "checkMember", 4)
            .function(NativeFunction::from_fn_ptr(Self::check_array), "checkArray", 4)
            .function(NativeFunction::from_fn_ptr(Self::check_update_operand), "checkUpdateOperand", 4)
            .function(NativeFunction::from_fn_ptr(Self::update_only_numbers), "updateOnlyNumbers", 3)
            .function(NativeFunction::from_fn_ptr(Self::apply_num_op), "applyNumOp", 4)
            .function(NativeFunction::from_fn_ptr(Self::apply_num_or_string_op), "applyNumOrStringOp", 4)
            .function(NativeFunction::from_fn_ptr(Self::check_if_boolean), "checkIfBoolean", 3)
            .function(NativeFunction::from_fn_ptr(Self::arity_check), "arityCheck", 4)
            .function(NativeFunction::from_fn_ptr(Self::check_call), "checkCall", 3)
            .function(NativeFunction::from_fn_ptr(Self::sequence), "sequence", 0)
            .build()
    }
}

/// Renders a value the way `console.log` does: same rule C4's diagnostics
/// use, exposed for the sandbox binder (C7) to reuse rather than duplicate.
pub fn console_repr(value: &JsValue, context: &mut Context) -> String {
    value::display_value(value, context)
}

/// Builds the frozen `__elementary_rts__` object the sandbox binder (C7)
/// installs on the global, and the program-local `rts` alias resolves to.
/// `deadline` is shared with the test harness (C6), which arms it for the
/// duration of a running `test` body.
pub fn build_rts_object(silent: bool, deadline: Deadline, context: &mut Context) -> JsObject {
    RuntimeChecks { silent, deadline }.build(context)
}
