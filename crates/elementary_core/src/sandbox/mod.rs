//! The sandbox binder (C7): builds the program's global object.
//!
//! Rather than a trapped exotic object wrapping a separate target, every
//! reserved binding is installed as an accessor property directly on the
//! realm's own global object. A bare identifier read at the top level
//! resolves through the global object's `[[Get]]`, and a bare assignment
//! through its `[[Set]]` — ordinary ECMAScript semantics, no exotic object
//! required — so a getter/setter pair is all it takes to freeze a name: the
//! getter returns the fixed value, the setter unconditionally raises "NAME is
//! part of the global library, and cannot be overwritten." Anything not in
//! the reserved set falls through to the engine's own behavior: an unbound
//! read raises its native `ReferenceError`, and `x = 1` for a never-declared
//! `x` creates an ordinary program-level global, exactly per §4.7.

use std::collections::HashMap;
use std::rc::Rc;

use boa_engine::object::{ConstructorBuilder, ObjectInitializer};
use boa_engine::property::PropertyDescriptor;
use boa_engine::{
    js_string, Context, FunctionObjectBuilder, JsArgs, JsError, JsNativeError, JsObject, JsResult,
    JsValue, NativeFunction, Source,
};
use boa_gc::{empty_trace, Finalize, Trace};

use crate::deadline::Deadline;
use crate::harness;
use crate::rewrite::synth::RTS_GLOBAL_NAME;
use crate::runtime::{self, sequence};

/// `console.log`'s destination. Hosts that don't care pass `Rc::new(|_| {})`.
pub type ConsoleSink = Rc<dyn Fn(&str)>;

/// Everything the sandbox needs that isn't already nailed down by C4/C6.
pub struct SandboxConfig {
    pub console_log: ConsoleSink,
    pub whitelist_code: HashMap<String, String>,
    pub silent: bool,
}

/// Marker backing for the plain property bags built below (the modules
/// registry) — no state of its own, just a place for `ObjectInitializer` to
/// hang properties off of the same way every other native object in this
/// crate is built.
struct Bag;
impl Finalize for Bag {}
unsafe impl Trace for Bag {
    empty_trace!();
}

/// Installs the frozen bindings on `context`'s global object. Returns the
/// global object itself (`CompileOK.g`, §6) alongside the harness object,
/// which stays out of the frozen bindings: `enableTests`/`summary` are
/// host-driven, not part of the runtime-visible built-in set (§6), so the
/// compile pipeline (C8) holds onto this handle to call them directly rather
/// than exposing them to script. `deadline` is shared with the runtime check
/// library and the test harness so `enableTests`/`checkIfBoolean` agree on
/// the same clock.
pub fn install(config: SandboxConfig, deadline: Deadline, context: &mut Context) -> JsResult<(JsObject, JsObject)> {
    let rts = runtime::build_rts_object(config.silent, deadline.clone(), context);
    let harness_obj = harness::build_harness_object(deadline, context);

    let mut bindings: Vec<(String, JsValue)> = vec![
        (RTS_GLOBAL_NAME.to_string(), rts.into()),
        ("undefined".to_string(), JsValue::undefined()),
        ("Infinity".to_string(), JsValue::from(f64::INFINITY)),
        ("console".to_string(), build_console(config.console_log, context)?),
        ("Math".to_string(), fetch_standard_global(context, "Math")?),
        ("Object".to_string(), fetch_standard_global(context, "Object")?),
        ("parseInt".to_string(), fetch_standard_global(context, "parseInt")?),
        ("parseFloat".to_string(), fetch_standard_global(context, "parseFloat")?),
        ("ArrayCreateStub".to_string(), build_array_stub(context)?),
        ("JSON".to_string(), build_json(context)?),
        ("test".to_string(), bind_method(&harness_obj, "test", 2, context)?),
        ("assert".to_string(), bind_method(&harness_obj, "assert", 1, context)?),
    ];

    let modules = build_modules(&config.whitelist_code, context)?;
    bindings.extend(modules_as_bindings(&modules, context)?);
    bindings.push(("require".to_string(), build_require(modules, context)?));

    let global = context.global_object().clone();
    for (name, value) in bindings {
        let property = frozen_accessor(&name, value, context);
        global.define_property_or_throw(js_string!(name), property, context)?;
    }
    Ok((global, harness_obj))
}

/// A getter that always returns `value` and a setter that always raises the
/// "part of the global library" error — the one mechanism every reserved
/// name shares.
fn frozen_accessor(name: &str, value: JsValue, context: &mut Context) -> PropertyDescriptor {
    let getter = FunctionObjectBuilder::new(context.realm(), unsafe {
        NativeFunction::from_closure_with_captures(
            |_this, _args, value: &mut JsValue, _context| Ok(value.clone()),
            value,
        )
    })
    .name(format!("get {name}"))
    .length(0)
    .build();

    let message = format!("{name} is part of the global library, and cannot be overwritten.");
    let setter = FunctionObjectBuilder::new(context.realm(), unsafe {
        NativeFunction::from_closure_with_captures(
            |_this, _args, message: &mut String, _context| {
                Err(JsError::from_native(JsNativeError::typ().with_message(message.clone())))
            },
            message,
        )
    })
    .name(format!("set {name}"))
    .length(1)
    .build();

    PropertyDescriptor::builder()
        .get(getter)
        .set(setter)
        .enumerable(true)
        .configurable(false)
        .build()
}

/// Grabs one of boa's own standard globals (`Math`, `Object`, `parseInt`,
/// `parseFloat`) before this function overwrites the plain data property with
/// a frozen accessor of the same name — giving the student the real,
/// spec-compliant implementation, just no longer reassignable.
fn fetch_standard_global(context: &mut Context, name: &str) -> JsResult<JsValue> {
    context.global_object().get(js_string!(name), context)
}

fn build_console(sink: ConsoleSink, context: &mut Context) -> JsResult<JsValue> {
    let log = unsafe {
        NativeFunction::from_closure_with_captures(
            move |_this, args, sink, context| {
                let rendered: Vec<String> = args.iter().map(|v| runtime::console_repr(v, context)).collect();
                sink(&rendered.join(" "));
                Ok(JsValue::undefined())
            },
            sink,
        )
    };
    Ok(ObjectInitializer::with_native(Bag, context)
        .function(log, "log", 0)
        .build()
        .into())
}

/// `ArrayCreateStub`: direct construction raises "Use Array.create"; `.create(n, v)`
/// is the only sanctioned way to build a sequence.
fn build_array_stub(context: &mut Context) -> JsResult<JsValue> {
    fn raw_constructor(_this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
        Err(JsNativeError::typ().with_message("Use Array.create").into())
    }

    fn create(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let n = args.get_or_undefined(0).to_number(context)?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(JsNativeError::typ()
                .with_message("Array.create's first argument must be a positive integer.")
                .into());
        }
        let fill = args.get_or_undefined(1).clone();
        let values = vec![fill; n as usize];
        sequence::make_sequence(values, context)
    }

    let mut builder = ConstructorBuilder::new(context, NativeFunction::from_fn_ptr(raw_constructor));
    builder.name("ArrayCreateStub");
    builder.length(0);
    builder.static_method(NativeFunction::from_fn_ptr(create), "create", 2);
    Ok(builder.build().constructor().into())
}

/// Wraps boa's real `JSON` object: `stringify` is passed straight through,
/// `parse`'s result is additionally marked scheduler-aware, recursively
/// (the one place this dialect's `JSON` differs from the host language's).
fn build_json(context: &mut Context) -> JsResult<JsValue> {
    let real_json = context.global_object().get(js_string!("JSON"), context)?;
    let real_json = real_json
        .as_object()
        .cloned()
        .ok_or_else(|| JsError::from_native(JsNativeError::typ().with_message("JSON is missing")))?;
    let real_parse = real_json.get(js_string!("parse"), context)?;
    let real_stringify = real_json.get(js_string!("stringify"), context)?;

    let parse = unsafe {
        NativeFunction::from_closure_with_captures(
            |_this, args, real_parse: &mut JsValue, context| {
                let Some(callable) = real_parse.as_object().cloned() else {
                    return Err(JsNativeError::typ().with_message("JSON.parse is missing").into());
                };
                let result = callable.call(&JsValue::undefined(), args, context)?;
                sequence::mark_recursively(&result, context)?;
                Ok(result)
            },
            real_parse,
        )
    };
    let stringify = unsafe {
        NativeFunction::from_closure_with_captures(
            |_this, args, real_stringify: &mut JsValue, context| {
                let Some(callable) = real_stringify.as_object().cloned() else {
                    return Err(JsNativeError::typ().with_message("JSON.stringify is missing").into());
                };
                callable.call(&JsValue::undefined(), args, context)
            },
            real_stringify,
        )
    };

    Ok(ObjectInitializer::with_native(Bag, context)
        .function(parse, "parse", 2)
        .function(stringify, "stringify", 3)
        .build()
        .into())
}

/// Evaluates every whitelisted module's source once, freezing the result
/// (§4.7 "the evaluated whitelisted-module contents (each frozen)") and
/// recording it under its module name in a plain property bag `require` can
/// later search by name. Kept as a `JsObject` rather than a `HashMap` so it
/// can be captured by the native closures below the same way every other
/// piece of per-binding state in this module is.
fn build_modules(whitelist: &HashMap<String, String>, context: &mut Context) -> JsResult<JsObject> {
    let modules = ObjectInitializer::with_native(Bag, context).build();
    for (name, source) in whitelist {
        let value = context.eval(Source::from_bytes(source.as_bytes()))?;
        let frozen = freeze(value, context)?;
        modules.set(js_string!(name.clone()), frozen, false, context)?;
    }
    Ok(modules)
}

fn modules_as_bindings(modules: &JsObject, context: &mut Context) -> JsResult<Vec<(String, JsValue)>> {
    let mut out = Vec::new();
    for key in modules.own_property_keys(context)? {
        if let boa_engine::property::PropertyKey::String(name) = &key {
            let value = modules.get(key.clone(), context)?;
            out.push((name.to_std_string_escaped(), value));
        }
    }
    Ok(out)
}

fn freeze(value: JsValue, context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = value.as_object().cloned() else {
        return Ok(value);
    };
    let object_ctor = context.global_object().get(js_string!("Object"), context)?;
    let Some(object_ctor) = object_ctor.as_object().cloned() else {
        return Ok(value);
    };
    let freeze_fn = object_ctor.get(js_string!("freeze"), context)?;
    if let Some(callable) = freeze_fn.as_object().cloned() {
        callable.call(&JsValue::undefined(), &[obj.clone().into()], context)?;
    }
    Ok(obj.into())
}

/// `require(name)`: looks `name` up in the frozen module table built by
/// [`build_modules`]; anything else raises `"'name' not found."`, the same
/// message [`crate::runtime::require`] uses for the identical whitelist-miss
/// case in the runtime check library.
fn build_require(modules: JsObject, context: &mut Context) -> JsResult<JsValue> {
    let require = FunctionObjectBuilder::new(context.realm(), unsafe {
        NativeFunction::from_closure_with_captures(
            |_this, args, modules: &mut JsObject, context| {
                let name = args.get_or_undefined(0).to_string(context)?.to_std_string_escaped();
                let key = js_string!(name.clone());
                if modules.has_property(key.clone(), context)? {
                    modules.get(key, context)
                } else {
                    Err(JsNativeError::typ().with_message(format!("'{name}' not found.")).into())
                }
            },
            modules,
        )
    })
    .name("require")
    .length(1)
    .build();
    Ok(require.into())
}

/// Binds `harness_obj`'s `name` method as a standalone global function that
/// always calls it with `this` set back to `harness_obj` — native methods on
/// [`harness::Harness`] expect to downcast `this`, so a bare `test(...)` call
/// (where ordinary JS call semantics would leave `this` undefined) has to be
/// rebound explicitly.
fn bind_method(harness_obj: &JsObject, name: &'static str, arity: usize, context: &mut Context) -> JsResult<JsValue> {
    let bound = FunctionObjectBuilder::new(context.realm(), unsafe {
        NativeFunction::from_closure_with_captures(
            move |_this, args, harness_obj: &mut JsObject, context| {
                let method = harness_obj.get(js_string!(name), context)?;
                let Some(callable) = method.as_object().cloned() else {
                    return Err(JsNativeError::typ()
                        .with_message(format!("{name} is not a function."))
                        .into());
                };
                callable.call(&harness_obj.clone().into(), args, context)
            },
            harness_obj.clone(),
        )
    })
    .name(name)
    .length(arity)
    .build();
    Ok(bound.into())
}
