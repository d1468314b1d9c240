//! The student-facing test framework (C6): `test`, `assert`, and the
//! host-driven `enableTests`/`summary` pair. Built as a native object in the
//! same style as [`crate::runtime::RuntimeChecks`] — a plain Rust struct
//! reached through `downcast_mut`, its methods registered as `NativeFunction`
//! members — except `test`'s timeout is not a second scheduler mechanism: it
//! reuses the shared [`crate::deadline::Deadline`] cell that every
//! `checkIfBoolean` call already consults (see `crate::deadline`), so an
//! infinite `while` loop inside a test body is interrupted by the very next
//! loop-condition check after the deadline passes, synchronously, with no
//! separate continuation machinery required.

use std::time::Duration;

use boa_engine::object::{Object, ObjectInitializer};
use boa_engine::{
    Context, JsArgs, JsError, JsNativeError, JsObject, JsResult, JsValue, NativeFunction,
};
use boa_gc::{empty_trace, Finalize, GcRefMut, Trace};

use crate::deadline::{self, Deadline};

const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// §3 "Test record".
#[derive(Debug, Clone)]
pub struct TestRecord {
    pub description: String,
    pub failed: bool,
    pub error: Option<String>,
}

pub struct Harness {
    enabled: bool,
    timeout: Duration,
    records: Vec<TestRecord>,
    deadline: Deadline,
}

impl Finalize for Harness {}
unsafe impl Trace for Harness {
    empty_trace!();
}

impl Harness {
    fn extract<'a>(this: &'a JsValue) -> JsResult<GcRefMut<'a, Object, Self>> {
        this.as_object()
            .and_then(|obj| obj.downcast_mut::<Self>())
            .ok_or_else(|| JsError::from_native(JsNativeError::typ().with_message("not a harness object")))
    }

    /// `enableTests(on, timeoutMs = 5000)`. Host-driven, not JS-visible: the
    /// CLI/REPL calls this before `run`, mirroring §4.6's contract exactly.
    fn enable_tests(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let mut state = Self::extract(this)?;
        let on = args.get_or_undefined(0).to_boolean();
        let timeout_ms = match args.get_or_undefined(1) {
            JsValue::Undefined => DEFAULT_TIMEOUT_MS,
            other => other.to_number(context)? as u64,
        };
        state.enabled = on;
        state.timeout = Duration::from_millis(timeout_ms);
        state.records.clear();
        Ok(JsValue::undefined())
    }

    /// `assert(v)`.
    fn assert(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
        let _state = Self::extract(this)?;
        let v = args.get_or_undefined(0);
        match v {
            JsValue::Boolean(true) => Ok(JsValue::undefined()),
            JsValue::Boolean(false) => Err(JsNativeError::typ()
                .with_message("Assertion failed.")
                .into()),
            _ => Err(JsNativeError::typ()
                .with_message("Assertion argument 'v' is not a boolean value.")
                .into()),
        }
    }

    /// `test(description, thunk)`. Runs `thunk` synchronously under an armed
    /// deadline; any `while`/`for`/`do-while` condition `thunk` executes
    /// passes through `rts.checkIfBoolean`, which raises once the deadline
    /// has passed — so a genuinely infinite loop still returns control here
    /// rather than hanging the host.
    fn test(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        let (enabled, timeout) = {
            let state = Self::extract(this)?;
            (state.enabled, state.timeout)
        };
        if !enabled {
            return Ok(JsValue::undefined());
        }
        let description = args
            .get_or_undefined(0)
            .to_string(context)?
            .to_std_string_escaped();
        let Some(thunk) = args.get_or_undefined(1).as_object().cloned() else {
            return Err(JsNativeError::typ()
                .with_message("test: second argument must be a function.")
                .into());
        };

        let deadline = Self::extract(this)?.deadline.clone();
        deadline::arm(&deadline, timeout);
        let result = thunk.call(&JsValue::undefined(), &[], context);
        deadline::disarm(&deadline);

        let record = match result {
            Ok(_) => TestRecord {
                description,
                failed: false,
                error: None,
            },
            Err(err) => TestRecord {
                description,
                failed: true,
                error: Some(error_message(&err)),
            },
        };
        Self::extract(this)?.records.push(record);
        Ok(JsValue::undefined())
    }

    /// `summary(hasStyles)`.
    fn summary(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
        let mut state = Self::extract(this)?;
        if !state.enabled && state.records.is_empty() {
            return Ok(JsValue::from("Tests are not enabled. Call enableTests(true) to turn on testing."));
        }
        let has_styles = args.get_or_undefined(0).to_boolean();
        let records = std::mem::take(&mut state.records);
        state.enabled = false;

        if records.is_empty() {
            return Ok(JsValue::from("You must write at least one test."));
        }

        let mut lines = Vec::with_capacity(records.len() + 1);
        let (mut passed, mut failed) = (0usize, 0usize);
        for record in &records {
            if record.failed {
                failed += 1;
                lines.push(status_line("FAILED", has_styles, true, &record.description));
                if let Some(error) = &record.error {
                    lines.push(format!("{}{error}", " ".repeat(9)));
                }
            } else {
                passed += 1;
                lines.push(status_line("OK", has_styles, false, &record.description));
            }
        }
        lines.push(format!(
            "Tests:     {failed} failed, {passed} passed, {} total.",
            records.len()
        ));
        Ok(JsValue::from(lines.join("\n")))
    }

    fn build(self, context: &mut Context) -> JsObject {
        ObjectInitializer::with_native(self, context)
            .function(NativeFunction::from_fn_ptr(Self::enable_tests), "enableTests", 2)
            .function(NativeFunction::from_fn_ptr(Self::assert), "assert", 1)
            .function(NativeFunction::from_fn_ptr(Self::test), "test", 2)
            .function(NativeFunction::from_fn_ptr(Self::summary), "summary", 1)
            .build()
    }
}

/// Field width used by `OK`/`FAILED` status lines: one leading space, the
/// status word, padded with spaces out to column 9 where the description
/// begins (§8 scenario 6's literal `" FAILED  loop"`).
fn status_line(status: &str, has_styles: bool, is_failure: bool, description: &str) -> String {
    let pad = " ".repeat(9 - 1 - status.len());
    let status = if has_styles {
        if is_failure {
            format!("\u{1b}[31m{status}\u{1b}[0m")
        } else {
            format!("\u{1b}[32m{status}\u{1b}[0m")
        }
    } else {
        status.to_string()
    };
    format!(" {status}{pad}{description}")
}

fn error_message(err: &JsError) -> String {
    let rendered = err.to_string();
    if rendered.contains(deadline::TIME_LIMIT_EXCEEDED) {
        deadline::TIME_LIMIT_EXCEEDED.to_string()
    } else {
        rendered
    }
}

/// Installs the hidden `__elementary_harness__` object and builds the two
/// JS-visible `test`/`assert` thin wrappers the sandbox binder (C7) freezes
/// onto the global object.
pub fn build_harness_object(deadline: Deadline, context: &mut Context) -> JsObject {
    Harness {
        enabled: false,
        timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        records: Vec::new(),
        deadline,
    }
    .build(context)
}
