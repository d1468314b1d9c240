//! The compile pipeline (C8): source text in, a running program handle or a
//! diagnostic list out. Wires together the parser, rewriter (C3), scheduler
//! (C5) and sandbox binder (C7) into the single entry point a host uses.

use std::collections::HashMap;
use std::rc::Rc;

use boa_engine::{js_string, JsObject, JsResult, JsValue};
use boa_interner::{Interner, ToInternedString};

use crate::error::{CompileError, Diagnostics};
use crate::lowering::{IdentityLowering, Lowering};
use crate::sandbox::{self, ConsoleSink, SandboxConfig};
use crate::scheduler::{RunResult, Scheduler};

/// The core's config surface (§10): no external config file format, every
/// knob is a field the host fills in before calling [`compile`].
pub struct CompileOpts {
    /// Destination for `console.log` output.
    pub console_log: ConsoleSink,
    /// Invoked once, before parsing, so a host can print a banner.
    pub version: Rc<dyn Fn()>,
    /// Source text for each whitelisted module, keyed by the name `require`
    /// looks it up under.
    pub whitelist_code: HashMap<String, String>,
    /// Demotes rewriter diagnostics to warnings instead of failing the
    /// compile (`ejsOff` in spec.md §6).
    pub ejs_off: bool,
}

impl Default for CompileOpts {
    fn default() -> Self {
        Self {
            console_log: Rc::new(|_| {}),
            version: Rc::new(|| {}),
            whitelist_code: HashMap::new(),
            ejs_off: false,
        }
    }
}

/// The live handle a successful compile hands back to the host. `run`/`eval`/
/// `stop` delegate to the scheduler (C5); `g` is the frozen global object
/// (C7) installed during this compile; `enable_tests`/`summary` reach the
/// test harness (C6) directly, since neither is part of the runtime-visible
/// built-in set a program can call (spec.md §6).
pub struct CompileOk {
    scheduler: Scheduler,
    harness: JsObject,
    source: String,
}

impl CompileOk {
    /// Runs the compiled program from the top, invoking `on_done` once it
    /// completes (normally or with an exception).
    pub fn run(&mut self, on_done: impl FnOnce(RunResult)) {
        let source = self.source.clone();
        self.scheduler.run(&source, on_done);
    }

    /// Parses, rewrites and evaluates `code` against the already-running
    /// program's global environment (spec.md §4.5 `eval`).
    pub fn eval(&mut self, code: &str, on_done: impl FnOnce(RunResult)) {
        self.scheduler.eval_snippet(code, on_done);
    }

    /// Requests that execution halt at the next suspension point.
    pub fn stop(&mut self, on_stopped: impl FnOnce()) {
        self.scheduler.stop(on_stopped);
    }

    /// Renders `value` the way `console.log` would — the host-facing
    /// equivalent of `Debug`, since a bare `JsValue` carries no rendering
    /// logic of its own without a `Context`.
    pub fn describe(&mut self, value: &boa_engine::JsValue) -> String {
        crate::runtime::console_repr(value, self.scheduler.context())
    }

    /// The frozen global object this compile installed.
    pub fn g(&mut self) -> JsObject {
        self.scheduler.context().global_object().clone()
    }

    /// `enableTests(on, timeoutMs)` (spec.md §4.6), called by the host before
    /// `run` rather than from within the program.
    pub fn enable_tests(&mut self, on: bool, timeout_ms: Option<u32>) -> JsResult<()> {
        let timeout = match timeout_ms {
            Some(ms) => JsValue::from(ms),
            None => JsValue::undefined(),
        };
        self.call_harness_method("enableTests", &[JsValue::from(on), timeout])?;
        Ok(())
    }

    /// `summary(hasStyles)` (spec.md §4.6): consumes the accumulated test
    /// records and returns the formatted report.
    pub fn summary(&mut self, has_styles: bool) -> JsResult<String> {
        let result = self.call_harness_method("summary", &[JsValue::from(has_styles)])?;
        let context = self.scheduler.context();
        Ok(result.to_string(context)?.to_std_string_escaped())
    }

    fn call_harness_method(&mut self, name: &str, args: &[JsValue]) -> JsResult<JsValue> {
        let context = self.scheduler.context();
        let method = self.harness.get(js_string!(name), context)?;
        let callable = method
            .as_object()
            .cloned()
            .expect("harness object always carries its own methods");
        callable.call(&self.harness.clone().into(), args, context)
    }
}

/// Compiles `code` with the identity lowering pass.
pub fn compile(code: &str, opts: CompileOpts) -> Result<CompileOk, CompileError> {
    compile_with_lowering(code, opts, &IdentityLowering)
}

/// Compiles `code`, running `lowering` as the downstream pass named in §4.8
/// step 3 before the program is handed to the engine.
pub fn compile_with_lowering(
    code: &str,
    opts: CompileOpts,
    lowering: &dyn Lowering,
) -> Result<CompileOk, CompileError> {
    (opts.version)();

    let mut interner = Interner::default();
    let statements = crate::parse::parse(code, &mut interner).map_err(|err| {
        let mut diagnostics = Diagnostics::new(opts.ejs_off);
        diagnostics.error(0, err.to_string());
        CompileError::from(diagnostics)
    })?;

    let rewriter = crate::rewrite::Rewriter::new(&mut interner, opts.ejs_off);
    let (rewritten, diagnostics) = rewriter.rewrite_program(statements);
    if !diagnostics.is_empty() && !diagnostics.is_silent() {
        return Err(CompileError::from(diagnostics));
    }

    let rewritten = lowering.lower(rewritten);
    let source = rewritten.to_interned_string(&interner);

    let mut scheduler = Scheduler::new();
    let deadline = crate::deadline::new();
    let config = SandboxConfig {
        console_log: opts.console_log,
        whitelist_code: opts.whitelist_code,
        silent: opts.ejs_off,
    };
    let (_global, harness) = sandbox::install(config, deadline, scheduler.context()).map_err(|err| {
        let mut diagnostics = Diagnostics::new(opts.ejs_off);
        diagnostics.error(0, err.to_string());
        CompileError::from(diagnostics)
    })?;

    Ok(CompileOk { scheduler, harness, source })
}
