//! The cooperative scheduler (C5): drives a rewritten program's execution on
//! the host's event loop, one job at a time, so that a suspension point is
//! always an explicit return to a well-known place rather than a hidden
//! re-entrancy into the engine.
//!
//! Grounded on the `Runtime`/`JobQueue` pair in the teacher's own runtime
//! module: a `boa_engine::Context` built with a custom `job::JobQueue`
//! implementation, drained one job at a time between statements.

mod job_queue;

use std::{cell::Cell, rc::Rc};

use boa_engine::{object::builtins::JsArray, Context, JsError, JsResult, JsValue, Source};
use boa_interner::{Interner, ToInternedString};

use job_queue::JobQueue;

/// §3 "Result payloads": `{type:"normal", value}` or
/// `{type:"exception", value, stack}`.
#[derive(Debug, Clone)]
pub enum RunResult {
    Normal(JsValue),
    Exception { value: JsValue, stack: Vec<String> },
}

/// Owns the engine, the job queue, and the running flag that `stop` flips.
/// The global object and the `rts`/test-harness native state are installed
/// into the context by the sandbox binder (C7) before the first `run`.
pub struct Scheduler {
    context: Context<'static>,
    job_queue: Rc<JobQueue>,
    is_running: Rc<Cell<bool>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let job_queue = Rc::new(JobQueue::new());
        let context = Context::builder()
            .job_queue(job_queue.clone() as Rc<dyn boa_engine::job::JobQueue>)
            .build()
            .expect("default context configuration is always valid");
        Self {
            context,
            job_queue,
            is_running: Rc::new(Cell::new(false)),
        }
    }

    pub fn context(&mut self) -> &mut Context<'static> {
        &mut self.context
    }

    pub fn is_running(&self) -> bool {
        self.is_running.get()
    }

    pub(crate) fn running_flag(&self) -> Rc<Cell<bool>> {
        self.is_running.clone()
    }

    /// Drains queued jobs one at a time; stops early if `stop` fired in the
    /// middle (§4.5 "interrupts at the next suspension point").
    fn drain_jobs(&mut self) {
        while self.is_running.get() {
            match self.job_queue.call_next(&mut self.context) {
                Some(_) => continue,
                None => break,
            }
        }
    }

    /// `throw` is a forbidden statement (§4.3), so every exception this
    /// crate ever surfaces originates from a `JsNativeError` raised by C1/C4
    /// or by a host parse failure — never an arbitrary thrown value. Its
    /// message string is therefore a faithful, complete rendering.
    fn outcome_of(&mut self, result: JsResult<JsValue>) -> RunResult {
        match result {
            Ok(value) => RunResult::Normal(value),
            Err(err) => RunResult::Exception {
                value: JsValue::from(err.to_string()),
                stack: vec![err.to_string()],
            },
        }
    }

    /// Executes `source` from the top. On completion (normal or exceptional)
    /// invokes `on_done`.
    pub fn run(&mut self, source: &str, on_done: impl FnOnce(RunResult)) {
        self.is_running.set(true);
        let result = self.context.eval(Source::from_bytes(source));
        self.drain_jobs();
        let outcome = self.outcome_of(result);
        self.is_running.set(false);
        on_done(outcome);
    }

    /// Compiles `snippet` through the same rewriter used for the top-level
    /// program and executes it in the already-running program's global
    /// environment. Static-error diagnostics become a single exception whose
    /// value is the newline-joined `Line L: message` list (§4.5 `eval`).
    pub fn eval_snippet(&mut self, snippet: &str, on_done: impl FnOnce(RunResult)) {
        let mut interner = Interner::default();
        let statements = match crate::parse::parse(snippet, &mut interner) {
            Ok(statements) => statements,
            Err(err) => {
                on_done(RunResult::Exception {
                    value: JsValue::from(format!("Line 0: {err}")),
                    stack: Vec::new(),
                });
                return;
            }
        };
        let rewriter = crate::rewrite::Rewriter::new(&mut interner, false);
        let (rewritten, diagnostics) = rewriter.rewrite_program(statements);
        if !diagnostics.is_empty() {
            on_done(RunResult::Exception {
                value: JsValue::from(diagnostics.to_string()),
                stack: Vec::new(),
            });
            return;
        }
        self.is_running.set(true);
        let code = rewritten.to_interned_string(&interner);
        let result = self.context.eval(Source::from_bytes(code.as_bytes()));
        self.drain_jobs();
        let outcome = self.outcome_of(result);
        self.is_running.set(false);
        on_done(outcome);
    }

    /// Requests that execution halt at the next suspension point; invokes
    /// `on_stopped` once the running flag is clear.
    pub fn stop(&mut self, on_stopped: impl FnOnce()) {
        self.is_running.set(false);
        on_stopped();
    }

    /// Suspends the caller until `thunk` is ready to resume: queues `thunk`
    /// as a job rather than invoking it synchronously, matching the "yields
    /// the turn" requirement used by test timeouts and host I/O primitives.
    pub fn pause_immediate(&mut self, thunk: impl FnOnce(&mut Context) + 'static) {
        self.job_queue
            .enqueue(boa_engine::job::NativeJob::new(move |context| {
                thunk(context);
                Ok(JsValue::undefined())
            }));
        self.drain_jobs();
    }

    /// Wraps a freshly produced array as a scheduler-aware sequence (used by
    /// `Array.create` and `JSON.parse` at setup time, mirroring `checkCall`'s
    /// own-result wrapping).
    pub fn mark_sequence(&mut self, array: &JsArray) -> JsResult<()> {
        super::runtime::sequence::mark_scheduler_aware(array, &mut self.context)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
