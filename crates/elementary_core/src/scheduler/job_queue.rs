//! The job queue backing [`super::Scheduler`]: a FIFO of pending microtasks
//! (promise reactions, the continuation enqueued by a resumed `test`), drained
//! one at a time so every suspension point is an explicit, observable event
//! rather than a hidden re-entrancy into the engine.

use std::{
    collections::VecDeque,
    future::Future,
    cell::RefCell,
    sync::Arc,
    task::{Context as TaskContext, Poll, Wake, Waker},
};

use boa_engine::{job::NativeJob, Context, JsResult, JsValue};

/// A no-op waker: every future this queue ever sees is polled to completion on
/// the first poll (or not at all), since nothing in this crate performs real
/// non-blocking I/O.
struct Signal;

impl Wake for Signal {
    fn wake(self: Arc<Self>) {}
}

fn block_on<F: Future>(mut fut: F) -> F::Output {
    let mut fut = unsafe { std::pin::Pin::new_unchecked(&mut fut) };
    let waker = Waker::from(Arc::new(Signal));
    let mut context = TaskContext::from_waker(&waker);
    loop {
        match fut.as_mut().poll(&mut context) {
            Poll::Pending => (),
            Poll::Ready(item) => break item,
        }
    }
}

#[derive(Default)]
pub(crate) struct JobQueue(RefCell<VecDeque<NativeJob>>);

impl JobQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> Option<NativeJob> {
        self.0.borrow_mut().pop_front()
    }

    /// Queues `job` to run on the next drain, rather than inline — the
    /// Rust-level equivalent of "yields the turn" (§4.5 `pauseImmediate`).
    pub(crate) fn enqueue(&self, job: NativeJob) {
        self.0.borrow_mut().push_back(job);
    }

    /// Runs exactly one queued job, if any. Used by [`super::Scheduler`] to
    /// drain jobs between the program's top-level statements, keeping each
    /// drained job itself a suspension point.
    pub(crate) fn call_next(&self, context: &mut Context<'_>) -> Option<JsResult<JsValue>> {
        let job = self.next()?;
        Some(job.call(context))
    }
}

impl boa_engine::job::JobQueue for JobQueue {
    fn enqueue_promise_job(&self, job: NativeJob, _context: &mut Context<'_>) {
        self.0.borrow_mut().push_back(job);
    }

    fn enqueue_future_job(&self, future: boa_engine::job::FutureJob, context: &mut Context<'_>) {
        let job = block_on(future);
        self.enqueue_promise_job(job, context);
    }

    fn run_jobs(&self, context: &mut Context<'_>) {
        while let Some(job) = self.next() {
            let _ = job.call(context);
        }
    }
}
