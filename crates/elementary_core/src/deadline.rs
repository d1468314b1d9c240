//! The shared per-test wall-clock deadline (§9 "continuation capture for
//! per-test timeouts"). Every loop condition in a rewritten program passes
//! through `rts.checkIfBoolean`, which makes that call the one guaranteed
//! per-iteration suspension point a single-threaded, non-preemptible engine
//! has available — so the harness (C6) arms this cell before running a test
//! body and the runtime check library (C4) consults it on every iteration,
//! regardless of whether the loop ever otherwise yields.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

pub(crate) type Deadline = Rc<Cell<Option<Instant>>>;

pub(crate) fn new() -> Deadline {
    Rc::new(Cell::new(None))
}

pub(crate) fn arm(deadline: &Deadline, timeout: std::time::Duration) {
    deadline.set(Some(Instant::now() + timeout));
}

pub(crate) fn disarm(deadline: &Deadline) {
    deadline.set(None);
}

pub(crate) fn exceeded(deadline: &Deadline) -> bool {
    match deadline.get() {
        Some(at) => Instant::now() >= at,
        None => false,
    }
}

/// The exact string the test record's `error` field carries on timeout
/// (§8 scenario 6).
pub(crate) const TIME_LIMIT_EXCEEDED: &str = "Time limit exceeded.";

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unarmed_deadline_never_exceeds() {
        let deadline = new();
        assert!(!exceeded(&deadline));
    }

    #[test]
    fn armed_with_zero_timeout_exceeds_immediately() {
        let deadline = new();
        arm(&deadline, Duration::from_millis(0));
        assert!(exceeded(&deadline));
    }

    #[test]
    fn armed_with_long_timeout_has_not_exceeded_yet() {
        let deadline = new();
        arm(&deadline, Duration::from_secs(60));
        assert!(!exceeded(&deadline));
    }

    #[test]
    fn disarming_clears_a_passed_deadline() {
        let deadline = new();
        arm(&deadline, Duration::from_millis(0));
        assert!(exceeded(&deadline));
        disarm(&deadline);
        assert!(!exceeded(&deadline));
    }
}
