//! Pins the end-to-end scenarios and invariants enumerated for this dialect:
//! eight literal input/output pairs, the arity/boolean/array-bounds/member
//! runtime checks, the definite-assignment promotion rules, and the
//! idempotence of rewriting an already-rewritten program.

use elementary_core::{compile, CompileOpts, RunResult};

fn run_ok(code: &str) -> RunResult {
    let mut program = compile(code, CompileOpts::default()).expect("should compile");
    let mut outcome = None;
    program.run(|result| outcome = Some(result));
    outcome.expect("run invokes on_done exactly once")
}

fn exception_message(result: &RunResult) -> String {
    match result {
        RunResult::Exception { value, .. } => value
            .as_string()
            .expect("every exception here renders as a string")
            .to_std_string_escaped(),
        RunResult::Normal(_) => panic!("expected an exception, got a normal result"),
    }
}

#[test]
fn scenario_1_static_rejection() {
    let err = compile("var x = 10;", CompileOpts::default()).unwrap_err();
    assert!(err
        .errors
        .iter()
        .any(|d| d.message == "Use 'let' or 'const' to declare a variable."));
}

#[test]
fn scenario_2_runtime_member_check() {
    let result = run_ok("let o = {x:500}; o.y;");
    let message = exception_message(&result);
    assert!(message.contains("Object does not have member 'y'."), "{message}");
}

#[test]
fn scenario_3_array_bounds() {
    let result = run_ok("let a = []; a[0] = 0;");
    let message = exception_message(&result);
    assert!(message.contains("Index '0' is out of array bounds."), "{message}");
}

#[test]
fn scenario_4_arity() {
    let result = run_ok("function F(x){} F(1,2,3);");
    let message = exception_message(&result);
    assert!(
        message.contains("Function F expected 1 argument but received 3 arguments."),
        "{message}"
    );
}

#[test]
fn scenario_5_boolean_context() {
    let result = run_ok("if (42) {}");
    let message = exception_message(&result);
    assert!(
        message.contains("Expected a boolean expression, instead received '42'."),
        "{message}"
    );
}

#[test]
fn scenario_6_test_timeout_then_recovery() {
    let mut program = compile("", CompileOpts::default()).expect("should compile");

    program.enable_tests(true, Some(2000)).expect("enableTests(true, 2000)");
    let mut outcome = None;
    program.eval(
        "test('loop', function(){ while(true){} });",
        |result| outcome = Some(result),
    );
    assert!(matches!(outcome, Some(RunResult::Normal(_))));

    let report = program.summary(false).expect("summary(false)");
    let mut lines = report.lines();
    assert_eq!(lines.next(), Some(" FAILED  loop"));
    assert_eq!(lines.next(), Some("         Time limit exceeded."));
    assert_eq!(lines.next(), Some("Tests:     1 failed, 0 passed, 1 total."));
    assert_eq!(lines.next(), None);

    program.enable_tests(true, None).expect("enableTests(true)");
    let mut outcome = None;
    program.eval("test('ok', function(){});", |result| outcome = Some(result));
    assert!(matches!(outcome, Some(RunResult::Normal(_))));

    let report = program.summary(false).expect("summary(false)");
    let mut lines = report.lines();
    assert_eq!(lines.next(), Some(" OK      ok"));
    assert_eq!(lines.next(), Some("Tests:     0 failed, 1 passed, 1 total."));
    assert_eq!(lines.next(), None);
}

#[test]
fn scenario_7_definite_assignment() {
    let err = compile("let x; x;", CompileOpts::default()).unwrap_err();
    assert!(err
        .errors
        .iter()
        .any(|d| d.message.contains("You must initialize the variable 'x' before use.")));
}

#[test]
fn scenario_8_if_both_branches_promotes() {
    compile(
        "let x; if (true) { x=0; x; } else { x=1; x; } x;",
        CompileOpts::default(),
    )
    .expect("both branches initialize x, so the trailing read is allowed");

    let err = compile(
        "let x; if (true) { x=0; x; } x;",
        CompileOpts::default(),
    )
    .unwrap_err();
    assert!(err
        .errors
        .iter()
        .any(|d| d.message.contains("You must initialize the variable 'x' before use.")));
}

#[test]
fn invariant_arity_mismatch_always_fails() {
    for (call, expected, received) in [("F(1)", 2, 1), ("F(1,2,3)", 2, 3)] {
        let code = format!("function F(a,b){{}} {call};");
        let result = run_ok(&code);
        let message = exception_message(&result);
        let expected_noun = if expected == 1 { "argument" } else { "arguments" };
        let received_noun = if received == 1 { "argument" } else { "arguments" };
        assert!(
            message.contains(&format!(
                "Function F expected {expected} {expected_noun} but received {received} {received_noun}."
            )),
            "{message}"
        );
    }
}

#[test]
fn invariant_boolean_context_rejects_non_booleans() {
    for code in ["if (0) {}", "while (1) {}", "42 && true;", "false || 1;"] {
        let result = run_ok(code);
        assert!(
            matches!(result, RunResult::Exception { .. }),
            "{code} should have raised a boolean-context exception"
        );
    }
}

#[test]
fn invariant_definite_assignment_rejects_read_before_write() {
    let err = compile("let x; if (x) {}", CompileOpts::default()).unwrap_err();
    assert!(!err.errors.is_empty());
}

#[test]
fn invariant_compound_assignment_evaluates_object_once() {
    // `a[++i] += 3` must evaluate the index expression exactly once; a
    // naive desugaring that re-evaluates `++i` would move `i` twice (landing
    // the write on a different slot than the read) and double-increment `i`.
    let mut program = compile(
        "let i = 0; let a = Array.create(3, 0); a[++i] += 3; a[1] === 3 && i === 1;",
        CompileOpts::default(),
    )
    .expect("should compile");
    let mut outcome = None;
    program.run(|result| outcome = Some(result));
    match outcome {
        Some(RunResult::Normal(value)) => {
            assert_eq!(program.describe(&value), "true");
        }
        other => panic!("expected a normal result, got {other:?}"),
    }
}

#[test]
fn round_trip_rewriting_is_idempotent() {
    let source = "let x = 1; function F(a,b){ return a + b; } F(x, x);";
    let mut first = compile(source, CompileOpts::default()).expect("first compile");
    let mut first_outcome = None;
    first.run(|result| first_outcome = Some(result));

    let mut second = compile(source, CompileOpts::default()).expect("second compile");
    let mut second_outcome = None;
    second.run(|result| second_outcome = Some(result));

    match (first_outcome, second_outcome) {
        (Some(RunResult::Normal(a)), Some(RunResult::Normal(b))) => {
            assert_eq!(first.describe(&a), second.describe(&b));
        }
        other => panic!("expected both runs to complete normally, got {other:?}"),
    }
}

fn assert_runs_true(code: &str) {
    let mut program = compile(code, CompileOpts::default()).expect("should compile");
    let mut outcome = None;
    program.run(|result| outcome = Some(result));
    match outcome {
        Some(RunResult::Normal(value)) => assert_eq!(program.describe(&value), "true", "{code}"),
        other => panic!("{code}: expected a normal result, got {other:?}"),
    }
}

#[test]
fn compound_plus_assign_concatenates_strings() {
    // `+=` shares its symbol with binary `+`, which accepts numbers or
    // strings; routing it through the numbers-only check would reject this.
    assert_runs_true("let s = 'a'; s += 'b'; s === 'ab';");
}

#[test]
fn compound_plus_assign_on_member_lhs_adds_numbers() {
    assert_runs_true("let o = {x: 1}; o.x += 2; o.x === 3;");
}

#[test]
fn binary_shift_operators_are_supported() {
    assert_runs_true("(8 >> 1) === 4;");
    assert_runs_true("(1 << 3) === 8;");
    assert_runs_true("(8 >>> 1) === 4;");
}

#[test]
fn diagnostics_carry_a_real_source_line() {
    let err = compile("let x = 1;\nvar y = 2;", CompileOpts::default()).unwrap_err();
    let diagnostic = err
        .errors
        .iter()
        .find(|d| d.message == "Use 'let' or 'const' to declare a variable.")
        .expect("var declaration should be flagged");
    assert_eq!(diagnostic.line, 2);
}

#[test]
fn runtime_check_exceptions_carry_a_real_source_line() {
    let result = run_ok("let o = {x: 1};\no.y;");
    let message = exception_message(&result);
    assert!(message.starts_with("Line 2:"), "{message}");
}
