// Integration tests for the candidate interpreter
//
// These tests run complete Ruff programs and check the results. Tests cover:
// - Variable definition, assignment and scoping
// - Control flow (if/else, while, loop, for, break/continue)
// - Functions, recursion and function values
// - Arrays, index assignment and push
// - Error handling and sandbox limits
// - Candidate compilation through the sandbox

use ruff_bigo::config::Config;
use ruff_bigo::errors::{AnalysisError, ErrorKind};
use ruff_bigo::interpreter::{Interpreter, Limits, Value};
use ruff_bigo::parser::parse_program;
use ruff_bigo::sandbox::{Candidate, Sandbox};
use std::sync::{Arc, Mutex};

fn run_code(code: &str) -> (Interpreter, String) {
    let program = parse_program(code).expect("program should parse");
    let output = Arc::new(Mutex::new(Vec::new()));
    let mut interp = Interpreter::new();
    interp.set_output(output.clone());
    interp.eval_program(&program).expect("program should run");
    let text = String::from_utf8(output.lock().unwrap().clone()).unwrap();
    (interp, text)
}

fn run_err(code: &str) -> AnalysisError {
    let program = parse_program(code).expect("program should parse");
    Interpreter::new().eval_program(&program).expect_err("program should fail")
}

fn global(interp: &Interpreter, name: &str) -> Value {
    interp.env().get(name).cloned().unwrap_or(Value::Null)
}

#[test]
fn test_arithmetic_precedence() {
    let (interp, _) = run_code("let x := 2 + 3 * 4\nlet y := (2 + 3) * 4\nlet z := 17 % 5");
    assert_eq!(global(&interp, "x"), Value::Int(14));
    assert_eq!(global(&interp, "y"), Value::Int(20));
    assert_eq!(global(&interp, "z"), Value::Int(2));
}

#[test]
fn test_mixed_numbers() {
    let (interp, _) = run_code("let a := 7 / 2\nlet b := 1 + 0.5\nlet c := 8 / 4");
    assert_eq!(global(&interp, "a"), Value::Float(3.5));
    assert_eq!(global(&interp, "b"), Value::Float(1.5));
    assert_eq!(global(&interp, "c"), Value::Int(2));
}

#[test]
fn test_for_range_sum() {
    let (interp, _) = run_code("mut s := 0\nfor i in range(10) { s := s + i }");
    assert_eq!(global(&interp, "s"), Value::Int(45));
}

#[test]
fn test_for_over_int_and_array() {
    let code = r#"
        mut count := 0
        for i in 3 { count := count + 1 }
        mut total := 0
        for v in [4, 5, 6] { total := total + v }
    "#;
    let (interp, _) = run_code(code);
    assert_eq!(global(&interp, "count"), Value::Int(3));
    assert_eq!(global(&interp, "total"), Value::Int(15));
}

#[test]
fn test_while_and_loop_forms() {
    let code = r#"
        mut i := 0
        while i < 5 { i := i + 1 }
        mut j := 0
        loop { j := j + 1; if j >= 7 { break } }
        mut k := 0
        loop while k < 3 { k := k + 1 }
    "#;
    let (interp, _) = run_code(code);
    assert_eq!(global(&interp, "i"), Value::Int(5));
    assert_eq!(global(&interp, "j"), Value::Int(7));
    assert_eq!(global(&interp, "k"), Value::Int(3));
}

#[test]
fn test_continue_skips_rest_of_body() {
    let code = r#"
        mut evens := 0
        for i in range(10) {
            if i % 2 == 1 { continue }
            evens := evens + 1
        }
    "#;
    let (interp, _) = run_code(code);
    assert_eq!(global(&interp, "evens"), Value::Int(5));
}

#[test]
fn test_else_if_chain() {
    let code = r#"
        func grade(n) {
            if n > 90 { return "a" } else if n > 50 { return "b" } else { return "c" }
        }
        let g1 := grade(95)
        let g2 := grade(60)
        let g3 := grade(10)
    "#;
    let (interp, _) = run_code(code);
    assert_eq!(global(&interp, "g1").to_string(), "a");
    assert_eq!(global(&interp, "g2").to_string(), "b");
    assert_eq!(global(&interp, "g3").to_string(), "c");
}

#[test]
fn test_block_scope_does_not_leak() {
    let code = r#"
        mut outer := 1
        if true { let inner := 5; outer := inner }
    "#;
    let (interp, _) = run_code(code);
    assert_eq!(global(&interp, "outer"), Value::Int(5));
    assert!(interp.env().get("inner").is_none());
}

#[test]
fn test_recursion() {
    let code = r#"
        func fib(n) {
            if n < 2 { return n }
            return fib(n - 1) + fib(n - 2)
        }
        let result := fib(15)
    "#;
    let (interp, _) = run_code(code);
    assert_eq!(global(&interp, "result"), Value::Int(610));
}

#[test]
fn test_functions_are_values() {
    let code = r#"
        func double(x) { return x * 2 }
        let f := double
        let r := f(21)
    "#;
    let (interp, _) = run_code(code);
    assert_eq!(global(&interp, "r"), Value::Int(42));
}

#[test]
fn test_function_called_before_definition() {
    let (interp, _) = run_code("let r := later(2)\nfunc later(x) { return x + 1 }");
    assert_eq!(global(&interp, "r"), Value::Int(3));
}

#[test]
fn test_function_without_return_is_null() {
    let (interp, _) = run_code("func noop(x) { let y := x }\nlet r := noop(1)");
    assert_eq!(global(&interp, "r"), Value::Null);
}

#[test]
fn test_push_and_len() {
    let code = r#"
        mut a := []
        push(a, 1)
        push(a, 2)
        let n := len(a)
    "#;
    let (interp, _) = run_code(code);
    assert_eq!(global(&interp, "n"), Value::Int(2));
    assert_eq!(global(&interp, "a").to_string(), "[1, 2]");
}

#[test]
fn test_nested_index_assignment() {
    let (interp, _) = run_code("let m := [[0, 0], [0, 0]]\nm[1][0] := 5");
    assert_eq!(global(&interp, "m").to_string(), "[[0, 0], [5, 0]]");
}

#[test]
fn test_array_builtin_fill() {
    let (interp, _) = run_code("let a := array(3, 7)\nlet b := a[2]");
    assert_eq!(global(&interp, "b"), Value::Int(7));
}

#[test]
fn test_string_concatenation_and_index() {
    let (interp, _) = run_code("let s := \"n=\" + 5\nlet c := \"abc\"[1]");
    assert_eq!(global(&interp, "s").to_string(), "n=5");
    assert_eq!(global(&interp, "c").to_string(), "b");
}

#[test]
fn test_short_circuit_skips_right_side() {
    let (interp, _) = run_code("let ok := false && missing_name\nlet yes := true || missing_name");
    assert_eq!(global(&interp, "ok"), Value::Bool(false));
    assert_eq!(global(&interp, "yes"), Value::Bool(true));
}

#[test]
fn test_comments_are_ignored() {
    let (interp, _) = run_code("# leading comment\nlet x := 1 // trailing\nlet y := x + 1 # again");
    assert_eq!(global(&interp, "y"), Value::Int(2));
}

#[test]
fn test_print_output() {
    let (_, out) = run_code("for i in range(3) { print(\"i\", i) }");
    assert_eq!(out, "i 0\ni 1\ni 2\n");
}

#[test]
fn test_try_except_captures_message() {
    let code = r#"
        mut msg := ""
        try { throw("boom", 7) } except e { msg := e }
    "#;
    let (interp, _) = run_code(code);
    assert_eq!(global(&interp, "msg").to_string(), "boom 7");
}

#[test]
fn test_runtime_errors_are_catchable() {
    let code = r#"
        mut caught := false
        try { let x := [1, 2][5] } except e { caught := true }
    "#;
    let (interp, _) = run_code(code);
    assert_eq!(global(&interp, "caught"), Value::Bool(true));
}

#[test]
fn test_top_level_return_stops_program() {
    let program = parse_program("return 1\nthrow(\"unreachable\")").unwrap();
    let value = Interpreter::new().eval_program(&program).unwrap();
    assert_eq!(value, Some(Value::Int(1)));
}

#[test]
fn test_undefined_function_suggestion() {
    let err = run_err("let n := lenn([1, 2])");
    assert_eq!(err.kind, ErrorKind::UndefinedFunction);
    assert_eq!(err.suggestion.as_deref(), Some("len"));
}

#[test]
fn test_arity_mismatch() {
    let err = run_err("func f(a, b) { return a }\nf(1)");
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(err.message.contains("expects 2 arguments, got 1"));
}

#[test]
fn test_index_out_of_bounds() {
    let err = run_err("let a := [1]\nlet b := a[3]");
    assert!(err.message.contains("out of bounds"));
    assert_eq!(err.location.line, 2);
}

#[test]
fn test_type_error_on_bad_operands() {
    let err = run_err("let x := [1] - 1");
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn test_collection_limit() {
    let program = parse_program("let a := array(1000)").unwrap();
    let mut interp = Interpreter::with_limits(Limits { max_collection_len: 100, ..Limits::default() });
    let err = interp.eval_program(&program).unwrap_err();
    assert!(err.message.contains("sandbox limit of 100"));
}

#[test]
fn test_push_respects_collection_limit() {
    let program = parse_program("mut a := []\nfor i in range(10) { push(a, i) }").unwrap();
    let mut interp = Interpreter::with_limits(Limits { max_collection_len: 5, ..Limits::default() });
    let err = interp.eval_program(&program).unwrap_err();
    assert!(err.message.contains("sandbox limit"));
}

#[test]
fn test_parse_error_location() {
    let err = parse_program("let x := 1\nlet := 2").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ParseError);
    assert_eq!(err.location.line, 2);
}

#[test]
fn test_sandbox_candidate_runs_entry() {
    let source = r#"
        func algoritmo(n) {
            mut s := 0
            for i in range(n) { for j in range(n) { s := s + 1 } }
            return s
        }
    "#;
    let mut candidate = Sandbox::compile(source, &Config::default()).unwrap();
    assert_eq!(candidate.run(12, None).unwrap(), Value::Int(144));
    assert_eq!(candidate.loop_depth(), Some(2));
    assert!(candidate.invoke(5, None).is_ok());
}

#[test]
fn test_sandbox_custom_entry_point() {
    let config = Config { entry_point: "solve".to_string(), ..Config::default() };
    let mut candidate = Sandbox::compile("func solve(n) { return n * 3 }", &config).unwrap();
    assert_eq!(candidate.entry_point(), "solve");
    assert_eq!(candidate.run(4, None).unwrap(), Value::Int(12));
}

#[test]
fn test_sandbox_state_reset_between_runs() {
    let source = r#"
        mut calls := 0
        func algoritmo(n) { calls := calls + 1; return calls }
    "#;
    let mut candidate = Sandbox::compile(source, &Config::default()).unwrap();
    assert_eq!(candidate.run(1, None).unwrap(), Value::Int(1));
    assert_eq!(candidate.run(1, None).unwrap(), Value::Int(1));
}

#[test]
fn test_demo_candidates_compile_and_run() {
    let demos = [
        (include_str!("../demos/constant.ruff"), 21, Some(0)),
        (include_str!("../demos/linear_sum.ruff"), 45, Some(1)),
        (include_str!("../demos/binary_search.ruff"), 9, Some(1)),
        (include_str!("../demos/bubble_sort.ruff"), 1, Some(2)),
        (include_str!("../demos/merge_sort.ruff"), 1, None),
    ];
    for (source, expected, depth) in demos {
        let mut candidate = Sandbox::compile(source, &Config::default()).unwrap();
        assert_eq!(candidate.run(10, None).unwrap(), Value::Int(expected));
        if depth.is_some() {
            assert_eq!(candidate.loop_depth(), depth);
        }
    }
}
