//! Evaluator invariants and end-to-end scenarios, driven through the
//! public interpreter facade with the core library loaded.

use haki::error::Error;
use haki::interp::{Interpreter, Mode};

fn interp() -> Interpreter {
    let mut interp = Interpreter::new(Mode::Tco);
    interp.load_core().expect("core library should load");
    interp
}

fn eval(interp: &mut Interpreter, form: &str) -> String {
    interp
        .execute(form)
        .unwrap_or_else(|e| panic!("'{}' failed: {}", form, e))
        .to_string()
}

//===----------------------------------------------------------------------===//
// Concrete scenarios
//===----------------------------------------------------------------------===//

#[test]
fn arithmetic_scenarios() {
    let mut it = interp();
    assert_eq!(eval(&mut it, "(+ 2 3)"), "5");
    assert_eq!(eval(&mut it, "(+ 1 (+ 2 6) (- 10 9))"), "10");
    assert_eq!(eval(&mut it, "(- 100 99 24)"), "-23");
    assert_eq!(eval(&mut it, "(+ 2 0.1)"), "2.1");
}

#[test]
fn float_results_demote_when_integral() {
    let mut it = interp();
    assert_eq!(eval(&mut it, "(+ 1 2.0)"), "3");
    assert_eq!(eval(&mut it, "(* 2 1.5)"), "3");
}

#[test]
fn filter_odd_over_range() {
    let mut it = interp();
    assert_eq!(
        eval(&mut it, "(filter (fn (x) (odd? x)) (range 10))"),
        "(1 3 5 7 9)"
    );
}

#[test]
fn let_bindings_see_earlier_bindings() {
    let mut it = interp();
    assert_eq!(eval(&mut it, "(let (a 1 b (+ a 1)) b)"), "2");
}

#[test]
fn lambda_captures_enclosing_let_scope() {
    let mut it = interp();
    assert_eq!(
        eval(&mut it, "(let (x 1) (let (a 2 b (fn () (+ a x))) (b)))"),
        "3"
    );
}

#[test]
fn regex_scenarios() {
    let mut it = interp();
    assert_eq!(
        eval(&mut it, r#"(re-split "\s+" "a b c")"#),
        r#"("a" "b" "c")"#
    );
    assert_eq!(eval(&mut it, r#"(re-match "[<]now[>]" "Now now no.")"#), "false");
}

#[test]
fn hashmap_scenario() {
    let mut it = interp();
    assert_eq!(eval(&mut it, "(hget (hset (hmap) 'k 42) 'k)"), "42");
}

//===----------------------------------------------------------------------===//
// Truthiness and conditionals
//===----------------------------------------------------------------------===//

#[test]
fn only_nil_and_false_are_falsy() {
    let mut it = interp();
    assert_eq!(eval(&mut it, "(if nil 1 2)"), "2");
    assert_eq!(eval(&mut it, "(if false 1 2)"), "2");
    assert_eq!(eval(&mut it, "(if 0 1 2)"), "1");
    assert_eq!(eval(&mut it, r#"(if "" 1 2)"#), "1");
    assert_eq!(eval(&mut it, "(if '() 1 2)"), "1");
}

#[test]
fn if_branch_selection() {
    let mut it = interp();
    assert_eq!(eval(&mut it, "(if true 'a 'b)"), "a");
    assert_eq!(eval(&mut it, "(if false 'a 'b)"), "b");
    assert_eq!(eval(&mut it, "(if true 'a)"), "a");
    assert_eq!(eval(&mut it, "(if false 'a)"), "nil");
}

#[test]
fn if_arity_is_checked() {
    let mut it = interp();
    assert!(matches!(it.execute("(if true)"), Err(Error::ArityError(_))));
    assert!(matches!(
        it.execute("(if true 1 2 3)"),
        Err(Error::ArityError(_))
    ));
}

//===----------------------------------------------------------------------===//
// Short-circuiting
//===----------------------------------------------------------------------===//

#[test]
fn and_short_circuits_without_side_effects() {
    let mut it = interp();
    eval(&mut it, "(def hits 0)");
    assert_eq!(
        eval(&mut it, "(and false (def hits (inc hits)))"),
        "false"
    );
    assert_eq!(eval(&mut it, "hits"), "0");
}

#[test]
fn or_short_circuits_without_side_effects() {
    let mut it = interp();
    eval(&mut it, "(def hits 0)");
    assert_eq!(eval(&mut it, "(or 7 (def hits (inc hits)))"), "7");
    assert_eq!(eval(&mut it, "hits"), "0");
}

#[test]
fn and_or_return_the_deciding_value() {
    let mut it = interp();
    assert_eq!(eval(&mut it, "(and 1 2 3)"), "3");
    assert_eq!(eval(&mut it, "(and 1 nil 3)"), "nil");
    assert_eq!(eval(&mut it, "(or nil false 3)"), "3");
    assert_eq!(eval(&mut it, "(or nil false)"), "false");
}

//===----------------------------------------------------------------------===//
// Tail calls and recursion
//===----------------------------------------------------------------------===//

#[test]
fn deep_tail_recursion_terminates() {
    let mut it = interp();
    eval(
        &mut it,
        "(defun countdown (n) (if (= n 0) n (countdown (- n 1))))",
    );
    assert_eq!(eval(&mut it, "(countdown 100000)"), "0");
}

#[test]
fn tail_position_do_and_let_do_not_grow_the_stack() {
    let mut it = interp();
    eval(
        &mut it,
        "(defun spin (n) (if (= n 0) 'done (do 1 (let (m (- n 1)) (spin m)))))",
    );
    assert_eq!(eval(&mut it, "(spin 50000)"), "done");
}

#[test]
fn let_is_mutually_recursive() {
    let mut it = interp();
    assert_eq!(
        eval(
            &mut it,
            "(let (a (fn (x) (if (= x 0) x (a (- x 1))))) (a 13))"
        ),
        "0"
    );
}

#[test]
fn defun_resolves_forward_references() {
    let mut it = interp();
    eval(&mut it, "(defun f () (g))");
    eval(&mut it, "(defun g () 42)");
    assert_eq!(eval(&mut it, "(f)"), "42");
}

#[test]
fn function_arity_mismatch_names_the_function() {
    let mut it = interp();
    eval(&mut it, "(defun two (a b) (+ a b))");
    match it.execute("(two 1)") {
        Err(Error::ArityError(msg)) => {
            assert!(msg.contains("two"), "message was: {}", msg);
            assert!(msg.contains('2'), "message was: {}", msg);
            assert!(msg.contains('1'), "message was: {}", msg);
        }
        other => panic!("expected arity error, got {:?}", other),
    }
}

#[test]
fn caller_locals_do_not_leak_into_functions() {
    let mut it = interp();
    eval(&mut it, "(defun probe () captured)");
    let result = it.execute("(let (captured 1) (probe))");
    assert!(matches!(result, Err(Error::LookupError(_))));
}

//===----------------------------------------------------------------------===//
// Quote, loop, and core helpers
//===----------------------------------------------------------------------===//

#[test]
fn quote_returns_payload_unevaluated() {
    let mut it = interp();
    assert_eq!(eval(&mut it, "'(+ 1 2)"), "(+ 1 2)");
    assert_eq!(eval(&mut it, "'sym"), "sym");
}

#[test]
fn loop_applies_and_returns_nil() {
    let mut it = interp();
    eval(&mut it, "(def total 0)");
    assert_eq!(
        eval(&mut it, "(loop (fn (x) (def total (+ total x))) (list 1 2 3))"),
        "nil"
    );
    assert_eq!(eval(&mut it, "total"), "6");
}

#[test]
fn loop_index_passes_the_index_first() {
    let mut it = interp();
    eval(&mut it, "(def acc '())");
    eval(
        &mut it,
        "(loop-index (fn (i x) (def acc (append acc (list i x)))) (list 'a 'b))",
    );
    assert_eq!(eval(&mut it, "acc"), "((0 a) (1 b))");
}

#[test]
fn core_helpers_behave() {
    let mut it = interp();
    assert_eq!(eval(&mut it, "(reduce (fn (a x) (+ a x)) 0 (range 5))"), "10");
    assert_eq!(eval(&mut it, "(take 2 (range 9))"), "(0 1)");
    assert_eq!(eval(&mut it, "(factorial 10)"), "3628800");
    assert_eq!(eval(&mut it, "(inc (dec 5))"), "5");
    assert_eq!(eval(&mut it, r#"(words "a few words")"#), r#"("a" "few" "words")"#);
}

//===----------------------------------------------------------------------===//
// Errors
//===----------------------------------------------------------------------===//

#[test]
fn unknown_symbol_is_a_lookup_error() {
    let mut it = interp();
    match it.execute("unbound-symbol") {
        Err(Error::LookupError(name)) => assert_eq!(name, "unbound-symbol"),
        other => panic!("expected lookup error, got {:?}", other),
    }
}

#[test]
fn applying_a_non_function_is_a_type_error() {
    let mut it = interp();
    assert!(matches!(it.execute("(1 2 3)"), Err(Error::TypeError(_))));
}

#[test]
fn primitive_type_mismatch_mentions_expected_type() {
    let mut it = interp();
    match it.execute("(hget (list 1) 'k)") {
        Err(Error::TypeError(msg)) => {
            assert!(msg.contains("hash-map"), "message was: {}", msg);
            assert!(msg.contains("list"), "message was: {}", msg);
        }
        other => panic!("expected type error, got {:?}", other),
    }
}

//===----------------------------------------------------------------------===//
// Naive evaluator parity
//===----------------------------------------------------------------------===//

#[test]
fn naive_mode_matches_tco_on_the_scenarios() {
    let mut naive = Interpreter::new(Mode::Naive);
    naive.load_core().expect("core library should load");
    let mut tco = interp();

    for form in [
        "(+ 2 3)",
        "(- 100 99 24)",
        "(+ 2 0.1)",
        "(filter (fn (x) (odd? x)) (range 10))",
        "(let (a 1 b (+ a 1)) b)",
        "(let (x 1) (let (a 2 b (fn () (+ a x))) (b)))",
        "(hget (hset (hmap) 'k 42) 'k)",
    ] {
        assert_eq!(
            eval(&mut tco, form),
            eval(&mut naive, form),
            "mode divergence on {}",
            form
        );
    }
}
