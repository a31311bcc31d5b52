//! Evaluator tests: operator semantics, truthiness, control flow,
//! functions, closures, and runtime error reporting.

mod common;

use common::run_program;

#[test]
fn arithmetic_follows_precedence() {
    let outcome = run_program("print 1 + 2 * 3 - 4 / 2;");

    assert_eq!(outcome.output, "5\n");
}

#[test]
fn division_produces_fractional_results() {
    let outcome = run_program("print 7 / 2;");

    assert_eq!(outcome.output, "3.5\n");
}

#[test]
fn division_by_zero_follows_ieee754() {
    let outcome = run_program("print 1 / 0; print -1 / 0;");

    assert!(!outcome.had_runtime_error);
    assert_eq!(outcome.output, "inf\n-inf\n");
}

#[test]
fn plus_concatenates_strings() {
    let outcome = run_program("print \"foo\" + \"bar\";");

    assert_eq!(outcome.output, "foobar\n");
}

#[test]
fn plus_rejects_mixed_operands() {
    let outcome = run_program("print \"foo\" + 1;");

    assert!(outcome.had_runtime_error);
    assert!(outcome.reported("Operands must be two numbers or two strings."));
    assert!(outcome.reported("[line 1]"));
}

#[test]
fn comparison_rejects_non_numbers() {
    let outcome = run_program("print \"a\" < \"b\";");

    assert!(outcome.had_runtime_error);
    assert!(outcome.reported("Operands must be numbers."));
}

#[test]
fn negation_rejects_non_numbers() {
    let outcome = run_program("print -\"oops\";");

    assert!(outcome.had_runtime_error);
    assert!(outcome.reported("Operand must be a number."));
}

#[test]
fn equality_never_coerces() {
    let outcome = run_program(
        "print 1 == \"1\";\n\
         print nil == nil;\n\
         print nil == false;\n\
         print \"a\" == \"a\";\n\
         print 2 != 3;\n",
    );

    assert_eq!(outcome.output, "false\ntrue\nfalse\ntrue\ntrue\n");
}

#[test]
fn only_nil_and_false_are_falsy() {
    let outcome = run_program(
        "if (0) print \"zero\";\n\
         if (\"\") print \"empty\";\n\
         if (nil) print \"nil\"; else print \"not nil\";\n\
         if (false) print \"false\"; else print \"not false\";\n",
    );

    assert_eq!(outcome.output, "zero\nempty\nnot nil\nnot false\n");
}

#[test]
fn logical_operators_return_operand_values() {
    let outcome = run_program(
        "print nil or \"fallback\";\n\
         print \"first\" or \"second\";\n\
         print nil and \"unreached\";\n\
         print true and \"taken\";\n",
    );

    assert_eq!(outcome.output, "fallback\nfirst\nnil\ntaken\n");
}

#[test]
fn and_short_circuits_side_effects() {
    let outcome = run_program(
        "fun boom() { print \"called\"; return true; }\n\
         print false and boom();\n",
    );

    assert_eq!(outcome.output, "false\n");
}

#[test]
fn while_loop_runs_until_condition_fails() {
    let outcome = run_program(
        "var i = 0;\n\
         while (i < 3) { print i; i = i + 1; }\n",
    );

    assert_eq!(outcome.output, "0\n1\n2\n");
}

#[test]
fn assignment_is_an_expression_yielding_the_value() {
    let outcome = run_program("var a = 1; print a = 2; print a;");

    assert_eq!(outcome.output, "2\n2\n");
}

#[test]
fn assignment_to_undefined_variable_is_a_runtime_error() {
    let outcome = run_program("missing = 1;");

    assert!(outcome.had_runtime_error);
    assert!(outcome.reported("Undefined variable 'missing'."));
}

#[test]
fn reading_undefined_global_is_a_runtime_error() {
    let outcome = run_program("print missing;");

    assert!(outcome.had_runtime_error);
    assert!(outcome.reported("Undefined variable 'missing'."));
}

#[test]
fn uninitialized_variable_defaults_to_nil() {
    let outcome = run_program("var a; print a;");

    assert_eq!(outcome.output, "nil\n");
}

#[test]
fn function_without_return_yields_nil() {
    let outcome = run_program("fun noop() {} print noop();");

    assert_eq!(outcome.output, "nil\n");
}

#[test]
fn return_unwinds_nested_control_flow() {
    let outcome = run_program(
        "fun find(limit) {\n\
           for (var i = 0; i < limit; i = i + 1) {\n\
             if (i == 2) return i;\n\
           }\n\
           return -1;\n\
         }\n\
         print find(10);\n",
    );

    assert_eq!(outcome.output, "2\n");
}

#[test]
fn recursion_computes_fibonacci() {
    let outcome = run_program(
        "fun fib(n) {\n\
           if (n < 2) return n;\n\
           return fib(n - 1) + fib(n - 2);\n\
         }\n\
         print fib(10);\n",
    );

    assert_eq!(outcome.output, "55\n");
}

#[test]
fn closures_keep_private_mutable_state() {
    let outcome = run_program(
        "fun makeCounter() {\n\
           var count = 0;\n\
           fun increment() {\n\
             count = count + 1;\n\
             return count;\n\
           }\n\
           return increment;\n\
         }\n\
         var a = makeCounter();\n\
         var b = makeCounter();\n\
         print a();\n\
         print a();\n\
         print b();\n",
    );

    assert_eq!(outcome.output, "1\n2\n1\n");
}

#[test]
fn sibling_functions_share_their_declaring_frame() {
    let outcome = run_program(
        "fun makePair() {\n\
           var value = 0;\n\
           fun set(v) { value = v; }\n\
           fun get() { return value; }\n\
           set(7);\n\
           print get();\n\
         }\n\
         makePair();\n",
    );

    assert_eq!(outcome.output, "7\n");
}

#[test]
fn functions_print_by_name() {
    let outcome = run_program("fun greet() {} print greet; print clock;");

    assert_eq!(outcome.output, "<fn greet>\n<fn clock>\n");
}

#[test]
fn clock_returns_a_positive_number() {
    let outcome = run_program("print clock() > 0;");

    assert_eq!(outcome.output, "true\n");
}

#[test]
fn arity_mismatch_is_a_runtime_error() {
    let outcome = run_program("fun f(a, b) {} f(1);");

    assert!(outcome.had_runtime_error);
    assert!(outcome.reported("Expected 2 arguments but got 1."));
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
    let outcome = run_program("\"not a function\"();");

    assert!(outcome.had_runtime_error);
    assert!(outcome.reported("Can only call functions and classes."));
}

#[test]
fn runtime_error_stops_execution_but_keeps_prior_output() {
    let outcome = run_program(
        "print \"before\";\n\
         print 1 + nil;\n\
         print \"after\";\n",
    );

    assert!(outcome.had_runtime_error);
    assert_eq!(outcome.output, "before\n");
    assert!(outcome.reported("[line 2]"));
}

#[test]
fn arguments_evaluate_left_to_right() {
    let outcome = run_program(
        "fun tag(label) { print label; return label; }\n\
         fun pair(a, b) {}\n\
         pair(tag(\"first\"), tag(\"second\"));\n",
    );

    assert_eq!(outcome.output, "first\nsecond\n");
}
