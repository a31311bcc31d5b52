//! Parser integration tests: precedence and associativity via the prefix
//! printer, `for` desugaring, and statement-boundary error recovery.

mod common;

use common::{print_expression, run_program};

#[test]
fn unary_binds_tighter_than_factor() {
    assert_eq!(
        print_expression("-123 * (45.67)").as_deref(),
        Some("(* (- 123.0) (group 45.67))")
    );
}

#[test]
fn factor_binds_tighter_than_term() {
    assert_eq!(
        print_expression("1 + 2 * 3").as_deref(),
        Some("(+ 1.0 (* 2.0 3.0))")
    );
}

#[test]
fn comparison_and_equality_layering() {
    assert_eq!(
        print_expression("1 + 2 < 4 == true").as_deref(),
        Some("(== (< (+ 1.0 2.0) 4.0) true)")
    );
}

#[test]
fn binary_operators_associate_left() {
    assert_eq!(
        print_expression("1 - 2 - 3").as_deref(),
        Some("(- (- 1.0 2.0) 3.0)")
    );
}

#[test]
fn and_binds_tighter_than_or() {
    assert_eq!(
        print_expression("a or b and c").as_deref(),
        Some("(or a (and b c))")
    );
}

#[test]
fn assignment_associates_right() {
    assert_eq!(
        print_expression("a = b = 1").as_deref(),
        Some("(= a (= b 1.0))")
    );
}

#[test]
fn calls_and_property_access_chain_left() {
    assert_eq!(
        print_expression("a.b(1).c").as_deref(),
        Some("(. (call (. a b) 1.0) c)")
    );
}

#[test]
fn property_assignment_prints_as_set() {
    assert_eq!(
        print_expression("a.b = 2").as_deref(),
        Some("(= (. a b) 2.0)")
    );
}

#[test]
fn this_is_a_primary_expression() {
    assert_eq!(
        print_expression("this.x + 1").as_deref(),
        Some("(+ (. this x) 1.0)")
    );
}

#[test]
fn missing_operand_is_an_error() {
    assert_eq!(print_expression("1 +"), None);
}

#[test]
fn unbalanced_parenthesis_is_an_error() {
    assert_eq!(print_expression("(1 + 2"), None);
}

#[test]
fn for_loop_desugars_to_working_while() {
    let outcome = run_program("for (var i = 0; i < 3; i = i + 1) print i;");

    assert!(!outcome.had_error);
    assert_eq!(outcome.output, "0\n1\n2\n");
}

#[test]
fn for_loop_clauses_are_each_optional() {
    let outcome = run_program(
        "var i = 0;\
         for (; i < 2;) { print i; i = i + 1; }",
    );

    assert!(!outcome.had_error);
    assert_eq!(outcome.output, "0\n1\n");
}

#[test]
fn invalid_assignment_target_reported_without_aborting() {
    let outcome = run_program("var a = 1; var b = 2; a + b = 3;");

    assert!(outcome.had_error);
    assert!(outcome.reported("Invalid assignment target."));
}

#[test]
fn recovery_surfaces_errors_in_multiple_statements() {
    // Two independent syntax errors; synchronization lets both surface in
    // one parse.
    let outcome = run_program("var 1 = 2;\nprint ;\n");

    assert!(outcome.had_error);
    assert!(outcome.reported("Expected variable name."));
    assert!(outcome.reported("Expected expression."));
}

#[test]
fn erroneous_program_is_not_executed() {
    let outcome = run_program("print \"ok\"; print ;");

    assert!(outcome.had_error);
    assert_eq!(outcome.output, "");
}

#[test]
fn parameter_limit_is_reported() {
    let params: Vec<String> = (0..=255).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));

    let outcome = run_program(&source);

    assert!(outcome.had_error);
    assert!(outcome.reported("Cannot have more than 255 parameters."));
}
