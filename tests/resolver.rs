//! Static-analysis tests: binding distances observed through execution,
//! plus the whole family of resolve-time errors.

mod common;

use common::run_program;

#[test]
fn closure_captures_binding_not_later_shadow() {
    // The classic scope-capture program: the function must keep seeing the
    // binding that existed at its declaration, even after a shadowing
    // declaration appears in the same block.
    let outcome = run_program(
        "var a = \"global\";\n\
         {\n\
           fun showA() { print a; }\n\
           showA();\n\
           var a = \"block\";\n\
           showA();\n\
         }\n",
    );

    assert!(!outcome.had_error);
    assert_eq!(outcome.output, "global\nglobal\n");
}

#[test]
fn shadowing_resolves_to_innermost_binding() {
    let outcome = run_program(
        "var x = \"outer\";\n\
         {\n\
           var x = \"inner\";\n\
           print x;\n\
         }\n\
         print x;\n",
    );

    assert!(!outcome.had_error);
    assert_eq!(outcome.output, "inner\nouter\n");
}

#[test]
fn reading_local_in_own_initializer_is_an_error() {
    let outcome = run_program("var a = \"outer\"; { var a = a; }");

    assert!(outcome.had_error);
    assert!(outcome.reported("Cannot read local variable in its own initializer."));
}

#[test]
fn duplicate_declaration_in_local_scope_is_an_error() {
    let outcome = run_program("{ var a = 1; var a = 2; }");

    assert!(outcome.had_error);
    assert!(outcome.reported("Variable with this name already declared in this scope."));
}

#[test]
fn global_redeclaration_is_legal() {
    let outcome = run_program("var a = 1; var a = 2; print a;");

    assert!(!outcome.had_error);
    assert_eq!(outcome.output, "2\n");
}

#[test]
fn top_level_return_is_an_error() {
    let outcome = run_program("return 1;");

    assert!(outcome.had_error);
    assert!(outcome.reported("Cannot return from top-level code."));
}

#[test]
fn return_inside_function_is_fine() {
    let outcome = run_program("fun f() { return 1; } print f();");

    assert!(!outcome.had_error);
    assert_eq!(outcome.output, "1\n");
}

#[test]
fn this_outside_class_is_an_error() {
    let outcome = run_program("print this;");

    assert!(outcome.had_error);
    assert!(outcome.reported("Cannot use 'this' outside of a class."));
}

#[test]
fn this_in_standalone_function_is_an_error() {
    let outcome = run_program("fun f() { return this; }");

    assert!(outcome.had_error);
    assert!(outcome.reported("Cannot use 'this' outside of a class."));
}

#[test]
fn returning_value_from_initializer_is_an_error() {
    let outcome = run_program("class C { init() { return 1; } }");

    assert!(outcome.had_error);
    assert!(outcome.reported("Cannot return a value from an initializer."));
}

#[test]
fn bare_return_from_initializer_is_fine() {
    let outcome = run_program(
        "class C { init() { return; } }\n\
         print C();\n",
    );

    assert!(!outcome.had_error);
    assert_eq!(outcome.output, "C instance\n");
}

#[test]
fn one_pass_surfaces_every_static_error() {
    let outcome = run_program(
        "return 1;\n\
         { var a = 1; var a = 2; }\n\
         print this;\n",
    );

    assert!(outcome.had_error);
    assert!(outcome.reported("Cannot return from top-level code."));
    assert!(outcome.reported("Variable with this name already declared in this scope."));
    assert!(outcome.reported("Cannot use 'this' outside of a class."));
}

#[test]
fn function_can_recurse_by_name() {
    let outcome = run_program(
        "fun count(n) {\n\
           if (n > 0) count(n - 1);\n\
           print n;\n\
         }\n\
         count(2);\n",
    );

    assert!(!outcome.had_error);
    assert_eq!(outcome.output, "0\n1\n2\n");
}

#[test]
fn late_bound_globals_still_work() {
    // A global referenced before its declaration line is fine as long as
    // the call happens after.
    let outcome = run_program(
        "fun callLater() { print answer; }\n\
         var answer = 42;\n\
         callLater();\n",
    );

    assert!(!outcome.had_error);
    assert_eq!(outcome.output, "42\n");
}
