//! One minimal program per static rule in spec.md §4.2, each asserted to
//! produce exactly that rule's error message and the exit code (65)
//! spec.md §6 assigns to any scanner/parser/resolver error.

mod util;

use predicates::str::contains;
use util::{run_script, STATIC_ERROR};

#[test]
fn unused_local_variable() {
    run_script("{ var x = 1; }").failure().code(STATIC_ERROR).stderr(contains("Unused local variable"));
}

#[test]
fn redeclaring_a_name_in_the_same_scope() {
    run_script("{ var x = 1; print x; var x = 2; print x; }")
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Already a variable with that name in this scope."));
}

#[test]
fn reading_a_local_variable_in_its_own_initializer() {
    run_script("{ var a = a; }")
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Can't read local variable in its own initializer."));
}

#[test]
fn return_at_top_level() {
    run_script("return 1;").failure().code(STATIC_ERROR).stderr(contains("Can't return from top-level code."));
}

#[test]
fn returning_a_value_from_an_initializer() {
    run_script("class C { init() { return 1; } }")
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Can't return a value from an initializer."));
}

#[test]
fn break_outside_a_loop() {
    run_script("break;").failure().code(STATIC_ERROR).stderr(contains("Illegal continue statement."));
}

#[test]
fn continue_outside_a_loop() {
    run_script("continue;").failure().code(STATIC_ERROR).stderr(contains("Illegal continue statement."));
}

#[test]
fn this_outside_a_class() {
    run_script("print this;").failure().code(STATIC_ERROR).stderr(contains("Can't use 'this' outside of a class."));
}

#[test]
fn super_outside_a_derived_class() {
    run_script("class A { m() { super.m(); } }")
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Can't use 'super' outside of a derived class."));
}

#[test]
fn super_property_before_super_call_inside_initializer() {
    let src = r#"
        class A { m() {} }
        class B < A { init() { super.m(); super(); } }
    "#;
    run_script(src)
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Can't access property on superclass until 'super' has been called."));
}

#[test]
fn super_call_inside_a_static_initializer() {
    let src = r#"
        class A {}
        class B < A { static init() { super(); } }
    "#;
    run_script(src).failure().code(STATIC_ERROR).stderr(contains("Can't call 'super' inside a static initializer."));
}

#[test]
fn super_call_outside_an_initializer() {
    let src = r#"
        class A { m() {} }
        class B < A { m() { super(); } }
    "#;
    run_script(src).failure().code(STATIC_ERROR).stderr(contains("Can't call 'super' outside of class initializer."));
}

#[test]
fn super_call_more_than_once_inside_an_initializer() {
    let src = r#"
        class A { init() {} }
        class B < A { init() { super(); super(); } }
    "#;
    run_script(src)
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Can't call 'super' more than once inside class initializer."));
}

#[test]
fn derived_initializer_without_a_super_call() {
    let src = r#"
        class A {}
        class B < A { init() { this.x = 1; } }
    "#;
    run_script(src)
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Superclass was not initialized inside subclass initializer."));
}

#[test]
fn class_inherits_from_itself() {
    run_script("class A < A {}").failure().code(STATIC_ERROR).stderr(contains("A class can't inherit from itself."));
}

#[test]
fn duplicate_method_and_getter_name() {
    run_script("class C { x() { return 1; } get x { return 2; } }")
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Duplicate method and getter name."));
}

#[test]
fn static_initializer_with_parameters() {
    run_script("class C { static init(x) {} }")
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Class static initializer can't have parameters."));
}
