//! Black-box coverage of the concrete end-to-end scenarios in spec.md
//! §8, run through the real compiled binary the way a user would invoke
//! it: one script path, stdout/stderr/exit-code assertions.

mod util;

use indoc::indoc;
use predicates::str::contains;
use util::{run_script, RUNTIME_ERROR, STATIC_ERROR, SUCCESS, USAGE_ERROR};

#[test]
fn arithmetic_addition() {
    run_script("print 1 + 2;").success().code(SUCCESS).stdout("3\n");
}

#[test]
fn string_plus_number_concatenates_with_stringified_number() {
    run_script("var a = \"hi\"; print a + 1;").success().stdout("hi1\n");
}

#[test]
fn closures_capture_their_frame_by_reference() {
    let src = indoc! {"
        fun make() {
            var i = 0;
            fun next() { i = i + 1; return i; }
            return next;
        }
        var n = make();
        print n();
        print n();
        print n();
    "};
    run_script(src).success().stdout("1\n2\n3\n");
}

#[test]
fn super_dot_method_reaches_base_class_implementation_first() {
    let src = indoc! {r#"
        class A { greet() { print "a"; } }
        class B < A { greet() { super.greet(); print "b"; } }
        B().greet();
    "#};
    run_script(src).success().stdout("a\nb\n");
}

#[test]
fn initializer_binds_constructor_arguments_to_fields() {
    run_script("class C { init(x) { this.x = x; } } print C(7).x;").success().stdout("7\n");
}

#[test]
fn a_method_torn_off_an_instance_still_sees_its_original_this() {
    let src = indoc! {r#"
        class Greeter { init(name) { this.name = name; } greet() { print this.name; } }
        var g = Greeter("Amy");
        var f = g.greet;
        class Other { init(name) { this.name = name; } }
        var other = Other("not Amy");
        f();
    "#};
    run_script(src).success().stdout("Amy\n");
}

#[test]
fn continue_inside_a_desugared_for_loop_still_runs_the_increment() {
    let src = "for (var i = 0; i < 3; i = i + 1) { if (i == 1) continue; print i; }";
    run_script(src).success().stdout("0\n2\n");
}

#[test]
fn clock_is_monotonic_non_increasing_backwards() {
    run_script("print clock() - clock() <= 0;").success().stdout("true\n");
}

#[test]
fn top_level_self_reference_is_not_a_static_error_but_fails_at_runtime() {
    // The resolver only rejects a self-referential initializer inside a
    // local scope (spec.md §4.2) — at the global scope `var a = a;` is
    // accepted statically. It still fails at runtime, though: the
    // initializer reads `a` before `var` has defined it, and the
    // globals frame has no entry for it yet (spec.md §4.1 `get`).
    run_script("var a = a;").failure().code(RUNTIME_ERROR).stderr(contains("Undefined variable 'a'."));
}

#[test]
fn block_scoped_self_reference_is_a_static_error() {
    run_script("{ var a = a; }")
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Can't read local variable in its own initializer."));
}

#[test]
fn divide_by_zero_is_a_runtime_error() {
    run_script("print 1 / 0;").failure().code(RUNTIME_ERROR).stderr(contains("Cannot divide by 0."));
}

#[test]
fn calling_a_non_callable_value_is_a_runtime_error() {
    run_script("var x = 1; x();").failure().code(RUNTIME_ERROR).stderr(contains("Can only call functions and classes."));
}

#[test]
fn wrong_arity_is_a_runtime_error() {
    run_script("fun f(a, b) { return a + b; } f(1);")
        .failure()
        .code(RUNTIME_ERROR)
        .stderr(contains("Expected 2 arguments but got 1."));
}

#[test]
fn getter_is_invoked_without_parens_on_access() {
    let src = indoc! {"
        class Circle {
            init(radius) { this.radius = radius; }
            get area { return 3.14159 * this.radius * this.radius; }
        }
        print Circle(2).area;
    "};
    run_script(src).success().stdout("12.56636\n");
}

#[test]
fn static_method_is_invoked_on_the_class_itself() {
    let src = indoc! {"
        class Math2 { static square(n) { return n * n; } }
        print Math2.square(5);
    "};
    run_script(src).success().stdout("25\n");
}

#[test]
fn too_many_cli_arguments_is_a_usage_error() {
    let mut cmd = assert_cmd::Command::cargo_bin("lox-tree-walker").unwrap();
    cmd.arg("one").arg("two");
    cmd.assert().failure().code(USAGE_ERROR).stderr(contains("Usage:"));
}

#[test]
fn function_expression_can_be_called_immediately() {
    run_script("print (fun (a) { return a + 1; })(41);").success().stdout("42\n");
}
