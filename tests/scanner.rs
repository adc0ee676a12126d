//! Black-box coverage of the scanner's observable behavior. The scanner
//! itself has no CLI surface of its own (no `tokenize` subcommand — the
//! binary only ever runs a whole program, per spec.md §6), so these
//! tests exercise it the only way a user can: through the static-error
//! channel it feeds via the same "had error" flag the parser and
//! resolver share, and through the exit code that flag produces.

mod util;

use predicates::str::contains;
use util::{run_script, STATIC_ERROR, SUCCESS};

#[test]
fn unexpected_character_is_a_static_error() {
    run_script("var a = 1 @ 2;")
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Unexpected character"));
}

#[test]
fn unterminated_string_is_a_static_error() {
    run_script("var s = \"never closed;")
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("Unterminated string"));
}

#[test]
fn multi_line_string_literals_keep_line_numbers_in_sync() {
    run_script("var s = \"line one\nline two\";\nvar bad = @;")
        .failure()
        .code(STATIC_ERROR)
        .stderr(contains("[line 3]"));
}

#[test]
fn comments_are_skipped_without_affecting_execution() {
    run_script("// a leading comment\nprint 1; // trailing\n").success().code(SUCCESS).stdout("1\n");
}

#[test]
fn number_literals_render_without_a_trailing_decimal_point() {
    run_script("print 3.0; print 3.5;").success().stdout("3\n3.5\n");
}
