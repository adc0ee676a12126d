#![allow(dead_code)]
use assert_cmd::Command;
use std::io::Write;
use tempfile::NamedTempFile;

pub const SUCCESS: i32 = 0;
pub const USAGE_ERROR: i32 = 64;
pub const STATIC_ERROR: i32 = 65;
pub const RUNTIME_ERROR: i32 = 70;

/// Writes `source` to a scratch file and runs the built binary against it
/// as its sole argument, the way spec.md §6's "one argument -> script
/// path" CLI form works.
pub fn run_script(source: &str) -> assert_cmd::assert::Assert {
    let mut file = NamedTempFile::new().expect("failed to create scratch script file");
    write!(file, "{source}").expect("failed to write scratch script file");

    let mut cmd = Command::cargo_bin("lox-tree-walker").expect("binary not found");
    cmd.arg(file.path());
    cmd.assert()
}
