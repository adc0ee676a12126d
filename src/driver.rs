use crate::error;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use anyhow::{Context, Result};
use bytes::Bytes;
use std::io::{self, BufRead, Write};

/// Runs one chunk of source text through the full pipeline: scan, parse,
/// resolve, interpret. Shared by `run_file` and `run_prompt` — the only
/// difference between a script and a REPL line is how the caller handles
/// the "had error" flags afterward (spec.md §6/§7).
fn run_source(source: &str) {
    let tokens = Scanner::new(source).scan_tokens();
    let statements = Parser::new(tokens).parse();

    if error::had_error() {
        return;
    }

    let locals = Resolver::new().resolve(&statements);

    if error::had_error() {
        return;
    }

    let mut interpreter = Interpreter::new(locals);
    interpreter.interpret(&statements);
}

/// Reads the whole file, runs it once, and maps the resulting error
/// flags to the exit codes spec.md §6 fixes: 65 for a static error, 70
/// for a runtime error.
pub fn run_file(path: &str) -> Result<()> {
    let raw = Bytes::from(std::fs::read(path).with_context(|| format!("could not read file '{path}'"))?);
    let source = String::from_utf8(raw.to_vec()).with_context(|| format!("'{path}' is not valid UTF-8"))?;

    run_source(&source);

    if error::had_error() {
        std::process::exit(65);
    }
    if error::had_runtime_error() {
        std::process::exit(70);
    }
    Ok(())
}

/// The REPL: reads one line at a time, evaluates it, and reports errors
/// without ever exiting on them — only EOF (an empty `read_line`) ends
/// the loop. "had error" is cleared between lines so a bad line doesn't
/// poison the ones after it; "had runtime error" deliberately is not,
/// since it feeds the process's eventual exit code.
pub fn run_prompt() -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().context("failed to flush stdout")?;

        let mut line = String::new();
        let bytes_read = stdin.lock().read_line(&mut line).context("failed to read from stdin")?;
        if bytes_read == 0 {
            break;
        }

        run_source(&line);
        error::reset_had_error();
    }

    Ok(())
}
