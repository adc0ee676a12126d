mod driver;
mod environment;
mod error;
mod expr;
mod interpreter;
mod parser;
mod resolver;
mod scanner;
mod stmt;
mod token;
mod value;

use std::env;
use std::process::ExitCode;

/// CLI surface (spec.md §6): no arguments starts the REPL; one argument
/// is a script path run once; anything else is a usage error.
fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let result = match args.len() {
        1 => driver::run_prompt(),
        2 => driver::run_file(&args[1]),
        _ => {
            eprintln!("Usage: {} [script]", args[0]);
            return ExitCode::from(64);
        }
    };

    if let Err(err) = result {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
