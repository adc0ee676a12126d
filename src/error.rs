use crate::token::Token;
use crate::value::Object;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

static HAD_ERROR: AtomicBool = AtomicBool::new(false);
static HAD_RUNTIME_ERROR: AtomicBool = AtomicBool::new(false);

pub fn had_error() -> bool {
    HAD_ERROR.load(Ordering::Relaxed)
}

pub fn had_runtime_error() -> bool {
    HAD_RUNTIME_ERROR.load(Ordering::Relaxed)
}

/// Cleared between REPL lines. "had runtime error" is deliberately left
/// alone — a runtime error in one REPL line doesn't un-set the process's
/// eventual exit code.
pub fn reset_had_error() {
    HAD_ERROR.store(false, Ordering::Relaxed);
}

/// Scanner-level error: no token to anchor on yet, just a line number.
pub fn error_at_line(line: usize, message: String) {
    report(line, String::new(), &message);
}

/// Parser/resolver-level error: anchored on the offending token.
pub fn error_at_token(token: &Token, message: &str) {
    let location = if token.token_type == crate::token::TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    };
    report(token.line, location, message);
}

fn report(line: usize, location: String, message: &str) {
    eprintln!("[line {line}] Error{location}: {message}");
    HAD_ERROR.store(true, Ordering::Relaxed);
}

pub fn report_runtime_error(err: &RuntimeError) {
    eprintln!("[line {}] RuntimeError: {}", err.token.line, err.message);
    HAD_RUNTIME_ERROR.store(true, Ordering::Relaxed);
}

/// A runtime error: carries the offending token (for its source line) and
/// a message, per the error-output format the driver is required to emit.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        RuntimeError { token, message: message.into() }
    }
}

/// Everything that can unwind out of `Interpreter::evaluate`/`execute`.
/// `Return`/`Break`/`Continue` are not user-visible errors — they are
/// non-local control-flow signals consumed by the matching construct (a
/// call frame for `Return`, the nearest `while` for `Break`/`Continue`).
/// Any other signal bubbles up through `?` unchanged, which is exactly
/// the propagation spec.md §7.3 asks for.
#[derive(Debug, Clone, Error)]
pub enum LoxSignal {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("return")]
    Return(Object),
    #[error("break")]
    Break,
    #[error("continue")]
    Continue,
}
