//! # Script Evaluation
//!
//! The boundary to the embedded rules engine. The loop only ever sees the
//! [`Evaluator`] trait: bootstrap once, then evaluate one command at a time.
//! What the engine keeps between calls (the board, defined functions) is its
//! own business.

mod rhai_engine;

use std::fmt;

pub use rhai_engine::{Output, RhaiEvaluator};

/// The board library every payload builds on. Defines `board` and its
/// `update(dir)`, `render()` and `reset()` methods.
pub const BOOT_LIBRARY: &str = include_str!("../../assets/boot.rhai");

/// Errors from the evaluator. None of them are fatal to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The bootstrap library failed to parse or run.
    Library(String),
    /// The game payload failed to parse or run.
    Payload(String),
    /// A command failed to parse or run.
    Command { source: String, message: String },
    /// `eval()` before `bootstrap()`.
    NotBootstrapped,
    /// `bootstrap()` a second time.
    AlreadyBootstrapped,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Library(msg) => write!(f, "bootstrap library error: {msg}"),
            ScriptError::Payload(msg) => write!(f, "game payload error: {msg}"),
            ScriptError::Command { source, message } => {
                write!(f, "error evaluating `{source}`: {message}")
            }
            ScriptError::NotBootstrapped => write!(f, "evaluator used before bootstrap"),
            ScriptError::AlreadyBootstrapped => write!(f, "evaluator already bootstrapped"),
        }
    }
}

impl std::error::Error for ScriptError {}

/// A synchronous script evaluator.
///
/// Callers must not run two calls at once; implementations may assume a
/// single caller.
pub trait Evaluator {
    /// Evaluate `library`, then `payload`. Must be called exactly once,
    /// before any [`Evaluator::eval`]. A library failure does not stop the
    /// payload from being evaluated; the first failure is returned.
    fn bootstrap(&mut self, library: &str, payload: &str) -> Result<(), ScriptError>;

    /// Evaluate one snippet and return its value as text (empty for unit).
    fn eval(&mut self, source: &str) -> Result<String, ScriptError>;
}
