//! Typed errors for sleec-connect.
//!
//! Provides structured error types instead of anyhow for better
//! library ergonomics and pattern matching. Best-effort parsing never
//! produces an `Error`; it reports [`Diagnostic`]s instead.

use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "trace-gen")]
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for sleec-connect operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Error during rule document synthesis.
    #[error("Synthesis error: {0}")]
    Synth(#[from] SynthError),

    /// Error during trace translation.
    #[error("Translation error: {0}")]
    Translate(#[from] TranslateError),

    /// Error during external trace generation.
    #[cfg(feature = "trace-gen")]
    #[error("Trace generation error: {0}")]
    TraceGen(#[from] TraceGenError),

    /// Error during CADP equivalence checking.
    #[cfg(feature = "check")]
    #[error("Equivalence check error: {0}")]
    Check(#[from] CheckError),

    /// Error building a configuration value.
    #[error("Builder error: {0}")]
    Builder(#[from] BuilderError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error during rule document synthesis.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SynthError {
    /// The selection contains no rules to emit.
    #[error("Selection contains no rules")]
    EmptySelection,

    /// Re-parsing the synthesized document did not reproduce the selection.
    #[error("Synthesized document does not round-trip:\n{diff}")]
    RoundTrip { diff: String },
}

/// Error during trace translation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TranslateError {
    /// A bound environment file must contain a flat JSON object.
    #[error("Bound environment must be a JSON object, got: {found}")]
    NonObjectBounds { found: String },

    /// A bound environment entry must be an integer.
    #[error("Bound '{name}' must be an integer, got: {found}")]
    NonIntegerBound { name: String, found: String },
}

/// Error during external trace generation.
#[cfg(feature = "trace-gen")]
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TraceGenError {
    /// Generator binary not found or not executable.
    #[error("Failed to execute trace generator '{bin}'. Is it installed and on PATH? {reason}")]
    GeneratorNotFound { bin: String, reason: String },

    /// Generator exited with a non-zero status.
    #[error("Trace generator failed (exit code: {exit_code:?}): {message}")]
    GeneratorExecution {
        exit_code: Option<i32>,
        message: String,
    },

    /// Generator exceeded the configured timeout.
    #[error("Trace generator timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Failed to create the temp work directory.
    #[error("Failed to create work directory: {0}")]
    WorkDir(String),

    /// Failed to read the generator's output file.
    #[error("Failed to read generator output {path}: {reason}")]
    OutputRead { path: PathBuf, reason: String },

    /// Generator produced no trace text.
    #[error("Trace generator produced no output")]
    EmptyOutput,
}

/// Error during CADP equivalence checking.
#[cfg(feature = "check")]
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CheckError {
    /// One of the input automata is empty.
    #[error("Input automaton '{role}' is empty")]
    EmptyAutomaton { role: &'static str },

    /// A CADP tool binary was not found.
    #[error("Failed to execute '{tool}'. Is CADP installed and on PATH? {reason}")]
    ToolNotFound { tool: String, reason: String },

    /// A CADP tool exited with a non-zero status.
    #[error("'{tool}' failed (exit code: {exit_code:?}): {message}")]
    ToolExecution {
        tool: String,
        exit_code: Option<i32>,
        message: String,
    },

    /// A CADP tool exceeded the configured timeout.
    #[error("'{tool}' timed out after {duration:?}")]
    Timeout {
        tool: String,
        duration: std::time::Duration,
    },

    /// Failed to create the temp work directory.
    #[error("Failed to create work directory: {0}")]
    WorkDir(String),

    /// A rename mapping line did not match `"<old>" -> "<new>"`.
    #[error("Malformed rename mapping on line {line}: {content}")]
    RenameParse { line: usize, content: String },
}

/// Error building a configuration value.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuilderError {
    /// A required builder field was not set.
    #[error("{builder}: missing required field '{field}'")]
    MissingRequiredField {
        builder: &'static str,
        field: &'static str,
    },
}

/// A non-fatal finding reported by a best-effort parsing or translation
/// stage. Callers decide whether to fail or proceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Human-readable description of what was skipped or assumed.
    pub message: String,

    /// Line in the processed (comment-stripped) input, if known.
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Result type alias using sleec-connect's Error.
pub type SleecResult<T> = std::result::Result<T, Error>;
