use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the contract was violated.
///
/// Gate failures are absent: an unmet gate is a normal stage outcome
/// (see `gates::StageOutcome`), not an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Operator-supplied input was wrong (file missing, columns missing, bad extension, bad id).
    InputValidation,
    /// Persisted run state forbids the operation (run exists, run missing, stage out of order).
    StateConflict,
    /// A persisted artifact failed its schema/identity check on read.
    Integrity,
    /// Filesystem or archive failure.
    Io,
}

/// Single structured error shape used across every layer and surfaced by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn input(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputValidation, code, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StateConflict, code, message)
    }

    pub fn integrity(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Integrity, code, message)
    }

    pub fn io(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, code, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = self.details.as_deref() {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
