//! Error taxonomy shared by validation, the HTTP layer and the registry.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Everything that can go wrong between receiving tool arguments and
/// returning a text result.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    Validation(ValidationErrors),
    #[error("upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("unexpected response shape at `{path}`: {message}")]
    ResponseParse { path: String, message: String },
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },
    #[error("call cancelled")]
    Cancelled,
    #[error("request failed: {0}")]
    Transport(reqwest::Error),
    #[error("gave up after {pages} pages, upstream still returned a next cursor")]
    PageLimit { pages: u32 },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("tool already registered: {0}")]
    DuplicateTool(String),
}

impl ToolError {
    /// Map a reqwest failure, keeping timeouts distinct from other transport errors.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return Self::Timeout { after: timeout };
        }
        Self::Transport(err)
    }
}

impl From<ValidationErrors> for ToolError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Missing,
    WrongType { expected: String, found: String },
    OutOfRange { value: f64, min: Option<f64>, max: Option<f64> },
    UnknownEnumValue { value: String, allowed: Vec<String> },
    UnknownField,
    NotAnObject,
    Invalid { reason: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "required field is missing"),
            Self::WrongType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::OutOfRange { value, min, max } => {
                write!(f, "{value} is out of range")?;
                match (min, max) {
                    (Some(lo), Some(hi)) => write!(f, " [{lo}, {hi}]"),
                    (Some(lo), None) => write!(f, " (minimum {lo})"),
                    (None, Some(hi)) => write!(f, " (maximum {hi})"),
                    (None, None) => Ok(()),
                }
            }
            Self::UnknownEnumValue { value, allowed } => {
                write!(f, "`{value}` is not one of {}", allowed.join(", "))
            }
            Self::UnknownField => write!(f, "unknown field"),
            Self::NotAnObject => write!(f, "arguments must be a JSON object"),
            Self::Invalid { reason } => f.write_str(reason),
        }
    }
}

/// A violation attached to the field (JSON path) it concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    #[serde(flatten)]
    pub violation: Violation,
}

/// Every violation found while validating one argument mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, violation: Violation) {
        self.violations.push(FieldViolation {
            field: field.into(),
            violation,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Whether any violation names `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// `Ok(())` when nothing was collected, the whole set otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            let field = if v.field.is_empty() { "<root>" } else { &v.field };
            write!(f, "{field}: {}", v.violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
