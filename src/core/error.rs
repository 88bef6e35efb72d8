use thiserror::Error;

/// Errors produced by the invoicing engine.
///
/// All variants are recoverable and propagate to the calling workflow
/// unmodified; the engine never retries on its own.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FatturaError {
    /// A referenced document or client does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// One or more business rules failed. Carries the complete list of
    /// violations, never just the first.
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    /// A legal but blocked action: illegal status transition, or an
    /// attempt to rewrite a non-draft document.
    #[error("operation not allowed: {0}")]
    Forbidden(String),

    /// Concurrent numbering collision or duplicate unique key.
    #[error("conflict: {0}")]
    Conflict(String),
}

fn summarize(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FatturaError {
    /// Wrap a non-empty violation list; `Ok(())` when there is nothing to
    /// report.
    pub fn from_violations(violations: Vec<ValidationError>) -> Result<(), Self> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self::Validation(violations))
        }
    }
}

/// A single validation failure with the offending field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "items[2].quantity").
    pub field: String,
    /// Human-readable description of the violated rule.
    pub message: String,
    /// Rule identifier, when one exists.
    pub rule: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "[{}] {}: {}", rule, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}
