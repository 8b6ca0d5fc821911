//! Diagnostics surfaced to the CLI: the first failure's context, plus
//! non-fatal warnings (incomplete proofs), grounded on the teacher's
//! `hir::diagnostics::Diagnostic`.

use crate::model::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A single reportable event: an incomplete-proof warning or the
/// formatted context of a fatal error.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub span: Option<Span>,
    pub severity: Severity,
    pub label: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(label: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self {
            span: Some(span),
            severity: Severity::Warning,
            label: Some(label.into()),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            span: None,
            severity: Severity::Error,
            label: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(span) = &self.span {
            write!(f, "{}: {}: {}", span, self.severity.as_str(), self.message)
        } else {
            write!(f, "{}: {}", self.severity.as_str(), self.message)
        }
    }
}
