use crate::model::Span;
use std::rc::Rc;

/// A single whitespace-delimited token, with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: Rc<str>,
    pub span: Span,
}

impl Token {
    pub fn new(text: impl Into<Rc<str>>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// A `$( ... $)` comment, captured with its text and its position in
/// the surrounding token stream (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
    /// Index into the token stream at which this comment occurred.
    pub token_position: usize,
    pub span: Span,
}
