//! Fatal error kinds (spec.md §7).
//!
//! A single `thiserror`-derived enum, mirroring the teacher's
//! `interchange::error::InterchangeError`: struct-like variants carry
//! the label/span/reason rather than a bare formatted `String`, so
//! callers can match on the failure kind programmatically.

use thiserror::Error;

use crate::model::{NameClass, Span};

/// Sub-kinds of spec.md §4.6/§6's "proof-shape" error category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofShapeError {
    SelfReference,
    UnknownLabel { label: String },
    StrayZ,
    UnfinishedNumber,
    BogusLetter { letter: char },
    LoadIndexOutOfRange { index: usize, saved_len: usize },
    PrefixContainsMandatory { label: String },
    PrefixContainsSelf,
    CompressedNumberOverflow,
    StackUnderflow { needed: usize, available: usize },
    WrongConclusion,
    EmptyProof,
}

impl std::fmt::Display for ProofShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfReference => write!(f, "proof refers to the theorem being proved"),
            Self::UnknownLabel { label } => write!(f, "unknown label `{label}`"),
            Self::StrayZ => write!(f, "stray `Z` in compressed proof"),
            Self::UnfinishedNumber => write!(f, "compressed proof ends in an unfinished number"),
            Self::BogusLetter { letter } => {
                write!(f, "bogus character `{letter}` in compressed proof")
            }
            Self::LoadIndexOutOfRange { index, saved_len } => write!(
                f,
                "load index {index} out of range (only {saved_len} steps saved)"
            ),
            Self::PrefixContainsMandatory { label } => write!(
                f,
                "compressed proof prefix lists `{label}`, which is already a mandatory hypothesis"
            ),
            Self::PrefixContainsSelf => {
                write!(f, "compressed proof prefix lists the theorem itself")
            }
            Self::CompressedNumberOverflow => {
                write!(f, "overflow computing numbers in compressed proof")
            }
            Self::StackUnderflow { needed, available } => write!(
                f,
                "stack underflow: assertion needs {needed} items, only {available} available"
            ),
            Self::WrongConclusion => write!(f, "proof proves the wrong statement"),
            Self::EmptyProof => write!(f, "no proof given"),
        }
    }
}

/// The six definition-soundness rule codes (spec.md §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionRule {
    /// Rule 1: essential-hypothesis free-variable count exceeds variable count.
    TooManyHypotheses,
    /// Rule 2: conclusion's top-level symbol is not an equality constructor.
    NotEquality,
    /// Rule 3: the statement does not parse into a clean LHS/RHS split.
    DoesNotParse,
    /// Rule 4: the defined syntax occurs in its own RHS.
    Circular,
    /// Rule 5: disjoint-variable restrictions don't match the dummy pattern.
    BadDisjointVariables,
    /// Rule 6: a dummy variable's type is not declared bound.
    DummyNotBound,
}

impl std::fmt::Display for DefinitionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TooManyHypotheses => "has essential hypotheses",
            Self::NotEquality => "root symbol not equality",
            Self::DoesNotParse => "definition does not parse",
            Self::Circular => "definition is circular",
            Self::BadDisjointVariables => "bad disjoint variables",
            Self::DummyNotBound => "has dummy non-set variables",
        };
        f.write_str(s)
    }
}

/// Every fatal error this crate can produce (spec.md §7).
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("{span}: syntax error: {message}")]
    Syntax { span: Span, message: String },

    #[error("{span}: `{name}` is already declared as {existing}")]
    NameReuse {
        span: Span,
        name: String,
        existing: NameClass,
    },

    #[error("{span}: scope violation: {message}")]
    Scope { span: Span, message: String },

    #[error("label `{label}`: unification failed: {message}")]
    Unification { label: String, message: String },

    #[error("label `{label}`: disjoint-variable violation between `{var1}` and `{var2}`")]
    DisjointVariable {
        label: String,
        var1: String,
        var2: String,
    },

    #[error("label `{label}`: {kind}")]
    ProofShape {
        label: String,
        kind: ProofShapeError,
    },

    #[error("label `{label}`: definition rule failed: {rule}")]
    Definition { label: String, rule: DefinitionRule },

    #[error("label `{label}`: propositional conclusion is counter-satisfiable")]
    Propositional { label: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type VerifyResult<T> = Result<T, VerifyError>;
