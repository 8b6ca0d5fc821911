//! Shared data model: interned symbols, expressions, hypotheses,
//! assertions, proof steps and substitutions (spec.md §3).
//!
//! This module has no dependencies on other crate modules, mirroring
//! the teacher's `base` module in the dependency chain.

mod assertion;
mod expr;
mod hyp;
mod proof_step;
mod span;
mod subst;
mod symbol;

pub use assertion::{Assertion, AssertionId, AssertionKind, DisjointPair, ProofTree};
pub use expr::Expression;
pub use hyp::{HypId, HypKind, Hypothesis};
pub use proof_step::ProofStep;
pub use span::{FileId, Position, Span};
pub use subst::Substitution;
pub use symbol::{ConstId, LabelId, NameClass, Symbol, VarId};
