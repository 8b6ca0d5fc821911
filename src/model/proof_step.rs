//! Tagged proof steps (spec.md §3, §9 "Union-tagged proof steps").
//!
//! Modeled as a tagged sum rather than the C-style discriminated union
//! of the original source — no untagged memory, per spec.md §9.

use super::assertion::AssertionId;
use super::hyp::HypId;

/// A single step of a flattened proof-step sequence.
///
/// Produced by either path described in spec.md §3 ("decoded
/// compressed proofs and resolved regular proofs") and consumed
/// identically by the executor (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofStep {
    /// Push the named hypothesis's expression.
    Hyp(HypId),
    /// Apply the named assertion.
    Assertion(AssertionId),
    /// Push a copy of `saved[index]`.
    Load(usize),
    /// Duplicate the top of stack into the saved-steps vector.
    Save,
}
