//! Candidate lookup for the reverse-Polish parser: which assertions
//! are usable as syntax-producing axioms, grouped by the type code
//! they produce.
//!
//! `original_source/syntaxiom.cpp` additionally builds a `_map()`
//! constant-indexed lookup to skip candidates whose first literal
//! constant can't match; this crate skips that optimization and just
//! tries every candidate of the right type code (see DESIGN.md).

use rustc_hash::FxHashMap;

use crate::database::Database;
use crate::model::{Assertion, AssertionId, ConstId, HypId, VarId};

/// An axiom is usable to produce syntax iff its hypotheses are all
/// floating *and* its conclusion's type code is primitive (spec.md
/// §4.8: "A syntax axiom is an axiom whose conclusion's type code is
/// *primitive* ... and whose hypotheses are all floating"). A type
/// code aliased via a `syntax '…' as '…'` convention comment (e.g.
/// `|-` aliasing to `wff`) never itself has syntax axioms; expressions
/// of that type are parsed against the aliased target instead (see
/// `resolve_primitive_type`).
pub fn is_syntax_axiom(db: &Database, ass: &Assertion) -> bool {
    ass.kind.is_axiom()
        && ass.mandatory_hyps.iter().all(|&h| db.hyp(h).is_floating())
        && ass
            .conclusion
            .type_code()
            .is_some_and(|tc| db.comment_info.is_primitive(db.symtab.const_name(tc)))
}

/// Resolve `type_code` to the primitive type code it ultimately
/// denotes, following `syntax '…' as '…'` aliases (spec.md §4.8, §6.2).
/// A type code with no alias information, or one whose alias target
/// doesn't resolve to a known constant, resolves to itself.
pub fn resolve_primitive_type(db: &Database, type_code: ConstId) -> ConstId {
    let mut current = type_code;
    for _ in 0..db.comment_info.type_codes.len() + 1 {
        let name = db.symtab.const_name(current);
        if db.comment_info.is_primitive(name) {
            return current;
        }
        let Some(as_type) = db.comment_info.type_codes.get(name).and_then(|info| info.as_type.as_deref())
        else {
            return current;
        };
        let Some(next) = db.symtab.lookup_constant(as_type) else {
            return current;
        };
        current = next;
    }
    current
}

/// The floating hypothesis of `axiom` that declares `var`, if any.
///
/// Every variable occurring in a syntax axiom's conclusion is
/// mandatory for it, so this is always found for a variable that
/// actually appears in `axiom`'s own conclusion.
pub(super) fn axiom_floating_hyp(db: &Database, axiom: AssertionId, var: VarId) -> Option<HypId> {
    db.assertion(axiom)
        .mandatory_hyps
        .iter()
        .copied()
        .find(|&h| db.hyp(h).floating_var() == Some(var))
}

/// Syntax axioms grouped by the type code of their conclusion.
#[derive(Debug, Default)]
pub struct SyntaxIndex {
    pub axioms_by_type: FxHashMap<ConstId, Vec<AssertionId>>,
}

impl SyntaxIndex {
    pub fn build(db: &Database) -> Self {
        let mut axioms_by_type: FxHashMap<ConstId, Vec<AssertionId>> = FxHashMap::default();
        for (i, ass) in db.assertions().iter().enumerate() {
            if is_syntax_axiom(db, ass) {
                if let Some(type_code) = ass.conclusion.type_code() {
                    axioms_by_type
                        .entry(type_code)
                        .or_default()
                        .push(AssertionId(i as u32));
                }
            }
        }
        Self { axioms_by_type }
    }
}
