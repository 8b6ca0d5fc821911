//! Assertion Builder (spec.md §4.5): computes mandatory hypotheses,
//! variable usage, and disjoint-variable restrictions for an `$a`/`$p`
//! statement's conclusion.
//!
//! Generalized from the teacher's "close a declaration over the
//! active scope" pass (`semantic::symbol_table::scope::Scope::resolve`)
//! to Metamath's specific three-part closure (spec.md §4.5 steps 1-3).

use rustc_hash::FxHashSet;

use crate::database::Database;
use crate::model::{Assertion, AssertionKind, DisjointPair, Expression, HypKind, LabelId, Span, VarId};

/// Build the `Assertion` record for a freshly read `$a`/`$p` conclusion,
/// against the database's current scope stack. Does not mutate `db` or
/// assign a label binding — the caller pushes the result itself.
pub fn build_assertion(
    db: &Database,
    label: LabelId,
    span: Span,
    conclusion: Expression,
    kind: AssertionKind,
) -> Assertion {
    // Step 1: variables used by the conclusion or any active essential hyp.
    let mut used: FxHashSet<VarId> = conclusion.variables().into_iter().collect();
    for hyp_id in db.scopes.all_active_hyps_ordered() {
        let hyp = db.hyp(hyp_id);
        if matches!(hyp.kind, HypKind::Essential) {
            used.extend(hyp.expr.variables());
        }
    }

    // Step 2: mandatory hypotheses, outermost-to-innermost, declaration
    // order within each frame; essential hyps always included, floating
    // hyps only when their variable is used.
    let mandatory_hyps: Vec<_> = db
        .scopes
        .all_active_hyps_ordered()
        .into_iter()
        .filter(|&h| match db.hyp(h).kind {
            HypKind::Essential => true,
            HypKind::Floating { var } => used.contains(&var),
        })
        .collect();

    // Step 3: disjoint-variable restrictions, limited to variables used.
    let mut disjoint = Vec::new();
    for set in db.scopes.all_active_disjoint_sets() {
        for i in 0..set.len() {
            for j in (i + 1)..set.len() {
                let (a, b) = (set[i], set[j]);
                if used.contains(&a) && used.contains(&b) {
                    disjoint.push(DisjointPair::new(a, b));
                }
            }
        }
    }
    disjoint.sort();
    disjoint.dedup();

    // A theorem whose conclusion exactly restates one of its own mandatory
    // hypotheses needs no real proof step beyond citing that hypothesis
    // (`original_source/ass.h`'s `istrivial`).
    let mut kind = kind;
    if mandatory_hyps.iter().any(|&h| db.hyp(h).expr == conclusion) {
        kind.set_trivial();
    }

    Assertion {
        label,
        span,
        kind,
        // Step 4.
        number: db.assertion_count() as u32 + 1,
        conclusion,
        mandatory_hyps,
        disjoint,
        conclusion_revpolish: None,
        hyp_revpolish: Vec::new(),
        proof_steps: None,
        incomplete: false,
    }
}
