//! Proof Executor (spec.md §4.6): runs a flattened proof-step sequence
//! against a working stack of expressions and a saved-steps vector,
//! grounded on `original_source/proof/verify.cpp`'s
//! `verifyproofsteps`/`verifyassertionref`.

use crate::database::Database;
use crate::diag::{ProofShapeError, VerifyError, VerifyResult};
use crate::model::{Assertion, Expression, HypKind, ProofStep, Substitution};

use super::disjoint;

/// Execute `steps`, requiring the result to equal `theorem`'s
/// conclusion. Used both for a freshly read `$p` proof and for the
/// external-collaborator contract (`Database::verify_external_proof`).
pub fn execute(
    db: &Database,
    label: &str,
    steps: &[ProofStep],
    theorem: &Assertion,
) -> VerifyResult<()> {
    let mut stack: Vec<Expression> = Vec::new();
    let mut saved: Vec<Expression> = Vec::new();

    for &step in steps {
        match step {
            ProofStep::Hyp(h) => stack.push(db.hyp(h).expr.clone()),
            ProofStep::Assertion(a) => {
                let applied = db.assertion(a);
                let k = applied.hyp_count();
                if stack.len() < k {
                    return Err(shape_err(
                        label,
                        ProofShapeError::StackUnderflow { needed: k, available: stack.len() },
                    ));
                }
                let base = stack.len() - k;
                let subst = unify(db, label, applied, &stack[base..])?;
                disjoint::check(db, label, theorem, applied, &subst)?;
                let conclusion = Expression::new(subst.apply(applied.conclusion.as_slice()));
                stack.truncate(base);
                stack.push(conclusion);
            }
            ProofStep::Save => {
                let top = stack.last().ok_or_else(|| {
                    shape_err(label, ProofShapeError::StackUnderflow { needed: 1, available: 0 })
                })?;
                saved.push(top.clone());
            }
            ProofStep::Load(index) => {
                let item = saved.get(index).cloned().ok_or_else(|| {
                    shape_err(
                        label,
                        ProofShapeError::LoadIndexOutOfRange { index, saved_len: saved.len() },
                    )
                })?;
                stack.push(item);
            }
        }
    }

    if stack.len() != 1 || stack[0] != theorem.conclusion {
        return Err(shape_err(label, ProofShapeError::WrongConclusion));
    }

    Ok(())
}

/// Unify `applied`'s mandatory hypotheses against the top `k` stack
/// items, building the substitution. Floating hypotheses reject a
/// type-code mismatch before anything else (spec.md §4.6 "Ordering and
/// tie-breaks").
fn unify(db: &Database, label: &str, applied: &Assertion, items: &[Expression]) -> VerifyResult<Substitution> {
    let mut subst = Substitution::new();
    for (&hyp_id, item) in applied.mandatory_hyps.iter().zip(items.iter()) {
        let hyp = db.hyp(hyp_id);
        match hyp.kind {
            HypKind::Floating { var } => {
                if item.type_code() != hyp.expr.type_code() {
                    return Err(VerifyError::Unification {
                        label: label.to_string(),
                        message: format!(
                            "type-code mismatch unifying `{}`",
                            db.symtab.label_name(hyp.label)
                        ),
                    });
                }
                subst.insert(var, item.as_slice()[1..].to_vec());
            }
            HypKind::Essential => {
                let substituted = Expression::new(subst.apply(hyp.expr.as_slice()));
                if &substituted != item {
                    return Err(VerifyError::Unification {
                        label: label.to_string(),
                        message: format!(
                            "essential hypothesis `{}` does not match the stack item after substitution",
                            db.symtab.label_name(hyp.label)
                        ),
                    });
                }
            }
        }
    }
    Ok(subst)
}

fn shape_err(label: &str, kind: ProofShapeError) -> VerifyError {
    VerifyError::ProofShape { label: label.to_string(), kind }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssertionId, FileId, HypKind as Kind, Hypothesis, Position, Span, Symbol};
    use crate::symtab::LabelBinding;

    fn dummy_span() -> Span {
        Span::new(FileId(0), Position::new(0, 0), Position::new(0, 0))
    }

    fn fixture() -> (Database, AssertionId) {
        let mut db = Database::new();
        let wff = db.symtab.add_constant("wff", dummy_span()).unwrap();
        let p = db.symtab.add_variable("p", dummy_span()).unwrap();
        db.scopes.top_mut().active_vars.insert(p);

        let wp_label = db.symtab.add_label("wp", dummy_span()).unwrap();
        let wp_hyp = db.push_hyp(Hypothesis {
            label: wp_label,
            expr: Expression::new(vec![Symbol::Const(wff), Symbol::Var(p)]),
            kind: Kind::Floating { var: p },
            span: dummy_span(),
        });
        db.symtab.bind_label(wp_label, LabelBinding::Hypothesis(wp_hyp));
        {
            let frame = db.scopes.top_mut();
            frame.active_hyps.push(wp_hyp);
            frame.floating_of.insert(p, wp_hyp);
        }

        let th1_label = db.symtab.add_label("th1", dummy_span()).unwrap();
        let assertion = Assertion {
            label: th1_label,
            span: dummy_span(),
            kind: crate::model::AssertionKind::THEOREM,
            number: 1,
            conclusion: Expression::new(vec![Symbol::Const(wff), Symbol::Var(p)]),
            mandatory_hyps: vec![wp_hyp],
            disjoint: Vec::new(),
            conclusion_revpolish: None,
            hyp_revpolish: Vec::new(),
            proof_steps: None,
            incomplete: false,
        };
        let id = db.push_assertion(assertion);
        db.symtab.bind_label(th1_label, LabelBinding::Assertion(id));
        (db, id)
    }

    #[test]
    fn trivial_proof_reaches_the_conclusion() {
        let (db, id) = fixture();
        let assertion = db.assertion(id).clone();
        let steps = vec![ProofStep::Hyp(assertion.mandatory_hyps[0])];
        assert!(execute(&db, "th1", &steps, &assertion).is_ok());
    }

    #[test]
    fn mismatched_conclusion_is_rejected() {
        let (db, id) = fixture();
        let mut assertion = db.assertion(id).clone();
        assertion.conclusion = Expression::default();
        let steps = vec![ProofStep::Hyp(assertion.mandatory_hyps[0])];
        assert!(execute(&db, "th1", &steps, &assertion).is_err());
    }

    #[test]
    fn save_with_empty_stack_fails() {
        let (db, id) = fixture();
        let assertion = db.assertion(id).clone();
        let steps = vec![ProofStep::Save];
        assert!(execute(&db, "th1", &steps, &assertion).is_err());
    }

    #[test]
    fn load_out_of_range_fails() {
        let (db, id) = fixture();
        let assertion = db.assertion(id).clone();
        let steps = vec![ProofStep::Hyp(assertion.mandatory_hyps[0]), ProofStep::Load(5)];
        assert!(execute(&db, "th1", &steps, &assertion).is_err());
    }

}
