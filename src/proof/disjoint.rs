//! Disjoint-Variable Check (spec.md §4.7), grounded on
//! `original_source/disjvars.cpp`'s two-level `checkdisjvars`,
//! reimplemented without its `remove_copy_if`/`&` idioms.

use crate::database::Database;
use crate::diag::{VerifyError, VerifyResult};
use crate::model::{Assertion, DisjointPair, Substitution, VarId};

/// Check every restriction pair of `applied` against the substitution
/// just built for applying it, requiring each pair of variables also
/// be covered by a restriction of the enclosing `theorem` (the proof
/// currently being verified).
pub fn check(
    db: &Database,
    label: &str,
    theorem: &Assertion,
    applied: &Assertion,
    subst: &Substitution,
) -> VerifyResult<()> {
    for &DisjointPair(x, y) in &applied.disjoint {
        let v1 = vars_of(subst, x);
        let v2 = vars_of(subst, y);

        for &u in &v1 {
            if v2.contains(&u) {
                return Err(violation(db, label, u, u));
            }
        }

        for &u in &v1 {
            for &v in &v2 {
                if !covers(&theorem.disjoint, u, v) {
                    return Err(violation(db, label, u, v));
                }
            }
        }
    }
    Ok(())
}

fn vars_of(subst: &Substitution, var: VarId) -> Vec<VarId> {
    match subst.get(var) {
        Some(symbols) => symbols.iter().filter_map(|s| s.as_var()).collect(),
        None => vec![var],
    }
}

fn covers(pairs: &[DisjointPair], u: VarId, v: VarId) -> bool {
    u != v && pairs.contains(&DisjointPair::new(u, v))
}

fn violation(db: &Database, label: &str, u: VarId, v: VarId) -> VerifyError {
    VerifyError::DisjointVariable {
        label: label.to_string(),
        var1: db.symtab.var_name(u).to_string(),
        var2: db.symtab.var_name(v).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Expression, FileId, Position, Span, Symbol};

    fn dummy_span() -> Span {
        Span::new(FileId(0), Position::new(0, 0), Position::new(0, 0))
    }

    fn dummy_assertion(disjoint: Vec<DisjointPair>) -> Assertion {
        Assertion {
            label: crate::model::LabelId(0),
            span: dummy_span(),
            kind: crate::model::AssertionKind::AXIOM,
            number: 1,
            conclusion: Expression::default(),
            mandatory_hyps: Vec::new(),
            disjoint,
            conclusion_revpolish: None,
            hyp_revpolish: Vec::new(),
            proof_steps: None,
            incomplete: false,
        }
    }

    #[test]
    fn violation_when_substitutions_share_a_variable() {
        let mut db = Database::new();
        let x = db.symtab.add_variable("x", dummy_span()).unwrap();
        let y = db.symtab.add_variable("y", dummy_span()).unwrap();
        let z = db.symtab.add_variable("z", dummy_span()).unwrap();

        let mut subst = Substitution::new();
        subst.insert(x, vec![Symbol::Var(z)]);
        subst.insert(y, vec![Symbol::Var(z)]);

        let applied = dummy_assertion(vec![DisjointPair::new(x, y)]);
        let theorem = dummy_assertion(vec![]);

        assert!(check(&db, "th", &theorem, &applied, &subst).is_err());
    }

    #[test]
    fn ok_when_theorem_covers_the_pair() {
        let mut db = Database::new();
        let x = db.symtab.add_variable("x", dummy_span()).unwrap();
        let y = db.symtab.add_variable("y", dummy_span()).unwrap();
        let u = db.symtab.add_variable("u", dummy_span()).unwrap();
        let v = db.symtab.add_variable("v", dummy_span()).unwrap();

        let mut subst = Substitution::new();
        subst.insert(x, vec![Symbol::Var(u)]);
        subst.insert(y, vec![Symbol::Var(v)]);

        let applied = dummy_assertion(vec![DisjointPair::new(x, y)]);
        let theorem = dummy_assertion(vec![DisjointPair::new(u, v)]);

        assert!(check(&db, "th", &theorem, &applied, &subst).is_ok());
    }

    #[test]
    fn violation_when_theorem_lacks_the_restriction() {
        let mut db = Database::new();
        let x = db.symtab.add_variable("x", dummy_span()).unwrap();
        let y = db.symtab.add_variable("y", dummy_span()).unwrap();
        let u = db.symtab.add_variable("u", dummy_span()).unwrap();
        let v = db.symtab.add_variable("v", dummy_span()).unwrap();

        let mut subst = Substitution::new();
        subst.insert(x, vec![Symbol::Var(u)]);
        subst.insert(y, vec![Symbol::Var(v)]);

        let applied = dummy_assertion(vec![DisjointPair::new(x, y)]);
        let theorem = dummy_assertion(vec![]);

        assert!(check(&db, "th", &theorem, &applied, &subst).is_err());
    }
}
