//! Definition Checker (spec.md §4.9): validates that `df-`-prefixed
//! assertions (and any convention-comment-declared definitions) define
//! their syntax soundly, grounded on `original_source/def.cpp`'s
//! `Definition`/`Definitions`.
//!
//! Unlike the core reader and executor, a failed check here is not
//! fatal: it is recorded in [`Definitions::failures`] for the caller to
//! report as a warning, matching `def.cpp`'s `printrule` (prints and
//! continues, never aborts the read).

use rustc_hash::FxHashMap;

use crate::database::Database;
use crate::diag::DefinitionRule;
use crate::model::{Assertion, AssertionId, HypKind, ProofStep, VarId};
use crate::symtab::LabelBinding;

const DF_PREFIX: &str = "df-";

/// A validated definition: the syntax axiom it defines, and the
/// left/right-hand sides of its reverse-Polish conclusion split at the
/// equality constructor (spec.md §4.9).
#[derive(Debug, Clone)]
pub struct Definition {
    pub defining_assertion: AssertionId,
    pub syntax_axiom: AssertionId,
    pub lhs: Vec<ProofStep>,
    pub rhs: Vec<ProofStep>,
}

/// Every recognized definition, keyed by the syntax axiom it defines
/// (spec.md §4.9: "map: label of syntax axiom -> its definition").
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    pub by_syntax_axiom: FxHashMap<AssertionId, Definition>,
    /// Candidates that failed one of the six rules, in the order checked.
    pub failures: Vec<(AssertionId, DefinitionRule)>,
}

impl Definitions {
    pub fn get(&self, syntax_axiom: AssertionId) -> Option<&Definition> {
        self.by_syntax_axiom.get(&syntax_axiom)
    }
}

/// Validate every definition candidate in `db`.
///
/// Candidates are assertions whose label starts with `df-`, plus any
/// explicit `definition 'df' for 'sa'` convention comment (spec.md §6,
/// `original_source/def.cpp`'s `Definitions::Definitions` "adjust
/// definitions" pass) — a `primitive` declaration for a syntax axiom is
/// never a candidate.
pub fn check_all(db: &Database) -> Definitions {
    let mut out = Definitions::default();

    let mut candidates: Vec<AssertionId> = Vec::new();
    for (i, ass) in db.assertions().iter().enumerate() {
        if db.symtab.label_name(ass.label).starts_with(DF_PREFIX) {
            candidates.push(AssertionId(i as u32));
        }
    }
    for defn_label in db.comment_info.ctor_defns.values().flatten() {
        if let Some(id) = db
            .symtab
            .lookup_label(defn_label)
            .and_then(|l| assertion_for_label(db, l))
        {
            if !candidates.contains(&id) {
                candidates.push(id);
            }
        }
    }

    for id in candidates {
        match check_one(db, id) {
            Ok(def) => {
                out.by_syntax_axiom.insert(def.syntax_axiom, def);
            }
            Err(rule) => out.failures.push((id, rule)),
        }
    }

    out
}

fn assertion_for_label(db: &Database, label: crate::model::LabelId) -> Option<AssertionId> {
    match db.symtab.label_binding(label)? {
        LabelBinding::Assertion(a) => Some(a),
        LabelBinding::Hypothesis(_) => None,
    }
}

/// Validate one candidate assertion against all six rules, short-circuiting
/// at the first failure.
pub fn check_one(db: &Database, defining_assertion: AssertionId) -> Result<Definition, DefinitionRule> {
    let ass = db.assertion(defining_assertion);

    if has_essential_hypothesis(db, ass) {
        return Err(DefinitionRule::TooManyHypotheses);
    }
    if !is_equality_root(db, ass) {
        return Err(DefinitionRule::NotEquality);
    }
    let (lhs, rhs, syntax_axiom) = split_lhs_rhs(ass).ok_or(DefinitionRule::DoesNotParse)?;
    if rhs.contains(&ProofStep::Assertion(syntax_axiom)) {
        return Err(DefinitionRule::Circular);
    }
    if !check_disjoint_variables(db, ass, &lhs) {
        return Err(DefinitionRule::BadDisjointVariables);
    }
    if !check_dummy_bound(db, ass, &lhs) {
        return Err(DefinitionRule::DummyNotBound);
    }

    Ok(Definition {
        defining_assertion,
        syntax_axiom,
        lhs,
        rhs,
    })
}

/// Rule 1: a definition's essential hypotheses would let it smuggle
/// unproven facts past its own equality shape, so none are allowed.
fn has_essential_hypothesis(db: &Database, ass: &Assertion) -> bool {
    ass.mandatory_hyps
        .iter()
        .any(|&h| matches!(db.hyp(h).kind, HypKind::Essential))
}

/// Rule 2: the conclusion's root constructor must be a binary,
/// same-sorted predicate — the practical stand-in this crate uses for
/// "is a recognized equality/biconditional constructor" in the absence
/// of a ported reflexivity/symmetry/transitivity check (see DESIGN.md).
fn is_equality_root(db: &Database, ass: &Assertion) -> bool {
    let Some(tree) = ass.conclusion_revpolish.as_ref() else {
        return false;
    };
    let Some(&ProofStep::Assertion(root)) = tree.steps.last() else {
        return false;
    };
    let root_ass = db.assertion(root);
    if root_ass.hyp_count() != 2 {
        return false;
    }
    let types: Vec<_> = root_ass
        .mandatory_hyps
        .iter()
        .filter_map(|&h| db.hyp(h).expr.type_code())
        .collect();
    types.len() == 2 && types[0] == types[1]
}

/// Rule 3: split the conclusion's reverse-Polish form into
/// `lhs = sa v1 ... vn` (the syntax being defined, applied to distinct
/// variable leaves) and `rhs` (everything else before the final
/// equality step), grounded on `def.cpp`'s `Definition::Definition(rass)`.
fn split_lhs_rhs(ass: &Assertion) -> Option<(Vec<ProofStep>, Vec<ProofStep>, AssertionId)> {
    let tree = ass.conclusion_revpolish.as_ref()?;
    if tree.steps.is_empty() {
        return None;
    }
    let root_idx = tree.steps.len() - 1;
    let root_children = &tree.parents[root_idx];
    if root_children.len() != 2 {
        return None;
    }
    let lhs_end = root_children[0];
    let lhs_len = lhs_end + 1;
    let lhs_children = &tree.parents[lhs_end];
    if lhs_children.len() != lhs_end {
        return None;
    }
    if !lhs_children.iter().enumerate().all(|(i, &p)| p == i) {
        return None;
    }
    let syntax_axiom = match tree.steps[lhs_end] {
        ProofStep::Assertion(a) => a,
        _ => return None,
    };
    let lhs = tree.steps[..lhs_len].to_vec();
    let rhs = tree.steps[lhs_len..root_idx].to_vec();
    Some((lhs, rhs, syntax_axiom))
}

fn floating_vars(db: &Database, ass: &Assertion) -> Vec<VarId> {
    ass.mandatory_hyps
        .iter()
        .filter_map(|&h| db.hyp(h).floating_var())
        .collect()
}

fn floating_hyp_of(db: &Database, ass: &Assertion, var: VarId) -> crate::model::HypId {
    ass.mandatory_hyps
        .iter()
        .copied()
        .find(|&h| db.hyp(h).floating_var() == Some(var))
        .expect("every variable used by an assertion has a mandatory floating hypothesis")
}

fn is_dummy(db: &Database, ass: &Assertion, lhs: &[ProofStep], var: VarId) -> bool {
    let hyp_id = floating_hyp_of(db, ass, var);
    !lhs.contains(&ProofStep::Hyp(hyp_id))
}

/// Rule 5: a disjoint-variable restriction between two variables is
/// required exactly when at least one of them is dummy (doesn't occur
/// on the LHS), matching `def.cpp`'s `Definition::checkdv`.
fn check_disjoint_variables(db: &Database, ass: &Assertion, lhs: &[ProofStep]) -> bool {
    let vars = floating_vars(db, ass);
    for i in 0..vars.len() {
        for j in (i + 1)..vars.len() {
            let (v1, v2) = (vars[i], vars[j]);
            let required = is_dummy(db, ass, lhs, v1) || is_dummy(db, ass, lhs, v2);
            let actual = ass.disjoint.contains(&crate::model::DisjointPair::new(v1, v2));
            if required != actual {
                return false;
            }
        }
    }
    true
}

/// Rule 6: every dummy variable's type code must be declared `bound`
/// by a convention comment, matching `def.cpp`'s `checkdummyvar`.
fn check_dummy_bound(db: &Database, ass: &Assertion, lhs: &[ProofStep]) -> bool {
    for var in floating_vars(db, ass) {
        if is_dummy(db, ass, lhs, var) {
            let hyp_id = floating_hyp_of(db, ass, var);
            let Some(type_code) = db.hyp(hyp_id).expr.type_code() else {
                return false;
            };
            let type_name = db.symtab.const_name(type_code);
            if !db.comment_info.is_bound(type_name) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{self, MemoryFileLoader};
    use crate::reader::Reader;

    fn read(source: &str) -> Database {
        let loader = MemoryFileLoader::new().with_file("root.mm", source);
        let lex = lexer::tokenize(&loader, "root.mm").unwrap();
        let mut db = Database::new();
        Reader::new(&mut db, &lex.tokens).read_database().unwrap();
        crate::syntax::parse_all(&mut db).unwrap();
        db
    }

    /// `wn -. p` (unary) is defined as `wb ( q <-> q )`, so `q` is a
    /// dummy variable: present on the RHS, absent from the LHS.
    #[test]
    fn accepts_well_formed_definition() {
        let mut db = read(
            "$c wff -. <-> $. $v p q $. \
             wp $f wff p $. wq $f wff q $. \
             wn $a wff -. p $. \
             wb $a wff ( p <-> q ) $. \
             $d p q $. \
             df-xx $a wff ( -. p <-> ( q <-> q ) ) $.",
        );
        db.comment_info
            .type_codes
            .entry("wff".to_string())
            .or_default()
            .bound = true;

        let defs = check_all(&db);
        assert!(defs.failures.is_empty(), "unexpected failures: {:?}", defs.failures);
        assert_eq!(
            defs.by_syntax_axiom.get(&crate::model::AssertionId(0)).map(|d| d.defining_assertion),
            Some(crate::model::AssertionId(2)),
        );
    }

    #[test]
    fn rejects_definition_with_essential_hypothesis() {
        let db = read(
            "$c wff -. <-> $. $v p q $. \
             wp $f wff p $. wq $f wff q $. \
             wn $a wff -. p $. \
             wb $a wff ( p <-> q ) $. \
             $d p q $. \
             ${ eh.1 $e wff p $. \
                df-bad $a wff ( -. p <-> ( q <-> q ) ) $. \
             $}",
        );
        let defs = check_all(&db);
        assert!(defs
            .failures
            .iter()
            .any(|(_, rule)| *rule == DefinitionRule::TooManyHypotheses));
    }

    #[test]
    fn non_df_assertions_are_not_candidates() {
        let db = read("$c wff $. $v p $. wp $f wff p $. th1 $a wff p $.");
        let defs = check_all(&db);
        assert!(defs.failures.is_empty());
        assert!(defs.by_syntax_axiom.is_empty());
    }
}
