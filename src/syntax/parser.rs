//! The reverse-Polish matcher itself: memoized recursive backtracking
//! over syntax axioms, grounded on `original_source/syntaxiom.cpp`'s
//! `Syntaxioms::rPolish`.

use rustc_hash::FxHashMap;

use crate::database::Database;
use crate::diag::{VerifyError, VerifyResult};
use crate::model::{AssertionId, ConstId, DisjointPair, Expression, ProofStep, Span, Symbol, VarId};

use super::index::{axiom_floating_hyp, resolve_primitive_type, SyntaxIndex};

/// One parse attempt for a single (type code, position) pair, memoized
/// so overlapping sub-expressions aren't re-derived (spec.md §4.8:
/// "memoized by (type code, position)").
pub(super) struct Parser<'a> {
    db: &'a Database,
    index: &'a SyntaxIndex,
    /// The assertion whose expression is being parsed: direct variable
    /// productions resolve against *its* mandatory floating hypotheses.
    owner: AssertionId,
    memo: FxHashMap<(ConstId, usize), Vec<(usize, Vec<ProofStep>)>>,
}

impl<'a> Parser<'a> {
    pub fn new(db: &'a Database, index: &'a SyntaxIndex, owner: AssertionId) -> Self {
        Self {
            db,
            index,
            owner,
            memo: FxHashMap::default(),
        }
    }

    /// Every way to parse a `type_code`-typed subexpression starting at
    /// `body[pos]`, as (end position, flattened revpolish steps) pairs.
    ///
    /// `type_code` is resolved through any `syntax '…' as '…'` alias
    /// before matching (spec.md §4.8, §6.2): a non-primitive type code
    /// like `|-` never has syntax axioms of its own, so parsing it
    /// means parsing its aliased target instead.
    pub fn parse(
        &mut self,
        type_code: ConstId,
        body: &[Symbol],
        pos: usize,
    ) -> Vec<(usize, Vec<ProofStep>)> {
        let type_code = resolve_primitive_type(self.db, type_code);
        if let Some(cached) = self.memo.get(&(type_code, pos)) {
            return cached.clone();
        }
        // Metamath syntax axioms are never left-recursive (a variable
        // slot always strictly advances position before recursing), so
        // this placeholder is never actually observed re-entrantly.
        self.memo.insert((type_code, pos), Vec::new());

        let mut results = Vec::new();

        if let Some(&Symbol::Var(v)) = body.get(pos) {
            if let Some(hyp_id) = axiom_floating_hyp(self.db, self.owner, v) {
                if let Some(var_type) = self.db.hyp(hyp_id).expr.type_code() {
                    if resolve_primitive_type(self.db, var_type) == type_code {
                        results.push((pos + 1, vec![ProofStep::Hyp(hyp_id)]));
                    }
                }
            }
        }

        let candidates = self
            .index
            .axioms_by_type
            .get(&type_code)
            .cloned()
            .unwrap_or_default();
        for axiom_id in candidates {
            let pattern: Vec<Symbol> = self.db.assertion(axiom_id).conclusion.as_slice()[1..].to_vec();
            results.extend(self.match_axiom_from(axiom_id, &pattern, 0, body, pos, &[], &[]));
        }

        self.memo.insert((type_code, pos), results.clone());
        results
    }

    fn match_axiom_from(
        &mut self,
        axiom_id: AssertionId,
        pattern: &[Symbol],
        idx: usize,
        body: &[Symbol],
        cur: usize,
        steps_so_far: &[ProofStep],
        var_ranges: &[(VarId, usize, usize)],
    ) -> Vec<(usize, Vec<ProofStep>)> {
        if idx == pattern.len() {
            if !self.disjoint_restrictions_hold(axiom_id, body, var_ranges) {
                return Vec::new();
            }
            let mut steps = steps_so_far.to_vec();
            steps.push(ProofStep::Assertion(axiom_id));
            return vec![(cur, steps)];
        }
        match pattern[idx] {
            Symbol::Const(c) => {
                if body.get(cur) == Some(&Symbol::Const(c)) {
                    self.match_axiom_from(axiom_id, pattern, idx + 1, body, cur + 1, steps_so_far, var_ranges)
                } else {
                    Vec::new()
                }
            }
            Symbol::Var(v) => {
                let Some(hyp_id) = axiom_floating_hyp(self.db, axiom_id, v) else {
                    return Vec::new();
                };
                let Some(slot_type) = self.db.hyp(hyp_id).expr.type_code() else {
                    return Vec::new();
                };
                let mut out = Vec::new();
                for (end, sub_steps) in self.parse(slot_type, body, cur) {
                    let mut combined = steps_so_far.to_vec();
                    combined.extend(sub_steps);
                    let mut ranges = var_ranges.to_vec();
                    ranges.push((v, cur, end));
                    out.extend(self.match_axiom_from(axiom_id, pattern, idx + 1, body, end, &combined, &ranges));
                }
                out
            }
        }
    }

    /// Check a completed match's substitutions against `axiom_id`'s own
    /// `$d` restrictions (spec.md §4.8): every variable actually
    /// substituted for one disjoint-restricted pattern variable must be
    /// disjoint, under the owner's own disjoint set, from every variable
    /// substituted for the other.
    fn disjoint_restrictions_hold(
        &self,
        axiom_id: AssertionId,
        body: &[Symbol],
        var_ranges: &[(VarId, usize, usize)],
    ) -> bool {
        let axiom = self.db.assertion(axiom_id);
        if axiom.disjoint.is_empty() {
            return true;
        }
        let owner_disjoint = &self.db.assertion(self.owner).disjoint;
        let vars_in = |v: VarId| -> Vec<VarId> {
            var_ranges
                .iter()
                .filter(|&&(pv, _, _)| pv == v)
                .flat_map(|&(_, start, end)| {
                    body[start..end].iter().filter_map(|s| match s {
                        Symbol::Var(x) => Some(*x),
                        _ => None,
                    })
                })
                .collect()
        };
        for pair in &axiom.disjoint {
            let vars1 = vars_in(pair.0);
            let vars2 = vars_in(pair.1);
            for &a in &vars1 {
                for &b in &vars2 {
                    if a != b && !owner_disjoint.contains(&DisjointPair::new(a, b)) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Rebuild the expression a flattened revpolish sequence derives, used
/// by the testable-property suite to check round-tripping (spec.md §8).
pub fn reconstruct(db: &Database, span: Span, steps: &[ProofStep]) -> VerifyResult<Expression> {
    let mut stack: Vec<Expression> = Vec::new();
    for step in steps {
        match step {
            ProofStep::Hyp(h) => stack.push(db.hyp(*h).expr.clone()),
            ProofStep::Assertion(a) => {
                let ass = db.assertion(*a);
                let n = ass.hyp_count();
                if stack.len() < n {
                    return Err(VerifyError::Syntax {
                        span,
                        message: "stack underflow reconstructing syntax tree".into(),
                    });
                }
                let operands: Vec<Expression> = stack.split_off(stack.len() - n);
                let mut subst = crate::model::Substitution::new();
                for (&hyp_id, operand) in ass.mandatory_hyps.iter().zip(operands) {
                    if let Some(var) = db.hyp(hyp_id).floating_var() {
                        subst.insert(var, operand.as_slice()[1..].to_vec());
                    }
                }
                let type_code = ass.conclusion.type_code().ok_or_else(|| VerifyError::Syntax {
                    span,
                    message: "assertion conclusion has no type code".into(),
                })?;
                let mut body = vec![Symbol::Const(type_code)];
                body.extend(subst.apply(&ass.conclusion.as_slice()[1..]));
                stack.push(Expression::new(body));
            }
            ProofStep::Load(_) | ProofStep::Save => {
                return Err(VerifyError::Syntax {
                    span,
                    message: "load/save step found in a syntax tree".into(),
                });
            }
        }
    }
    stack.pop().ok_or_else(|| VerifyError::Syntax {
        span,
        message: "empty syntax tree".into(),
    })
}
