//! Substitutions: transient maps from variable to a symbol sequence,
//! allocated once per assertion application (spec.md §3, §5).

use super::symbol::{Symbol, VarId};
use rustc_hash::FxHashMap;

/// A substitution built while unifying an assertion's mandatory
/// hypotheses against the top of the proof-executor's stack.
///
/// Values are stored without their leading type-code symbol (the
/// "tail-of-stack-item" spec.md §4.6 describes for floating hypotheses).
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    map: FxHashMap<VarId, Vec<Symbol>>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: VarId, value: Vec<Symbol>) {
        self.map.insert(var, value);
    }

    pub fn get(&self, var: VarId) -> Option<&[Symbol]> {
        self.map.get(&var).map(Vec::as_slice)
    }

    pub fn contains(&self, var: VarId) -> bool {
        self.map.contains_key(&var)
    }

    /// Apply the substitution to an expression's body (every symbol
    /// after the leading type code is looked up; constants pass through).
    pub fn apply(&self, body: &[Symbol]) -> Vec<Symbol> {
        let mut out = Vec::with_capacity(body.len());
        for sym in body {
            match sym {
                Symbol::Const(_) => out.push(*sym),
                Symbol::Var(v) => match self.get(*v) {
                    Some(value) => out.extend_from_slice(value),
                    None => out.push(*sym),
                },
            }
        }
        out
    }

    /// All variables actually substituted, used by the disjoint-variable check.
    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.map.keys().copied()
    }
}
