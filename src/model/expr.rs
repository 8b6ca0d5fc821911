//! Expressions: finite ordered sequences of symbols, first element a
//! type-code constant (spec.md §3).

use super::symbol::{ConstId, Symbol, VarId};

/// A finite ordered sequence of symbols whose first element is a
/// type-code constant.
///
/// The empty expression is reserved as a failure sentinel for the
/// syntax parser's internal memo table (spec.md §3) and must never be
/// returned by the statement reader or proof executor as a success value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Expression(pub Vec<Symbol>);

impl Expression {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self(symbols)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn type_code(&self) -> Option<ConstId> {
        match self.0.first() {
            Some(Symbol::Const(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.0
    }

    /// Distinct variables occurring anywhere in the expression, in
    /// first-occurrence order.
    pub fn variables(&self) -> Vec<VarId> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut out = Vec::new();
        for sym in &self.0 {
            if let Symbol::Var(v) = sym {
                if seen.insert(*v) {
                    out.push(*v);
                }
            }
        }
        out
    }
}

impl std::ops::Index<usize> for Expression {
    type Output = Symbol;
    fn index(&self, idx: usize) -> &Symbol {
        &self.0[idx]
    }
}
