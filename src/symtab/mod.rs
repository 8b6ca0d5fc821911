//! Symbol table: three disjoint interning spaces for constants,
//! variables and labels (spec.md §4.2).

use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::diag::{VerifyError, VerifyResult};
use crate::model::{ConstId, HypId, LabelId, NameClass, Span, VarId};

/// What a label currently refers to: a hypothesis or an assertion.
///
/// Populated incrementally as the statement reader processes `$f`/`$e`
/// (hypotheses) and `$a`/`$p` (assertions) statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelBinding {
    Hypothesis(HypId),
    Assertion(crate::model::AssertionId),
}

/// Interns constants, variables and labels, enforcing that the three
/// name spaces never overlap (spec.md §4.2, §3 Invariants).
#[derive(Debug, Default)]
pub struct SymbolTable {
    constants: FxHashMap<Rc<str>, ConstId>,
    const_names: Vec<Rc<str>>,

    variables: FxHashMap<Rc<str>, VarId>,
    var_names: Vec<Rc<str>>,

    labels: FxHashMap<Rc<str>, LabelId>,
    label_names: Vec<Rc<str>>,
    label_bindings: Vec<Option<LabelBinding>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn classify(&self, name: &str) -> Option<NameClass> {
        if self.constants.contains_key(name) {
            Some(NameClass::Constant)
        } else if self.variables.contains_key(name) {
            Some(NameClass::Variable)
        } else if self.labels.contains_key(name) {
            Some(NameClass::Label)
        } else {
            None
        }
    }

    pub fn add_constant(&mut self, name: &str, span: Span) -> VerifyResult<ConstId> {
        if let Some(existing) = self.classify(name) {
            return Err(VerifyError::NameReuse {
                span,
                name: name.to_string(),
                existing,
            });
        }
        let rc: Rc<str> = Rc::from(name);
        let id = ConstId(self.const_names.len() as u32);
        self.const_names.push(Rc::clone(&rc));
        self.constants.insert(rc, id);
        Ok(id)
    }

    pub fn add_variable(&mut self, name: &str, span: Span) -> VerifyResult<VarId> {
        if let Some(existing) = self.classify(name) {
            return Err(VerifyError::NameReuse {
                span,
                name: name.to_string(),
                existing,
            });
        }
        let rc: Rc<str> = Rc::from(name);
        // 0 is reserved; ids start at 1 (spec.md §4.2).
        let id = VarId(self.var_names.len() as u32 + 1);
        self.var_names.push(Rc::clone(&rc));
        self.variables.insert(rc, id);
        Ok(id)
    }

    pub fn add_label(&mut self, name: &str, span: Span) -> VerifyResult<LabelId> {
        if let Some(existing) = self.classify(name) {
            return Err(VerifyError::NameReuse {
                span,
                name: name.to_string(),
                existing,
            });
        }
        let rc: Rc<str> = Rc::from(name);
        let id = LabelId(self.label_names.len() as u32);
        self.label_names.push(Rc::clone(&rc));
        self.label_bindings.push(None);
        self.labels.insert(rc, id);
        Ok(id)
    }

    pub fn bind_label(&mut self, id: LabelId, binding: LabelBinding) {
        self.label_bindings[id.index()] = Some(binding);
    }

    pub fn lookup_label(&self, name: &str) -> Option<LabelId> {
        self.labels.get(name).copied()
    }

    pub fn label_binding(&self, id: LabelId) -> Option<LabelBinding> {
        self.label_bindings[id.index()]
    }

    pub fn lookup_constant(&self, name: &str) -> Option<ConstId> {
        self.constants.get(name).copied()
    }

    pub fn lookup_variable(&self, name: &str) -> Option<VarId> {
        self.variables.get(name).copied()
    }

    pub fn const_name(&self, id: ConstId) -> &str {
        &self.const_names[id.index()]
    }

    pub fn var_name(&self, id: VarId) -> &str {
        &self.var_names[id.index() - 1]
    }

    pub fn label_name(&self, id: LabelId) -> &str {
        &self.label_names[id.index()]
    }

    /// Variables in declaration order (spec.md §4.2 "variable-vector").
    pub fn variables_in_order(&self) -> impl Iterator<Item = VarId> + '_ {
        (1..=self.var_names.len() as u32).map(VarId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileId, Position};

    fn dummy_span() -> Span {
        Span::new(FileId(0), Position::new(0, 0), Position::new(0, 0))
    }

    #[test]
    fn rejects_cross_namespace_reuse() {
        let mut table = SymbolTable::new();
        table.add_constant("wff", dummy_span()).unwrap();
        assert!(table.add_variable("wff", dummy_span()).is_err());
        assert!(table.add_label("wff", dummy_span()).is_err());
    }

    #[test]
    fn variable_ids_start_at_one() {
        let mut table = SymbolTable::new();
        let a = table.add_variable("p", dummy_span()).unwrap();
        let b = table.add_variable("q", dummy_span()).unwrap();
        assert_eq!(a, VarId(1));
        assert_eq!(b, VarId(2));
    }

    #[test]
    fn rejects_duplicate_label() {
        let mut table = SymbolTable::new();
        table.add_label("th1", dummy_span()).unwrap();
        assert!(table.add_label("th1", dummy_span()).is_err());
    }
}
