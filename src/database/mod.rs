//! The database façade: owns the symbol table, scope stack, and the
//! hypothesis/assertion arenas, and drives the read + verification
//! pipeline (spec.md §2, §5).
//!
//! Grounded on the teacher's `project::workspace_loader::Workspace` —
//! a single owned value the CLI instantiates fresh per invocation,
//! without the teacher's file-watcher/incremental-reload machinery
//! (this crate has no incremental use case; see DESIGN.md).

use crate::comment::CommentInfo;
use crate::defcheck::Definitions;
use crate::diag::{Diagnostic, VerifyError, VerifyResult};
use crate::lexer::{self, Comment, FileLoader};
use crate::model::{Assertion, AssertionId, HypId, Hypothesis, LabelId, ProofStep};
use crate::prop::Propctors;
use crate::scope::ScopeStack;
use crate::symtab::{LabelBinding, SymbolTable};

/// The whole verified state of one Metamath source tree.
///
/// Arena-style and append-only while reading (spec.md §5): no
/// reference to a previously interned symbol or assertion is
/// invalidated by later growth. Re-created from scratch on every call
/// to [`Database::read_file`] so a failed read never leaves partial
/// state visible (spec.md §7).
#[derive(Default)]
pub struct Database {
    pub symtab: SymbolTable,
    pub scopes: ScopeStack,
    hyps: Vec<Hypothesis>,
    assertions: Vec<Assertion>,
    pub comments: Vec<Comment>,
    pub file_names: Vec<String>,
    pub warnings: Vec<Diagnostic>,
    pub comment_info: CommentInfo,
    pub definitions: Option<Definitions>,
    pub propctors: Option<Propctors>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and verify `path` (and its transitive `$[ ... $]` includes)
    /// from scratch, resetting any previous state (spec.md §7).
    pub fn read_file(&mut self, loader: &dyn FileLoader, path: &str) -> VerifyResult<()> {
        *self = Self::new();

        let lex = lexer::tokenize(loader, path)?;
        tracing::debug!(tokens = lex.tokens.len(), files = lex.file_names.len(), "tokenized");
        self.comments = lex.comments;
        self.file_names = lex.file_names;
        self.comment_info = crate::comment::parse_convention_comments(&self.comments);

        let mut reader = crate::reader::Reader::new(self, &lex.tokens);
        reader.read_database()?;
        tracing::debug!(assertions = self.assertions.len(), "statements read");

        crate::syntax::parse_all(self)?;
        self.definitions = Some(crate::defcheck::check_all(self));
        tracing::debug!(
            definitions = self.definitions.as_ref().unwrap().by_syntax_axiom.len(),
            failures = self.definitions.as_ref().unwrap().failures.len(),
            "definitions checked"
        );
        self.propctors = Some(Propctors::build(
            self.definitions.as_ref().expect("just set"),
            self,
        ));
        self.tag_propositional();

        Ok(())
    }

    /// Mark every assertion whose conclusion translates to a propositional
    /// CNF, so callers can tell (spec.md §4.10) which theorems
    /// [`Database::check_propositional`] is meaningful for without
    /// attempting the translation themselves.
    fn tag_propositional(&mut self) {
        let Some(propctors) = self.propctors.take() else { return };
        for i in 0..self.assertions.len() {
            let id = AssertionId(i as u32);
            if crate::prop::assertion_cnf(self, &propctors, self.assertion(id)).is_some() {
                self.assertion_mut(id).kind.set_propositional();
            }
        }
        self.propctors = Some(propctors);
    }

    /// Translate `assertion`'s conclusion and essential hypotheses to CNF
    /// and run the SAT solver on it (spec.md §4.10, §7): satisfiable means
    /// a counter-example exists, so the theorem is *not* propositionally
    /// valid under its own syntax.
    ///
    /// This check is opt-in and separate from [`Database::read_file`]:
    /// only assertions tagged [`crate::model::AssertionKind::is_propositional`]
    /// can be checked, and a non-propositional theorem is not a failure —
    /// it is simply outside what this layer can decide.
    pub fn check_propositional(&self, assertion: AssertionId) -> VerifyResult<()> {
        let ass = self.assertion(assertion);
        let propctors = self.propctors.as_ref().expect("read_file always builds this");
        let cnf = crate::prop::assertion_cnf(self, propctors, ass).ok_or_else(|| {
            VerifyError::Propositional { label: self.symtab.label_name(ass.label).to_string() }
        })?;
        if cnf.is_satisfiable() {
            return Err(VerifyError::Propositional {
                label: self.symtab.label_name(ass.label).to_string(),
            });
        }
        Ok(())
    }

    // -- hypothesis arena -----------------------------------------------

    pub fn push_hyp(&mut self, hyp: Hypothesis) -> HypId {
        let id = HypId(self.hyps.len() as u32);
        self.hyps.push(hyp);
        id
    }

    pub fn hyp(&self, id: HypId) -> &Hypothesis {
        &self.hyps[id.index()]
    }

    pub fn hyp_mut(&mut self, id: HypId) -> &mut Hypothesis {
        &mut self.hyps[id.index()]
    }

    pub fn hyps(&self) -> &[Hypothesis] {
        &self.hyps
    }

    // -- assertion arena --------------------------------------------------

    pub fn push_assertion(&mut self, assertion: Assertion) -> AssertionId {
        let id = AssertionId(self.assertions.len() as u32);
        debug_assert_eq!(assertion.number as usize, self.assertions.len() + 1);
        self.assertions.push(assertion);
        id
    }

    pub fn assertion(&self, id: AssertionId) -> &Assertion {
        &self.assertions[id.index()]
    }

    pub fn assertion_mut(&mut self, id: AssertionId) -> &mut Assertion {
        &mut self.assertions[id.index()]
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    pub fn assertion_count(&self) -> usize {
        self.assertions.len()
    }

    /// Lookup by label, resolved to either a hypothesis or an
    /// assertion, used by the proof executor for regular proofs.
    pub fn resolve_label(&self, label: LabelId) -> Option<LabelBinding> {
        self.symtab.label_binding(label)
    }

    /// The hypothesis bound to `label`, if it is currently active in scope.
    pub fn active_hyp_by_label(&self, label: LabelId) -> Option<HypId> {
        match self.symtab.label_binding(label)? {
            LabelBinding::Hypothesis(h) if self.scopes.is_active_hyp(h) => Some(h),
            _ => None,
        }
    }

    /// Runs a proof-step sequence produced outside the core reader
    /// (spec.md §6's external-collaborator contract) through the same
    /// executor as any stored `$p` proof.
    pub fn verify_external_proof(
        &self,
        assertion: AssertionId,
        steps: &[ProofStep],
    ) -> VerifyResult<()> {
        let label = self.symtab.label_name(self.assertion(assertion).label).to_string();
        crate::proof::executor::execute(self, &label, steps, self.assertion(assertion))
    }
}
