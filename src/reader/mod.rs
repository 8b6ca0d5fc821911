//! Statement Reader (spec.md §4.4): consumes the token stream produced
//! by the lexer, driving the symbol table and scope stack through each
//! top-level `$`-statement.
//!
//! One private method per construct, following the teacher's
//! `parser::grammar::kerml::*` one-function-per-construct convention
//! (`definitions.rs`, `usages.rs`, ...).

pub mod assertion_builder;

use rustc_hash::FxHashSet;

use crate::database::Database;
use crate::diag::{Diagnostic, ProofShapeError, VerifyError, VerifyResult};
use crate::lexer::Token;
use crate::model::{
    Assertion, AssertionKind, Expression, HypKind, Hypothesis, ProofStep, Span, Symbol,
};
use crate::symtab::LabelBinding;

pub struct Reader<'d> {
    db: &'d mut Database,
    tokens: &'d [Token],
    pos: usize,
}

impl<'d> Reader<'d> {
    pub fn new(db: &'d mut Database, tokens: &'d [Token]) -> Self {
        Self { db, tokens, pos: 0 }
    }

    /// Consume the whole token stream as a sequence of top-level
    /// statements and scope brackets.
    pub fn read_database(&mut self) -> VerifyResult<()> {
        while let Some(tok) = self.peek() {
            match tok.as_str() {
                "${" => {
                    self.bump();
                    self.db.scopes.push();
                }
                "$}" => {
                    self.bump();
                    if self.db.scopes.pop().is_none() {
                        return Err(VerifyError::Scope {
                            span: tok.span,
                            message: "unmatched `$}`".into(),
                        });
                    }
                }
                "$c" => self.read_c()?,
                "$v" => self.read_v()?,
                "$d" => self.read_d()?,
                _ => {
                    let label_tok = self.bump().expect("peeked");
                    self.validate_label_token(&label_tok)?;
                    let keyword = self.peek().ok_or_else(|| VerifyError::Syntax {
                        span: label_tok.span,
                        message: "expected a statement keyword after label".into(),
                    })?;
                    match keyword.as_str() {
                        "$f" => {
                            self.bump();
                            self.read_f(&label_tok)?;
                        }
                        "$e" => {
                            self.bump();
                            self.read_e(&label_tok)?;
                        }
                        "$a" => {
                            self.bump();
                            self.read_a(&label_tok)?;
                        }
                        "$p" => {
                            self.bump();
                            self.read_p(&label_tok)?;
                        }
                        other => {
                            return Err(VerifyError::Syntax {
                                span: keyword.span,
                                message: format!("unexpected token `{other}` after label"),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // -- cursor helpers ---------------------------------------------------

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).cloned()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eof_err(&self) -> VerifyError {
        let span = self
            .tokens
            .last()
            .map(|t| t.span)
            .unwrap_or_else(|| Span::new(crate::model::FileId(0), Default::default(), Default::default()));
        VerifyError::Syntax {
            span,
            message: "unexpected end of input".into(),
        }
    }

    fn expect_token(&mut self, context: &str) -> VerifyResult<Token> {
        self.bump()
            .ok_or_else(|| VerifyError::Syntax {
                span: self.eof_span(),
                message: format!("unexpected end of input in {context}"),
            })
    }

    fn eof_span(&self) -> Span {
        self.tokens
            .last()
            .map(|t| t.span)
            .unwrap_or_else(|| Span::new(crate::model::FileId(0), Default::default(), Default::default()))
    }

    fn validate_label_token(&self, tok: &Token) -> VerifyResult<()> {
        let ok = !tok.as_str().is_empty()
            && tok
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if ok {
            Ok(())
        } else {
            Err(VerifyError::Syntax {
                span: tok.span,
                message: format!("`{}` is not a valid label", tok.as_str()),
            })
        }
    }

    // -- $c / $v / $d ------------------------------------------------------

    fn read_c(&mut self) -> VerifyResult<()> {
        let start = self.expect_token("$c statement")?;
        if !self.db.scopes.is_global() {
            return Err(VerifyError::Scope {
                span: start.span,
                message: "`$c` is only valid in the outermost scope".into(),
            });
        }
        let mut count = 0;
        let mut tok = start;
        loop {
            if tok.as_str() == "$." {
                break;
            }
            if tok.as_str().contains('$') {
                return Err(VerifyError::Syntax {
                    span: tok.span,
                    message: format!("`{}` is not a valid constant name", tok.as_str()),
                });
            }
            self.db.symtab.add_constant(tok.as_str(), tok.span)?;
            count += 1;
            tok = self.expect_token("$c statement")?;
        }
        if count == 0 {
            return Err(VerifyError::Syntax {
                span: tok.span,
                message: "`$c` statement declares no constants".into(),
            });
        }
        Ok(())
    }

    fn read_v(&mut self) -> VerifyResult<()> {
        let start = self.expect_token("$v statement")?;
        let mut count = 0;
        let mut tok = start;
        loop {
            if tok.as_str() == "$." {
                break;
            }
            if tok.as_str().contains('$') {
                return Err(VerifyError::Syntax {
                    span: tok.span,
                    message: format!("`{}` is not a valid variable name", tok.as_str()),
                });
            }
            let var = self.db.symtab.add_variable(tok.as_str(), tok.span)?;
            self.db.scopes.top_mut().active_vars.insert(var);
            count += 1;
            tok = self.expect_token("$v statement")?;
        }
        if count == 0 {
            return Err(VerifyError::Syntax {
                span: tok.span,
                message: "`$v` statement declares no variables".into(),
            });
        }
        Ok(())
    }

    fn read_d(&mut self) -> VerifyResult<()> {
        let mut vars = Vec::new();
        let mut tok = self.expect_token("$d statement")?;
        loop {
            if tok.as_str() == "$." {
                break;
            }
            let var = self
                .db
                .symtab
                .lookup_variable(tok.as_str())
                .filter(|&v| self.db.scopes.is_active_variable(v))
                .ok_or_else(|| VerifyError::Scope {
                    span: tok.span,
                    message: format!("`{}` is not an active variable", tok.as_str()),
                })?;
            if vars.contains(&var) {
                return Err(VerifyError::Syntax {
                    span: tok.span,
                    message: format!("variable `{}` repeated in `$d` statement", tok.as_str()),
                });
            }
            vars.push(var);
            tok = self.expect_token("$d statement")?;
        }
        if vars.len() < 2 {
            return Err(VerifyError::Syntax {
                span: tok.span,
                message: "`$d` statement needs at least two distinct variables".into(),
            });
        }
        self.db.scopes.top_mut().disjoint_sets.push(vars);
        Ok(())
    }

    // -- expression parsing (shared by $e / $a / $p) -----------------------

    /// Collect tokens up to and including `terminator`, resolving each
    /// to a `Symbol` per spec.md §4.4 ("each token is either a constant
    /// or a variable carrying an active floating hypothesis; the first
    /// must be a constant").
    fn parse_expression(&mut self, terminator: &str) -> VerifyResult<Expression> {
        let mut symbols = Vec::new();
        let mut first = true;
        loop {
            let tok = self.peek().ok_or_else(|| self.eof_err())?;
            if tok.as_str() == terminator {
                self.bump();
                break;
            }
            self.bump();
            symbols.push(self.resolve_expr_symbol(&tok, first)?);
            first = false;
        }
        if symbols.is_empty() {
            return Err(VerifyError::Syntax {
                span: self.eof_span(),
                message: "expression must not be empty".into(),
            });
        }
        Ok(Expression::new(symbols))
    }

    fn resolve_expr_symbol(&self, tok: &Token, must_be_const: bool) -> VerifyResult<Symbol> {
        if let Some(c) = self.db.symtab.lookup_constant(tok.as_str()) {
            return Ok(Symbol::Const(c));
        }
        if let Some(v) = self.db.symtab.lookup_variable(tok.as_str()) {
            if must_be_const {
                return Err(VerifyError::Syntax {
                    span: tok.span,
                    message: format!(
                        "expression must begin with a constant type code, found variable `{}`",
                        tok.as_str()
                    ),
                });
            }
            if self.db.scopes.active_floating_hyp_for_variable(v).is_none() {
                return Err(VerifyError::Scope {
                    span: tok.span,
                    message: format!("variable `{}` has no active floating hypothesis", tok.as_str()),
                });
            }
            return Ok(Symbol::Var(v));
        }
        Err(VerifyError::Syntax {
            span: tok.span,
            message: format!("unknown symbol `{}`", tok.as_str()),
        })
    }

    // -- $f / $e -----------------------------------------------------------

    fn read_f(&mut self, label_tok: &Token) -> VerifyResult<()> {
        let type_tok = self.expect_token("$f statement")?;
        let var_tok = self.expect_token("$f statement")?;
        let terminator = self.expect_token("$f statement")?;
        if terminator.as_str() != "$." {
            return Err(VerifyError::Syntax {
                span: terminator.span,
                message: "`$f` statement takes exactly a type code and a variable".into(),
            });
        }

        let type_id = self.db.symtab.lookup_constant(type_tok.as_str()).ok_or_else(|| {
            VerifyError::Syntax {
                span: type_tok.span,
                message: format!("`{}` is not a declared constant", type_tok.as_str()),
            }
        })?;
        let var_id = self.db.symtab.lookup_variable(var_tok.as_str()).ok_or_else(|| {
            VerifyError::Syntax {
                span: var_tok.span,
                message: format!("`{}` is not a declared variable", var_tok.as_str()),
            }
        })?;
        if !self.db.scopes.is_active_variable(var_id) {
            return Err(VerifyError::Scope {
                span: var_tok.span,
                message: format!("variable `{}` is not active", var_tok.as_str()),
            });
        }
        if self.db.scopes.active_floating_hyp_for_variable(var_id).is_some() {
            return Err(VerifyError::Scope {
                span: var_tok.span,
                message: format!(
                    "variable `{}` already has an active floating hypothesis",
                    var_tok.as_str()
                ),
            });
        }

        let label_id = self.db.symtab.add_label(label_tok.as_str(), label_tok.span)?;
        let hyp = Hypothesis {
            label: label_id,
            expr: Expression::new(vec![Symbol::Const(type_id), Symbol::Var(var_id)]),
            kind: HypKind::Floating { var: var_id },
            span: label_tok.span,
        };
        let hyp_id = self.db.push_hyp(hyp);
        self.db.symtab.bind_label(label_id, LabelBinding::Hypothesis(hyp_id));
        let frame = self.db.scopes.top_mut();
        frame.active_hyps.push(hyp_id);
        frame.floating_of.insert(var_id, hyp_id);
        frame.hyp_labels.insert(var_id, label_id);
        Ok(())
    }

    fn read_e(&mut self, label_tok: &Token) -> VerifyResult<()> {
        let expr = self.parse_expression("$.")?;
        let label_id = self.db.symtab.add_label(label_tok.as_str(), label_tok.span)?;
        let hyp = Hypothesis {
            label: label_id,
            expr,
            kind: HypKind::Essential,
            span: label_tok.span,
        };
        let hyp_id = self.db.push_hyp(hyp);
        self.db.symtab.bind_label(label_id, LabelBinding::Hypothesis(hyp_id));
        self.db.scopes.top_mut().active_hyps.push(hyp_id);
        Ok(())
    }

    // -- $a / $p -------------------------------------------------------------

    fn read_a(&mut self, label_tok: &Token) -> VerifyResult<()> {
        let conclusion = self.parse_expression("$.")?;
        let label_id = self.db.symtab.add_label(label_tok.as_str(), label_tok.span)?;
        let assertion = assertion_builder::build_assertion(
            self.db,
            label_id,
            label_tok.span,
            conclusion,
            AssertionKind::AXIOM,
        );
        let id = self.db.push_assertion(assertion);
        self.db.symtab.bind_label(label_id, LabelBinding::Assertion(id));
        Ok(())
    }

    fn read_p(&mut self, label_tok: &Token) -> VerifyResult<()> {
        let conclusion = self.parse_expression("$=")?;
        let label_id = self.db.symtab.add_label(label_tok.as_str(), label_tok.span)?;
        let mut assertion = assertion_builder::build_assertion(
            self.db,
            label_id,
            label_tok.span,
            conclusion,
            AssertionKind::THEOREM,
        );

        let first = self.peek().ok_or_else(|| self.eof_err())?;
        let (steps, incomplete) = if first.as_str() == "(" {
            self.bump();
            self.read_compressed_proof(label_tok, &assertion)?
        } else {
            self.read_regular_proof(label_tok)?
        };

        if incomplete {
            self.db.warnings.push(Diagnostic::warning(
                label_tok.as_str().to_string(),
                label_tok.span,
                "incomplete proof (contains `?`)",
            ));
        } else {
            crate::proof::executor::execute(self.db, label_tok.as_str(), &steps, &assertion)?;
        }

        assertion.proof_steps = Some(steps);
        assertion.incomplete = incomplete;

        let id = self.db.push_assertion(assertion);
        self.db.symtab.bind_label(label_id, LabelBinding::Assertion(id));
        Ok(())
    }

    fn read_regular_proof(&mut self, label_tok: &Token) -> VerifyResult<(Vec<ProofStep>, bool)> {
        let mut steps = Vec::new();
        let mut incomplete = false;
        loop {
            let tok = self.peek().ok_or_else(|| self.eof_err())?;
            if tok.as_str() == "$." {
                self.bump();
                break;
            }
            self.bump();
            if tok.as_str() == "?" {
                incomplete = true;
                continue;
            }
            if tok.as_str() == label_tok.as_str() {
                return Err(self.shape_err(label_tok, ProofShapeError::SelfReference));
            }
            let label_id = self.db.symtab.lookup_label(tok.as_str()).ok_or_else(|| {
                self.shape_err(
                    label_tok,
                    ProofShapeError::UnknownLabel { label: tok.as_str().to_string() },
                )
            })?;
            match self.db.symtab.label_binding(label_id) {
                Some(LabelBinding::Hypothesis(h)) if self.db.scopes.is_active_hyp(h) => {
                    steps.push(ProofStep::Hyp(h));
                }
                Some(LabelBinding::Assertion(a)) => steps.push(ProofStep::Assertion(a)),
                _ => {
                    return Err(self.shape_err(
                        label_tok,
                        ProofShapeError::UnknownLabel { label: tok.as_str().to_string() },
                    ));
                }
            }
        }
        if steps.is_empty() && !incomplete {
            return Err(self.shape_err(label_tok, ProofShapeError::EmptyProof));
        }
        Ok((steps, incomplete))
    }

    fn read_compressed_proof(
        &mut self,
        label_tok: &Token,
        assertion: &Assertion,
    ) -> VerifyResult<(Vec<ProofStep>, bool)> {
        let mut labels: Vec<ProofStep> = assertion.mandatory_hyps.iter().copied().map(ProofStep::Hyp).collect();
        let mandatory_set: FxHashSet<_> = assertion.mandatory_hyps.iter().copied().collect();

        loop {
            let tok = self.peek().ok_or_else(|| self.eof_err())?;
            if tok.as_str() == ")" {
                self.bump();
                break;
            }
            self.bump();
            if tok.as_str() == label_tok.as_str() {
                return Err(self.shape_err(label_tok, ProofShapeError::SelfReference));
            }
            let label_id = self.db.symtab.lookup_label(tok.as_str()).ok_or_else(|| {
                self.shape_err(
                    label_tok,
                    ProofShapeError::UnknownLabel { label: tok.as_str().to_string() },
                )
            })?;
            match self.db.symtab.label_binding(label_id) {
                Some(LabelBinding::Hypothesis(h)) => {
                    if mandatory_set.contains(&h) {
                        return Err(self.shape_err(
                            label_tok,
                            ProofShapeError::PrefixContainsMandatory { label: tok.as_str().to_string() },
                        ));
                    }
                    if !self.db.scopes.is_active_hyp(h) {
                        return Err(self.shape_err(
                            label_tok,
                            ProofShapeError::UnknownLabel { label: tok.as_str().to_string() },
                        ));
                    }
                    labels.push(ProofStep::Hyp(h));
                }
                Some(LabelBinding::Assertion(a)) => labels.push(ProofStep::Assertion(a)),
                None => {
                    return Err(self.shape_err(
                        label_tok,
                        ProofShapeError::UnknownLabel { label: tok.as_str().to_string() },
                    ));
                }
            }
        }

        let mut letters = String::new();
        loop {
            let tok = self.peek().ok_or_else(|| self.eof_err())?;
            if tok.as_str() == "$." {
                self.bump();
                break;
            }
            self.bump();
            letters.push_str(tok.as_str());
        }

        if letters.contains('?') {
            return Ok((Vec::new(), true));
        }
        if letters.is_empty() {
            return Err(self.shape_err(label_tok, ProofShapeError::EmptyProof));
        }

        let numbers = crate::proof::compressed::decode(&letters, label_tok.as_str())?;
        let label_count = labels.len();
        let mut steps = Vec::with_capacity(numbers.len());
        for n in numbers {
            let n = n as usize;
            let step = if n == 0 {
                ProofStep::Save
            } else if n <= label_count {
                labels[n - 1]
            } else {
                ProofStep::Load(n - label_count - 1)
            };
            steps.push(step);
        }
        Ok((steps, false))
    }

    fn shape_err(&self, label_tok: &Token, kind: ProofShapeError) -> VerifyError {
        VerifyError::ProofShape {
            label: label_tok.as_str().to_string(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{self, MemoryFileLoader};

    fn read(source: &str) -> VerifyResult<Database> {
        let loader = MemoryFileLoader::new().with_file("root.mm", source);
        let lex = lexer::tokenize(&loader, "root.mm")?;
        let mut db = Database::new();
        Reader::new(&mut db, &lex.tokens).read_database()?;
        Ok(db)
    }

    #[test]
    fn minimal_file_reads_successfully() {
        let db = read("$c wff $. $v p $. wp $f wff p $.").unwrap();
        assert_eq!(db.hyps().len(), 1);
        assert!(db.hyps()[0].is_floating());
    }

    #[test]
    fn axiom_gets_one_mandatory_hypothesis() {
        let db = read("$c wff $. $v p $. wp $f wff p $. ax1 $a wff p $.").unwrap();
        assert_eq!(db.assertion_count(), 1);
        let ax1 = db.assertion(crate::model::AssertionId(0));
        assert!(ax1.kind.is_axiom());
        assert_eq!(ax1.mandatory_hyps.len(), 1);
    }

    #[test]
    fn trivial_theorem_verifies() {
        let db = read(
            "$c wff $. $v p $. wp $f wff p $. th1 $p wff p $= wp $.",
        )
        .unwrap();
        assert_eq!(db.assertion_count(), 1);
        assert!(!db.assertion(crate::model::AssertionId(0)).incomplete);
    }

    #[test]
    fn compressed_proof_equivalent_to_regular() {
        let db = read(
            "$c wff $. $v p $. wp $f wff p $. th1 $p wff p $= ( ) A $.",
        )
        .unwrap();
        let ass = db.assertion(crate::model::AssertionId(0));
        let steps = ass.proof_steps.as_ref().unwrap();
        assert_eq!(steps.as_slice(), [ProofStep::Hyp(crate::model::HypId(0))]);
    }

    #[test]
    fn wrong_conclusion_is_rejected() {
        let err = read(
            "$c wff $. $v p q $. wp $f wff p $. wq $f wff q $. th2 $p wff q $= wp $.",
        );
        assert!(err.is_err());
    }

    #[test]
    fn empty_constant_list_is_rejected() {
        assert!(read("$c $.").is_err());
    }

    #[test]
    fn redeclaring_active_variable_fails() {
        assert!(read("$v p p $.").is_err());
    }

    #[test]
    fn self_referential_proof_is_rejected() {
        let err = read(
            "$c wff $. $v p $. wp $f wff p $. th1 $p wff p $= th1 $.",
        );
        assert!(err.is_err());
    }
}
