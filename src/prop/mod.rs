//! Propositional Layer (spec.md §4.10): truth tables and CNF for
//! propositional connectives, and the CNF translation of a
//! propositional assertion's conclusion and hypotheses, grounded on
//! `original_source/propctor.cpp`'s `Propctor`/`Propctors`.
//!
//! Building this table is always run (spec.md §2: "once the whole
//! file is consumed ... (9) builds propositional metadata"); actually
//! *checking* an assertion's CNF for counter-satisfiability is a
//! separate, opt-in step (spec.md §7: "SAT counter-examples are
//! reported as failures only when checking is explicitly enabled for
//! that assertion"), exposed as [`Database::check_propositional`].

pub mod cnf;
pub mod sat;

use rustc_hash::FxHashMap;

use crate::database::Database;
use crate::defcheck::{Definition, Definitions};
use crate::model::{AssertionId, Assertion, HypId, HypKind, ProofStep};

use cnf::{negate, positive, Cnf, Literal};

/// A propositional syntax constructor: its arity, truth table (a
/// `Vec<bool>` of length `2^argcount`, indexed bit `i` = argument `i`,
/// per spec.md §4.10), and the canonical CNF encoding of that table.
#[derive(Debug, Clone)]
pub struct Propctor {
    pub argcount: usize,
    pub truth_table: Vec<bool>,
    pub cnf: Cnf,
}

/// Every recognized propositional constructor, keyed by the syntax
/// axiom it defines (spec.md §4.10: "map: ... syntax axiom -> data",
/// generalized from the teacher's string-label key to our
/// `AssertionId` handle).
#[derive(Debug, Clone, Default)]
pub struct Propctors {
    by_syntax_axiom: FxHashMap<AssertionId, Propctor>,
}

impl Propctors {
    pub fn get(&self, syntax_axiom: AssertionId) -> Option<&Propctor> {
        self.by_syntax_axiom.get(&syntax_axiom)
    }

    pub fn is_propositional_constructor(&self, syntax_axiom: AssertionId) -> bool {
        self.by_syntax_axiom.contains_key(&syntax_axiom)
    }

    /// Seed with the three primitive connectives, by the conventional
    /// `set.mm` labels (`original_source/propctor.cpp`'s `init()`
    /// hard-codes these same three truth tables under the names
    /// `wi`/`wn`/`wtru`), then extend by evaluating every accepted
    /// definition's RHS (spec.md §4.10).
    pub fn build(definitions: &Definitions, db: &Database) -> Self {
        let mut builder = Builder {
            db,
            definitions,
            done: FxHashMap::default(),
        };
        builder.seed_primitives();
        for &syntax_axiom in definitions.by_syntax_axiom.keys() {
            builder.get_or_build(syntax_axiom);
        }
        Propctors {
            by_syntax_axiom: builder.done,
        }
    }
}

struct Builder<'a> {
    db: &'a Database,
    definitions: &'a Definitions,
    done: FxHashMap<AssertionId, Propctor>,
}

/// Label name, truth table entries of one primitive connective.
const PRIMITIVES: &[(&str, &[bool])] = &[
    ("wi", &[true, false, true, true]),
    ("wn", &[true, false]),
    ("wtru", &[true]),
];

impl<'a> Builder<'a> {
    fn seed_primitives(&mut self) {
        for &(label, table) in PRIMITIVES {
            let Some(label_id) = self.db.symtab.lookup_label(label) else {
                continue;
            };
            let Some(crate::symtab::LabelBinding::Assertion(id)) =
                self.db.symtab.label_binding(label_id)
            else {
                continue;
            };
            let argcount = table.len().trailing_zeros() as usize;
            self.done.insert(
                id,
                Propctor {
                    argcount,
                    truth_table: table.to_vec(),
                    cnf: Cnf::from_truth_table(table),
                },
            );
        }
    }

    /// Build (and memoize) the propositional constructor for
    /// `syntax_axiom`, recursing into any constructor its definition's
    /// RHS mentions (`original_source/propctor.cpp`'s `adddef`
    /// falling back to `definitions.find` when a referenced
    /// constructor isn't registered yet).
    fn get_or_build(&mut self, syntax_axiom: AssertionId) -> Option<Propctor> {
        if let Some(p) = self.done.get(&syntax_axiom) {
            return Some(p.clone());
        }
        let def = self.definitions.get(syntax_axiom)?.clone();
        let propctor = self.build_definition(&def)?;
        self.done.insert(syntax_axiom, propctor.clone());
        Some(propctor)
    }

    fn build_definition(&mut self, def: &Definition) -> Option<Propctor> {
        if def.lhs.is_empty() {
            return None;
        }
        let argcount = def.lhs.len() - 1;
        // A `Bvector`'s bit width in the original; no realistic
        // Metamath connective exceeds a handful of arguments.
        if argcount > 32 {
            return None;
        }
        let mut var_index = FxHashMap::default();
        for (i, step) in def.lhs[..argcount].iter().enumerate() {
            match step {
                ProofStep::Hyp(h) => {
                    var_index.insert(*h, i);
                }
                _ => return None,
            }
        }

        let mut table = Vec::with_capacity(1 << argcount);
        for arg in 0..(1usize << argcount) {
            table.push(self.eval_rhs(&def.rhs, &var_index, arg)?);
        }
        let cnf = Cnf::from_truth_table(&table);
        Some(Propctor {
            argcount,
            truth_table: table,
            cnf,
        })
    }

    /// Evaluate `rhs` (a self-contained reverse-Polish sequence) at
    /// one packed variable assignment, grounded on
    /// `original_source/propctor.cpp`'s `calctruthvalue`.
    fn eval_rhs(
        &mut self,
        rhs: &[ProofStep],
        var_index: &FxHashMap<HypId, usize>,
        arg: usize,
    ) -> Option<bool> {
        let mut stack: Vec<bool> = Vec::new();
        for step in rhs {
            match step {
                ProofStep::Hyp(h) => {
                    let i = *var_index.get(h)?;
                    stack.push((arg >> i) & 1 == 1);
                }
                ProofStep::Assertion(a) => {
                    let propctor = self.get_or_build(*a)?;
                    let k = propctor.argcount;
                    if stack.len() < k {
                        return None;
                    }
                    let operands = stack.split_off(stack.len() - k);
                    let idx = pack_bits(&operands);
                    stack.push(propctor.truth_table[idx]);
                }
                ProofStep::Load(_) | ProofStep::Save => return None,
            }
        }
        if stack.len() != 1 {
            return None;
        }
        stack.pop()
    }
}

fn pack_bits(bits: &[bool]) -> usize {
    bits.iter()
        .enumerate()
        .fold(0usize, |acc, (i, &b)| acc | ((b as usize) << i))
}

/// Translate `ass`'s conclusion and essential hypotheses to the CNF of
/// a single SAT instance (spec.md §4.10), or `None` if any step isn't
/// reducible to known propositional constructors (in which case `ass`
/// simply isn't a propositional assertion).
///
/// Every mandatory floating hypothesis gets its own atom, in mandatory
/// order; each essential hypothesis's formula is closed off *true*;
/// the conclusion's formula is closed off *false* (so satisfiability
/// of the result means the assertion does not follow propositionally).
pub fn assertion_cnf(db: &Database, propctors: &Propctors, ass: &Assertion) -> Option<Cnf> {
    let atom_of: FxHashMap<HypId, usize> = ass
        .mandatory_hyps
        .iter()
        .copied()
        .filter(|&h| db.hyp(h).is_floating())
        .enumerate()
        .map(|(i, h)| (h, i))
        .collect();
    let mut natom = atom_of.len();
    let mut cnf = Cnf::new();

    for (&hyp_id, tree) in ass.mandatory_hyps.iter().zip(ass.hyp_revpolish.iter()) {
        if let HypKind::Essential = db.hyp(hyp_id).kind {
            let tree = tree.as_ref()?;
            let lit = eval_formula_cnf(propctors, &tree.steps, &atom_of, &mut natom, &mut cnf)?;
            cnf.close_off(lit);
        }
    }

    let tree = ass.conclusion_revpolish.as_ref()?;
    let lit = eval_formula_cnf(propctors, &tree.steps, &atom_of, &mut natom, &mut cnf)?;
    cnf.close_off(negate(lit));

    Some(cnf)
}

fn eval_formula_cnf(
    propctors: &Propctors,
    steps: &[ProofStep],
    atom_of: &FxHashMap<HypId, usize>,
    natom: &mut usize,
    cnf: &mut Cnf,
) -> Option<Literal> {
    let mut stack: Vec<Literal> = Vec::new();
    for step in steps {
        match step {
            ProofStep::Hyp(h) => {
                let i = *atom_of.get(h)?;
                stack.push(positive(i));
            }
            ProofStep::Assertion(a) => {
                let propctor = propctors.get(*a)?;
                let k = propctor.argcount;
                if stack.len() < k {
                    return None;
                }
                let args = stack.split_off(stack.len() - k);
                cnf.append(&propctor.cnf, *natom, &args);
                stack.push(positive(*natom));
                *natom += 1;
            }
            ProofStep::Load(_) | ProofStep::Save => return None,
        }
    }
    if stack.len() != 1 {
        return None;
    }
    stack.pop()
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

    #[test]
    fn primitive_implication_is_seeded() {
        let db = read(
            "$c wff -> $. $v p q $. wp $f wff p $. wq $f wff q $. \
             wi $a wff ( p -> q ) $.",
        );
        let defs = crate::defcheck::check_all(&db);
        let propctors = Propctors::build(&defs, &db);
        let wi = db.symtab.lookup_label("wi").unwrap();
        let wi_id = match db.symtab.label_binding(wi).unwrap() {
            crate::symtab::LabelBinding::Assertion(a) => a,
            _ => unreachable!(),
        };
        let propctor = propctors.get(wi_id).unwrap();
        assert_eq!(propctor.argcount, 2);
        assert_eq!(propctor.truth_table, vec![true, false, true, true]);
    }

    #[test]
    fn definition_extends_the_table() {
        // `df-or`: (p \/ q) <-> ( -. p -> q ), a disjunction built
        // purely from the two primitive connectives.
        let db = read(
            "$c wff -> -. \\/ <-> $. $v p q $. \
             wp $f wff p $. wq $f wff q $. \
             wi $a wff ( p -> q ) $. \
             wn $a wff -. p $. \
             wb $a wff ( p <-> q ) $. \
             wo $a wff ( p \\/ q ) $. \
             df-or $a wff ( ( p \\/ q ) <-> ( -. p -> q ) ) $.",
        );
        let defs = crate::defcheck::check_all(&db);
        assert!(defs.failures.is_empty(), "unexpected failures: {:?}", defs.failures);
        let propctors = Propctors::build(&defs, &db);

        let wo = db.symtab.lookup_label("wo").unwrap();
        let wo_id = match db.symtab.label_binding(wo).unwrap() {
            crate::symtab::LabelBinding::Assertion(a) => a,
            _ => unreachable!(),
        };
        let propctor = propctors.get(wo_id).expect("disjunction should be recognized");
        // p \/ q is true unless both are false.
        assert_eq!(propctor.truth_table, vec![false, true, true, true]);
    }

    #[test]
    fn assertion_cnf_is_unsat_for_a_tautology() {
        // `id1`: p -> p (both slots of the binary `wi` connective bound
        // to the same variable) is propositionally valid: its CNF
        // (hyp atom p, conclusion closed off false) must be UNSAT.
        let db = read(
            "$c wff -> $. $v p q $. wp $f wff p $. wq $f wff q $. \
             wi $a wff ( p -> q ) $. \
             id1 $a wff ( p -> p ) $.",
        );
        let defs = crate::defcheck::check_all(&db);
        let propctors = Propctors::build(&defs, &db);
        let id1 = db.assertion(crate::model::AssertionId(1));
        let cnf = assertion_cnf(&db, &propctors, id1).expect("should translate to CNF");
        assert!(!cnf.is_satisfiable(), "p -> p should be propositionally valid");
    }
}
