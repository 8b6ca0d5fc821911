//! End-to-end scenarios over a whole `Database::read_file` pipeline,
//! one test per literal input/outcome pair.

use systermm::lexer::MemoryFileLoader;
use systermm::model::AssertionId;
use systermm::{Database, VerifyError};

fn read(source: &str) -> Result<Database, VerifyError> {
    let loader = MemoryFileLoader::new().with_file("root.mm", source);
    let mut db = Database::new();
    db.read_file(&loader, "root.mm")?;
    Ok(db)
}

#[test]
fn minimal_well_formed_file() {
    let db = read("$c wff $. $v p $. wp $f wff p $. $( done $)").unwrap();
    assert_eq!(db.symtab.variables_in_order().len(), 1);
    assert_eq!(db.hyps().len(), 1);
    assert!(db.hyps()[0].is_floating());
    assert_eq!(db.assertion_count(), 0);
}

#[test]
fn single_axiom() {
    let db = read("$c wff $. $v p $. wp $f wff p $. ax1 $a wff p $.").unwrap();
    assert_eq!(db.assertion_count(), 1);
    let ax1 = db.assertion(AssertionId(0));
    assert_eq!(ax1.number, 1);
    assert!(ax1.kind.is_axiom());
    assert_eq!(ax1.mandatory_hyps.len(), 1);
    assert_eq!(
        ax1.mandatory_hyps.iter().filter(|&&h| db.hyp(h).is_floating()).count(),
        1
    );
}

#[test]
fn trivial_theorem_verifies() {
    let db = read(
        "$c wff $. $v p $. wp $f wff p $. \
         th1 $p wff p $= wp $.",
    )
    .unwrap();
    let th1 = db.assertion(AssertionId(0));
    assert!(th1.kind.is_theorem());
    assert!(th1.kind.is_trivial());
    let steps = th1.proof_steps.as_ref().unwrap();
    assert!(db.verify_external_proof(AssertionId(0), steps).is_ok());
}

#[test]
fn compressed_equivalent_decodes_to_the_same_hypothesis() {
    let db = read(
        "$c wff $. $v p $. wp $f wff p $. \
         th1 $p wff p $= ( ) A $.",
    )
    .unwrap();
    let th1 = db.assertion(AssertionId(0));
    let steps = th1.proof_steps.as_ref().unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(*steps, vec![systermm::ProofStep::Hyp(th1.mandatory_hyps[0])]);
}

#[test]
fn detectable_wrong_conclusion() {
    let err = read(
        "$c wff $. $v p q $. wp $f wff p $. wq $f wff q $. \
         th2 $p wff q $= wp $.",
    )
    .unwrap_err();
    match err {
        VerifyError::ProofShape { kind, .. } => {
            assert_eq!(kind, systermm::diag::ProofShapeError::WrongConclusion);
        }
        other => panic!("expected a proof-shape error, got {other:?}"),
    }
}

#[test]
fn disjoint_variable_violation_is_rejected() {
    // `wdv` requires `x` and `y` disjoint. `th` applies it with both
    // mandatory hypotheses substituted by the same variable `z`, which
    // can never satisfy that restriction.
    let err = read(
        "$c wff ( A ) $. $v x y z $. \
         wx $f wff x $. wy $f wff y $. wz $f wff z $. \
         $d x y $. \
         wdv $a wff ( x A y ) $. \
         th $p wff ( z A z ) $= wz wz wdv $.",
    )
    .unwrap_err();
    match err {
        VerifyError::DisjointVariable { var1, var2, .. } => {
            assert_eq!(var1, "z");
            assert_eq!(var2, "z");
        }
        other => panic!("expected a disjoint-variable violation, got {other:?}"),
    }
}
