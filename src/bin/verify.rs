//! `verify`: read a Metamath database and check every stored proof.
//!
//! ```text
//! verify <file.mm> [<section-title-prefix>]
//! ```
//!
//! With no second argument every theorem's proof is checked. A second
//! argument restricts checking to assertions whose nearest preceding
//! comment starts with that prefix, so a large database can be checked
//! incrementally.
//!
//! Exit codes: `0` everything checked out, `1` a verification error was
//! found, `2` the command line itself was wrong.

use std::process::ExitCode;

use systermm::lexer::DiskFileLoader;
use systermm::{AssertionId, Database};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: verify <file.mm> [<section-title-prefix>]");
        return ExitCode::from(2);
    };
    let section_prefix = args.next();

    let loader = DiskFileLoader;
    let mut db = Database::new();

    tracing::info!(file = %path, "reading database");
    if let Err(err) = db.read_file(&loader, &path) {
        eprintln!("{err}");
        return ExitCode::from(1);
    }

    let mut checked = 0usize;
    for (i, ass) in db.assertions().iter().enumerate() {
        if !ass.kind.is_theorem() {
            continue;
        }
        if let Some(prefix) = &section_prefix {
            if !preceding_comment_starts_with(&db, i, prefix) {
                continue;
            }
        }
        let label = db.symtab.label_name(ass.label);
        let Some(steps) = ass.proof_steps.as_ref() else {
            tracing::warn!(%label, "theorem has no stored proof, skipping");
            continue;
        };
        tracing::debug!(%label, "checking proof");
        if let Err(err) = db.verify_external_proof(AssertionId(i as u32), steps) {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
        checked += 1;
    }

    tracing::info!(checked, "verification complete");
    ExitCode::SUCCESS
}

/// Whether the comment text nearest to (and before) assertion `index`,
/// in the same file, starts with `prefix`.
fn preceding_comment_starts_with(db: &Database, index: usize, prefix: &str) -> bool {
    let span = db.assertion(AssertionId(index as u32)).span;
    db.comments
        .iter()
        .filter(|c| c.span.file == span.file && c.span.start.line <= span.start.line)
        .max_by_key(|c| c.span.start.line)
        .is_some_and(|c| c.text.trim().starts_with(prefix))
}
