//! Tokenisation with include-file resolution and comment extraction
//! (spec.md §4.1).

mod file_loader;
mod scanner;
mod token;

pub use file_loader::{DiskFileLoader, FileLoader, MemoryFileLoader};
pub use token::{Comment, Token};

use rustc_hash::FxHashSet;

use crate::diag::{VerifyError, VerifyResult};
use crate::model::FileId;
use scanner::Scanner;

/// Result of tokenising a file (and everything it transitively includes).
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
    /// File names in allocation order, indexed by `FileId`.
    pub file_names: Vec<String>,
}

/// Tokenise `root` (and its `$[ ... $]` includes) against `loader`.
pub fn tokenize(loader: &dyn FileLoader, root: &str) -> VerifyResult<LexOutput> {
    let mut state = LexState {
        loader,
        tokens: Vec::new(),
        comments: Vec::new(),
        file_names: Vec::new(),
        already_included: FxHashSet::default(),
    };
    state.read_file(root)?;
    Ok(LexOutput {
        tokens: state.tokens,
        comments: state.comments,
        file_names: state.file_names,
    })
}

struct LexState<'a> {
    loader: &'a dyn FileLoader,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    file_names: Vec<String>,
    /// Raw filename strings already read, for spec.md §9's
    /// deduplicate-by-raw-string (not canonical path) behavior.
    already_included: FxHashSet<String>,
}

impl<'a> LexState<'a> {
    fn alloc_file(&mut self, name: &str) -> FileId {
        let id = FileId(self.file_names.len() as u32);
        self.file_names.push(name.to_string());
        id
    }

    fn read_file(&mut self, name: &str) -> VerifyResult<()> {
        if !self.already_included.insert(name.to_string()) {
            return Ok(());
        }

        let text = self.loader.read(name)?;
        let file = self.alloc_file(name);
        let mut sc = Scanner::new(&text, file);

        let mut scope_depth: u32 = 0;
        let mut in_statement = false;

        loop {
            sc.skip_whitespace();
            if sc.is_eof() {
                break;
            }
            let start = sc.position();
            let tok_text = self.read_raw_token(&mut sc)?;
            let span = sc.span_from(start);

            match tok_text.as_str() {
                "$(" => {
                    let position = self.tokens.len();
                    self.read_comment(&mut sc, position)?;
                    continue;
                }
                "$[" => {
                    if scope_depth > 0 {
                        return Err(VerifyError::Scope {
                            span,
                            message: "file inclusion command not in outermost scope".into(),
                        });
                    }
                    if in_statement {
                        return Err(VerifyError::Scope {
                            span,
                            message: "file inclusion command inside an open statement".into(),
                        });
                    }
                    let include_name = self.read_include_filename(&mut sc, span)?;
                    self.read_file(&include_name)?;
                    continue;
                }
                "${" => scope_depth += 1,
                "$}" => {
                    scope_depth = scope_depth.checked_sub(1).ok_or_else(|| VerifyError::Scope {
                        span,
                        message: "unmatched `$}`".into(),
                    })?;
                }
                "$c" | "$v" | "$f" | "$e" | "$d" | "$a" | "$p" => in_statement = true,
                "$." => in_statement = false,
                _ => {}
            }

            self.tokens.push(Token::new(tok_text, span));
        }

        Ok(())
    }

    /// Read one maximal run of non-whitespace printable-ASCII bytes.
    fn read_raw_token(&self, sc: &mut Scanner<'_>) -> VerifyResult<String> {
        let start = sc.position();
        let mut out = String::new();
        while let Some(b) = sc.peek() {
            if scanner::is_whitespace(b) {
                break;
            }
            if !scanner::is_printable_nonspace(b) {
                let span = sc.span_from(start);
                return Err(VerifyError::Syntax {
                    span,
                    message: format!("invalid character 0x{b:02x} in token"),
                });
            }
            out.push(b as char);
            sc.bump();
        }
        Ok(out)
    }

    /// Read a `$( ... $)` comment body per spec.md §4.1's delimiter rules.
    fn read_comment(&mut self, sc: &mut Scanner<'_>, token_position: usize) -> VerifyResult<()> {
        let start = sc.position();
        let mut content = String::new();
        loop {
            match sc.peek() {
                None => {
                    return Err(VerifyError::Syntax {
                        span: sc.span_from(start),
                        message: "unterminated comment".into(),
                    });
                }
                Some(b'$') => {
                    let next = sc.peek_at(1);
                    match next {
                        Some(b'(') => {
                            return Err(VerifyError::Syntax {
                                span: sc.span_from(start),
                                message: "`$(` found inside a comment".into(),
                            });
                        }
                        Some(b')') => {
                            let preceded_by_ws =
                                content.as_bytes().last().copied().is_none_or(scanner::is_whitespace);
                            if !preceded_by_ws {
                                return Err(VerifyError::Syntax {
                                    span: sc.span_from(start),
                                    message: "`$)` not preceded by whitespace".into(),
                                });
                            }
                            sc.bump(); // '$'
                            sc.bump(); // ')'
                            let followed_by_ws_or_eof =
                                sc.peek().is_none_or(scanner::is_whitespace);
                            if !followed_by_ws_or_eof {
                                return Err(VerifyError::Syntax {
                                    span: sc.span_from(start),
                                    message: "`$)` not followed by whitespace".into(),
                                });
                            }
                            self.comments.push(Comment {
                                text: content,
                                token_position,
                                span: sc.span_from(start),
                            });
                            return Ok(());
                        }
                        _ => {
                            content.push('$');
                            sc.bump();
                        }
                    }
                }
                Some(b) => {
                    content.push(b as char);
                    sc.bump();
                }
            }
        }
    }

    /// Read the filename + closing `$]` of an include directive.
    fn read_include_filename(
        &self,
        sc: &mut Scanner<'_>,
        open_span: crate::model::Span,
    ) -> VerifyResult<String> {
        sc.skip_whitespace();
        if sc.is_eof() {
            return Err(VerifyError::Syntax {
                span: open_span,
                message: "unfinished file inclusion command".into(),
            });
        }
        let name = self.read_raw_token(sc)?;
        if name.contains('$') {
            return Err(VerifyError::Syntax {
                span: open_span,
                message: format!("include filename `{name}` contains a `$`"),
            });
        }
        sc.skip_whitespace();
        let closing = self.read_raw_token(sc)?;
        if closing != "$]" {
            return Err(VerifyError::Syntax {
                span: open_span,
                message: "missing closing `$]` in file inclusion command".into(),
            });
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok_strs(out: &LexOutput) -> Vec<&str> {
        out.tokens.iter().map(|t| t.as_str()).collect()
    }

    #[test]
    fn tokenizes_minimal_file() {
        let loader = MemoryFileLoader::new().with_file(
            "root.mm",
            "$c wff $. $v p $. wp $f wff p $. $( done $)",
        );
        let out = tokenize(&loader, "root.mm").unwrap();
        assert_eq!(
            tok_strs(&out),
            vec!["$c", "wff", "$.", "$v", "p", "$.", "wp", "$f", "wff", "p", "$."]
        );
        assert_eq!(out.comments.len(), 1);
        assert_eq!(out.comments[0].text.trim(), "done");
    }

    #[test]
    fn rejects_unterminated_comment() {
        let loader = MemoryFileLoader::new().with_file("root.mm", "$c wff $. $( unterminated");
        assert!(tokenize(&loader, "root.mm").is_err());
    }

    #[test]
    fn rejects_nested_comment_marker() {
        let loader = MemoryFileLoader::new().with_file("root.mm", "$( outer $( inner $) $)");
        assert!(tokenize(&loader, "root.mm").is_err());
    }

    #[test]
    fn resolves_includes_once() {
        let loader = MemoryFileLoader::new()
            .with_file("root.mm", "$[ a.mm $] $[ a.mm $] tail")
            .with_file("a.mm", "head");
        let out = tokenize(&loader, "root.mm").unwrap();
        assert_eq!(tok_strs(&out), vec!["head", "tail"]);
    }

    #[test]
    fn rejects_dollar_in_include_filename() {
        let loader = MemoryFileLoader::new().with_file("root.mm", "$[ a$b.mm $]");
        assert!(tokenize(&loader, "root.mm").is_err());
    }

    #[test]
    fn rejects_include_inside_scope() {
        let loader = MemoryFileLoader::new()
            .with_file("root.mm", "${ $[ a.mm $] $}")
            .with_file("a.mm", "x");
        assert!(tokenize(&loader, "root.mm").is_err());
    }

    #[test]
    fn rejects_non_ascii_byte() {
        let loader = MemoryFileLoader::new().with_file("root.mm", "$c w\u{00e9} $.");
        assert!(tokenize(&loader, "root.mm").is_err());
    }
}
