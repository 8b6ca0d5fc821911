//! Convention comments: the `$j`/`$t` mini-language (spec.md §6
//! "Convention comments"), grounded on
//! `original_source/comment.cpp`'s `Commentinfo`/`Typecodes`/`Ctordefns`.
//!
//! Parsed independently of the symbol table (it runs before the
//! statement reader, mirroring `Database::read_file`'s pipeline), so
//! every name here is a raw string, resolved against the symbol table
//! lazily by whichever component needs it (`syntax`, `defcheck`).

use rustc_hash::FxHashMap;

use crate::lexer::Comment;

/// What a convention comment said about one type code: its alias
/// target (`syntax 'cv' as 'class'` records `cv -> class`) and whether
/// `bound 'type'` marked it as a bound-variable type code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCodeInfo {
    pub as_type: Option<String>,
    pub bound: bool,
}

/// Accumulated `$j`/`$t` convention-comment metadata for one database
/// (spec.md §6.2), grounded on `Commentinfo`.
#[derive(Debug, Clone, Default)]
pub struct CommentInfo {
    pub type_codes: FxHashMap<String, TypeCodeInfo>,
    /// Constructor label -> defining label, `None` for a `primitive` declaration.
    pub ctor_defns: FxHashMap<String, Option<String>>,
}

impl CommentInfo {
    /// A type code is primitive unless it was explicitly aliased via
    /// `syntax 'type' as 'astype'` (spec.md §4.8: "declared as
    /// primitive ... or never aliased" — a type never mentioned at all
    /// defaults to primitive).
    pub fn is_primitive(&self, type_name: &str) -> bool {
        self.type_codes
            .get(type_name)
            .is_none_or(|info| info.as_type.is_none())
    }

    pub fn is_bound(&self, type_name: &str) -> bool {
        self.type_codes.get(type_name).is_some_and(|info| info.bound)
    }
}

/// Parse every `$j`/`$t` comment in `comments` into a [`CommentInfo`].
///
/// Unrecognized commands are ignored rather than rejected, matching
/// `original_source/comment.cpp`'s permissive "unknown command,
/// ignored" handling (spec.md §6.2).
pub fn parse_convention_comments(comments: &[Comment]) -> CommentInfo {
    let mut info = CommentInfo::default();
    for comment in comments {
        let text = comment.text.trim_start();
        let marker_end = text.find(char::is_whitespace).unwrap_or(text.len());
        let marker = &text[..marker_end];
        if marker != "$j" && marker != "$t" {
            continue;
        }
        let rest = text[marker_end..].trim_start();
        for command in rest.split(';') {
            apply_command(&mut info, command.trim());
        }
    }
    info
}

fn apply_command(info: &mut CommentInfo, command: &str) {
    let words: Vec<&str> = command.split_whitespace().collect();
    let Some(&keyword) = words.first() else {
        return;
    };
    match keyword {
        "syntax" => match words.len() {
            2 => {
                if let Some(ty) = unquote(words[1]) {
                    info.type_codes.entry(ty).or_default();
                }
            }
            4 if words[2] == "as" => {
                if let (Some(ty), Some(as_ty)) = (unquote(words[1]), unquote(words[3])) {
                    info.type_codes.entry(ty).or_default().as_type = Some(as_ty);
                }
            }
            _ => {}
        },
        "bound" => {
            if words.len() == 2 {
                if let Some(ty) = unquote(words[1]) {
                    info.type_codes.entry(ty).or_default().bound = true;
                }
            }
        }
        "definition" => {
            if words.len() == 4 && words[2] == "for" {
                if let (Some(defn), Some(ctor)) = (unquote(words[1]), unquote(words[3])) {
                    info.ctor_defns.insert(ctor, Some(defn));
                }
            }
        }
        "primitive" => {
            for &w in &words[1..] {
                if let Some(ctor) = unquote(w) {
                    info.ctor_defns.insert(ctor, None);
                }
            }
        }
        _ => {}
    }
}

fn unquote(s: &str) -> Option<String> {
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        Some(s[1..s.len() - 1].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileId, Position, Span};

    fn comment(text: &str) -> Comment {
        Comment {
            text: text.to_string(),
            token_position: 0,
            span: Span::new(FileId(0), Position::new(0, 0), Position::new(0, 0)),
        }
    }

    #[test]
    fn parses_syntax_alias() {
        let info = parse_convention_comments(&[comment("$j syntax 'cv' as 'class';")]);
        assert!(!info.is_primitive("cv"));
        assert!(info.is_primitive("wff"));
    }

    #[test]
    fn parses_bound_and_definition() {
        let info = parse_convention_comments(&[comment(
            "$j bound 'setvar'; definition 'df-an' for 'wa'; primitive 'wi' 'wn';",
        )]);
        assert!(info.is_bound("setvar"));
        assert_eq!(info.ctor_defns.get("wa"), Some(&Some("df-an".to_string())));
        assert_eq!(info.ctor_defns.get("wi"), Some(&None));
    }

    #[test]
    fn ignores_unrecognized_commands_and_non_convention_comments() {
        let info = parse_convention_comments(&[
            comment("$j frobnicate 'x';"),
            comment("just a plain comment"),
        ]);
        assert!(info.type_codes.is_empty());
        assert!(info.ctor_defns.is_empty());
    }
}
