use crate::index::{Declaration, FileIndex};
use crate::language::Language;
use regex::RegexBuilder;

/// A single contextual search hit.
///
/// `snippet` is the full source of the enclosing declaration when one was
/// found, so the model sees the match in context; otherwise just the matching
/// line. `structural` records whether a syntax tree backed this match —
/// `false` means the search degraded to plain text.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    pub line_number: usize,
    pub line_text: String,
    pub declaration: Option<Declaration>,
    pub snippet: String,
    pub structural: bool,
}

/// Contextual search over one file's content.
///
/// The text scan runs first and works for any language; the syntax tree, when
/// a grammar is available, only enriches each hit with its innermost
/// enclosing declaration. Parse failures degrade silently to the plain scan.
pub fn search_file(
    content: &str,
    language: Language,
    pattern: &str,
    case_sensitive: bool,
) -> Vec<SearchMatch> {
    let index = if language.supports_ast() {
        match FileIndex::parse(content, language) {
            Ok(index) => Some(index),
            Err(e) => {
                log::debug!("structural context unavailable ({e}); falling back to text search");
                None
            }
        }
    } else {
        None
    };

    let matcher = LineMatcher::new(pattern, case_sensitive);
    let lines: Vec<&str> = content.lines().collect();

    let mut matches = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if !matcher.is_match(line) {
            continue;
        }
        let line_number = idx + 1;
        let declaration = index
            .as_ref()
            .and_then(|index| index.enclosing(line_number))
            .cloned();
        let snippet = match &declaration {
            Some(decl) => {
                let end = decl.end_line.min(lines.len());
                lines[decl.start_line - 1..end].join("\n")
            }
            None => (*line).to_string(),
        };
        matches.push(SearchMatch {
            line_number,
            line_text: (*line).to_string(),
            declaration,
            snippet,
            structural: index.is_some(),
        });
    }
    matches
}

/// Pattern matcher for the line scan. Compiled as a regex when the pattern is
/// one; raw code fragments like `foo(` fall back to substring matching so the
/// model can paste code verbatim.
enum LineMatcher {
    Regex(regex::Regex),
    Literal { needle: String, case_sensitive: bool },
}

impl LineMatcher {
    fn new(pattern: &str, case_sensitive: bool) -> Self {
        match RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
        {
            Ok(re) => LineMatcher::Regex(re),
            Err(_) => LineMatcher::Literal {
                needle: if case_sensitive {
                    pattern.to_string()
                } else {
                    pattern.to_lowercase()
                },
                case_sensitive,
            },
        }
    }

    fn is_match(&self, line: &str) -> bool {
        match self {
            LineMatcher::Regex(re) => re.is_match(line),
            LineMatcher::Literal {
                needle,
                case_sensitive,
            } => {
                if *case_sensitive {
                    line.contains(needle.as_str())
                } else {
                    line.to_lowercase().contains(needle.as_str())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NESTED_PY: &str = "def outer():\n    def inner():\n        x = 1\n    return inner\n";

    #[test]
    fn test_match_carries_innermost_declaration() {
        let matches = search_file(NESTED_PY, Language::Python, "x", true);
        assert_eq!(matches.len(), 1);

        let hit = &matches[0];
        assert_eq!(hit.line_number, 3);
        assert!(hit.structural);

        let decl = hit.declaration.as_ref().unwrap();
        assert_eq!(decl.name, "inner");
        assert_eq!((decl.start_line, decl.end_line), (2, 3));
    }

    #[test]
    fn test_snippet_is_whole_declaration() {
        let code = "fn compute(a: i32) -> i32 {\n    let doubled = a * 2;\n    doubled\n}\n";
        let matches = search_file(code, Language::Rust, "doubled", true);
        assert_eq!(matches.len(), 2);
        // Both hits share the same enclosing function and full-body snippet.
        for hit in &matches {
            assert_eq!(hit.snippet, code.trim_end());
            assert_eq!(hit.declaration.as_ref().unwrap().name, "compute");
        }
    }

    #[test]
    fn test_unknown_language_degrades_to_text() {
        let content = "# notes\nremember the milk\n";
        let matches = search_file(content, Language::Markdown, "milk", true);
        assert_eq!(matches.len(), 1);
        assert!(!matches[0].structural);
        assert!(matches[0].declaration.is_none());
        assert_eq!(matches[0].snippet, "remember the milk");
    }

    #[test]
    fn test_case_sensitivity() {
        let content = "let Value = 1;\n";
        assert!(search_file(content, Language::JavaScript, "value", true).is_empty());
        assert_eq!(
            search_file(content, Language::JavaScript, "value", false).len(),
            1
        );
    }

    #[test]
    fn test_regex_patterns() {
        let content = "fn alpha() {}\nfn beta() {}\n";
        let matches = search_file(content, Language::Rust, r"fn \w+ha", true);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line_number, 1);
    }

    #[test]
    fn test_invalid_regex_falls_back_to_substring() {
        let content = "call(foo(bar)\n";
        let matches = search_file(content, Language::Rust, "foo(", true);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_zero_matches_is_empty_not_error() {
        assert!(search_file("fn main() {}\n", Language::Rust, "nonexistent", true).is_empty());
    }

    #[test]
    fn test_match_outside_declarations_keeps_line_snippet() {
        let content = "use std::fs;\n\nfn main() {}\n";
        let matches = search_file(content, Language::Rust, "std::fs", true);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].structural);
        assert!(matches[0].declaration.is_none());
        assert_eq!(matches[0].snippet, "use std::fs;");
    }
}
