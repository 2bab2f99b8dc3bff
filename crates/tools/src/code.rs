//! Structural code tools: `search_code` (contextual search) and
//! `list_definitions` (signature listing).

use crate::args::{optional_bool, required_str, resolve_path};
use crate::error::ToolError;
use crate::file::read_text;
use brain_security::SecurityContext;
use brain_structural::{search_file, Declaration, FileIndex, Language, StructuralError};
use serde_json::Value;

/// Matches rendered in full; anything past this is summarized in one line so
/// a pathological pattern cannot flood the conversation with snippets.
const MAX_RENDERED_MATCHES: usize = 10;

pub fn search_code(ctx: &SecurityContext, args: &Value) -> Result<String, ToolError> {
    let candidate = required_str(args, "path")?;
    let pattern = required_str(args, "pattern")?;
    let case_sensitive = optional_bool(args, "case_sensitive")?.unwrap_or(true);

    let path = resolve_path(ctx, candidate)?;
    let content = read_text(&path, candidate)?;
    let language = Language::from_path(&path);

    let matches = search_file(&content, language, pattern, case_sensitive);
    if matches.is_empty() {
        return Ok(format!("No matches for '{pattern}' in '{candidate}'"));
    }

    let structural = matches.iter().all(|m| m.structural);
    let mut sections = Vec::new();
    if !structural {
        sections.push(format!(
            "note: no syntax context available for '{candidate}'; plain text matches"
        ));
    }

    for hit in matches.iter().take(MAX_RENDERED_MATCHES) {
        let header = match &hit.declaration {
            Some(decl) => format!(
                "{candidate}:{} (in {} '{}', lines {}-{})",
                hit.line_number,
                decl.kind.as_str(),
                decl.name,
                decl.start_line,
                decl.end_line
            ),
            None => format!("{candidate}:{}", hit.line_number),
        };
        sections.push(format!("{header}\n{}", hit.snippet));
    }

    if matches.len() > MAX_RENDERED_MATCHES {
        sections.push(format!(
            "({} more matches not shown)",
            matches.len() - MAX_RENDERED_MATCHES
        ));
    }

    Ok(sections.join("\n\n"))
}

pub fn list_definitions(ctx: &SecurityContext, args: &Value) -> Result<String, ToolError> {
    let candidate = required_str(args, "path")?;
    let path = resolve_path(ctx, candidate)?;
    let content = read_text(&path, candidate)?;
    let language = Language::from_path(&path);

    let index = match FileIndex::parse(&content, language) {
        Ok(index) => index,
        Err(StructuralError::GrammarUnavailable(lang)) => {
            // Exploration tool: degrade with a note, never a failure.
            return Ok(format!(
                "No grammar available for '{candidate}' (language: {lang}); definitions cannot be listed. Use search_code or read_file instead."
            ));
        }
        Err(e) => return Err(ToolError::internal(e.to_string())),
    };

    if index.declarations().is_empty() {
        return Ok(format!("No definitions found in '{candidate}'"));
    }

    let mut lines = vec![format!(
        "{} definitions in '{candidate}':",
        index.declarations().len()
    )];
    for decl in index.declarations() {
        lines.push(render_declaration(decl));
    }
    Ok(lines.join("\n"))
}

fn render_declaration(decl: &Declaration) -> String {
    let indent = if decl.parent.is_some() { "  " } else { "" };
    let mut out = String::new();
    if let Some(doc) = &decl.doc_comment {
        for doc_line in doc.lines() {
            out.push_str(indent);
            out.push_str(doc_line);
            out.push('\n');
        }
    }
    out.push_str(&format!(
        "{indent}{}  [{} lines {}-{}]",
        decl.signature,
        decl.kind.as_str(),
        decl.start_line,
        decl.end_line
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> (tempfile::TempDir, SecurityContext) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("nested.py"),
            "def outer():\n    def inner():\n        x = 1\n    return inner\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("shapes.py"),
            "class Shape:\n    \"\"\"Base.\"\"\"\n    def area(self):\n        pass\n\n    def name(self):\n        pass\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "plain text here\n").unwrap();
        let ctx = SecurityContext::new(dir.path()).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_search_reports_innermost_context() {
        let (_dir, ctx) = fixture();
        let out = search_code(&ctx, &json!({"path": "nested.py", "pattern": "x"})).unwrap();
        assert!(out.contains("in function 'inner'"));
        assert!(out.contains("lines 2-3"));
        assert!(!out.contains("note: no syntax context"));
    }

    #[test]
    fn test_search_zero_matches_is_explicit() {
        let (_dir, ctx) = fixture();
        let out = search_code(&ctx, &json!({"path": "nested.py", "pattern": "zzz"})).unwrap();
        assert!(out.contains("No matches"));
    }

    #[test]
    fn test_search_fallback_is_flagged() {
        let (_dir, ctx) = fixture();
        let out = search_code(&ctx, &json!({"path": "README.md", "pattern": "plain"})).unwrap();
        assert!(out.contains("note: no syntax context"));
        assert!(out.contains("README.md:1"));
    }

    #[test]
    fn test_list_definitions_ordered_with_methods() {
        let (_dir, ctx) = fixture();
        let out = list_definitions(&ctx, &json!({"path": "shapes.py"})).unwrap();
        assert!(out.contains("3 definitions"));
        let class_pos = out.find("class Shape").unwrap();
        let area_pos = out.find("def area(self)").unwrap();
        let name_pos = out.find("def name(self)").unwrap();
        assert!(class_pos < area_pos && area_pos < name_pos);
        // Bodies are never included.
        assert!(!out.contains("pass"));
    }

    #[test]
    fn test_list_definitions_no_grammar_is_note() {
        let (_dir, ctx) = fixture();
        let out = list_definitions(&ctx, &json!({"path": "README.md"})).unwrap();
        assert!(out.contains("No grammar available"));
    }

    #[test]
    fn test_sandbox_applies_to_code_tools() {
        let (_dir, ctx) = fixture();
        assert!(matches!(
            search_code(&ctx, &json!({"path": "../etc/passwd", "pattern": "root"})),
            Err(ToolError::PathEscape { .. })
        ));
    }
}
