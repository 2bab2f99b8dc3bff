use crate::error::{Result, StructuralError};
use crate::language::Language;
use serde::Serialize;
use tree_sitter::{Node, Parser};

/// Kind of a named, boundable unit of code structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Trait,
    Interface,
    Impl,
    Module,
    Const,
}

impl DeclarationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Function => "function",
            DeclarationKind::Method => "method",
            DeclarationKind::Class => "class",
            DeclarationKind::Struct => "struct",
            DeclarationKind::Enum => "enum",
            DeclarationKind::Trait => "trait",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Impl => "impl",
            DeclarationKind::Module => "module",
            DeclarationKind::Const => "const",
        }
    }
}

/// A declaration exposed by the structural index.
///
/// `signature` stops before the body; `parent` is the name of the enclosing
/// declaration, used only for display and enclosing-context lookups.
#[derive(Debug, Clone, Serialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    pub signature: String,
    pub doc_comment: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub parent: Option<String>,
}

impl Declaration {
    /// Whether a 1-based line falls inside this declaration's source range
    pub fn covers(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

/// Syntax-tree index over a single file, built fresh per tool call.
pub struct FileIndex {
    declarations: Vec<Declaration>,
}

impl FileIndex {
    /// Parse file content and collect declarations in source order
    /// (pre-order over nesting).
    pub fn parse(content: &str, language: Language) -> Result<Self> {
        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| StructuralError::parse(format!("failed to set language: {e}")))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| StructuralError::parse("parser produced no tree"))?;

        let mut declarations = Vec::new();
        collect(content, language, tree.root_node(), None, &mut declarations);
        Ok(Self { declarations })
    }

    /// All declarations, top-to-bottom, nested included
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// The innermost declaration covering a 1-based line, if any.
    ///
    /// Pre-order guarantees ancestors precede descendants and siblings never
    /// overlap, so the last covering declaration is the innermost one.
    pub fn enclosing(&self, line: usize) -> Option<&Declaration> {
        self.declarations.iter().filter(|d| d.covers(line)).last()
    }
}

fn classify(
    language: Language,
    node_kind: &str,
    parent: Option<DeclarationKind>,
) -> Option<DeclarationKind> {
    let inside_type = matches!(
        parent,
        Some(
            DeclarationKind::Class
                | DeclarationKind::Struct
                | DeclarationKind::Trait
                | DeclarationKind::Interface
                | DeclarationKind::Impl
        )
    );

    match language {
        Language::Rust => match node_kind {
            "function_item" => Some(if inside_type {
                DeclarationKind::Method
            } else {
                DeclarationKind::Function
            }),
            "struct_item" => Some(DeclarationKind::Struct),
            "enum_item" => Some(DeclarationKind::Enum),
            "trait_item" => Some(DeclarationKind::Trait),
            "impl_item" => Some(DeclarationKind::Impl),
            "mod_item" => Some(DeclarationKind::Module),
            "const_item" | "static_item" => Some(DeclarationKind::Const),
            _ => None,
        },
        Language::Python => match node_kind {
            "function_definition" => Some(if inside_type {
                DeclarationKind::Method
            } else {
                DeclarationKind::Function
            }),
            "class_definition" => Some(DeclarationKind::Class),
            _ => None,
        },
        Language::JavaScript | Language::TypeScript => match node_kind {
            "function_declaration" | "generator_function_declaration" => {
                Some(DeclarationKind::Function)
            }
            "class_declaration" | "abstract_class_declaration" => Some(DeclarationKind::Class),
            "method_definition" => Some(DeclarationKind::Method),
            "interface_declaration" => Some(DeclarationKind::Interface),
            "enum_declaration" => Some(DeclarationKind::Enum),
            _ => None,
        },
        _ => None,
    }
}

/// Recursive pre-order walk. Declaration nodes are recorded and then descended
/// into (so nested functions and methods are found); everything else is just
/// descended into with the current parent unchanged.
fn collect(
    content: &str,
    language: Language,
    node: Node,
    parent: Option<(&str, DeclarationKind)>,
    out: &mut Vec<Declaration>,
) {
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();

    for child in children {
        if let Some(kind) = classify(language, child.kind(), parent.map(|(_, k)| k)) {
            let name = node_name(content, child).unwrap_or_else(|| "<anonymous>".to_string());
            out.push(Declaration {
                kind,
                name: name.clone(),
                signature: node_signature(content, child),
                doc_comment: doc_comment_above(content, language, child),
                start_line: child.start_position().row + 1,
                end_line: child.end_position().row + 1,
                parent: parent.map(|(n, _)| n.to_string()),
            });
            collect(content, language, child, Some((name.as_str(), kind)), out);
        } else {
            collect(content, language, child, parent, out);
        }
    }
}

/// Extract the declared name from a node's direct children, descending one
/// level into generic or qualified type wrappers (`impl<T> Stack<T>`,
/// `impl module::Thing`).
fn node_name(content: &str, node: Node) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" | "name" | "type_identifier" | "field_identifier"
            | "property_identifier" => {
                return Some(node_text(content, child).to_string());
            }
            "generic_type" | "scoped_type_identifier" => {
                let mut inner = child.walk();
                for grandchild in child.children(&mut inner) {
                    if grandchild.kind() == "type_identifier" {
                        return Some(node_text(content, grandchild).to_string());
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Declaration text up to (not including) the body, whitespace-collapsed.
fn node_signature(content: &str, node: Node) -> String {
    let sig_end = node
        .child_by_field_name("body")
        .map(|body| body.start_byte())
        .unwrap_or(node.end_byte());

    let raw = &content[node.start_byte()..sig_end];
    let first_chunk = if node.child_by_field_name("body").is_some() {
        raw
    } else {
        // No body node (e.g. const items): keep the first line only.
        raw.lines().next().unwrap_or(raw)
    };

    let collapsed = first_chunk.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches(':').trim().to_string()
}

/// Backward scan for doc comments immediately above the declaration.
/// Comments are not part of the syntax tree, so this is text-based.
fn doc_comment_above(content: &str, language: Language, node: Node) -> Option<String> {
    let prefixes = language.doc_prefixes();
    if prefixes.is_empty() {
        return None;
    }

    let node_start_line = node.start_position().row;
    let lines: Vec<&str> = content.lines().collect();
    if node_start_line == 0 || node_start_line >= lines.len() {
        return None;
    }

    let mut doc_lines = Vec::new();
    let mut idx = node_start_line;
    while idx > 0 {
        idx -= 1;
        let line = lines[idx].trim();
        if prefixes.iter().any(|p| line.starts_with(p)) {
            doc_lines.push(line);
        } else if !line.is_empty() {
            break;
        }
    }

    if doc_lines.is_empty() {
        return None;
    }
    doc_lines.reverse();
    Some(doc_lines.join("\n"))
}

fn node_text<'a>(content: &'a str, node: Node) -> &'a str {
    &content[node.start_byte()..node.end_byte()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rust_top_level_declarations() {
        let code = r#"
/// Adds numbers.
fn add(a: i32, b: i32) -> i32 {
    a + b
}

struct Point {
    x: i32,
    y: i32,
}
"#;
        let index = FileIndex::parse(code, Language::Rust).unwrap();
        let decls = index.declarations();
        assert_eq!(decls.len(), 2);

        assert_eq!(decls[0].kind, DeclarationKind::Function);
        assert_eq!(decls[0].name, "add");
        assert_eq!(decls[0].signature, "fn add(a: i32, b: i32) -> i32");
        assert_eq!(decls[0].doc_comment.as_deref(), Some("/// Adds numbers."));
        assert!(decls[0].signature.find('{').is_none());

        assert_eq!(decls[1].kind, DeclarationKind::Struct);
        assert_eq!(decls[1].name, "Point");
    }

    #[test]
    fn test_rust_impl_methods_have_parent() {
        let code = r#"
struct Stack;

impl Stack {
    fn push(&mut self) {}
    fn pop(&mut self) {}
}
"#;
        let index = FileIndex::parse(code, Language::Rust).unwrap();
        let decls = index.declarations();

        let push = decls.iter().find(|d| d.name == "push").unwrap();
        assert_eq!(push.kind, DeclarationKind::Method);
        assert_eq!(push.parent.as_deref(), Some("Stack"));
    }

    #[test]
    fn test_python_class_with_methods_in_order() {
        let code = r#"
class Greeter:
    def hello(self):
        pass

    def goodbye(self):
        pass
"#;
        let index = FileIndex::parse(code, Language::Python).unwrap();
        let decls = index.declarations();
        assert_eq!(decls.len(), 3);
        assert_eq!(decls[0].name, "Greeter");
        assert_eq!(decls[0].kind, DeclarationKind::Class);
        assert_eq!(decls[1].name, "hello");
        assert_eq!(decls[1].kind, DeclarationKind::Method);
        assert_eq!(decls[2].name, "goodbye");
        assert_eq!(decls[1].parent.as_deref(), Some("Greeter"));
    }

    #[test]
    fn test_nested_function_enclosing_lookup() {
        let code = "def outer():\n    def inner():\n        x = 1\n    return inner\n";
        let index = FileIndex::parse(code, Language::Python).unwrap();

        // Line 3 (`x = 1`) is inside both; innermost wins.
        let enclosing = index.enclosing(3).unwrap();
        assert_eq!(enclosing.name, "inner");
        assert_eq!(enclosing.start_line, 2);
        assert_eq!(enclosing.end_line, 3);

        // Line 4 (`return inner`) is only inside outer.
        assert_eq!(index.enclosing(4).unwrap().name, "outer");
    }

    #[test]
    fn test_enclosing_outside_any_declaration() {
        let code = "import os\n\ndef f():\n    pass\n";
        let index = FileIndex::parse(code, Language::Python).unwrap();
        assert!(index.enclosing(1).is_none());
    }

    #[test]
    fn test_signatures_exclude_bodies() {
        let code = "def compute(a, b):\n    total = a + b\n    return total\n";
        let index = FileIndex::parse(code, Language::Python).unwrap();
        let decl = &index.declarations()[0];
        assert_eq!(decl.signature, "def compute(a, b)");
        assert!(!decl.signature.contains("total"));
    }

    #[test]
    fn test_typescript_interface_and_class() {
        let code = r#"
interface Shape {
    area(): number;
}

class Circle {
    area(): number { return 0; }
}
"#;
        let index = FileIndex::parse(code, Language::TypeScript).unwrap();
        let decls = index.declarations();

        assert_eq!(decls[0].kind, DeclarationKind::Interface);
        assert_eq!(decls[0].name, "Shape");
        let method = decls.iter().find(|d| d.name == "area" && d.parent.as_deref() == Some("Circle"));
        assert!(method.is_some());
    }

    #[test]
    fn test_generic_impl_target_name() {
        let code = "struct Holder<T>(T);\n\nimpl<T> Holder<T> {\n    fn get(&self) {}\n}\n";
        let index = FileIndex::parse(code, Language::Rust).unwrap();
        let imp = index
            .declarations()
            .iter()
            .find(|d| d.kind == DeclarationKind::Impl)
            .unwrap();
        assert_eq!(imp.name, "Holder");
    }

    #[test]
    fn test_no_grammar_is_typed_error() {
        assert!(matches!(
            FileIndex::parse("# heading\n", Language::Markdown),
            Err(StructuralError::GrammarUnavailable(_))
        ));
    }
}
