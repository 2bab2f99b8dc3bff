use thiserror::Error;

/// Result type for structural-index operations
pub type Result<T> = std::result::Result<T, StructuralError>;

/// Errors that can occur while building a file's syntax index
#[derive(Error, Debug)]
pub enum StructuralError {
    /// No grammar is available for this language
    #[error("no grammar available for language: {0}")]
    GrammarUnavailable(String),

    /// Tree-sitter failed to produce a tree
    #[error("parse error: {0}")]
    ParseError(String),
}

impl StructuralError {
    pub fn grammar_unavailable(lang: impl Into<String>) -> Self {
        Self::GrammarUnavailable(lang.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}
