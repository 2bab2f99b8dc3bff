use crate::{code, file, repo, shell};
use brain_security::{clamp, SecurityContext, DEFAULT_LIMITS};
use serde_json::{json, Value};

/// Result of one tool invocation, already bounded by the output governor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// The closed set of operations available to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ReadFile,
    ListDirectory,
    FileInfo,
    SearchCode,
    ListDefinitions,
    RepoStatus,
    RepoLog,
    RepoDiff,
    RepoChangedFiles,
    RunCommand,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::ReadFile,
        ToolKind::ListDirectory,
        ToolKind::FileInfo,
        ToolKind::SearchCode,
        ToolKind::ListDefinitions,
        ToolKind::RepoStatus,
        ToolKind::RepoLog,
        ToolKind::RepoDiff,
        ToolKind::RepoChangedFiles,
        ToolKind::RunCommand,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::ReadFile => "read_file",
            ToolKind::ListDirectory => "list_directory",
            ToolKind::FileInfo => "file_info",
            ToolKind::SearchCode => "search_code",
            ToolKind::ListDefinitions => "list_definitions",
            ToolKind::RepoStatus => "repo_status",
            ToolKind::RepoLog => "repo_log",
            ToolKind::RepoDiff => "repo_diff",
            ToolKind::RepoChangedFiles => "repo_changed_files",
            ToolKind::RunCommand => "run_command",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::ReadFile => {
                "Read a text file inside the project, optionally a line range. Large output is truncated; prefer search_code or list_definitions for big files."
            }
            ToolKind::ListDirectory => {
                "List a directory's entries with sizes, filtered by a glob pattern. Hidden and build directories are skipped."
            }
            ToolKind::FileInfo => {
                "Size, modification time, and detected language of a path."
            }
            ToolKind::SearchCode => {
                "Search a file for a pattern; each match is returned together with the full function or class that encloses it."
            }
            ToolKind::ListDefinitions => {
                "List every function, class, and type declared in a file with signatures and doc comments, but no bodies."
            }
            ToolKind::RepoStatus => "Current branch and working-tree status (read-only).",
            ToolKind::RepoLog => "Recent commit history, one line per commit (read-only).",
            ToolKind::RepoDiff => {
                "Unstaged (or staged) changes as a unified diff, optionally for one file (read-only)."
            }
            ToolKind::RepoChangedFiles => {
                "Paths of changed files, optionally including untracked ones (read-only)."
            }
            ToolKind::RunCommand => {
                "Run a single read-only shell command inside the project root. No pipes, redirection, or destructive commands."
            }
        }
    }

    /// JSON Schema for the tool's arguments, in the shape Ollama expects.
    pub fn parameters(self) -> Value {
        match self {
            ToolKind::ReadFile => json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "File path, relative to the project root"},
                    "start_line": {"type": "integer", "description": "First line to return (1-based)"},
                    "max_lines": {"type": "integer", "description": "Maximum number of lines to return"}
                },
                "required": ["path"]
            }),
            ToolKind::ListDirectory => json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Directory path (default: project root)"},
                    "pattern": {"type": "string", "description": "Glob filter on entry names, e.g. *.rs (default: *)"}
                },
                "required": []
            }),
            ToolKind::FileInfo => json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Path to inspect"}
                },
                "required": ["path"]
            }),
            ToolKind::SearchCode => json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "File to search"},
                    "pattern": {"type": "string", "description": "Regex or plain text to look for"},
                    "case_sensitive": {"type": "boolean", "description": "Match case exactly (default: true)"}
                },
                "required": ["path", "pattern"]
            }),
            ToolKind::ListDefinitions => json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Source file to outline"}
                },
                "required": ["path"]
            }),
            ToolKind::RepoStatus => json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            ToolKind::RepoLog => json!({
                "type": "object",
                "properties": {
                    "count": {"type": "integer", "description": "Number of commits to show (default 10, max 50)"}
                },
                "required": []
            }),
            ToolKind::RepoDiff => json!({
                "type": "object",
                "properties": {
                    "staged": {"type": "boolean", "description": "Show staged changes instead of unstaged"},
                    "path": {"type": "string", "description": "Limit the diff to one file"}
                },
                "required": []
            }),
            ToolKind::RepoChangedFiles => json!({
                "type": "object",
                "properties": {
                    "staged": {"type": "boolean", "description": "List staged files instead of modified"},
                    "include_untracked": {"type": "boolean", "description": "Also list untracked files"}
                },
                "required": []
            }),
            ToolKind::RunCommand => json!({
                "type": "object",
                "properties": {
                    "command": {"type": "string", "description": "The command to run, e.g. 'grep -rn TODO src'"},
                    "timeout": {"type": "integer", "description": "Seconds to wait (default 30, max 120)"}
                },
                "required": ["command"]
            }),
        }
    }
}

/// Dispatch one tool call.
///
/// Errors never escape: every [`ToolError`](crate::ToolError) becomes an
/// error-flagged result the model can react to, and success content is
/// clamped to the output budget.
pub async fn execute(kind: ToolKind, ctx: &SecurityContext, args: &Value) -> ToolResult {
    log::debug!("tool {} args={}", kind.name(), args);

    let outcome = match kind {
        ToolKind::ReadFile => file::read_file(ctx, args),
        ToolKind::ListDirectory => file::list_directory(ctx, args),
        ToolKind::FileInfo => file::file_info(ctx, args),
        ToolKind::SearchCode => code::search_code(ctx, args),
        ToolKind::ListDefinitions => code::list_definitions(ctx, args),
        ToolKind::RepoStatus => repo::status(ctx).await,
        ToolKind::RepoLog => repo::log(ctx, args).await,
        ToolKind::RepoDiff => repo::diff(ctx, args).await,
        ToolKind::RepoChangedFiles => repo::changed_files(ctx, args).await,
        ToolKind::RunCommand => shell::run_command(ctx, args).await,
    };

    match outcome {
        Ok(content) => ToolResult::success(clamp(&content, DEFAULT_LIMITS)),
        Err(e) => {
            log::debug!("tool {} failed: {e}", kind.name());
            ToolResult::error(clamp(&e.to_string(), DEFAULT_LIMITS))
        }
    }
}
