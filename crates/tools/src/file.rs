//! Read-only filesystem tools: `read_file`, `list_directory`, `file_info`.

use crate::args::{optional_str, optional_usize, required_str, resolve_path};
use crate::error::ToolError;
use brain_security::{normalize_relative_path, SecurityContext};
use brain_structural::Language;
use chrono::{DateTime, Local};
use globset::Glob;
use serde_json::Value;
use std::path::Path;

/// Directories skipped in listings: build output and package caches add noise
/// without telling the model anything about the source tree.
const EXCLUDED_DIRS: &[&str] = &["node_modules", "target", "__pycache__", ".venv", "venv"];

const MAX_ENTRIES: usize = 100;

/// How many leading bytes are checked for NUL when sniffing binary content.
const BINARY_SNIFF_BYTES: usize = 8_192;

pub fn read_file(ctx: &SecurityContext, args: &Value) -> Result<String, ToolError> {
    let candidate = required_str(args, "path")?;
    let path = resolve_path(ctx, candidate)?;

    let metadata = std::fs::metadata(&path).map_err(|_| ToolError::NotFound {
        path: candidate.to_string(),
    })?;
    if !metadata.is_file() {
        return Err(ToolError::NotAFile {
            path: candidate.to_string(),
        });
    }

    let content = read_text(&path, candidate)?;

    let start_line = optional_usize(args, "start_line")?.unwrap_or(1).max(1);
    let max_lines = optional_usize(args, "max_lines")?;

    if start_line == 1 && max_lines.is_none() {
        return Ok(content);
    }

    let total = content.lines().count();
    if start_line > total {
        return Ok(format!(
            "'{candidate}' has only {total} lines (requested start_line {start_line})"
        ));
    }

    let window: Vec<&str> = content
        .lines()
        .skip(start_line - 1)
        .take(max_lines.unwrap_or(usize::MAX))
        .collect();
    Ok(window.join("\n"))
}

pub fn list_directory(ctx: &SecurityContext, args: &Value) -> Result<String, ToolError> {
    let candidate = optional_str(args, "path").unwrap_or(".");
    let pattern = optional_str(args, "pattern").unwrap_or("*");
    let dir = resolve_path(ctx, candidate)?;

    let metadata = std::fs::metadata(&dir).map_err(|_| ToolError::NotFound {
        path: candidate.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(ToolError::NotADirectory {
            path: candidate.to_string(),
        });
    }

    let glob = Glob::new(pattern)
        .map_err(|e| ToolError::invalid_argument("pattern", e.to_string()))?
        .compile_matcher();

    let mut entries: Vec<(String, bool, u64)> = Vec::new();
    let read_dir = std::fs::read_dir(&dir)
        .map_err(|e| ToolError::internal(format!("failed to list '{candidate}': {e}")))?;
    for entry in read_dir.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || EXCLUDED_DIRS.contains(&name.as_str()) {
            continue;
        }
        if ctx.is_sensitive(&entry.path()) {
            continue;
        }
        if !glob.is_match(&name) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        entries.push((name, meta.is_dir(), meta.len()));
    }

    if entries.is_empty() {
        return Ok(format!("No entries matching '{pattern}' in '{candidate}'"));
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let total = entries.len();
    entries.truncate(MAX_ENTRIES);

    let display_dir = normalize_relative_path(ctx.root(), &dir)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| ".".to_string());

    let mut lines = vec![format!("{display_dir}:")];
    for (name, is_dir, size) in &entries {
        if *is_dir {
            lines.push(format!("{name}/"));
        } else {
            lines.push(format!("{name}  {}", human_size(*size)));
        }
    }
    if total > MAX_ENTRIES {
        lines.push(format!("({} more entries not shown)", total - MAX_ENTRIES));
    }
    Ok(lines.join("\n"))
}

pub fn file_info(ctx: &SecurityContext, args: &Value) -> Result<String, ToolError> {
    let candidate = required_str(args, "path")?;
    let path = resolve_path(ctx, candidate)?;

    // A missing path is a normal negative answer here, unlike read_file.
    let Ok(metadata) = std::fs::metadata(&path) else {
        return Ok(format!("'{candidate}' does not exist"));
    };

    let file_type = if metadata.is_dir() { "directory" } else { "file" };
    let modified = metadata
        .modified()
        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let mut out = format!(
        "Path: {candidate}\nType: {file_type}\nSize: {}\nModified: {modified}",
        human_size(metadata.len())
    );
    if metadata.is_file() {
        let language = Language::from_path(&path);
        if language != Language::Unknown {
            out.push_str(&format!("\nLanguage: {}", language.as_str()));
        }
    }
    Ok(out)
}

/// Read a file as UTF-8 text, rejecting binary content with a typed error
/// instead of returning garbled bytes.
pub(crate) fn read_text(path: &Path, candidate: &str) -> Result<String, ToolError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ToolError::NotFound {
            path: candidate.to_string(),
        },
        _ => ToolError::internal(format!("failed to read '{candidate}': {e}")),
    })?;

    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
    if sniff.contains(&0) {
        return Err(ToolError::UnsupportedEncoding {
            path: candidate.to_string(),
        });
    }

    String::from_utf8(bytes).map_err(|_| ToolError::UnsupportedEncoding {
        path: candidate.to_string(),
    })
}

fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
