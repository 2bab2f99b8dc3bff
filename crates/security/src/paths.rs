use std::path::Path;

/// Render a jailed path relative to the project root with forward slashes,
/// for display in tool output.
pub fn normalize_relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let rel = rel.to_string_lossy().into_owned();
    Some(rel.replace('\\', "/"))
}
