use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::sensitive::{component_is_sensitive, component_pair_is_sensitive, is_sensitive_name};

/// Errors raised while constructing a [`SecurityContext`].
///
/// These are setup failures and abort the run; everything that happens to a
/// model-supplied path afterwards is a [`ResolvedPath::Rejected`] value, not
/// an error.
#[derive(Error, Debug)]
pub enum SecurityError {
    #[error("project root '{0}' does not exist or cannot be resolved: {1}")]
    InvalidRoot(String, io::Error),

    #[error("project root '{0}' is not a directory")]
    RootNotADirectory(String),
}

/// Why a candidate path was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The canonical path is not the project root or a descendant of it.
    EscapesRoot,
    /// A component matched the sensitive-name rule set.
    SensitiveFile,
    /// An ancestor directory could not be resolved (broken chain, not just a
    /// missing final target).
    MissingAncestor,
}

/// Outcome of resolving a model-supplied path against the project root.
///
/// Only `InsideRoot` values may reach a filesystem call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    InsideRoot(PathBuf),
    Rejected(RejectReason),
}

impl ResolvedPath {
    pub fn is_inside(&self) -> bool {
        matches!(self, ResolvedPath::InsideRoot(_))
    }
}

/// Immutable jail configuration: one canonical project root plus the
/// sensitive-name rules.
///
/// Constructed once at startup and passed explicitly into every tool call so
/// tests can hold several independent contexts in one process.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    root: PathBuf,
}

impl SecurityContext {
    /// Canonicalize and validate the project root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SecurityError> {
        let raw = root.as_ref();
        let canonical = raw
            .canonicalize()
            .map_err(|e| SecurityError::InvalidRoot(raw.display().to_string(), e))?;
        if !canonical.is_dir() {
            return Err(SecurityError::RootNotADirectory(
                raw.display().to_string(),
            ));
        }
        Ok(Self { root: canonical })
    }

    /// The canonical project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a candidate path and classify it.
    ///
    /// Relative candidates are joined against the root first. Canonicalization
    /// happens before the containment check: the existing prefix of the path
    /// is resolved through the filesystem (following symlinks), the missing
    /// suffix is normalized lexically. A `..` that climbs above the filesystem
    /// root, or a canonical result outside the project root, is an escape.
    pub fn resolve(&self, candidate: impl AsRef<Path>) -> ResolvedPath {
        let candidate = candidate.as_ref();
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };

        let canonical = match canonicalize_allow_missing(&joined) {
            Ok(p) => p,
            Err(reason) => {
                log::debug!("rejected '{}': {:?}", candidate.display(), reason);
                return ResolvedPath::Rejected(reason);
            }
        };

        // Component-wise prefix check; `/repo-extra` must not pass for `/repo`.
        if !canonical.starts_with(&self.root) {
            log::debug!(
                "rejected '{}': resolves to '{}' outside root",
                candidate.display(),
                canonical.display()
            );
            return ResolvedPath::Rejected(RejectReason::EscapesRoot);
        }

        if self.is_sensitive(&canonical) {
            log::debug!("rejected '{}': sensitive file", candidate.display());
            return ResolvedPath::Rejected(RejectReason::SensitiveFile);
        }

        ResolvedPath::InsideRoot(canonical)
    }

    /// Check every component under the root against the sensitive-name rules.
    ///
    /// `path` must already be canonical and inside the root.
    pub fn is_sensitive(&self, path: &Path) -> bool {
        let rel = match path.strip_prefix(&self.root) {
            Ok(rel) => rel,
            Err(_) => return false,
        };

        let mut previous: Option<String> = None;
        for component in rel.components() {
            let name = component.as_os_str().to_string_lossy().into_owned();
            if component_is_sensitive(&name) || is_sensitive_name(&name) {
                return true;
            }
            if let Some(parent) = previous.as_deref() {
                if component_pair_is_sensitive(parent, &name) {
                    return true;
                }
            }
            previous = Some(name);
        }
        false
    }
}

/// Canonicalize a path without requiring the final target to exist.
///
/// The deepest existing prefix is resolved through the filesystem (so
/// symlinks cannot smuggle a path outside the jail); the remaining components
/// are applied lexically. `..` pops the already-resolved parent, which keeps
/// "resolve symlinks before applying parent-dir" semantics.
fn canonicalize_allow_missing(path: &Path) -> Result<PathBuf, RejectReason> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }

    let mut resolved = PathBuf::new();
    let mut missing = false;
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => resolved.push(prefix.as_os_str()),
            Component::RootDir => resolved.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(RejectReason::EscapesRoot);
                }
            }
            Component::Normal(name) => {
                resolved.push(name);
                if !missing {
                    match resolved.canonicalize() {
                        Ok(canonical) => resolved = canonical,
                        Err(e) if e.kind() == io::ErrorKind::NotFound => missing = true,
                        Err(_) => return Err(RejectReason::MissingAncestor),
                    }
                }
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context() -> (tempfile::TempDir, SecurityContext) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
        let ctx = SecurityContext::new(dir.path()).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_relative_path_inside_root() {
        let (_dir, ctx) = context();
        let resolved = ctx.resolve("src/main.rs");
        assert!(resolved.is_inside());
    }

    #[test]
    fn test_absolute_path_inside_root() {
        let (_dir, ctx) = context();
        let abs = ctx.root().join("src/main.rs");
        assert!(ctx.resolve(&abs).is_inside());
    }

    #[test]
    fn test_dotdot_escape_rejected() {
        let (_dir, ctx) = context();
        assert_eq!(
            ctx.resolve("../etc/passwd"),
            ResolvedPath::Rejected(RejectReason::EscapesRoot)
        );
        assert_eq!(
            ctx.resolve("src/../../outside.txt"),
            ResolvedPath::Rejected(RejectReason::EscapesRoot)
        );
    }

    #[test]
    fn test_absolute_escape_rejected() {
        let (_dir, ctx) = context();
        assert_eq!(
            ctx.resolve("/etc/passwd"),
            ResolvedPath::Rejected(RejectReason::EscapesRoot)
        );
    }

    #[test]
    fn test_dotdot_that_stays_inside_is_allowed() {
        let (_dir, ctx) = context();
        assert!(ctx.resolve("src/../src/main.rs").is_inside());
    }

    #[test]
    fn test_missing_target_inside_root_is_allowed() {
        let (_dir, ctx) = context();
        // Tools decide whether a missing file is an error; the jail only
        // cares about containment.
        assert!(ctx.resolve("src/not_yet_written.rs").is_inside());
        assert!(ctx.resolve("no_such_dir/file.txt").is_inside());
    }

    #[test]
    fn test_sensitive_file_rejected() {
        let (dir, ctx) = context();
        std::fs::write(dir.path().join(".env"), "SECRET=1\n").unwrap();
        assert_eq!(
            ctx.resolve(".env"),
            ResolvedPath::Rejected(RejectReason::SensitiveFile)
        );
        // Pattern applies anywhere under the root, existing or not.
        assert_eq!(
            ctx.resolve("config/deploy.pem"),
            ResolvedPath::Rejected(RejectReason::SensitiveFile)
        );
    }

    #[test]
    fn test_git_internals_rejected() {
        let (_dir, ctx) = context();
        assert_eq!(
            ctx.resolve(".git/config"),
            ResolvedPath::Rejected(RejectReason::SensitiveFile)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (dir, ctx) = context();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "hidden").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            dir.path().join("link.txt"),
        )
        .unwrap();

        assert_eq!(
            ctx.resolve("link.txt"),
            ResolvedPath::Rejected(RejectReason::EscapesRoot)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_dir_escape_rejected() {
        let (dir, ctx) = context();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("portal")).unwrap();

        // Even a missing file under the escaping directory is rejected: the
        // existing prefix resolves through the symlink first.
        assert_eq!(
            ctx.resolve("portal/anything.txt"),
            ResolvedPath::Rejected(RejectReason::EscapesRoot)
        );
    }

    #[test]
    fn test_sibling_with_common_prefix_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        let sibling = dir.path().join("project-extra");
        std::fs::create_dir(&root).unwrap();
        std::fs::create_dir(&sibling).unwrap();
        std::fs::write(sibling.join("data.txt"), "x").unwrap();

        let ctx = SecurityContext::new(&root).unwrap();
        assert_eq!(
            ctx.resolve(sibling.join("data.txt")),
            ResolvedPath::Rejected(RejectReason::EscapesRoot)
        );
    }

    #[test]
    fn test_independent_contexts() {
        let (_dir_a, ctx_a) = context();
        let (_dir_b, ctx_b) = context();
        // A path inside one jail is outside the other.
        let inside_a = ctx_a.root().join("src/main.rs");
        assert!(ctx_a.resolve(&inside_a).is_inside());
        assert!(!ctx_b.resolve(&inside_a).is_inside());
    }

    #[test]
    fn test_invalid_root_is_setup_error() {
        assert!(SecurityContext::new("/no/such/root/anywhere").is_err());
    }
}
