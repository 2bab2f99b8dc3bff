//! Read-only repository queries.
//!
//! The four permitted operations are a closed enum; argv is built from the
//! variant, never from model-supplied command strings, so no invocation shape
//! can write, commit, or rewrite history. Timeouts kill the child process
//! (`kill_on_drop`) before the error is surfaced.

use crate::args::{optional_bool, optional_str, optional_usize, resolve_path};
use crate::error::ToolError;
use brain_security::{normalize_relative_path, SecurityContext};
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Commits returned by `repo_log` are capped regardless of what was asked.
const MAX_LOG_COUNT: usize = 50;

/// The only repository queries this system can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RepoQuery {
    Status,
    Log { count: usize },
    Diff { staged: bool, path: Option<String> },
    ChangedFiles { staged: bool },
    UntrackedFiles,
}

impl RepoQuery {
    fn argv(&self) -> Vec<String> {
        match self {
            RepoQuery::Status => {
                vec!["status".into(), "--short".into(), "--branch".into()]
            }
            RepoQuery::Log { count } => {
                vec![
                    "log".into(),
                    format!("-{}", (*count).min(MAX_LOG_COUNT)),
                    "--oneline".into(),
                ]
            }
            RepoQuery::Diff { staged, path } => {
                let mut argv = vec!["diff".into()];
                if *staged {
                    argv.push("--cached".into());
                }
                if let Some(path) = path {
                    argv.push("--".into());
                    argv.push(path.clone());
                }
                argv
            }
            RepoQuery::ChangedFiles { staged } => {
                let mut argv = vec!["diff".into()];
                if *staged {
                    argv.push("--cached".into());
                }
                argv.push("--name-only".into());
                argv.push("--diff-filter=ACMR".into());
                argv
            }
            RepoQuery::UntrackedFiles => {
                vec![
                    "ls-files".into(),
                    "--others".into(),
                    "--exclude-standard".into(),
                ]
            }
        }
    }
}

pub async fn status(ctx: &SecurityContext) -> Result<String, ToolError> {
    let out = run_git(ctx, RepoQuery::Status).await?;
    if out.trim().is_empty() {
        return Ok("Working tree clean".to_string());
    }
    Ok(out)
}

pub async fn log(ctx: &SecurityContext, args: &Value) -> Result<String, ToolError> {
    let count = optional_usize(args, "count")?.unwrap_or(10).max(1);
    let out = run_git(ctx, RepoQuery::Log { count }).await?;
    if out.trim().is_empty() {
        return Ok("No commits found".to_string());
    }
    Ok(out)
}

pub async fn diff(ctx: &SecurityContext, args: &Value) -> Result<String, ToolError> {
    let staged = optional_bool(args, "staged")?.unwrap_or(false);

    // A path filter is still a path-shaped argument: jail it first, then hand
    // git the root-relative form.
    let path = match optional_str(args, "path") {
        Some(candidate) => {
            let resolved = resolve_path(ctx, candidate)?;
            Some(
                normalize_relative_path(ctx.root(), &resolved)
                    .unwrap_or_else(|| candidate.to_string()),
            )
        }
        None => None,
    };

    let out = run_git(ctx, RepoQuery::Diff { staged, path }).await?;
    if out.trim().is_empty() {
        let scope = if staged { "staged" } else { "unstaged" };
        return Ok(format!("No changes found ({scope})"));
    }
    Ok(out)
}

pub async fn changed_files(ctx: &SecurityContext, args: &Value) -> Result<String, ToolError> {
    let staged = optional_bool(args, "staged")?.unwrap_or(false);
    let include_untracked = optional_bool(args, "include_untracked")?.unwrap_or(false);

    let out = run_git(ctx, RepoQuery::ChangedFiles { staged }).await?;
    let mut files: Vec<String> = out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if include_untracked {
        let untracked = run_git(ctx, RepoQuery::UntrackedFiles).await?;
        files.extend(
            untracked
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }

    files.sort();
    files.dedup();

    if files.is_empty() {
        return Ok("No changed files found".to_string());
    }
    Ok(files.join("\n"))
}

async fn run_git(ctx: &SecurityContext, query: RepoQuery) -> Result<String, ToolError> {
    let argv = query.argv();
    log::debug!("git {}", argv.join(" "));

    let mut command = Command::new("git");
    command
        .args(&argv)
        .current_dir(ctx.root())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(GIT_TIMEOUT, command.output()).await {
        Err(_) => {
            // Dropping the future kills the child before we report.
            return Err(ToolError::Timeout {
                command: format!("git {}", argv[0]),
                seconds: GIT_TIMEOUT.as_secs(),
            });
        }
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ToolError::internal("git is not installed"));
        }
        Ok(Err(e)) => return Err(ToolError::internal(format!("failed to run git: {e}"))),
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.to_lowercase().contains("not a git repository") {
            return Err(ToolError::NotARepository);
        }
        return Err(ToolError::internal(format!(
            "git {} failed: {}",
            argv[0],
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_argv_shapes_are_read_only() {
        assert_eq!(
            RepoQuery::Status.argv(),
            vec!["status", "--short", "--branch"]
        );
        assert_eq!(RepoQuery::Log { count: 10 }.argv(), vec!["log", "-10", "--oneline"]);
        assert_eq!(
            RepoQuery::Diff { staged: true, path: None }.argv(),
            vec!["diff", "--cached"]
        );
        assert_eq!(
            RepoQuery::ChangedFiles { staged: false }.argv(),
            vec!["diff", "--name-only", "--diff-filter=ACMR"]
        );
    }

    #[test]
    fn test_log_count_is_capped() {
        assert_eq!(
            RepoQuery::Log { count: 9_999 }.argv()[1],
            format!("-{MAX_LOG_COUNT}")
        );
    }

    #[tokio::test]
    async fn test_non_repository_is_typed_result() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = SecurityContext::new(dir.path()).unwrap();
        match status(&ctx).await {
            Err(ToolError::NotARepository) => {}
            other => panic!("expected NotARepository, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_diff_path_is_jailed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = SecurityContext::new(dir.path()).unwrap();
        assert!(matches!(
            diff(&ctx, &json!({"path": "/etc/passwd"})).await,
            Err(ToolError::PathEscape { .. })
        ));
    }
}
