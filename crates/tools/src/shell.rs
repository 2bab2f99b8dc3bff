//! `run_command`: allow/deny-listed shell execution for read-mostly commands.
//!
//! Commands run with an argv built by whitespace splitting inside the project
//! root; pipes, redirection, substitution, and quoting are rejected outright
//! rather than interpreted, so the deny-list cannot be smuggled past through
//! a shell.

use crate::args::{optional_usize, required_str};
use crate::error::ToolError;
use brain_security::SecurityContext;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Commands considered safe to run without a second look.
const ALLOWED_COMMANDS: &[&str] = &[
    // File inspection
    "cat", "head", "tail", "wc", "file", "stat",
    // Search
    "grep", "find", "rg", "fd",
    // Directory
    "ls", "tree", "pwd",
    // Text processing
    "sort", "uniq", "cut", "awk", "sed",
    // Development
    "cargo", "npm", "pip", "python", "node", "rustc", "make",
    // Version control (repo_* tools cover the common cases)
    "git",
    // System info
    "which", "whoami", "date", "echo",
];

/// Commands that are never run, whatever the arguments.
const BLOCKED_COMMANDS: &[&str] = &[
    // Destructive file ops
    "rm", "rmdir", "mv", "cp", "dd", "mkfs", "fdisk",
    // Privilege escalation
    "sudo", "su", "chmod", "chown",
    // Network
    "curl", "wget", "ssh", "scp", "nc",
    // Process / system control
    "kill", "pkill", "killall", "shutdown", "reboot",
    // Shell re-entry
    "sh", "bash", "zsh", "eval", "exec", "source",
];

const METACHARACTERS: &[&str] = &[";", "&&", "||", "|", ">", "<", "`", "$(", "${", "\"", "'"];

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 120;

pub async fn run_command(ctx: &SecurityContext, args: &Value) -> Result<String, ToolError> {
    let command = required_str(args, "command")?;

    for meta in METACHARACTERS {
        if command.contains(meta) {
            return Err(ToolError::invalid_argument(
                "command",
                format!("shell metacharacter '{meta}' not allowed; run one command at a time without piping or quoting"),
            ));
        }
    }

    let parts: Vec<&str> = command.split_whitespace().collect();
    let Some(&program) = parts.first() else {
        return Err(ToolError::invalid_argument("command", "empty command"));
    };

    let base = program.rsplit('/').next().unwrap_or(program);
    if BLOCKED_COMMANDS.contains(&base) {
        return Err(ToolError::CommandBlocked(base.to_string()));
    }
    if !ALLOWED_COMMANDS.contains(&base) {
        log::warn!("running command outside the allow-list: {base}");
    }

    let timeout_secs = optional_usize(args, "timeout")?
        .map(|t| t as u64)
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
        .clamp(1, MAX_TIMEOUT_SECS);

    let mut command = Command::new(program);
    command
        .args(&parts[1..])
        .current_dir(ctx.root())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), command.output())
        .await
    {
        Err(_) => {
            return Err(ToolError::Timeout {
                command: base.to_string(),
                seconds: timeout_secs,
            });
        }
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ToolError::NotFound {
                path: base.to_string(),
            });
        }
        Ok(Err(e)) => {
            return Err(ToolError::internal(format!("failed to run '{base}': {e}")));
        }
        Ok(Ok(output)) => output,
    };

    let mut out = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        out.push_str(&format!("\n[stderr]: {}", stderr.trim()));
    }
    if let Some(code) = output.status.code() {
        if code != 0 {
            out.push_str(&format!("\n[exit code: {code}]"));
        }
    }

    if out.trim().is_empty() {
        return Ok("(no output)".to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> (tempfile::TempDir, SecurityContext) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hello world\n").unwrap();
        let ctx = SecurityContext::new(dir.path()).unwrap();
        (dir, ctx)
    }

    #[tokio::test]
    async fn test_blocked_command_rejected() {
        let (_dir, ctx) = fixture();
        assert!(matches!(
            run_command(&ctx, &json!({"command": "rm -rf /"})).await,
            Err(ToolError::CommandBlocked(_))
        ));
        // Full paths don't dodge the deny-list.
        assert!(matches!(
            run_command(&ctx, &json!({"command": "/bin/rm file"})).await,
            Err(ToolError::CommandBlocked(_))
        ));
    }

    #[tokio::test]
    async fn test_metacharacters_rejected() {
        let (_dir, ctx) = fixture();
        for cmd in ["ls | grep foo", "echo hi > out.txt", "ls; rm x", "echo `id`"] {
            assert!(matches!(
                run_command(&ctx, &json!({ "command": cmd })).await,
                Err(ToolError::InvalidArgument { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_runs_in_project_root() {
        let (_dir, ctx) = fixture();
        let out = run_command(&ctx, &json!({"command": "cat hello.txt"})).await.unwrap();
        assert!(out.contains("hello world"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_reported_inline() {
        let (_dir, ctx) = fixture();
        let out = run_command(&ctx, &json!({"command": "cat no_such_file.txt"}))
            .await
            .unwrap();
        assert!(out.contains("[stderr]:"));
        assert!(out.contains("[exit code:"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_typed() {
        let (_dir, ctx) = fixture();
        assert!(matches!(
            run_command(&ctx, &json!({"command": "definitely-not-a-binary-2094"})).await,
            Err(ToolError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let (_dir, ctx) = fixture();
        let start = std::time::Instant::now();
        let result = run_command(&ctx, &json!({"command": "tail -f hello.txt", "timeout": 1})).await;
        assert!(matches!(result, Err(ToolError::Timeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
