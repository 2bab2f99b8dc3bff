//! Argument extraction from the model's tool-call JSON.
//!
//! Local models are loose with argument types (numbers arrive as strings,
//! booleans as "true"), so the numeric and boolean getters accept both forms.

use crate::error::ToolError;
use brain_security::{ResolvedPath, SecurityContext};
use serde_json::Value;
use std::path::PathBuf;

pub fn required_str<'a>(args: &'a Value, name: &'static str) -> Result<&'a str, ToolError> {
    optional_str(args, name).ok_or(ToolError::MissingArgument(name))
}

pub fn optional_str<'a>(args: &'a Value, name: &'static str) -> Option<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn optional_usize(args: &Value, name: &'static str) -> Result<Option<usize>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| ToolError::invalid_argument(name, "expected a non-negative integer")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ToolError::invalid_argument(name, "expected a non-negative integer")),
        Some(other) => Err(ToolError::invalid_argument(
            name,
            format!("expected an integer, got {other}"),
        )),
    }
}

pub fn optional_bool(args: &Value, name: &'static str) -> Result<Option<bool>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(ToolError::invalid_argument(name, "expected true or false")),
        },
        Some(other) => Err(ToolError::invalid_argument(
            name,
            format!("expected a boolean, got {other}"),
        )),
    }
}

/// Resolve a path argument through the boundary enforcer. This is the single
/// entry point every path-accepting tool uses; there is no other way for an
/// argument to become a filesystem path.
pub fn resolve_path(ctx: &SecurityContext, candidate: &str) -> Result<PathBuf, ToolError> {
    match ctx.resolve(candidate) {
        ResolvedPath::InsideRoot(path) => Ok(path),
        ResolvedPath::Rejected(reason) => Err(ToolError::from_rejection(reason, candidate)),
    }
}
