use brain_security::RejectReason;
use thiserror::Error;

/// Everything that can go wrong inside a tool.
///
/// None of these abort the run: the dispatcher converts them into
/// error-flagged tool results and the model is expected to adapt.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Access denied: '{path}' is outside the project root")]
    PathEscape { path: String },

    #[error("Access denied: '{path}' matches a blocked sensitive-file pattern")]
    SensitiveFile { path: String },

    #[error("Invalid path '{path}': a parent directory cannot be resolved")]
    MissingAncestor { path: String },

    #[error("'{path}' not found")]
    NotFound { path: String },

    #[error("'{path}' is not a file")]
    NotAFile { path: String },

    #[error("'{path}' is not a directory")]
    NotADirectory { path: String },

    #[error("'{path}' is binary; this tool only handles text files")]
    UnsupportedEncoding { path: String },

    #[error("missing required argument '{0}'")]
    MissingArgument(&'static str),

    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("not a git repository")]
    NotARepository,

    #[error("command '{0}' is not allowed for safety reasons")]
    CommandBlocked(String),

    #[error("'{command}' timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("tool error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Map a boundary-enforcer rejection onto the taxonomy.
    pub fn from_rejection(reason: RejectReason, candidate: &str) -> Self {
        let path = candidate.to_string();
        match reason {
            RejectReason::EscapesRoot => ToolError::PathEscape { path },
            RejectReason::SensitiveFile => ToolError::SensitiveFile { path },
            RejectReason::MissingAncestor => ToolError::MissingAncestor { path },
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}
