//! # Brain Security
//!
//! Path jailing and output budgeting for agent-facing tools.
//!
//! Every filesystem path a model supplies goes through [`SecurityContext::resolve`]
//! before any I/O happens, and every string a tool returns goes through
//! [`clamp`] before it reaches the conversation. The two together are the
//! security boundary of the whole system: a tool that bypasses either is a bug.

mod context;
mod governor;
mod paths;
mod sensitive;

pub use context::{RejectReason, ResolvedPath, SecurityContext, SecurityError};
pub use governor::{clamp, OutputLimits, DEFAULT_LIMITS};
pub use paths::normalize_relative_path;
pub use sensitive::is_sensitive_name;
