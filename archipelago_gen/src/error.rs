// Error type for the generation pipeline.
//
// Only conditions that abort a run are errors: assets that fail to resolve
// before generation starts, grammar strings that turn out to be malformed
// mid-interpretation, and I/O or JSON failures at the edges (config files,
// asset libraries, CLI output). Missing grammar symbols are *not* errors;
// they expand to a blank no-op (see `grammar.rs`). Misuse of low-level
// primitives (priority-queue indices, negative edge weights) panics instead,
// since it can only come from a bug in the caller.

use thiserror::Error;

pub type GenResult<T> = Result<T, GenError>;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("mesh asset `{name}` is not available")]
    MissingAsset { name: String },

    #[error("mesh asset `{name}` is malformed: {reason}")]
    InvalidAsset { name: String, reason: String },

    /// A `]` (or bridge `)`) would pop the root turtle frame.
    #[error("unbalanced pop at symbol {position}: the root turtle frame cannot be popped")]
    UnbalancedPop { position: usize },

    /// A bridge symbol asked for a bridge index past the end of the list.
    #[error("bridge index {depth} out of range ({available} bridges)")]
    MissingBridge { depth: usize, available: usize },

    /// An island symbol asked for a site index past the end of the list.
    #[error("island index {depth} out of range ({available} land sites)")]
    MissingSite { depth: usize, available: usize },

    /// The program ended with `[` or `(` frames still pushed.
    #[error("program ended with {open} turtle frame(s) still open")]
    UnclosedFrames { open: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
