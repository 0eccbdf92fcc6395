//! Error kinds, `spec.md` §7.
//!
//! The teacher's own save-state code
//! (`examples/ajoneil-missingno/core/src/game_boy/save_state/mod.rs`) gets
//! away with a bare `Result<_, String>`, but the
//! wider example pack (`freddiehaddad-oxidized`, `MrGunflame-big-gaming`,
//! `londey-pico-gs`) universally reaches for `thiserror` for this, so we
//! follow the pack here rather than the teacher's one under-engineered
//! corner.

use thiserror::Error;

/// Preprocessing failure (`spec.md` §7: "bad image dimensions, unreadable
/// header"). `InvalidPlacement` is deliberately *not* a variant here —
/// per `spec.md` §7 it downgrades the offending pixel in place and
/// preprocessing still succeeds.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("malformed image {width}x{height}: {reason}")]
    MalformedInput {
        width: usize,
        height: usize,
        reason: &'static str,
    },
}

/// Assembly failure, surfaced with a line number as `spec.md` §7 requires.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: unresolved symbol '{symbol}'")]
    UnresolvedSymbol { line: usize, symbol: String },
}
