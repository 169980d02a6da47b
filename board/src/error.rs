//! Errors surfaced by board commands.
//!
//! Every variant is a rejected request: the engine validates before it
//! mutates, so state is unchanged whenever one of these is returned.

use crate::doc::ItemId;

/// Error returned by the user-facing board commands.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoardError {
    /// Item scale factor outside the open interval `(0.1, 10)`.
    #[error("invalid scale {requested}: enter a number between 0.1 and 10 (exclusive)")]
    InvalidScale { requested: f64 },
    /// Canvas height below the fixed content plus headroom.
    #[error("invalid canvas height {requested}: minimum is {minimum}px")]
    InvalidHeight { requested: f64, minimum: f64 },
    /// No item with this id exists.
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),
}
