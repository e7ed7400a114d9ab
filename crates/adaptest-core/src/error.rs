//! Engine error types.
//!
//! Every fallible engine operation returns a [`CatError`]. Callers that front
//! the engine with a transport (HTTP, RPC, CLI) use [`CatError::kind`] to map
//! errors onto their own status codes without string matching.

use thiserror::Error;

use crate::item::ItemId;

/// Errors produced by the adaptive-testing engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatError {
    /// Two items in one pool share an id.
    #[error("duplicate item id: {0}")]
    DuplicateItem(ItemId),

    /// An item's 3PL parameters are out of range.
    #[error("invalid parameters for item {item_id}: {reason}")]
    InvalidParameter { item_id: ItemId, reason: String },

    /// A prior with a non-positive or non-finite variance, or a non-finite mean.
    #[error("invalid prior: {0}")]
    InvalidPrior(String),

    /// A malformed session scope (unknown or empty skill names).
    #[error("invalid scope: {0}")]
    InvalidScope(String),

    /// An item cap outside the accepted range.
    #[error("invalid item cap {requested}: must be between 1 and {cap}")]
    InvalidItemCap { requested: usize, cap: usize },

    /// A skill name registered twice.
    #[error("duplicate skill: {0}")]
    DuplicateSkill(String),

    /// The item is not in the pool (never existed or already administered).
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),

    /// The skill is not part of this model.
    #[error("unknown skill: {0}")]
    UnknownSkill(String),

    /// No session with this id exists.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// An answer that does not match the item currently presented.
    #[error("out-of-sequence answer: {0}")]
    Sequencing(String),

    /// Any call against a session that already reached FINISHED.
    #[error("session {0} is already finished")]
    AlreadyFinished(String),

    /// The MAP optimizer did not reach its tolerance.
    #[error("estimator did not converge after {iterations} iterations (bracket width {width:e})")]
    NonConvergence { iterations: u32, width: f64 },
}

/// Coarse classification of [`CatError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    UnknownEntity,
    Sequencing,
    Numeric,
}

impl CatError {
    /// Returns the error family this variant belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatError::DuplicateItem(_)
            | CatError::InvalidParameter { .. }
            | CatError::InvalidPrior(_)
            | CatError::InvalidScope(_)
            | CatError::InvalidItemCap { .. }
            | CatError::DuplicateSkill(_) => ErrorKind::Validation,
            CatError::UnknownItem(_)
            | CatError::UnknownSkill(_)
            | CatError::SessionNotFound(_) => ErrorKind::UnknownEntity,
            CatError::Sequencing(_) | CatError::AlreadyFinished(_) => ErrorKind::Sequencing,
            CatError::NonConvergence { .. } => ErrorKind::Numeric,
        }
    }
}

/// Convenience alias used across the engine.
pub type CatResult<T> = Result<T, CatError>;
