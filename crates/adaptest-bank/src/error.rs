//! Item-bank error types.

use adaptest_core::item::ItemId;
use thiserror::Error;

/// Errors raised while assembling or querying an item bank.
#[derive(Debug, Error)]
pub enum BankError {
    /// The same question id appears twice across the loaded bank files.
    #[error("duplicate question id {id} (in '{first}' and '{second}')")]
    DuplicateQuestion {
        id: ItemId,
        first: String,
        second: String,
    },

    /// No question with this id is loaded.
    #[error("unknown question: {0}")]
    UnknownQuestion(ItemId),

    /// The chosen option index does not exist for the question.
    #[error("answer index {index} is out of range for question {id} ({options} options)")]
    AnswerOutOfRange {
        id: ItemId,
        index: usize,
        options: usize,
    },
}
