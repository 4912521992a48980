use thiserror::Error;

use crate::game::{Action, MoveSet};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Shoe exhausted after {dealt} cards")]
    ExhaustedShoe { dealt: usize },

    #[error("Illegal action {action} (legal: {legal})")]
    IllegalAction { action: Action, legal: MoveSet },

    #[error("Hand is already resolved")]
    HandFinished,

    #[error("Card {0} appears more than once in the stacked shoe")]
    DuplicateCard(String),

    #[error("Invalid rank: {0}")]
    InvalidRank(char),

    #[error("Invalid suit: {0}")]
    InvalidSuit(char),

    #[error("Invalid card notation: {0}")]
    InvalidCardNotation(String),

    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported statistics format version {0}")]
    UnsupportedVersion(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SimError {
    /// Errors that only invalidate the hand being simulated.
    pub fn is_hand_local(&self) -> bool {
        matches!(self, SimError::ExhaustedShoe { .. })
    }
}

pub type SimResult<T> = Result<T, SimError>;
