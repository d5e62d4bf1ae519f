//! Error type shared by the scheduler, the stores and the review service.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlashcardError {
    #[error("Invalid rating {0}: quality must be between 0 and 5")]
    InvalidRating(i32),

    #[error("Card not found: {0}")]
    CardNotFound(i64),

    #[error("Deck not found: {0}")]
    DeckNotFound(i64),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Card {0} was modified concurrently, review not applied")]
    Conflict(i64),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, FlashcardError>;
