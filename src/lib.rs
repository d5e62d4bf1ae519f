pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod service;

pub use config::Config;
pub use database::{CardRepository, MemoryStore, SqliteStore};
pub use error::{FlashcardError, Result};
pub use models::{Deck, DueQuery, Flashcard, LearningSession, Quality, SchedulingState};
pub use models::sm2::compute_next_state;
pub use models::due::select_due;
pub use service::ReviewService;
