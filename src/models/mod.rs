pub mod deck;
pub mod due;
pub mod flashcard;
pub mod learning_card;
pub mod learning_session;
pub mod quality;
pub mod review_event;
pub mod scheduling_state;
pub mod sm2;
pub mod stats;

pub use deck::Deck;
pub use due::{DueQuery, HasDueDate, select_due};
pub use flashcard::{Flashcard, NewCard};
pub use learning_card::LearningCard;
pub use learning_session::LearningSession;
pub use quality::Quality;
pub use review_event::{NewReview, ReviewEvent};
pub use scheduling_state::SchedulingState;
pub use stats::StudyStats;
