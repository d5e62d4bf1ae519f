//! Wrapper for flashcards that tracks progress within one study session.
use super::{Flashcard, Quality};

#[derive(Clone, Debug)]
pub struct LearningCard {
    pub card: Flashcard,
    pub is_learned: bool,
    pub last_grade: Option<Quality>,
}

impl LearningCard {
    pub fn new(card: Flashcard) -> Self {
        Self {
            card,
            is_learned: false,
            last_grade: None,
        }
    }

    /// Records a grade; only passing grades count as learned.
    pub fn record_grade(&mut self, quality: Quality) {
        self.is_learned = !quality.is_lapse();
        self.last_grade = Some(quality);
    }
}
