//! Flashcard is a pair <front, back> plus its tags and scheduling state.
use super::SchedulingState;
use super::due::HasDueDate;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: i64,
    pub deck_id: i64,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub schedule: SchedulingState,
}

/// Card contents and initial schedule, before the store assigns an id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewCard {
    pub deck_id: i64,
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
    pub schedule: SchedulingState,
}

impl NewCard {
    /// A card with the default schedule, due on `today`.
    pub fn new(deck_id: i64, front: &str, back: &str, tags: Vec<String>, today: NaiveDate) -> Self {
        Self {
            deck_id,
            front: front.to_string(),
            back: back.to_string(),
            tags,
            schedule: SchedulingState::new_card(today),
        }
    }
}

impl Flashcard {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl HasDueDate for Flashcard {
    fn due_date(&self) -> NaiveDate {
        self.schedule.due_date
    }
}
