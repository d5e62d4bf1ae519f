//! Append-only record of a submitted rating, used for statistics only.
use super::Quality;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub id: i64,
    pub card_id: i64,
    pub user_id: i64,
    pub quality: Quality,
    pub reviewed_at: DateTime<Utc>,
}

/// A review that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewReview {
    pub card_id: i64,
    pub user_id: i64,
    pub quality: Quality,
    pub reviewed_at: DateTime<Utc>,
}
