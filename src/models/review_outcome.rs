//! A single graded answer, consumed by the scheduler and then dropped.
use super::sm2::SchedulerError;
use super::{Grade, ItemId, OwnerId};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq)]
pub struct ReviewOutcome {
    pub item_id: ItemId,
    pub owner_id: OwnerId,
    pub grade: Grade,
    pub answered_at: DateTime<Utc>,
}

impl ReviewOutcome {
    pub fn new(
        owner_id: OwnerId,
        item_id: ItemId,
        grade: Grade,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id,
            owner_id,
            grade,
            answered_at,
        }
    }

    /// Builds an outcome from a numeric grade (0-3), rejecting anything else.
    pub fn from_raw(
        owner_id: OwnerId,
        item_id: ItemId,
        grade: u8,
        answered_at: DateTime<Utc>,
    ) -> Result<Self, SchedulerError> {
        let grade = Grade::try_from(grade)?;
        Ok(Self::new(owner_id, item_id, grade, answered_at))
    }
}
