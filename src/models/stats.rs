//! Summary counts over one learner's review items.
use super::{ItemState, ReviewItem};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total: usize,
    pub new: usize,
    pub learning: usize,
    pub review: usize,
    pub lapsed: usize,
    /// New items that could be introduced now.
    pub due_new: usize,
    /// Learning, review and lapsed items due now.
    pub due_reviews: usize,
    pub total_lapses: u64,
}

impl ReviewStats {
    pub fn from_items(items: &[ReviewItem], now: DateTime<Utc>) -> Self {
        let mut stats = Self::default();

        for item in items {
            stats.total += 1;
            stats.total_lapses += u64::from(item.lapses);
            match item.state {
                ItemState::New => stats.new += 1,
                ItemState::Learning => stats.learning += 1,
                ItemState::Review => stats.review += 1,
                ItemState::Lapsed => stats.lapsed += 1,
            }
            if item.is_due(now) {
                if item.is_new() {
                    stats.due_new += 1;
                } else {
                    stats.due_reviews += 1;
                }
            }
        }

        stats
    }

    /// Number of items an uncapped queue would hold right now.
    pub fn due_total(&self) -> usize {
        self.due_new + self.due_reviews
    }
}
