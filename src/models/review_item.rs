//! Per-learner scheduling state of one vocabulary entry.
use super::{ItemId, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ease factor every new item starts with.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;
/// Ease factor never drops below this.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Where an item sits in its review lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    New,
    Learning,
    Review,
    Lapsed,
}

impl ItemState {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemState::New => "new",
            ItemState::Learning => "learning",
            ItemState::Review => "review",
            ItemState::Lapsed => "lapsed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(ItemState::New),
            "learning" => Some(ItemState::Learning),
            "review" => Some(ItemState::Review),
            "lapsed" => Some(ItemState::Lapsed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub item_id: ItemId,
    pub owner_id: OwnerId,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub due_at: DateTime<Utc>,
    pub lapses: u32,
    pub state: ItemState,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewItem {
    /// Creates a never-reviewed item that is due immediately.
    pub fn new(owner_id: OwnerId, item_id: ItemId, now: DateTime<Utc>) -> Self {
        Self {
            item_id,
            owner_id,
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 0,
            repetitions: 0,
            due_at: now,
            lapses: 0,
            state: ItemState::New,
            last_reviewed_at: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }

    pub fn is_new(&self) -> bool {
        self.state == ItemState::New
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_new_item_defaults() {
        let item = ReviewItem::new(OwnerId::from("u1"), ItemId::from("hola"), t0());

        assert_eq!(item.state, ItemState::New);
        assert_eq!(item.ease_factor, INITIAL_EASE_FACTOR);
        assert_eq!(item.interval_days, 0);
        assert_eq!(item.repetitions, 0);
        assert_eq!(item.lapses, 0);
        assert_eq!(item.due_at, t0());
        assert!(item.last_reviewed_at.is_none());
    }

    #[test]
    fn test_new_item_is_immediately_due() {
        let item = ReviewItem::new(OwnerId::from("u1"), ItemId::from("hola"), t0());
        assert!(item.is_due(t0()));
        assert!(!item.is_due(t0() - Duration::seconds(1)));
    }

    #[test]
    fn test_state_names_parse_back() {
        for state in [
            ItemState::New,
            ItemState::Learning,
            ItemState::Review,
            ItemState::Lapsed,
        ] {
            assert_eq!(ItemState::parse(state.as_str()), Some(state));
        }
        assert_eq!(ItemState::parse("ignored"), None);
    }
}
