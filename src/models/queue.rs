//! Builds the ordered list of items a learner should review now.
//!
//! Due review items (learning, review, lapsed) come first, earliest due
//! first. New items follow, so a fresh word never pushes an overdue one out
//! of the session.

use super::ReviewItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_MAX_NEW_PER_SESSION: usize = 10;
pub const DEFAULT_MAX_REVIEW_PER_SESSION: usize = 100;

/// Session size limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueueConfig {
    pub max_new_per_session: usize,
    pub max_review_per_session: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_new_per_session: DEFAULT_MAX_NEW_PER_SESSION,
            max_review_per_session: DEFAULT_MAX_REVIEW_PER_SESSION,
        }
    }
}

/// Returns the items due at `now`, reviews first then new items, each capped by `config`.
pub fn build_queue(
    items: &[ReviewItem],
    now: DateTime<Utc>,
    config: &QueueConfig,
) -> Vec<ReviewItem> {
    let (mut fresh, mut reviews): (Vec<&ReviewItem>, Vec<&ReviewItem>) = items
        .iter()
        .filter(|item| item.is_due(now))
        .partition(|item| item.is_new());

    reviews.sort_by(|a, b| by_due_then_id(a, b));
    fresh.sort_by(|a, b| by_due_then_id(a, b));

    let queue: Vec<ReviewItem> = reviews
        .into_iter()
        .take(config.max_review_per_session)
        .chain(fresh.into_iter().take(config.max_new_per_session))
        .cloned()
        .collect();

    tracing::debug!(
        candidates = items.len(),
        queued = queue.len(),
        "built review queue"
    );

    queue
}

fn by_due_then_id(a: &ReviewItem, b: &ReviewItem) -> Ordering {
    a.due_at
        .cmp(&b.due_at)
        .then_with(|| a.item_id.cmp(&b.item_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemId, ItemState, OwnerId, ReviewStats};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn item(id: &str, state: ItemState, due_at: DateTime<Utc>) -> ReviewItem {
        let mut item = ReviewItem::new(OwnerId::from("u1"), ItemId::from(id), due_at);
        item.state = state;
        item
    }

    fn ids(queue: &[ReviewItem]) -> Vec<&str> {
        queue.iter().map(|i| i.item_id.as_str()).collect()
    }

    #[test]
    fn test_empty_input_gives_empty_queue() {
        assert!(build_queue(&[], now(), &QueueConfig::default()).is_empty());
    }

    #[test]
    fn test_nothing_due_gives_empty_queue() {
        let items = vec![
            item("a", ItemState::Review, now() + Duration::days(1)),
            item("b", ItemState::New, now() + Duration::seconds(1)),
        ];
        assert!(build_queue(&items, now(), &QueueConfig::default()).is_empty());
    }

    #[test]
    fn test_orders_by_due_then_item_id() {
        let items = vec![
            item("c", ItemState::Review, now() - Duration::days(1)),
            item("b", ItemState::Lapsed, now() - Duration::days(3)),
            item("a", ItemState::Learning, now() - Duration::days(1)),
            item("d", ItemState::Review, now()),
        ];

        let queue = build_queue(&items, now(), &QueueConfig::default());
        assert_eq!(ids(&queue), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_new_items_are_capped_and_follow_reviews() {
        let mut items: Vec<ReviewItem> = (0..15)
            .map(|i| item(&format!("new-{i:02}"), ItemState::New, now() - Duration::days(5)))
            .collect();
        items.push(item("rev-1", ItemState::Review, now() - Duration::hours(1)));
        items.push(item("rev-2", ItemState::Lapsed, now() - Duration::hours(2)));
        items.push(item("later", ItemState::Review, now() + Duration::hours(2)));

        let config = QueueConfig {
            max_new_per_session: 10,
            ..QueueConfig::default()
        };
        let queue = build_queue(&items, now(), &config);

        assert_eq!(queue.len(), 12);
        assert_eq!(ids(&queue[..2]), vec!["rev-2", "rev-1"]);
        assert!(queue[2..].iter().all(|i| i.state == ItemState::New));
        assert_eq!(queue[2].item_id.as_str(), "new-00");
        assert_eq!(queue[11].item_id.as_str(), "new-09");
    }

    #[test]
    fn test_review_cap() {
        let items: Vec<ReviewItem> = (0..5)
            .map(|i| item(&format!("r{i}"), ItemState::Review, now() - Duration::days(i)))
            .collect();
        let config = QueueConfig {
            max_new_per_session: 10,
            max_review_per_session: 2,
        };

        let queue = build_queue(&items, now(), &config);
        // The two most overdue survive the cap.
        assert_eq!(ids(&queue), vec!["r4", "r3"]);
    }

    #[test]
    fn test_zero_new_limit() {
        let items = vec![item("n", ItemState::New, now())];
        let config = QueueConfig {
            max_new_per_session: 0,
            ..QueueConfig::default()
        };
        assert!(build_queue(&items, now(), &config).is_empty());
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: QueueConfig = serde_json::from_str(r#"{"maxNewPerSession": 3}"#).unwrap();
        assert_eq!(config.max_new_per_session, 3);
        assert_eq!(config.max_review_per_session, DEFAULT_MAX_REVIEW_PER_SESSION);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_items() -> impl Strategy<Value = Vec<ReviewItem>> {
            prop::collection::vec(
                (
                    0usize..40,
                    prop_oneof![
                        Just(ItemState::New),
                        Just(ItemState::Learning),
                        Just(ItemState::Review),
                        Just(ItemState::Lapsed),
                    ],
                    -72i64..72,
                ),
                0..40,
            )
            .prop_map(|specs| {
                specs
                    .into_iter()
                    .map(|(id, state, hours)| {
                        item(&format!("w{id:02}"), state, now() + Duration::hours(hours))
                    })
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn queue_only_holds_due_items_in_order(
                items in arb_items(),
                max_new in 0usize..12,
                max_review in 0usize..12,
            ) {
                let config = QueueConfig {
                    max_new_per_session: max_new,
                    max_review_per_session: max_review,
                };
                let queue = build_queue(&items, now(), &config);

                prop_assert!(queue.iter().all(|i| i.due_at <= now()));

                let split = queue.iter().position(|i| i.is_new()).unwrap_or(queue.len());
                prop_assert!(queue[split..].iter().all(|i| i.is_new()));
                prop_assert!(split <= max_review);
                prop_assert!(queue.len() - split <= max_new);

                for part in [&queue[..split], &queue[split..]] {
                    for pair in part.windows(2) {
                        prop_assert!(by_due_then_id(&pair[0], &pair[1]) != Ordering::Greater);
                    }
                }

                let stats = ReviewStats::from_items(&items, now());
                prop_assert_eq!(split, stats.due_reviews.min(max_review));
                prop_assert_eq!(queue.len() - split, stats.due_new.min(max_new));
            }

            #[test]
            fn queue_is_recomputable(items in arb_items()) {
                let config = QueueConfig::default();
                prop_assert_eq!(
                    build_queue(&items, now(), &config),
                    build_queue(&items, now(), &config)
                );
            }
        }
    }
}
