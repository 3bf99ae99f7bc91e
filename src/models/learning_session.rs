//! Review sessions: turning queued items into persisted gradings.
//!
//! [`SessionCoordinator`] owns the store and clock handles, applies each
//! graded answer through the scheduler and writes the result back with a
//! compare-and-swap. [`ReviewSession`] is the caller's in-memory view of the
//! queue for one sitting.

use super::sm2::{SchedulerError, schedule_outcome};
use super::{
    Clock, Grade, ItemId, ItemState, OwnerId, QueueConfig, ReviewItem, ReviewOutcome, ReviewStats,
    build_queue,
};
use crate::database::{ReviewStore, StoreError};
use chrono::{DateTime, Utc};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("review item {owner}/{item} is already being graded or the answer is not newer")]
    DuplicateGrading { owner: OwnerId, item: ItemId },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoordinatorError {
    /// True for the races a caller resolves by re-fetching the item.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoordinatorError::DuplicateGrading { .. }
                | CoordinatorError::Store(StoreError::Conflict { .. })
        )
    }
}

type Key = (OwnerId, ItemId);

/// Grades review items against a store, one in-flight grading per item.
pub struct SessionCoordinator<S, C> {
    store: S,
    clock: C,
    config: QueueConfig,
    in_flight: Mutex<HashSet<Key>>,
}

/// Marks a key as being graded until dropped.
struct InFlight<'a> {
    registry: &'a Mutex<HashSet<Key>>,
    key: Key,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        registry.remove(&self.key);
    }
}

impl<S: ReviewStore, C: Clock> SessionCoordinator<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self::with_config(store, clock, QueueConfig::default())
    }

    pub fn with_config(store: S, clock: C, config: QueueConfig) -> Self {
        Self {
            store,
            clock,
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Starts tracking a vocabulary item for a learner. The new item is due immediately.
    pub fn enroll(&self, owner: &OwnerId, item: &ItemId) -> Result<ReviewItem, CoordinatorError> {
        let review_item = ReviewItem::new(owner.clone(), item.clone(), self.clock.now());
        self.store.create(&review_item)?;
        tracing::info!(owner = %owner, item = %item, "enrolled review item");
        Ok(review_item)
    }

    /// Items the learner should review now, in presentation order.
    pub fn due_queue(&self, owner: &OwnerId) -> Result<Vec<ReviewItem>, CoordinatorError> {
        let now = self.clock.now();
        let due = self.store.list_due(owner, now)?;
        Ok(build_queue(&due, now, &self.config))
    }

    pub fn start_session(&self, owner: &OwnerId) -> Result<ReviewSession, CoordinatorError> {
        let queue = self.due_queue(owner)?;
        tracing::info!(owner = %owner, queued = queue.len(), "starting review session");
        Ok(ReviewSession::new(owner.clone(), queue))
    }

    pub fn stats(&self, owner: &OwnerId) -> Result<ReviewStats, CoordinatorError> {
        let items = self.store.list_all(owner)?;
        Ok(ReviewStats::from_items(&items, self.clock.now()))
    }

    /// Records one graded answer and returns the rescheduled item.
    ///
    /// A second grading of the same item while one is in progress is rejected
    /// with `DuplicateGrading`. So is any answer whose `answered_at` is at or
    /// before the item's last recorded review, which treats a resubmitted
    /// answer as a replay. Callers must therefore give successive answers for
    /// one item strictly increasing timestamps. Store errors are returned
    /// as-is; nothing is retried.
    pub fn grade_item(
        &self,
        owner: &OwnerId,
        item: &ItemId,
        grade: Grade,
        answered_at: DateTime<Utc>,
    ) -> Result<ReviewItem, CoordinatorError> {
        let _guard = self.begin_grading(owner, item)?;

        let current = self.store.get(owner, item)?;
        if let Some(last) = current.last_reviewed_at {
            if last >= answered_at {
                tracing::warn!(
                    owner = %owner,
                    item = %item,
                    "answer is not newer than last review"
                );
                return Err(CoordinatorError::DuplicateGrading {
                    owner: owner.clone(),
                    item: item.clone(),
                });
            }
        }

        let outcome = ReviewOutcome::new(owner.clone(), item.clone(), grade, answered_at);
        let next = schedule_outcome(&current, &outcome)?;

        if let Err(err) = self.store.compare_and_swap(&next, current.last_reviewed_at) {
            if matches!(err, StoreError::Conflict { .. }) {
                tracing::warn!(owner = %owner, item = %item, "review item changed while grading");
            }
            return Err(err.into());
        }

        tracing::info!(
            owner = %owner,
            item = %item,
            grade = %grade,
            state = next.state.as_str(),
            interval_days = next.interval_days,
            "graded review item"
        );
        Ok(next)
    }

    fn begin_grading(
        &self,
        owner: &OwnerId,
        item: &ItemId,
    ) -> Result<InFlight<'_>, CoordinatorError> {
        let key = (owner.clone(), item.clone());
        let mut registry = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !registry.insert(key.clone()) {
            tracing::warn!(owner = %owner, item = %item, "rejected concurrent grading");
            return Err(CoordinatorError::DuplicateGrading {
                owner: owner.clone(),
                item: item.clone(),
            });
        }
        Ok(InFlight {
            registry: &self.in_flight,
            key,
        })
    }
}

/// In-memory queue for one sitting. Graded items leave the queue; failed
/// gradings keep the item where it was.
pub struct ReviewSession {
    pub owner_id: OwnerId,
    queue: VecDeque<ReviewItem>,
    graded: Vec<ReviewItem>,
}

impl ReviewSession {
    pub fn new(owner_id: OwnerId, queue: Vec<ReviewItem>) -> Self {
        Self {
            owner_id,
            queue: queue.into(),
            graded: Vec::new(),
        }
    }

    pub fn current_item(&self) -> Option<&ReviewItem> {
        self.queue.front()
    }

    pub fn queued(&self) -> impl Iterator<Item = &ReviewItem> {
        self.queue.iter()
    }

    /// Items graded in this session, in grading order.
    pub fn graded(&self) -> &[ReviewItem] {
        &self.graded
    }

    /// Moves the current item to the back of the queue.
    pub fn skip(&mut self) {
        if let Some(item) = self.queue.pop_front() {
            self.queue.push_back(item);
        }
    }

    /// Grades the current item at the coordinator's current time.
    ///
    /// Returns `Ok(None)` when the queue is empty.
    pub fn grade_current<S: ReviewStore, C: Clock>(
        &mut self,
        coordinator: &SessionCoordinator<S, C>,
        grade: Grade,
    ) -> Result<Option<ReviewItem>, CoordinatorError> {
        let Some(item_id) = self.current_item().map(|item| item.item_id.clone()) else {
            return Ok(None);
        };

        let updated =
            coordinator.grade_item(&self.owner_id, &item_id, grade, coordinator.clock().now())?;
        self.record(updated.clone());
        Ok(Some(updated))
    }

    /// Removes a graded item from the queue view.
    ///
    /// For callers that grade through [`SessionCoordinator::grade_item`] directly.
    /// Returns false when the item was not queued.
    pub fn record(&mut self, updated: ReviewItem) -> bool {
        let Some(pos) = self
            .queue
            .iter()
            .position(|item| item.item_id == updated.item_id)
        else {
            return false;
        };
        self.queue.remove(pos);
        self.graded.push(updated);
        true
    }

    pub fn remaining_count(&self) -> usize {
        self.queue.len()
    }

    pub fn graded_count(&self) -> usize {
        self.graded.len()
    }

    pub fn total_count(&self) -> usize {
        self.remaining_count() + self.graded_count()
    }

    /// Items forgotten during this session.
    pub fn lapsed_count(&self) -> usize {
        self.graded
            .iter()
            .filter(|item| item.state == ItemState::Lapsed)
            .count()
    }

    pub fn is_completed(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn progress_message(&self) -> String {
        if self.is_completed() {
            format!(
                "Session complete: {} reviewed, {} to relearn",
                self.graded_count(),
                self.lapsed_count()
            )
        } else {
            format!(
                "{} of {} reviewed, {} remaining",
                self.graded_count(),
                self.total_count(),
                self.remaining_count()
            )
        }
    }
}
