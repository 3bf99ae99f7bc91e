//! Persistence boundary for review items.
use crate::models::{ItemId, OwnerId, ReviewItem};
use chrono::{DateTime, Utc};

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("review item not found: {owner}/{item}")]
    NotFound { owner: OwnerId, item: ItemId },
    #[error("review item {owner}/{item} was modified concurrently")]
    Conflict { owner: OwnerId, item: ItemId },
    #[error("review item already exists: {owner}/{item}")]
    AlreadyExists { owner: OwnerId, item: ItemId },
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage of review items, unique per `(owner_id, item_id)`.
///
/// Writes go through [`ReviewStore::compare_and_swap`] so a grading computed
/// from a stale read can never overwrite a newer one.
pub trait ReviewStore: Send + Sync {
    fn get(&self, owner: &OwnerId, item: &ItemId) -> Result<ReviewItem>;

    /// Items of `owner` with `due_at <= before`, earliest due first.
    fn list_due(&self, owner: &OwnerId, before: DateTime<Utc>) -> Result<Vec<ReviewItem>>;

    /// Every item of `owner`, ordered by item id.
    fn list_all(&self, owner: &OwnerId) -> Result<Vec<ReviewItem>>;

    /// Replaces the stored item only if its `last_reviewed_at` still equals
    /// `expected_last_reviewed_at`.
    fn compare_and_swap(
        &self,
        item: &ReviewItem,
        expected_last_reviewed_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    fn create(&self, item: &ReviewItem) -> Result<()>;
}

impl<S: ReviewStore + ?Sized> ReviewStore for std::sync::Arc<S> {
    fn get(&self, owner: &OwnerId, item: &ItemId) -> Result<ReviewItem> {
        (**self).get(owner, item)
    }

    fn list_due(&self, owner: &OwnerId, before: DateTime<Utc>) -> Result<Vec<ReviewItem>> {
        (**self).list_due(owner, before)
    }

    fn list_all(&self, owner: &OwnerId) -> Result<Vec<ReviewItem>> {
        (**self).list_all(owner)
    }

    fn compare_and_swap(
        &self,
        item: &ReviewItem,
        expected_last_reviewed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        (**self).compare_and_swap(item, expected_last_reviewed_at)
    }

    fn create(&self, item: &ReviewItem) -> Result<()> {
        (**self).create(item)
    }
}
