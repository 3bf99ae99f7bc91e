//! In-process store, handy for tests and single-process callers.
use super::store::{Result, ReviewStore, StoreError};
use crate::models::{ItemId, OwnerId, ReviewItem};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

type Key = (OwnerId, ItemId);

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<Key, ReviewItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads items in bulk, e.g. from an imported snapshot.
    pub fn with_items(items: impl IntoIterator<Item = ReviewItem>) -> Self {
        let map = items
            .into_iter()
            .map(|item| ((item.owner_id.clone(), item.item_id.clone()), item))
            .collect();
        Self {
            items: Mutex::new(map),
        }
    }

    /// Counts every stored item, including after a writer panicked mid-update.
    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Key, ReviewItem>>> {
        self.items
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn collect_sorted<F>(&self, owner: &OwnerId, keep: F) -> Result<Vec<ReviewItem>>
    where
        F: Fn(&ReviewItem) -> bool,
    {
        let items = self.lock()?;
        let mut found: Vec<ReviewItem> = items
            .values()
            .filter(|item| &item.owner_id == owner && keep(item))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.item_id.cmp(&b.item_id)));
        Ok(found)
    }
}

impl ReviewStore for MemoryStore {
    fn get(&self, owner: &OwnerId, item: &ItemId) -> Result<ReviewItem> {
        self.lock()?
            .get(&(owner.clone(), item.clone()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                owner: owner.clone(),
                item: item.clone(),
            })
    }

    fn list_due(&self, owner: &OwnerId, before: DateTime<Utc>) -> Result<Vec<ReviewItem>> {
        self.collect_sorted(owner, |item| item.due_at <= before)
    }

    fn list_all(&self, owner: &OwnerId) -> Result<Vec<ReviewItem>> {
        let mut all = self.collect_sorted(owner, |_| true)?;
        all.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        Ok(all)
    }

    fn compare_and_swap(
        &self,
        item: &ReviewItem,
        expected_last_reviewed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut items = self.lock()?;
        let key = (item.owner_id.clone(), item.item_id.clone());
        let stored = items.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            owner: item.owner_id.clone(),
            item: item.item_id.clone(),
        })?;

        if stored.last_reviewed_at != expected_last_reviewed_at {
            return Err(StoreError::Conflict {
                owner: item.owner_id.clone(),
                item: item.item_id.clone(),
            });
        }

        *stored = item.clone();
        Ok(())
    }

    fn create(&self, item: &ReviewItem) -> Result<()> {
        let mut items = self.lock()?;
        let key = (item.owner_id.clone(), item.item_id.clone());
        if items.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                owner: item.owner_id.clone(),
                item: item.item_id.clone(),
            });
        }
        items.insert(key, item.clone());
        Ok(())
    }
}
