//! JSON import/export of a learner's review state.
//! A snapshot holds every review item of one owner and can be restored into any store.

use crate::database::{ReviewStore, StoreError};
use crate::models::{OwnerId, ReviewItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot for {owner} contains item {item} owned by {item_owner}")]
    ForeignItem {
        owner: OwnerId,
        item: String,
        item_owner: OwnerId,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSnapshot {
    pub owner_id: OwnerId,
    pub exported_at: DateTime<Utc>,
    pub items: Vec<ReviewItem>,
}

impl ReviewSnapshot {
    /// Reads every item of `owner` from the store.
    pub fn capture<S: ReviewStore + ?Sized>(
        store: &S,
        owner: &OwnerId,
        exported_at: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            owner_id: owner.clone(),
            exported_at,
            items: store.list_all(owner)?,
        })
    }

    /// Creates the snapshot's items in `store`, skipping ones that already exist.
    /// Returns how many were created.
    pub fn restore_into<S: ReviewStore + ?Sized>(&self, store: &S) -> Result<usize, StoreError> {
        let mut created = 0;
        for item in &self.items {
            match store.create(item) {
                Ok(()) => created += 1,
                Err(StoreError::AlreadyExists { .. }) => {
                    tracing::debug!(
                        owner = %item.owner_id,
                        item = %item.item_id,
                        "skipping existing item"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        tracing::info!(
            owner = %self.owner_id,
            created,
            skipped = self.items.len() - created,
            "restored review snapshot"
        );
        Ok(created)
    }

    fn validate(&self) -> Result<(), ExportError> {
        match self.items.iter().find(|item| item.owner_id != self.owner_id) {
            Some(item) => Err(ExportError::ForeignItem {
                owner: self.owner_id.clone(),
                item: item.item_id.to_string(),
                item_owner: item.owner_id.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Writes a snapshot as pretty-printed JSON.
pub fn export_json_to_path(
    snapshot: &ReviewSnapshot,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let json_string = serde_json::to_string_pretty(snapshot)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json_string.as_bytes())?;
    tracing::info!(
        owner = %snapshot.owner_id,
        items = snapshot.items.len(),
        path = %path.as_ref().display(),
        "exported review snapshot"
    );
    Ok(())
}

/// Reads a snapshot, rejecting files whose items belong to another owner.
pub fn import_json(path: impl AsRef<Path>) -> Result<ReviewSnapshot, ExportError> {
    let mut file = File::open(path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let snapshot: ReviewSnapshot = serde_json::from_str(&contents)?;
    snapshot.validate()?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{Grade, ItemId, ReviewOutcome, schedule_outcome};
    use chrono::TimeZone;
    use std::fs;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 3, 20, 0, 0).unwrap()
    }

    fn create_test_store() -> MemoryStore {
        let owner = OwnerId::from("u1");
        let fresh = ReviewItem::new(owner.clone(), ItemId::from("gracias"), t0());
        let seen = ReviewItem::new(owner.clone(), ItemId::from("hola"), t0());
        let seen = schedule_outcome(
            &seen,
            &ReviewOutcome::new(owner, ItemId::from("hola"), Grade::Good, t0()),
        )
        .unwrap();
        let other = ReviewItem::new(OwnerId::from("u2"), ItemId::from("adios"), t0());
        MemoryStore::with_items(vec![fresh, seen, other])
    }

    #[test]
    fn test_capture_only_takes_owner_items() {
        let store = create_test_store();
        let snapshot = ReviewSnapshot::capture(&store, &OwnerId::from("u1"), t0()).unwrap();

        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].item_id.as_str(), "gracias");
        assert_eq!(snapshot.items[1].item_id.as_str(), "hola");
    }

    #[test]
    fn test_export_then_restore_into_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("u1.json");
        let store = create_test_store();
        let snapshot = ReviewSnapshot::capture(&store, &OwnerId::from("u1"), t0()).unwrap();

        export_json_to_path(&snapshot, &path).unwrap();
        assert!(fs::metadata(&path).is_ok(), "File should exist");

        let imported = import_json(&path).unwrap();
        assert_eq!(imported, snapshot);

        let target = MemoryStore::new();
        assert_eq!(imported.restore_into(&target).unwrap(), 2);
        assert_eq!(
            target.get(&OwnerId::from("u1"), &ItemId::from("hola")).unwrap(),
            snapshot.items[1]
        );

        // Restoring again creates nothing new.
        assert_eq!(imported.restore_into(&target).unwrap(), 0);
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = import_json("nonexistent_file_xyz123.json");
        assert!(matches!(result, Err(ExportError::Io(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        assert!(matches!(import_json(&path), Err(ExportError::Json(_))));
    }

    #[test]
    fn test_import_rejects_foreign_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.json");
        let snapshot = ReviewSnapshot {
            owner_id: OwnerId::from("u1"),
            exported_at: t0(),
            items: vec![ReviewItem::new(OwnerId::from("u2"), ItemId::from("adios"), t0())],
        };
        export_json_to_path(&snapshot, &path).unwrap();

        assert!(matches!(
            import_json(&path),
            Err(ExportError::ForeignItem { .. })
        ));
    }

    #[test]
    fn test_import_handwritten_snapshot() {
        let json_content = r#"{
  "ownerId": "u9",
  "exportedAt": "2024-11-03T20:00:00Z",
  "items": [
    {
      "itemId": "perro",
      "ownerId": "u9",
      "easeFactor": 2.36,
      "intervalDays": 6,
      "repetitions": 2,
      "dueAt": "2024-11-09T20:00:00Z",
      "lapses": 1,
      "state": "review",
      "lastReviewedAt": "2024-11-03T20:00:00Z"
    }
  ]
}"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hand.json");
        fs::write(&path, json_content).unwrap();

        let snapshot = import_json(&path).unwrap();
        assert_eq!(snapshot.items.len(), 1);
        let item = &snapshot.items[0];
        assert_eq!(item.item_id.as_str(), "perro");
        assert_eq!(item.state, crate::models::ItemState::Review);
        assert_eq!(item.interval_days, 6);
        assert_eq!(item.last_reviewed_at, Some(t0()));
    }
}
