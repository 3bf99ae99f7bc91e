//! SQLite-backed review item store
//!
//! One row per `(owner_id, item_id)`. Each timestamp is stored as two INTEGER
//! columns, whole seconds since the Unix epoch and the nanosecond remainder.
//! Comparing the pair in SQL matches the ordering of `DateTime<Utc>` over
//! chrono's whole range, and compare-and-swap checks stay exact.

use super::store::{Result, ReviewStore, StoreError};
use crate::models::{ItemId, ItemState, OwnerId, ReviewItem};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SELECT_COLUMNS: &str = "owner_id, item_id, ease_factor, interval_days, repetitions,
     due_secs, due_nanos, lapses, state, last_reviewed_secs, last_reviewed_nanos";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and makes sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn query_items(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<ReviewItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, read_row)?
            .collect::<rusqlite::Result<Vec<RawItem>>>()?;
        rows.into_iter().map(RawItem::into_item).collect()
    }
}

/// Creates the review_items table if missing
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS review_items (
            owner_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 0,
            repetitions INTEGER NOT NULL DEFAULT 0,
            due_secs INTEGER NOT NULL,
            due_nanos INTEGER NOT NULL DEFAULT 0,
            lapses INTEGER NOT NULL DEFAULT 0,
            state TEXT NOT NULL DEFAULT 'new',
            last_reviewed_secs INTEGER,
            last_reviewed_nanos INTEGER,
            PRIMARY KEY (owner_id, item_id)
        );
        CREATE INDEX IF NOT EXISTS idx_review_items_due
            ON review_items (owner_id, due_secs, due_nanos);",
    )?;
    Ok(())
}

fn split_timestamp(at: DateTime<Utc>) -> (i64, u32) {
    (at.timestamp(), at.timestamp_subsec_nanos())
}

fn join_timestamp(secs: i64, nanos: u32) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| StoreError::InvalidRecord(format!("bad timestamp {secs}s + {nanos}ns")))
}

/// Row as stored, before timestamps and state are parsed
struct RawItem {
    owner_id: String,
    item_id: String,
    ease_factor: f64,
    interval_days: u32,
    repetitions: u32,
    due_secs: i64,
    due_nanos: u32,
    lapses: u32,
    state: String,
    last_reviewed_secs: Option<i64>,
    last_reviewed_nanos: Option<u32>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawItem> {
    Ok(RawItem {
        owner_id: row.get(0)?,
        item_id: row.get(1)?,
        ease_factor: row.get(2)?,
        interval_days: row.get(3)?,
        repetitions: row.get(4)?,
        due_secs: row.get(5)?,
        due_nanos: row.get(6)?,
        lapses: row.get(7)?,
        state: row.get(8)?,
        last_reviewed_secs: row.get(9)?,
        last_reviewed_nanos: row.get(10)?,
    })
}

impl RawItem {
    fn into_item(self) -> Result<ReviewItem> {
        let state = ItemState::parse(&self.state)
            .ok_or_else(|| StoreError::InvalidRecord(format!("unknown state '{}'", self.state)))?;
        let last_reviewed_at = match (self.last_reviewed_secs, self.last_reviewed_nanos) {
            (Some(secs), Some(nanos)) => Some(join_timestamp(secs, nanos)?),
            (None, None) => None,
            _ => {
                return Err(StoreError::InvalidRecord(
                    "last review time is only half set".to_string(),
                ));
            }
        };

        Ok(ReviewItem {
            item_id: ItemId(self.item_id),
            owner_id: OwnerId(self.owner_id),
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions,
            due_at: join_timestamp(self.due_secs, self.due_nanos)?,
            lapses: self.lapses,
            state,
            last_reviewed_at,
        })
    }
}

impl ReviewStore for SqliteStore {
    fn get(&self, owner: &OwnerId, item: &ItemId) -> Result<ReviewItem> {
        let raw = {
            let conn = self.lock()?;
            conn.query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM review_items WHERE owner_id = ?1 AND item_id = ?2"
                ),
                params![owner.as_str(), item.as_str()],
                read_row,
            )
            .optional()?
        };

        raw.ok_or_else(|| StoreError::NotFound {
            owner: owner.clone(),
            item: item.clone(),
        })?
        .into_item()
    }

    fn list_due(&self, owner: &OwnerId, before: DateTime<Utc>) -> Result<Vec<ReviewItem>> {
        let (secs, nanos) = split_timestamp(before);
        self.query_items(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM review_items
                 WHERE owner_id = ?1 AND (due_secs, due_nanos) <= (?2, ?3)
                 ORDER BY due_secs ASC, due_nanos ASC, item_id ASC"
            ),
            params![owner.as_str(), secs, nanos],
        )
    }

    fn list_all(&self, owner: &OwnerId) -> Result<Vec<ReviewItem>> {
        self.query_items(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM review_items
                 WHERE owner_id = ?1
                 ORDER BY item_id ASC"
            ),
            params![owner.as_str()],
        )
    }

    fn compare_and_swap(
        &self,
        item: &ReviewItem,
        expected_last_reviewed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let (due_secs, due_nanos) = split_timestamp(item.due_at);
        let (last_secs, last_nanos) = item.last_reviewed_at.map(split_timestamp).unzip();
        let (expected_secs, expected_nanos) =
            expected_last_reviewed_at.map(split_timestamp).unzip();

        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE review_items
             SET ease_factor = ?1, interval_days = ?2, repetitions = ?3,
                 due_secs = ?4, due_nanos = ?5, lapses = ?6, state = ?7,
                 last_reviewed_secs = ?8, last_reviewed_nanos = ?9
             WHERE owner_id = ?10 AND item_id = ?11
               AND last_reviewed_secs IS ?12 AND last_reviewed_nanos IS ?13",
            params![
                item.ease_factor,
                item.interval_days,
                item.repetitions,
                due_secs,
                due_nanos,
                item.lapses,
                item.state.as_str(),
                last_secs,
                last_nanos,
                item.owner_id.as_str(),
                item.item_id.as_str(),
                expected_secs,
                expected_nanos,
            ],
        )?;

        if updated == 1 {
            return Ok(());
        }

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM review_items WHERE owner_id = ?1 AND item_id = ?2)",
            params![item.owner_id.as_str(), item.item_id.as_str()],
            |row| row.get(0),
        )?;

        let owner = item.owner_id.clone();
        let item = item.item_id.clone();
        if exists {
            Err(StoreError::Conflict { owner, item })
        } else {
            Err(StoreError::NotFound { owner, item })
        }
    }

    fn create(&self, item: &ReviewItem) -> Result<()> {
        let (due_secs, due_nanos) = split_timestamp(item.due_at);
        let (last_secs, last_nanos) = item.last_reviewed_at.map(split_timestamp).unzip();

        let conn = self.lock()?;
        // UNIQUE(owner_id, item_id) turns a duplicate into a no-op
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO review_items
                (owner_id, item_id, ease_factor, interval_days, repetitions,
                 due_secs, due_nanos, lapses, state, last_reviewed_secs, last_reviewed_nanos)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                item.owner_id.as_str(),
                item.item_id.as_str(),
                item.ease_factor,
                item.interval_days,
                item.repetitions,
                due_secs,
                due_nanos,
                item.lapses,
                item.state.as_str(),
                last_secs,
                last_nanos,
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::AlreadyExists {
                owner: item.owner_id.clone(),
                item: item.item_id.clone(),
            });
        }
        Ok(())
    }
}
