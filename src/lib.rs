pub mod config;
pub mod database;
pub mod export;
pub mod models;

pub use database::{MemoryStore, ReviewStore, SqliteStore, StoreError};
pub use models::{
    Clock, CoordinatorError, Grade, ItemId, ItemState, OwnerId, QueueConfig, ReviewItem,
    ReviewOutcome, ReviewSession, SchedulerError, SessionCoordinator, build_queue,
    schedule_outcome,
};
