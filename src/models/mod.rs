pub mod clock;
pub mod grade;
pub mod ids;
pub mod learning_session;
pub mod queue;
pub mod review_item;
pub mod review_outcome;
pub mod sm2;
pub mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use grade::Grade;
pub use ids::{ItemId, OwnerId};
pub use learning_session::{CoordinatorError, ReviewSession, SessionCoordinator};
pub use queue::{QueueConfig, build_queue};
pub use review_item::{ItemState, ReviewItem};
pub use review_outcome::ReviewOutcome;
pub use sm2::{SchedulerError, schedule_outcome};
pub use stats::ReviewStats;
