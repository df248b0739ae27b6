//! MathQuest Core - progress engine and topic gating
//!
//! This crate provides the domain layer of the math island learning app:
//! - Users, topics and per-(user, topic) progress records
//! - The `Storage` contract and an in-memory backend (`MemStorage`)
//! - The four-stage learning cycle (Watch, Test, Practice, Teach)
//! - Topic unlock rules and stage star rewards
//! - `LearningService`, the façade the HTTP layer calls into
//!
//! ## Example
//!
//! ```
//! use mathquest_core::{LearningService, MemStorage, ProgressUpdate, Stage, TopicId, UserId};
//!
//! let mut service = LearningService::new(MemStorage::new());
//! let update = ProgressUpdate::complete(Stage::Watch).with_stars(1);
//! let progress = service.update_progress(UserId::new(1), TopicId::new(1), &update).unwrap();
//! assert!(progress.watch_completed);
//! ```

pub mod catalog;
mod error;
pub mod gating;
mod identity;
mod memory;
pub mod progress;
mod rewards;
mod service;
pub mod stage;
mod storage;
mod summary;
mod topic;
mod user;

pub use error::{Error, Result};
pub use gating::{UnlockRule, UnlockRules};
pub use identity::{ProgressId, ProgressKey, TopicId, UserId};
pub use memory::MemStorage;
pub use progress::{Progress, ProgressUpdate};
pub use rewards::{StageOutcome, StageRewards};
pub use service::{LearningService, StageCompletion};
pub use stage::Stage;
pub use storage::Storage;
pub use summary::{ProgressSummary, TopicOverview};
pub use topic::{NewTopic, Topic, TopicFilter};
pub use user::{NewUser, User, DEFAULT_ROLE, GRADE_RANGE};
