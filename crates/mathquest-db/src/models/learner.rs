//! User, topic and progress models for database storage.

use chrono::{DateTime, Utc};
use mathquest_core::{Progress, ProgressId, ProgressKey, Topic, TopicId, User, UserId};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored learner account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredUser {
    /// Primary key - user ID.
    #[primary_key]
    pub id: u64,
    pub username: String,
    /// Opaque credential hash.
    pub password: String,
    pub display_name: Option<String>,
    pub grade: Option<u8>,
    pub role: String,
    pub stars: u32,
}

impl StoredUser {
    /// Create from a domain user.
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.raw(),
            username: user.username.clone(),
            password: user.password.clone(),
            display_name: user.display_name.clone(),
            grade: user.grade,
            role: user.role.clone(),
            stars: user.stars,
        }
    }

    /// Convert to a domain user.
    pub fn to_user(&self) -> User {
        User {
            id: UserId::new(self.id),
            username: self.username.clone(),
            password: self.password.clone(),
            display_name: self.display_name.clone(),
            grade: self.grade,
            role: self.role.clone(),
            stars: self.stars,
        }
    }
}

/// Stored catalog topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredTopic {
    /// Primary key - topic ID.
    #[primary_key]
    pub id: u64,
    pub name: String,
    pub description: String,
    pub grade: u8,
    /// Category label.
    #[secondary_key]
    pub category: String,
    pub order: u32,
    pub island: String,
    pub is_locked: bool,
}

impl StoredTopic {
    /// Create from a domain topic.
    pub fn from_topic(topic: &Topic) -> Self {
        Self {
            id: topic.id.raw(),
            name: topic.name.clone(),
            description: topic.description.clone(),
            grade: topic.grade,
            category: topic.category.clone(),
            order: topic.order,
            island: topic.island.clone(),
            is_locked: topic.is_locked,
        }
    }

    /// Convert to a domain topic.
    pub fn to_topic(&self) -> Topic {
        Topic {
            id: TopicId::new(self.id),
            name: self.name.clone(),
            description: self.description.clone(),
            grade: self.grade,
            category: self.category.clone(),
            order: self.order,
            island: self.island.clone(),
            is_locked: self.is_locked,
        }
    }
}

/// Stored progress record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredProgress {
    /// Primary key - "{user}-{topic}".
    #[primary_key]
    pub key: String,
    /// Owning user, indexed for bulk reads.
    #[secondary_key]
    pub user_id: u64,
    pub topic_id: u64,
    /// Assigned record ID.
    pub id: u64,
    pub watch_completed: bool,
    pub test_completed: bool,
    pub practice_completed: bool,
    pub teach_completed: bool,
    pub stars_earned: u32,
    /// Best test percentage.
    pub test_score: Option<u32>,
    /// Microseconds since the Unix epoch.
    pub updated_at_micros: Option<i64>,
}

impl StoredProgress {
    /// Primary key for a pair.
    pub fn key_for(key: ProgressKey) -> String {
        key.to_string()
    }

    /// Create from a persisted domain record.
    pub fn from_progress(progress: &Progress, id: ProgressId) -> Self {
        Self {
            key: Self::key_for(progress.key()),
            user_id: progress.user_id.raw(),
            topic_id: progress.topic_id.raw(),
            id: id.raw(),
            watch_completed: progress.watch_completed,
            test_completed: progress.test_completed,
            practice_completed: progress.practice_completed,
            teach_completed: progress.teach_completed,
            stars_earned: progress.stars_earned,
            test_score: progress.test_score,
            updated_at_micros: progress.updated_at.map(|t| t.timestamp_micros()),
        }
    }

    /// Convert to a domain record.
    pub fn to_progress(&self) -> Progress {
        Progress {
            id: Some(ProgressId::new(self.id)),
            user_id: UserId::new(self.user_id),
            topic_id: TopicId::new(self.topic_id),
            watch_completed: self.watch_completed,
            test_completed: self.test_completed,
            practice_completed: self.practice_completed,
            teach_completed: self.teach_completed,
            stars_earned: self.stars_earned,
            test_score: self.test_score,
            updated_at: self
                .updated_at_micros
                .and_then(DateTime::<Utc>::from_timestamp_micros),
        }
    }
}
