//! Storage contract shared by the in-memory and durable backends
//!
//! Three independent tables: users, topics and progress keyed by
//! (user, topic). Lookups of missing records return `Ok(None)`; `Err` is
//! reserved for backend failures.

use crate::{NewUser, Progress, ProgressKey, ProgressUpdate, Result, Topic, TopicFilter, TopicId, User, UserId};

/// Operations every storage backend provides
pub trait Storage {
    /// Get a user by ID
    fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// First user whose username matches exactly
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Assign the next ID, apply defaults and store the user
    ///
    /// Username uniqueness is the caller's concern.
    fn create_user(&mut self, user: NewUser) -> Result<User>;

    /// Replace the star total with an absolute value
    fn update_user_stars(&mut self, id: UserId, stars: u32) -> Result<Option<User>>;

    /// Get a topic by ID
    fn get_topic(&self, id: TopicId) -> Result<Option<Topic>>;

    /// Topics passing `filter`, sorted ascending by `order`
    fn get_topics(&self, filter: &TopicFilter) -> Result<Vec<Topic>>;

    /// Set `is_locked = false`; idempotent
    fn unlock_topic(&mut self, id: TopicId) -> Result<Option<Topic>>;

    /// Persisted record for a pair, if any
    fn get_progress(&self, key: ProgressKey) -> Result<Option<Progress>>;

    /// Merge `update` over the existing record, or over a fresh one on first
    /// write, refresh the timestamp and persist
    fn update_progress(&mut self, key: ProgressKey, update: &ProgressUpdate) -> Result<Progress>;

    /// All persisted records of a user, unordered
    fn all_progress_for_user(&self, user_id: UserId) -> Result<Vec<Progress>>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        (**self).get_user(id)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        (**self).get_user_by_username(username)
    }

    fn create_user(&mut self, user: NewUser) -> Result<User> {
        (**self).create_user(user)
    }

    fn update_user_stars(&mut self, id: UserId, stars: u32) -> Result<Option<User>> {
        (**self).update_user_stars(id, stars)
    }

    fn get_topic(&self, id: TopicId) -> Result<Option<Topic>> {
        (**self).get_topic(id)
    }

    fn get_topics(&self, filter: &TopicFilter) -> Result<Vec<Topic>> {
        (**self).get_topics(filter)
    }

    fn unlock_topic(&mut self, id: TopicId) -> Result<Option<Topic>> {
        (**self).unlock_topic(id)
    }

    fn get_progress(&self, key: ProgressKey) -> Result<Option<Progress>> {
        (**self).get_progress(key)
    }

    fn update_progress(&mut self, key: ProgressKey, update: &ProgressUpdate) -> Result<Progress> {
        (**self).update_progress(key, update)
    }

    fn all_progress_for_user(&self, user_id: UserId) -> Result<Vec<Progress>> {
        (**self).all_progress_for_user(user_id)
    }
}
