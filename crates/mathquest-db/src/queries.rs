//! Common query patterns for the database.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;
use mathquest_core::{Progress, Topic, TopicFilter, User, UserId};

impl Store {
    /// First user whose username matches exactly (linear scan).
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .all_users()?
            .into_iter()
            .find(|u| u.username == username)
            .map(|u| u.to_user()))
    }

    /// Topics passing the filter, sorted ascending by order.
    pub fn topics_matching(&self, filter: &TopicFilter) -> Result<Vec<Topic>> {
        let stored = match filter.category.as_deref() {
            Some(category) => self.topics_in_category(category)?,
            None => self.all_topics()?,
        };
        let topics: Vec<Topic> = stored.iter().map(|t| t.to_topic()).collect();
        Ok(filter.apply(&topics))
    }

    /// Topics whose category starts with `category`; callers filter exactly.
    fn topics_in_category(&self, category: &str) -> Result<Vec<StoredTopic>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredTopic>(StoredTopicKey::category)?;
        let iter = scan.start_with(category)?;
        let topics: std::result::Result<Vec<StoredTopic>, _> = iter.collect();
        topics.map_err(|e| Error::Database(e.to_string()))
    }

    /// All progress records of a user.
    pub fn progress_for_user(&self, user_id: UserId) -> Result<Vec<Progress>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredProgress>(StoredProgressKey::user_id)?;
        let iter = scan.start_with(user_id.raw())?;
        let records: std::result::Result<Vec<StoredProgress>, _> = iter.collect();
        let records = records.map_err(|e| Error::Database(e.to_string()))?;
        Ok(records
            .into_iter()
            .filter(|p| p.user_id == user_id.raw())
            .map(|p| p.to_progress())
            .collect())
    }

    /// Count catalog topics.
    pub fn topic_count(&self) -> Result<usize> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredTopic>()?;
        let iter = scan.all()?;
        Ok(iter.count())
    }

    /// Get all stored users.
    pub fn all_users(&self) -> Result<Vec<StoredUser>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredUser>()?;
        let iter = scan.all()?;
        let users: std::result::Result<Vec<StoredUser>, _> = iter.collect();
        users.map_err(|e| Error::Database(e.to_string()))
    }

    /// Get all stored topics.
    pub fn all_topics(&self) -> Result<Vec<StoredTopic>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredTopic>()?;
        let iter = scan.all()?;
        let topics: std::result::Result<Vec<StoredTopic>, _> = iter.collect();
        topics.map_err(|e| Error::Database(e.to_string()))
    }
}
