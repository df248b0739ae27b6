//! In-memory storage backend

use crate::storage::Storage;
use crate::{
    catalog, NewTopic, NewUser, Progress, ProgressId, ProgressKey, ProgressUpdate, Result, Topic,
    TopicFilter, TopicId, User, UserId,
};
use indexmap::IndexMap;

/// Process-lifetime store for users, topics and progress
///
/// Owned explicitly by whoever hosts it; there is no global instance.
#[derive(Debug, Clone)]
pub struct MemStorage {
    users: IndexMap<UserId, User>,
    topics: IndexMap<TopicId, Topic>,
    progress: IndexMap<ProgressKey, Progress>,
    next_user_id: u64,
    next_topic_id: u64,
    next_progress_id: u64,
}

impl MemStorage {
    /// Create a store seeded with the built-in grade 1 catalog
    pub fn new() -> Self {
        Self::with_catalog(catalog::default_topics())
    }

    /// Create a store with no topics
    pub fn empty() -> Self {
        Self {
            users: IndexMap::new(),
            topics: IndexMap::new(),
            progress: IndexMap::new(),
            next_user_id: 1,
            next_topic_id: 1,
            next_progress_id: 1,
        }
    }

    /// Create a store seeded with `topics`, assigning IDs in list order
    pub fn with_catalog(topics: impl IntoIterator<Item = NewTopic>) -> Self {
        let mut store = Self::empty();
        for topic in topics {
            store.add_topic(topic);
        }
        store
    }

    /// Add a catalog topic and return its ID
    pub fn add_topic(&mut self, topic: NewTopic) -> TopicId {
        let id = TopicId::new(self.next_topic_id);
        self.next_topic_id += 1;
        self.topics.insert(id, topic.into_topic(id));
        id
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemStorage {
    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.values().find(|u| u.username == username).cloned())
    }

    fn create_user(&mut self, user: NewUser) -> Result<User> {
        let id = UserId::new(self.next_user_id);
        self.next_user_id += 1;
        let user = user.into_user(id);
        self.users.insert(id, user.clone());
        tracing::debug!(user_id = %id, username = %user.username, "created user");
        Ok(user)
    }

    fn update_user_stars(&mut self, id: UserId, stars: u32) -> Result<Option<User>> {
        Ok(self.users.get_mut(&id).map(|user| {
            user.stars = stars;
            user.clone()
        }))
    }

    fn get_topic(&self, id: TopicId) -> Result<Option<Topic>> {
        Ok(self.topics.get(&id).cloned())
    }

    fn get_topics(&self, filter: &TopicFilter) -> Result<Vec<Topic>> {
        Ok(filter.apply(self.topics.values()))
    }

    fn unlock_topic(&mut self, id: TopicId) -> Result<Option<Topic>> {
        Ok(self.topics.get_mut(&id).map(|topic| {
            topic.is_locked = false;
            topic.clone()
        }))
    }

    fn get_progress(&self, key: ProgressKey) -> Result<Option<Progress>> {
        Ok(self.progress.get(&key).cloned())
    }

    fn update_progress(&mut self, key: ProgressKey, update: &ProgressUpdate) -> Result<Progress> {
        let next_id = &mut self.next_progress_id;
        let record = self.progress.entry(key).or_insert_with(|| {
            let id = ProgressId::new(*next_id);
            *next_id += 1;
            tracing::debug!(%key, "creating progress record");
            Progress::fresh(id, key)
        });
        record.merge(update);
        tracing::debug!(%key, ?update, "progress updated");
        Ok(record.clone())
    }

    fn all_progress_for_user(&self, user_id: UserId) -> Result<Vec<Progress>> {
        Ok(self
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }
}
