//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use mathquest_core::{
    NewTopic, NewUser, Progress, ProgressId, ProgressKey, ProgressUpdate, Storage, Topic,
    TopicFilter, TopicId, User, UserId,
};
use native_db::transaction::RwTransaction;
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredUser>().unwrap();
    models.define::<StoredTopic>().unwrap();
    models.define::<StoredProgress>().unwrap();
    models.define::<StoredSequence>().unwrap();
    models
});

/// Database store for users, topics and progress.
pub struct Store {
    pub(crate) db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        tracing::info!(path = %path.as_ref().display(), "opened database");
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Insert catalog topics if the topic table is empty.
    ///
    /// Returns the number of topics inserted.
    pub fn seed_catalog(&self, topics: impl IntoIterator<Item = NewTopic>) -> Result<usize> {
        if self.topic_count()? > 0 {
            return Ok(0);
        }

        let rw = self.db.rw_transaction()?;
        let mut inserted = 0;
        for topic in topics {
            let id = next_id(&rw, StoredSequence::TOPICS)?;
            let topic = topic.into_topic(TopicId::new(id));
            rw.insert(StoredTopic::from_topic(&topic))?;
            inserted += 1;
        }
        rw.commit()?;
        tracing::info!(topics = inserted, "seeded topic catalog");
        Ok(inserted)
    }

    /// Create a user with the next ID.
    pub fn insert_user(&self, user: NewUser) -> Result<User> {
        let rw = self.db.rw_transaction()?;
        let id = next_id(&rw, StoredSequence::USERS)?;
        let user = user.into_user(UserId::new(id));
        rw.insert(StoredUser::from_user(&user))?;
        rw.commit()?;
        tracing::debug!(user_id = %user.id, username = %user.username, "created user");
        Ok(user)
    }

    /// Load a user by ID.
    pub fn load_user(&self, id: UserId) -> Result<Option<User>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredUser> = r.get().primary(id.raw())?;
        Ok(stored.map(|s| s.to_user()))
    }

    /// Overwrite a user's star total.
    pub fn save_user_stars(&self, id: UserId, stars: u32) -> Result<Option<User>> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredUser> = rw.get().primary(id.raw())?;
        let updated = match stored {
            Some(mut s) => {
                s.stars = stars;
                rw.upsert(s.clone())?;
                Some(s.to_user())
            }
            None => None,
        };
        rw.commit()?;
        Ok(updated)
    }

    /// Load a topic by ID.
    pub fn load_topic(&self, id: TopicId) -> Result<Option<Topic>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredTopic> = r.get().primary(id.raw())?;
        Ok(stored.map(|s| s.to_topic()))
    }

    /// Mark a topic unlocked.
    pub fn save_unlocked(&self, id: TopicId) -> Result<Option<Topic>> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredTopic> = rw.get().primary(id.raw())?;
        let updated = match stored {
            Some(mut s) => {
                if s.is_locked {
                    s.is_locked = false;
                    rw.upsert(s.clone())?;
                }
                Some(s.to_topic())
            }
            None => None,
        };
        rw.commit()?;
        Ok(updated)
    }

    /// Load the progress record of a pair.
    pub fn load_progress(&self, key: ProgressKey) -> Result<Option<Progress>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredProgress> = r.get().primary(StoredProgress::key_for(key))?;
        Ok(stored.map(|s| s.to_progress()))
    }

    /// Merge an update into the record of a pair, creating it on first write.
    pub fn merge_progress(&self, key: ProgressKey, update: &ProgressUpdate) -> Result<Progress> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredProgress> = rw.get().primary(StoredProgress::key_for(key))?;
        let mut progress = match stored {
            Some(s) => s.to_progress(),
            None => {
                let id = next_id(&rw, StoredSequence::PROGRESS)?;
                tracing::debug!(%key, "creating progress record");
                Progress::fresh(ProgressId::new(id), key)
            }
        };
        progress.merge(update);

        let id = progress
            .id
            .ok_or_else(|| Error::Corrupt(format!("progress {key} has no id")))?;
        rw.upsert(StoredProgress::from_progress(&progress, id))?;
        rw.commit()?;
        tracing::debug!(%key, ?update, "progress updated");
        Ok(progress)
    }
}

/// Take the next ID of a sequence inside an open write transaction.
fn next_id(rw: &RwTransaction<'_>, name: &str) -> Result<u64> {
    let mut seq = rw
        .get()
        .primary::<StoredSequence>(name.to_string())?
        .unwrap_or_else(|| StoredSequence::start(name));
    let id = seq.next;
    seq.next += 1;
    rw.upsert(seq)?;
    Ok(id)
}

impl Storage for Store {
    fn get_user(&self, id: UserId) -> mathquest_core::Result<Option<User>> {
        Ok(self.load_user(id)?)
    }

    fn get_user_by_username(&self, username: &str) -> mathquest_core::Result<Option<User>> {
        Ok(self.find_user_by_username(username)?)
    }

    fn create_user(&mut self, user: NewUser) -> mathquest_core::Result<User> {
        Ok(self.insert_user(user)?)
    }

    fn update_user_stars(&mut self, id: UserId, stars: u32) -> mathquest_core::Result<Option<User>> {
        Ok(self.save_user_stars(id, stars)?)
    }

    fn get_topic(&self, id: TopicId) -> mathquest_core::Result<Option<Topic>> {
        Ok(self.load_topic(id)?)
    }

    fn get_topics(&self, filter: &TopicFilter) -> mathquest_core::Result<Vec<Topic>> {
        Ok(self.topics_matching(filter)?)
    }

    fn unlock_topic(&mut self, id: TopicId) -> mathquest_core::Result<Option<Topic>> {
        Ok(self.save_unlocked(id)?)
    }

    fn get_progress(&self, key: ProgressKey) -> mathquest_core::Result<Option<Progress>> {
        Ok(self.load_progress(key)?)
    }

    fn update_progress(
        &mut self,
        key: ProgressKey,
        update: &ProgressUpdate,
    ) -> mathquest_core::Result<Progress> {
        Ok(self.merge_progress(key, update)?)
    }

    fn all_progress_for_user(&self, user_id: UserId) -> mathquest_core::Result<Vec<Progress>> {
        Ok(self.progress_for_user(user_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathquest_core::{catalog, LearningService, Stage, StageOutcome};

    fn seeded() -> Store {
        let store = Store::in_memory().unwrap();
        store.seed_catalog(catalog::default_topics()).unwrap();
        store
    }

    #[test]
    fn test_seed_only_once() {
        let store = seeded();
        assert_eq!(store.seed_catalog(catalog::default_topics()).unwrap(), 0);
        assert_eq!(store.topic_count().unwrap(), 5);
    }

    #[test]
    fn test_seed_state_numbers() {
        let store = seeded();
        let numbers = store
            .get_topics(&TopicFilter::all().grade(1).category("Numbers"))
            .unwrap();
        let names: Vec<&str> = numbers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Counting Numbers 1-10", "Numbers 11-20"]);
        assert!(!numbers[0].is_locked);
        assert!(numbers[1].is_locked);
    }

    #[test]
    fn test_user_roundtrip_and_stars() {
        let mut store = seeded();
        let user = store.create_user(catalog::demo_user()).unwrap();
        assert_eq!(user.id, UserId::new(1));
        assert_eq!(user.role, "student");

        let found = store.get_user_by_username("sammy").unwrap().unwrap();
        assert_eq!(found.display_name.as_deref(), Some("Sammy Student"));

        let updated = store.update_user_stars(user.id, 4).unwrap().unwrap();
        assert_eq!(updated.stars, 4);
        assert!(store.update_user_stars(UserId::new(9), 1).unwrap().is_none());
    }

    #[test]
    fn test_progress_lazy_creation_and_merge() {
        let mut store = seeded();
        let key = ProgressKey::new(UserId::new(7), TopicId::new(3));
        assert!(store.get_progress(key).unwrap().is_none());

        let first = store
            .update_progress(key, &ProgressUpdate::complete(Stage::Watch).with_stars(1))
            .unwrap();
        let second = store
            .update_progress(key, &ProgressUpdate::complete(Stage::Test))
            .unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.watch_completed && second.test_completed);
        assert_eq!(second.stars_earned, 1);
        assert!(second.updated_at > first.updated_at);

        let loaded = store.get_progress(key).unwrap().unwrap();
        assert_eq!(loaded, second);
    }

    #[test]
    fn test_progress_for_user() {
        let mut store = seeded();
        let empty = ProgressUpdate::default();
        store.update_progress(ProgressKey::new(UserId::new(1), TopicId::new(1)), &empty).unwrap();
        store.update_progress(ProgressKey::new(UserId::new(1), TopicId::new(2)), &empty).unwrap();
        store.update_progress(ProgressKey::new(UserId::new(2), TopicId::new(1)), &empty).unwrap();

        assert_eq!(store.all_progress_for_user(UserId::new(1)).unwrap().len(), 2);
        assert_eq!(store.all_progress_for_user(UserId::new(2)).unwrap().len(), 1);
        assert!(store.all_progress_for_user(UserId::new(3)).unwrap().is_empty());
    }

    #[test]
    fn test_unlock_idempotent() {
        let mut store = seeded();
        assert!(!store.unlock_topic(TopicId::new(2)).unwrap().unwrap().is_locked);
        assert!(!store.unlock_topic(TopicId::new(2)).unwrap().unwrap().is_locked);
        assert!(store.unlock_topic(TopicId::new(77)).unwrap().is_none());
    }

    #[test]
    fn test_service_over_db() {
        let mut store = seeded();
        let user = store.create_user(catalog::demo_user()).unwrap();
        let mut service = LearningService::new(store);

        service
            .update_progress(user.id, TopicId::new(1), &ProgressUpdate::complete(Stage::Watch).with_stars(1))
            .unwrap();
        assert_eq!(service.user(user.id).unwrap().unwrap().stars, 1);

        service
            .complete_stage(user.id, TopicId::new(1), Stage::Test, &StageOutcome::scored(3, 4))
            .unwrap();
        let stored = service.storage().load_progress(ProgressKey::new(user.id, TopicId::new(1)));
        assert_eq!(stored.unwrap().unwrap().test_score, Some(75));
    }
}
