//! Access façade: the operation surface the HTTP layer calls into
//!
//! Progress updates that carry `stars_earned` also add that value to the
//! user's running star total. The two writes are separate storage calls;
//! hosts that share a service between tasks must hold one lock across
//! each façade call so concurrent updates for a user cannot interleave.

use crate::progress;
use crate::stage::{next_route, next_stage};
use crate::storage::Storage;
use crate::{
    Error, NewUser, Progress, ProgressSummary, ProgressUpdate, Result, Stage, StageOutcome,
    StageRewards, Topic, TopicFilter, TopicId, UnlockRules, User, UserId,
};
use serde::Serialize;
use tracing::{debug, info};

/// Result of completing one stage of a topic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCompletion {
    pub progress: Progress,
    /// Stars added to the user's total by this call
    pub stars_awarded: u32,
    /// Topics that went from locked to unlocked
    pub unlocked: Vec<Topic>,
    pub next_stage: Option<Stage>,
    /// Client route to continue from
    pub next_route: String,
}

/// Façade over a storage backend
#[derive(Debug)]
pub struct LearningService<S> {
    storage: S,
    rewards: StageRewards,
    unlock_rules: UnlockRules,
}

impl<S: Storage> LearningService<S> {
    /// Create a service with default rewards and the built-in unlock rules
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            rewards: StageRewards::default(),
            unlock_rules: UnlockRules::builtin(),
        }
    }

    pub fn with_rewards(mut self, rewards: StageRewards) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_unlock_rules(mut self, rules: UnlockRules) -> Self {
        self.unlock_rules = rules;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn rewards(&self) -> &StageRewards {
        &self.rewards
    }

    pub fn unlock_rules(&self) -> &UnlockRules {
        &self.unlock_rules
    }

    // Users

    /// Validate and create an account; usernames must be unique
    pub fn register_user(&mut self, user: NewUser) -> Result<User> {
        user.validate()?;
        if self.storage.get_user_by_username(&user.username)?.is_some() {
            return Err(Error::Validation(format!(
                "username already exists: {}",
                user.username
            )));
        }
        self.storage.create_user(user)
    }

    pub fn user(&self, id: UserId) -> Result<Option<User>> {
        self.storage.get_user(id)
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.storage.get_user_by_username(username)
    }

    // Topics

    pub fn topics(&self, filter: &TopicFilter) -> Result<Vec<Topic>> {
        self.storage.get_topics(filter)
    }

    pub fn topic(&self, id: TopicId) -> Result<Option<Topic>> {
        self.storage.get_topic(id)
    }

    /// Unlock a topic; `None` when it does not exist
    pub fn unlock_topic(&mut self, id: TopicId) -> Result<Option<Topic>> {
        let topic = self.storage.unlock_topic(id)?;
        if let Some(ref t) = topic {
            info!(topic_id = %id, name = %t.name, "topic unlocked");
        }
        Ok(topic)
    }

    // Progress

    /// Record for a pair, or the unpersisted default
    pub fn progress(&self, user_id: UserId, topic_id: TopicId) -> Result<Progress> {
        progress::get_progress(&self.storage, user_id, topic_id)
    }

    pub fn all_progress(&self, user_id: UserId) -> Result<Vec<Progress>> {
        progress::all_progress_for_user(&self.storage, user_id)
    }

    /// Merge a partial update, then add any submitted stars to the user total
    ///
    /// Resubmitting the same stars adds them again.
    pub fn update_progress(
        &mut self,
        user_id: UserId,
        topic_id: TopicId,
        update: &ProgressUpdate,
    ) -> Result<Progress> {
        let merged = progress::update_progress(&mut self.storage, user_id, topic_id, update)?;

        if let Some(stars) = update.stars_earned {
            match self.storage.get_user(user_id)? {
                Some(user) => {
                    let total = user.stars.saturating_add(stars);
                    self.storage.update_user_stars(user_id, total)?;
                    info!(user_id = %user_id, stars, total, "stars awarded");
                }
                None => debug!(user_id = %user_id, "stars submitted for unknown user"),
            }
        }

        Ok(merged)
    }

    /// Complete one stage of a playable topic
    ///
    /// Each stage pays out once. A failed test still marks the stage done
    /// but pays nothing, so a later passing attempt earns the test stars.
    /// Finishing the Teach stage applies the unlock rules of the topic.
    pub fn complete_stage(
        &mut self,
        user_id: UserId,
        topic_id: TopicId,
        stage: Stage,
        outcome: &StageOutcome,
    ) -> Result<StageCompletion> {
        let topic = self
            .storage
            .get_topic(topic_id)?
            .ok_or_else(|| Error::TopicNotFound(topic_id.to_string()))?;
        if !topic.is_playable() {
            return Err(Error::TopicLocked(topic_id.to_string()));
        }

        let award = self.rewards.stars_for(stage, outcome)?;
        let current = self.progress(user_id, topic_id)?;
        let already_rewarded = self.already_rewarded(&current, stage);

        let mut update = ProgressUpdate::complete(stage);
        if stage == Stage::Test {
            update = update.with_test_score(outcome.percent()?);
        }
        if !already_rewarded {
            update = update.with_stars(award);
        }
        let merged = self.update_progress(user_id, topic_id, &update)?;

        let mut unlocked = Vec::new();
        if stage == Stage::Teach {
            for next in self.unlock_rules.unlocked_by(topic_id) {
                let was_locked = matches!(self.storage.get_topic(next)?, Some(t) if t.is_locked);
                if let Some(t) = self.unlock_topic(next)? {
                    if was_locked {
                        unlocked.push(t);
                    }
                }
            }
        }

        Ok(StageCompletion {
            next_stage: next_stage(&merged),
            next_route: next_route(&merged),
            progress: merged,
            stars_awarded: if already_rewarded { 0 } else { award },
            unlocked,
        })
    }

    /// Whether `stage` has already paid out for this record
    ///
    /// A test completed without a recorded score counts as paid.
    fn already_rewarded(&self, progress: &Progress, stage: Stage) -> bool {
        if !progress.is_stage_complete(stage) {
            return false;
        }
        match stage {
            Stage::Test => progress
                .test_score
                .map_or(true, |best| self.rewards.passes(best)),
            _ => true,
        }
    }

    /// Dashboard overview over every topic in the catalog
    pub fn summary(&self, user_id: UserId) -> Result<ProgressSummary> {
        let topics = self.storage.get_topics(&TopicFilter::all())?;
        let records = self.all_progress(user_id)?;
        Ok(ProgressSummary::build(user_id, &topics, &records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog, MemStorage};

    fn service_with_user() -> (LearningService<MemStorage>, UserId) {
        let mut service = LearningService::new(MemStorage::new());
        let user = service.register_user(catalog::demo_user()).unwrap();
        (service, user.id)
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let (mut service, _) = service_with_user();
        let err = service.register_user(catalog::demo_user()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_stars_accumulate_on_user() {
        let (mut service, user) = service_with_user();
        let topic = TopicId::new(1);
        service
            .update_progress(user, topic, &ProgressUpdate::complete(Stage::Watch).with_stars(1))
            .unwrap();
        service
            .update_progress(user, topic, &ProgressUpdate::complete(Stage::Teach).with_stars(2))
            .unwrap();

        assert_eq!(service.user(user).unwrap().unwrap().stars, 3);
        assert_eq!(service.progress(user, topic).unwrap().stars_earned, 2);
    }

    #[test]
    fn test_resubmitted_stars_double_count() {
        let (mut service, user) = service_with_user();
        let update = ProgressUpdate::complete(Stage::Practice).with_stars(1);
        let first = service.update_progress(user, TopicId::new(1), &update).unwrap();
        let second = service.update_progress(user, TopicId::new(1), &update).unwrap();

        assert_eq!(first.practice_completed, second.practice_completed);
        assert_eq!(second.stars_earned, 1);
        assert_eq!(service.user(user).unwrap().unwrap().stars, 2);
    }

    #[test]
    fn test_update_without_stars_leaves_total() {
        let (mut service, user) = service_with_user();
        service
            .update_progress(user, TopicId::new(1), &ProgressUpdate::complete(Stage::Watch))
            .unwrap();
        assert_eq!(service.user(user).unwrap().unwrap().stars, 0);
    }

    #[test]
    fn test_stars_for_unknown_user_still_update_progress() {
        let mut service = LearningService::new(MemStorage::new());
        let p = service
            .update_progress(UserId::new(7), TopicId::new(3), &ProgressUpdate::default().with_stars(1))
            .unwrap();
        assert_eq!(p.stars_earned, 1);
        assert!(service.user(UserId::new(7)).unwrap().is_none());
    }

    #[test]
    fn test_complete_stage_awards_once() {
        let (mut service, user) = service_with_user();
        let topic = TopicId::new(1);
        let none = StageOutcome::default();

        let first = service.complete_stage(user, topic, Stage::Watch, &none).unwrap();
        assert_eq!(first.stars_awarded, 1);
        assert_eq!(first.next_stage, Some(Stage::Test));
        assert_eq!(first.next_route, "/test/1");

        let again = service.complete_stage(user, topic, Stage::Watch, &none).unwrap();
        assert_eq!(again.stars_awarded, 0);
        assert_eq!(again.progress.stars_earned, 1);
        assert_eq!(service.user(user).unwrap().unwrap().stars, 1);
    }

    #[test]
    fn test_failed_test_awards_nothing() {
        let (mut service, user) = service_with_user();
        let result = service
            .complete_stage(user, TopicId::new(1), Stage::Test, &StageOutcome::scored(2, 5))
            .unwrap();
        assert_eq!(result.stars_awarded, 0);
        assert!(result.progress.test_completed);
        assert_eq!(result.progress.test_score, Some(40));
        assert_eq!(service.user(user).unwrap().unwrap().stars, 0);
    }

    #[test]
    fn test_retake_after_failed_test_awards_star() {
        let (mut service, user) = service_with_user();
        let topic = TopicId::new(1);

        let failed = service
            .complete_stage(user, topic, Stage::Test, &StageOutcome::scored(1, 5))
            .unwrap();
        assert_eq!(failed.stars_awarded, 0);

        let passed = service
            .complete_stage(user, topic, Stage::Test, &StageOutcome::scored(5, 5))
            .unwrap();
        assert_eq!(passed.stars_awarded, 1);
        assert_eq!(passed.progress.test_score, Some(100));
        assert_eq!(service.user(user).unwrap().unwrap().stars, 1);

        let again = service
            .complete_stage(user, topic, Stage::Test, &StageOutcome::scored(4, 5))
            .unwrap();
        assert_eq!(again.stars_awarded, 0);
        assert_eq!(again.progress.test_score, Some(100));
        assert_eq!(service.user(user).unwrap().unwrap().stars, 1);
    }

    #[test]
    fn test_raw_test_completion_counts_as_paid() {
        let (mut service, user) = service_with_user();
        let topic = TopicId::new(1);
        service
            .update_progress(user, topic, &ProgressUpdate::complete(Stage::Test).with_stars(1))
            .unwrap();

        let result = service
            .complete_stage(user, topic, Stage::Test, &StageOutcome::scored(5, 5))
            .unwrap();
        assert_eq!(result.stars_awarded, 0);
        assert_eq!(service.user(user).unwrap().unwrap().stars, 1);
    }

    #[test]
    fn test_teach_unlocks_next_topic_once() {
        let (mut service, user) = service_with_user();
        let none = StageOutcome::default();

        let done = service
            .complete_stage(user, TopicId::new(1), Stage::Teach, &none)
            .unwrap();
        assert_eq!(done.stars_awarded, 2);
        assert_eq!(done.unlocked.len(), 1);
        assert_eq!(done.unlocked[0].id, TopicId::new(2));
        assert!(service.topic(TopicId::new(2)).unwrap().unwrap().is_playable());
        // no cascade
        assert!(!service.topic(TopicId::new(3)).unwrap().unwrap().is_playable());

        let again = service
            .complete_stage(user, TopicId::new(1), Stage::Teach, &none)
            .unwrap();
        assert!(again.unlocked.is_empty());
    }

    #[test]
    fn test_locked_topic_rejected() {
        let (mut service, user) = service_with_user();
        let err = service
            .complete_stage(user, TopicId::new(3), Stage::Watch, &StageOutcome::default())
            .unwrap_err();
        assert!(matches!(err, Error::TopicLocked(_)));

        let err = service
            .complete_stage(user, TopicId::new(99), Stage::Watch, &StageOutcome::default())
            .unwrap_err();
        assert!(matches!(err, Error::TopicNotFound(_)));
    }

    #[test]
    fn test_unlock_monotonic() {
        let mut service = LearningService::new(MemStorage::new());
        service.unlock_topic(TopicId::new(4)).unwrap();
        service
            .update_progress(UserId::new(1), TopicId::new(4), &ProgressUpdate::complete(Stage::Watch))
            .unwrap();
        for _ in 0..3 {
            assert!(!service.topic(TopicId::new(4)).unwrap().unwrap().is_locked);
        }
    }
}
