//! Progress records and the merge-update engine
//!
//! A progress record holds the four-stage completion state of one
//! (user, topic) pair. Records materialize lazily: reading a pair that was
//! never written yields a virtual default that is not persisted, and the
//! first update synthesizes a fresh record as its merge base.

use crate::storage::Storage;
use crate::{ProgressId, ProgressKey, Result, Stage, TopicId, UserId};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Completion and reward state for a (user, topic) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Persisted record ID; `None` for the virtual default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProgressId>,
    pub user_id: UserId,
    pub topic_id: TopicId,
    pub watch_completed: bool,
    pub test_completed: bool,
    pub practice_completed: bool,
    pub teach_completed: bool,
    /// Stars submitted with the latest update that carried a value
    pub stars_earned: u32,
    /// Best test score so far, as a percentage
    #[serde(default)]
    pub test_score: Option<u32>,
    /// Refreshed on every write; absent on the virtual default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Progress {
    /// The record reported for a pair that has never been written
    pub fn virtual_default(key: ProgressKey) -> Self {
        Self {
            id: None,
            user_id: key.user_id,
            topic_id: key.topic_id,
            watch_completed: false,
            test_completed: false,
            practice_completed: false,
            teach_completed: false,
            stars_earned: 0,
            test_score: None,
            updated_at: None,
        }
    }

    /// A fresh merge base for the first write of a pair
    pub fn fresh(id: ProgressId, key: ProgressKey) -> Self {
        Self {
            id: Some(id),
            ..Self::virtual_default(key)
        }
    }

    /// Composite key of this record
    pub fn key(&self) -> ProgressKey {
        ProgressKey::new(self.user_id, self.topic_id)
    }

    /// Whether this record has been persisted
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Completion flag for a stage
    pub fn is_stage_complete(&self, stage: Stage) -> bool {
        match stage {
            Stage::Watch => self.watch_completed,
            Stage::Test => self.test_completed,
            Stage::Practice => self.practice_completed,
            Stage::Teach => self.teach_completed,
        }
    }

    /// Apply only the fields present in `update`, then refresh `updated_at`
    ///
    /// `stars_earned` is overwritten, never summed.
    pub fn merge(&mut self, update: &ProgressUpdate) {
        if let Some(v) = update.watch_completed {
            self.watch_completed = v;
        }
        if let Some(v) = update.test_completed {
            self.test_completed = v;
        }
        if let Some(v) = update.practice_completed {
            self.practice_completed = v;
        }
        if let Some(v) = update.teach_completed {
            self.teach_completed = v;
        }
        if let Some(stars) = update.stars_earned {
            self.stars_earned = stars;
        }
        if let Some(score) = update.test_score {
            self.test_score = Some(self.test_score.map_or(score, |best| best.max(score)));
        }
        self.updated_at = Some(next_timestamp(self.updated_at));
    }
}

/// Partial update: only the fields that are `Some` change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(default)]
    pub watch_completed: Option<bool>,
    #[serde(default)]
    pub test_completed: Option<bool>,
    #[serde(default)]
    pub practice_completed: Option<bool>,
    #[serde(default)]
    pub teach_completed: Option<bool>,
    #[serde(default)]
    pub stars_earned: Option<u32>,
    /// Test percentage; kept on the record only if it beats the best so far
    #[serde(skip)]
    pub test_score: Option<u32>,
}

impl ProgressUpdate {
    /// An update that marks one stage complete
    pub fn complete(stage: Stage) -> Self {
        let mut update = Self::default();
        update.set_stage(stage, true);
        update
    }

    /// Set the flag for a stage
    pub fn set_stage(&mut self, stage: Stage, value: bool) {
        let slot = match stage {
            Stage::Watch => &mut self.watch_completed,
            Stage::Test => &mut self.test_completed,
            Stage::Practice => &mut self.practice_completed,
            Stage::Teach => &mut self.teach_completed,
        };
        *slot = Some(value);
    }

    /// Attach a star count
    pub fn with_stars(mut self, stars: u32) -> Self {
        self.stars_earned = Some(stars);
        self
    }

    /// Attach a test percentage
    pub fn with_test_score(mut self, percent: u32) -> Self {
        self.test_score = Some(percent);
        self
    }

    /// True when no field is present
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Current time at microsecond precision, strictly after `previous`
pub fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    match previous {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}

/// Read the record for a pair, or the virtual default when none exists
///
/// Reading never persists the default.
pub fn get_progress<S: Storage + ?Sized>(
    storage: &S,
    user_id: UserId,
    topic_id: TopicId,
) -> Result<Progress> {
    let key = ProgressKey::new(user_id, topic_id);
    Ok(storage
        .get_progress(key)?
        .unwrap_or_else(|| Progress::virtual_default(key)))
}

/// Merge `update` into the record for a pair, creating it on first write
pub fn update_progress<S: Storage + ?Sized>(
    storage: &mut S,
    user_id: UserId,
    topic_id: TopicId,
    update: &ProgressUpdate,
) -> Result<Progress> {
    storage.update_progress(ProgressKey::new(user_id, topic_id), update)
}

/// All persisted records of a user, unordered
pub fn all_progress_for_user<S: Storage + ?Sized>(
    storage: &S,
    user_id: UserId,
) -> Result<Vec<Progress>> {
    storage.all_progress_for_user(user_id)
}
