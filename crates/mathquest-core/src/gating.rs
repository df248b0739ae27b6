//! Topic gating: which topics are playable and what unlocks them
//!
//! Unlocking is one-way and never cascades. Rules fire when the Teach
//! stage of their source topic is completed.

use crate::TopicId;
use serde::{Deserialize, Serialize};

/// Completing the Teach stage of `after` unlocks `unlocks`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRule {
    pub after: TopicId,
    pub unlocks: TopicId,
}

impl UnlockRule {
    pub fn new(after: TopicId, unlocks: TopicId) -> Self {
        Self { after, unlocks }
    }
}

/// Ordered set of unlock rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnlockRules(Vec<UnlockRule>);

impl UnlockRules {
    /// No rules: topics only unlock through explicit calls
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Rules matching the built-in catalog: the first topic opens the second
    pub fn builtin() -> Self {
        Self(vec![UnlockRule::new(TopicId::new(1), TopicId::new(2))])
    }

    pub fn push(&mut self, rule: UnlockRule) {
        self.0.push(rule);
    }

    /// Topics opened by finishing `topic`, in rule order
    pub fn unlocked_by(&self, topic: TopicId) -> Vec<TopicId> {
        self.0
            .iter()
            .filter(|rule| rule.after == topic)
            .map(|rule| rule.unlocks)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnlockRule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<UnlockRule>> for UnlockRules {
    fn from(rules: Vec<UnlockRule>) -> Self {
        Self(rules)
    }
}
