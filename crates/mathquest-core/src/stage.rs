//! The four-stage learning cycle
//!
//! Stages run in a fixed order: Watch, Test, Practice, Teach. No current
//! stage is stored; it is always derived from the four completion flags as
//! the first incomplete stage in order. Flags may be set out of order, in
//! which case the learner is routed back to the earliest gap.

use crate::{Progress, TopicId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of the learning cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Watch the lesson
    Watch,
    /// Take the test
    Test,
    /// Drag-and-drop practice activity
    Practice,
    /// Teach the virtual student
    Teach,
}

impl Stage {
    /// All stages in cycle order
    pub const ALL: [Stage; 4] = [Stage::Watch, Stage::Test, Stage::Practice, Stage::Teach];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Watch => "watch",
            Stage::Test => "test",
            Stage::Practice => "practice",
            Stage::Teach => "teach",
        }
    }

    /// Client route for this stage of a topic
    pub fn route(&self, topic_id: TopicId) -> String {
        let prefix = match self {
            Stage::Watch => "learn",
            Stage::Test => "test",
            Stage::Practice => "practice",
            Stage::Teach => "teach",
        };
        format!("/{}/{}", prefix, topic_id)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watch" => Ok(Stage::Watch),
            "test" => Ok(Stage::Test),
            "practice" => Ok(Stage::Practice),
            "teach" => Ok(Stage::Teach),
            other => Err(crate::Error::Validation(format!("unknown stage: {other}"))),
        }
    }
}

/// First incomplete stage in cycle order; `None` once the topic is complete
pub fn next_stage(progress: &Progress) -> Option<Stage> {
    Stage::ALL
        .into_iter()
        .find(|stage| !progress.is_stage_complete(*stage))
}

/// A topic is complete iff all four flags are set
pub fn is_complete(progress: &Progress) -> bool {
    next_stage(progress).is_none()
}

/// Number of completed stages (0-4)
pub fn completed_stages(progress: &Progress) -> usize {
    Stage::ALL
        .into_iter()
        .filter(|stage| progress.is_stage_complete(*stage))
        .count()
}

/// Completed stages as a rounded percentage
pub fn completion_percent(progress: &Progress) -> u8 {
    let done = completed_stages(progress) as f64;
    ((done / Stage::ALL.len() as f64) * 100.0).round() as u8
}

/// Where the learner should go next for this topic
pub fn next_route(progress: &Progress) -> String {
    match next_stage(progress) {
        Some(stage) => stage.route(progress.topic_id),
        None => format!("/topic/{}", progress.topic_id),
    }
}
