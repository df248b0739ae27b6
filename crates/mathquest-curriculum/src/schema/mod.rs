//! Schema definitions for curriculum files

pub mod topic;
pub mod unlock;

pub use topic::TopicDef;
pub use unlock::UnlockDef;

use mathquest_core::StageRewards;
use serde::{Deserialize, Serialize};

/// Top-level shape of one curriculum file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurriculumFile {
    #[serde(default)]
    pub topics: Vec<TopicDef>,
    #[serde(default)]
    pub unlocks: Vec<UnlockDef>,
    #[serde(default)]
    pub rewards: Option<StageRewards>,
}
