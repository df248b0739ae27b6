//! Topic definition schema

use mathquest_core::NewTopic;
use serde::{Deserialize, Serialize};

/// Definition of one catalog topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicDef {
    /// Handle used by unlock rules; unique across the curriculum
    pub key: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub grade: u8,
    pub category: String,
    #[serde(default = "default_order")]
    pub order: u32,
    /// Island label; defaults to the category
    #[serde(default)]
    pub island: Option<String>,
    #[serde(default = "default_locked")]
    pub locked: bool,
}

fn default_order() -> u32 {
    1
}

fn default_locked() -> bool {
    true
}

impl TopicDef {
    /// Catalog entry for storage seeding
    pub fn to_new_topic(&self) -> NewTopic {
        NewTopic {
            name: self.name.clone(),
            description: self.description.clone(),
            grade: self.grade,
            category: self.category.clone(),
            order: self.order,
            island: self.island.clone().unwrap_or_else(|| self.category.clone()),
            is_locked: self.locked,
        }
    }
}
