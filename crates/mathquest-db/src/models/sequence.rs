//! Identifier sequences.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Next identifier to hand out for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 10, version = 1)]
#[native_db]
pub struct StoredSequence {
    /// Table name - one row per table.
    #[primary_key]
    pub name: String,
    /// Next ID to assign.
    pub next: u64,
}

impl StoredSequence {
    pub const USERS: &'static str = "users";
    pub const TOPICS: &'static str = "topics";
    pub const PROGRESS: &'static str = "progress";

    /// A sequence that starts at 1.
    pub fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            next: 1,
        }
    }
}
