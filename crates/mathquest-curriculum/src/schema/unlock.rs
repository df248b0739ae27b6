//! Unlock rule schema

use serde::{Deserialize, Serialize};

/// Finishing the Teach stage of `after` unlocks every topic in `unlocks`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockDef {
    pub after: String,
    pub unlocks: Vec<String>,
}
