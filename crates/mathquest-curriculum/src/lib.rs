//! MathQuest Curriculum - RON loader for the topic catalog
//!
//! A curriculum file declares:
//! - Topics, each with a stable `key` used to reference it
//! - Unlock rules between topic keys
//! - Optional star rewards per stage
//!
//! Topic IDs follow declaration order starting at 1, which is the order
//! storage backends assign them when seeding an empty catalog.

mod error;
mod loader;
mod schema;

pub use error::{Error, Result};
pub use loader::{Curriculum, Loader};
pub use schema::{CurriculumFile, TopicDef, UnlockDef};
