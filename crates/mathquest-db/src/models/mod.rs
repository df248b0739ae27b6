//! Database models for persistent storage.

mod learner;
mod sequence;

pub use learner::*;
pub use sequence::*;
