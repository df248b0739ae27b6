//! MathQuest DB - Durable storage using native_db
//!
//! Implements the `mathquest_core::Storage` contract over three tables:
//! - Users
//! - Topics (seeded from a catalog on first open)
//! - Progress keyed by (user, topic), indexed by user
//!
//! ID counters live in their own single-row sequence records so that
//! identifier assignment survives restarts.

mod error;
mod models;
mod queries;
mod store;

pub use error::{Error, Result};
pub use store::Store;
