//! MathQuest HTTP server
//!
//! JSON API over the learning service:
//! - Topic catalog listing, detail and unlock
//! - Per-topic and bulk progress reads, partial progress updates
//! - Stage completion with star rewards and topic unlocking
//! - Dashboard summaries
//!
//! The acting learner is taken from an identity header set by an upstream
//! auth layer, with a configurable placeholder for unauthenticated reads.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod identity;
pub mod query;
pub mod router;

pub use api::{handle_request, ApiRequest, AppState, DynStorage};
pub use bootstrap::{build_state, StartupError};
pub use config::{Config, ConfigError, IdentityConfig, StorageConfig};
pub use error::ApiError;
pub use identity::IdentityResolver;
pub use router::{ApiRouter, Endpoint, RouteMatch, RouteMiss};
