//! Startup: curriculum, storage backend and shared state

use crate::api::{AppState, DynStorage};
use crate::config::{Config, ConfigError, StorageConfig};
use crate::identity::IdentityResolver;
use mathquest_core::{catalog, LearningService, MemStorage};
use mathquest_curriculum::Curriculum;
use mathquest_db::Store;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors that abort startup
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Curriculum error: {0}")]
    Curriculum(#[from] mathquest_curriculum::Error),

    #[error("Database error: {0}")]
    Database(#[from] mathquest_db::Error),

    #[error(transparent)]
    Core(#[from] mathquest_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Route table error: {0}")]
    Routes(#[from] regex::Error),
}

/// The configured curriculum, or the built-in one
pub fn load_curriculum(config: &Config) -> Result<Curriculum, StartupError> {
    match &config.curriculum {
        Some(path) => {
            let curriculum = Curriculum::from_path(path)?;
            info!(path = %path, topics = curriculum.topics.len(), "loaded curriculum");
            Ok(curriculum)
        }
        None => Ok(Curriculum::builtin()),
    }
}

/// Open the storage backend and seed the topic catalog
pub fn open_storage(
    storage: &StorageConfig,
    curriculum: &Curriculum,
) -> Result<DynStorage, StartupError> {
    match storage {
        StorageConfig::Memory => {
            info!(topics = curriculum.topics.len(), "using in-memory storage");
            Ok(Box::new(MemStorage::with_catalog(curriculum.topics.clone())))
        }
        StorageConfig::NativeDb(path) => {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let store = Store::open(path)?;
            store.seed_catalog(curriculum.topics.clone())?;
            Ok(Box::new(store))
        }
    }
}

/// Build the shared state for the HTTP service
pub fn build_state(config: &Config) -> Result<AppState, StartupError> {
    let curriculum = load_curriculum(config)?;
    let storage = open_storage(&config.storage, &curriculum)?;

    let mut service = LearningService::new(storage)
        .with_rewards(curriculum.rewards)
        .with_unlock_rules(curriculum.unlock_rules);

    if config.seed_demo_user {
        let demo = catalog::demo_user();
        if service.user_by_username(&demo.username)?.is_none() {
            let user = service.register_user(demo)?;
            info!(user_id = %user.id, username = %user.username, "created demo user");
        }
    }

    let identity = IdentityResolver::new(&config.identity)?;
    Ok(AppState::new(service, identity)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathquest_core::{TopicFilter, TopicId, UserId};

    #[tokio::test]
    async fn test_default_state() {
        let state = build_state(&Config::default()).unwrap();
        let service = state.service().read().await;

        let demo = service.user(UserId::new(1)).unwrap().unwrap();
        assert_eq!(demo.username, "sammy");
        assert_eq!(service.topics(&TopicFilter::all()).unwrap().len(), 5);
        assert_eq!(
            service.unlock_rules().unlocked_by(TopicId::new(1)),
            vec![TopicId::new(2)]
        );
    }

    #[tokio::test]
    async fn test_without_demo_user() {
        let config = Config {
            seed_demo_user: false,
            ..Config::default()
        };
        let state = build_state(&config).unwrap();
        assert!(state.service().read().await.user(UserId::new(1)).unwrap().is_none());
    }

    #[test]
    fn test_missing_curriculum_file() {
        let config = Config {
            curriculum: Some("does/not/exist.ron".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            build_state(&config),
            Err(StartupError::Curriculum(mathquest_curriculum::Error::Io(_)))
        ));
    }
}
