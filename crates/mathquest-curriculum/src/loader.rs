//! RON curriculum loader

use crate::error::{Error, Result};
use crate::schema::{CurriculumFile, TopicDef, UnlockDef};
use mathquest_core::{
    catalog, NewTopic, StageRewards, TopicId, UnlockRule, UnlockRules, GRADE_RANGE,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A resolved curriculum, ready to seed storage and configure the service
#[derive(Debug, Clone)]
pub struct Curriculum {
    /// Topics in ID order (the first gets ID 1)
    pub topics: Vec<NewTopic>,
    pub unlock_rules: UnlockRules,
    pub rewards: StageRewards,
}

impl Curriculum {
    /// The built-in grade 1 catalog with its single unlock rule
    pub fn builtin() -> Self {
        Self {
            topics: catalog::default_topics(),
            unlock_rules: UnlockRules::builtin(),
            rewards: StageRewards::default(),
        }
    }

    /// Parse a single curriculum document
    pub fn parse(content: &str) -> Result<Self> {
        let mut loader = Loader::new();
        loader.load_str(content)?;
        loader.finish()
    }

    /// Load a curriculum file, or every `.ron` file of a directory
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut loader = Loader::new();
        if path.is_dir() {
            loader.load_directory(path)?;
        } else {
            loader.load_file(path)?;
        }
        loader.finish()
    }
}

/// Accumulates curriculum files; references are resolved in `finish`
pub struct Loader {
    topics: Vec<TopicDef>,
    index: HashMap<String, usize>,
    unlocks: Vec<UnlockDef>,
    rewards: Option<StageRewards>,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            topics: Vec::new(),
            index: HashMap::new(),
            unlocks: Vec::new(),
            rewards: None,
        }
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        self.load_str(&content)?;
        tracing::debug!(path = %path.display(), topics = self.topics.len(), "loaded curriculum file");
        Ok(())
    }

    /// Load a curriculum document from a RON string
    pub fn load_str(&mut self, content: &str) -> Result<()> {
        let file: CurriculumFile = ron::from_str(content)?;

        for topic in file.topics {
            self.add_topic(topic)?;
        }
        self.unlocks.extend(file.unlocks);

        if let Some(rewards) = file.rewards {
            if self.rewards.is_some() {
                return Err(Error::DuplicateDefinition("rewards".to_string()));
            }
            self.rewards = Some(rewards);
        }
        Ok(())
    }

    /// Add one topic definition
    pub fn add_topic(&mut self, topic: TopicDef) -> Result<()> {
        if topic.key.trim().is_empty() {
            return Err(Error::InvalidSchema("topic key must not be empty".to_string()));
        }
        if topic.name.trim().is_empty() {
            return Err(Error::InvalidSchema(format!(
                "topic {} has an empty name",
                topic.key
            )));
        }
        if !GRADE_RANGE.contains(&topic.grade) {
            return Err(Error::InvalidSchema(format!(
                "topic {} has grade {}, expected {}..={}",
                topic.key,
                topic.grade,
                GRADE_RANGE.start(),
                GRADE_RANGE.end()
            )));
        }
        if self.index.contains_key(&topic.key) {
            return Err(Error::DuplicateDefinition(topic.key));
        }
        self.index.insert(topic.key.clone(), self.topics.len());
        self.topics.push(topic);
        Ok(())
    }

    /// Load all RON files from a directory, in file name order
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        // IDs follow load order, so it must not depend on the filesystem
        entries.sort();

        for file_path in entries {
            if file_path.extension().map(|e| e == "ron").unwrap_or(false) {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    /// Topic ID a key resolves to
    fn topic_id(&self, key: &str) -> Result<TopicId> {
        self.index
            .get(key)
            .map(|&pos| TopicId::new(pos as u64 + 1))
            .ok_or_else(|| Error::UnknownTopic(key.to_string()))
    }

    /// Resolve unlock references and return the curriculum
    pub fn finish(self) -> Result<Curriculum> {
        if self.topics.is_empty() {
            return Err(Error::InvalidSchema("curriculum declares no topics".to_string()));
        }

        let mut rules = UnlockRules::none();
        for def in &self.unlocks {
            let after = self.topic_id(&def.after)?;
            for target in &def.unlocks {
                let unlocks = self.topic_id(target)?;
                if unlocks == after {
                    return Err(Error::InvalidSchema(format!(
                        "topic {} cannot unlock itself",
                        def.after
                    )));
                }
                rules.push(UnlockRule::new(after, unlocks));
            }
        }

        if self.topics.iter().all(|t| t.locked) {
            tracing::warn!("every topic starts locked; nothing is playable until unlocked");
        }

        Ok(Curriculum {
            topics: self.topics.iter().map(TopicDef::to_new_topic).collect(),
            unlock_rules: rules,
            rewards: self.rewards.unwrap_or_default(),
        })
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
