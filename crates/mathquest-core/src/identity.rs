//! Identity types for users, topics and progress records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Unique identifier of a learner account
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    /// Create a new user ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_raw(s).map(Self)
    }
}

/// Unique identifier of a topic in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(pub u64);

impl TopicId {
    /// Create a new topic ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TopicId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_raw(s).map(Self)
    }
}

/// Identifier assigned to a persisted progress record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressId(pub u64);

impl ProgressId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Composite key of a progress record: at most one record per pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressKey {
    pub user_id: UserId,
    pub topic_id: TopicId,
}

impl ProgressKey {
    pub fn new(user_id: UserId, topic_id: TopicId) -> Self {
        Self { user_id, topic_id }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.user_id, self.topic_id)
    }
}

// Identifiers start at 1; zero and anything non-numeric is rejected.
fn parse_raw(s: &str) -> Result<u64, Error> {
    match s.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(Error::InvalidId(s.to_string())),
        Ok(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id() {
        let id = UserId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "42");
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!("7".parse::<TopicId>().unwrap(), TopicId::new(7));
        assert!("abc".parse::<TopicId>().is_err());
        assert!("0".parse::<UserId>().is_err());
        assert!("-3".parse::<UserId>().is_err());
    }

    #[test]
    fn test_progress_key_display() {
        let key = ProgressKey::new(UserId::new(7), TopicId::new(3));
        assert_eq!(key.to_string(), "7-3");
    }
}
