//! Topics: single math lesson units shown as islands on the map

use crate::TopicId;
use serde::{Deserialize, Serialize};

/// A math lesson unit tagged with grade and category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Unique identifier
    pub id: TopicId,
    /// Display name (e.g. "Counting Numbers 1-10")
    pub name: String,
    /// Short description shown on the topic card
    pub description: String,
    /// School grade the topic belongs to
    pub grade: u8,
    /// Category label (e.g. "Numbers", "Addition")
    pub category: String,
    /// Sequencing within a category and grade
    pub order: u32,
    /// Island grouping label on the map
    pub island: String,
    /// Whether the topic is still inaccessible to learners
    pub is_locked: bool,
}

impl Topic {
    /// A topic is playable iff it has been unlocked
    pub fn is_playable(&self) -> bool {
        !self.is_locked
    }
}

/// Catalog entry used to create a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTopic {
    pub name: String,
    pub description: String,
    pub grade: u8,
    pub category: String,
    pub order: u32,
    pub island: String,
    #[serde(default = "default_locked")]
    pub is_locked: bool,
}

fn default_locked() -> bool {
    true
}

impl NewTopic {
    /// Build the stored record
    pub fn into_topic(self, id: TopicId) -> Topic {
        Topic {
            id,
            name: self.name,
            description: self.description,
            grade: self.grade,
            category: self.category,
            order: self.order,
            island: self.island,
            is_locked: self.is_locked,
        }
    }
}

/// Optional grade/category filter, AND-combined when both are set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicFilter {
    pub grade: Option<u8>,
    pub category: Option<String>,
}

impl TopicFilter {
    /// Filter matching every topic
    pub fn all() -> Self {
        Self::default()
    }

    pub fn grade(mut self, grade: u8) -> Self {
        self.grade = Some(grade);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Check whether a topic passes the filter
    pub fn matches(&self, topic: &Topic) -> bool {
        self.grade.map_or(true, |g| topic.grade == g)
            && self.category.as_deref().map_or(true, |c| topic.category == c)
    }

    /// Apply the filter and sort ascending by `order`
    pub fn apply<'a>(&self, topics: impl IntoIterator<Item = &'a Topic>) -> Vec<Topic> {
        let mut matched: Vec<Topic> = topics
            .into_iter()
            .filter(|t| self.matches(t))
            .cloned()
            .collect();
        // Stable sort keeps insertion order between equal `order` values
        matched.sort_by_key(|t| t.order);
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: u64, category: &str, order: u32) -> Topic {
        Topic {
            id: TopicId::new(id),
            name: format!("topic {id}"),
            description: String::new(),
            grade: 1,
            category: category.to_string(),
            order,
            island: category.to_string(),
            is_locked: true,
        }
    }

    #[test]
    fn test_filter_sorts_by_order() {
        let topics = vec![topic(1, "Numbers", 3), topic(2, "Numbers", 1), topic(3, "Time", 2)];
        let result = TopicFilter::all().grade(1).category("Numbers").apply(&topics);
        let ids: Vec<u64> = result.iter().map(|t| t.id.raw()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_filter_grade_mismatch() {
        let topics = vec![topic(1, "Numbers", 1)];
        assert!(TopicFilter::all().grade(2).apply(&topics).is_empty());
    }

    #[test]
    fn test_new_topic_locked_by_default() {
        let json = r#"{"name":"n","description":"d","grade":1,"category":"c","order":1,"island":"i"}"#;
        let new: NewTopic = serde_json::from_str(json).unwrap();
        assert!(new.is_locked);
    }
}
