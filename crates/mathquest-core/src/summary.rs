//! Per-learner progress overview for the parent dashboard

use crate::stage::{completion_percent, is_complete, next_route, next_stage};
use crate::{Progress, ProgressKey, Stage, Topic, UserId};
use serde::Serialize;

/// One topic row of the overview
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicOverview {
    pub topic: Topic,
    pub progress: Progress,
    pub completion_percent: u8,
    /// `None` once every stage is done
    pub next_stage: Option<Stage>,
    pub next_route: String,
}

/// Aggregate progress of one learner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub user_id: UserId,
    pub total_topics: usize,
    pub completed_topics: usize,
    /// Sum of `stars_earned` over the learner's records
    pub total_stars: u64,
    /// Completed topics as a rounded percentage of all topics
    pub completion_rate: u8,
    pub topics: Vec<TopicOverview>,
}

impl ProgressSummary {
    /// Build the overview; topics without a record use the virtual default
    pub fn build(user_id: UserId, topics: &[Topic], records: &[Progress]) -> Self {
        let rows: Vec<TopicOverview> = topics
            .iter()
            .map(|topic| {
                let progress = records
                    .iter()
                    .find(|p| p.topic_id == topic.id)
                    .cloned()
                    .unwrap_or_else(|| Progress::virtual_default(ProgressKey::new(user_id, topic.id)));
                TopicOverview {
                    completion_percent: completion_percent(&progress),
                    next_stage: next_stage(&progress),
                    next_route: next_route(&progress),
                    topic: topic.clone(),
                    progress,
                }
            })
            .collect();

        let completed_topics = records.iter().filter(|p| is_complete(p)).count();
        let total_stars = records.iter().map(|p| u64::from(p.stars_earned)).sum();
        let completion_rate = if topics.is_empty() {
            0
        } else {
            ((completed_topics as f64 / topics.len() as f64) * 100.0).round() as u8
        };

        Self {
            user_id,
            total_topics: topics.len(),
            completed_topics,
            total_stars,
            completion_rate,
            topics: rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog, MemStorage, Storage, TopicFilter, TopicId};

    #[test]
    fn test_empty_summary() {
        let summary = ProgressSummary::build(UserId::new(1), &[], &[]);
        assert_eq!(summary.completion_rate, 0);
        assert_eq!(summary.total_stars, 0);
        assert!(summary.topics.is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let store = MemStorage::with_catalog(catalog::default_topics());
        let topics = store.get_topics(&TopicFilter::all()).unwrap();
        let user = UserId::new(1);

        let mut done = Progress::virtual_default(ProgressKey::new(user, TopicId::new(1)));
        done.watch_completed = true;
        done.test_completed = true;
        done.practice_completed = true;
        done.teach_completed = true;
        done.stars_earned = 2;
        let mut started = Progress::virtual_default(ProgressKey::new(user, TopicId::new(3)));
        started.watch_completed = true;
        started.stars_earned = 1;

        let summary = ProgressSummary::build(user, &topics, &[done, started]);
        assert_eq!(summary.total_topics, 5);
        assert_eq!(summary.completed_topics, 1);
        assert_eq!(summary.total_stars, 3);
        assert_eq!(summary.completion_rate, 20);

        let addition = summary
            .topics
            .iter()
            .find(|row| row.topic.id == TopicId::new(3))
            .unwrap();
        assert_eq!(addition.completion_percent, 25);
        assert_eq!(addition.next_stage, Some(Stage::Test));
        assert_eq!(addition.next_route, "/test/3");
    }
}
