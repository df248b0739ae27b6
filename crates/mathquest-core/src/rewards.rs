//! Star rewards per learning stage

use crate::{Error, Result, Stage};
use serde::{Deserialize, Serialize};

/// Stars awarded for completing each stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRewards {
    #[serde(default = "one")]
    pub watch: u32,
    /// Awarded only when the test score reaches `test_pass_percent`
    #[serde(default = "one")]
    pub test: u32,
    #[serde(default = "default_pass_percent")]
    pub test_pass_percent: u32,
    #[serde(default = "one")]
    pub practice: u32,
    #[serde(default = "two")]
    pub teach: u32,
}

fn one() -> u32 {
    1
}

fn two() -> u32 {
    2
}

fn default_pass_percent() -> u32 {
    70
}

impl Default for StageRewards {
    fn default() -> Self {
        Self {
            watch: one(),
            test: one(),
            test_pass_percent: default_pass_percent(),
            practice: one(),
            teach: two(),
        }
    }
}

/// What the learner achieved in a stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Correct answers (test stage)
    #[serde(default)]
    pub score: Option<u32>,
    /// Number of questions (test stage)
    #[serde(default)]
    pub total: Option<u32>,
}

impl StageOutcome {
    pub fn scored(score: u32, total: u32) -> Self {
        Self {
            score: Some(score),
            total: Some(total),
        }
    }

    /// Test score as a percentage, rounded down
    pub fn percent(&self) -> Result<u32> {
        let (score, total) = match (self.score, self.total) {
            (Some(score), Some(total)) => (score, total),
            _ => {
                return Err(Error::Validation(
                    "test completion requires score and total".to_string(),
                ))
            }
        };
        if total == 0 || score > total {
            return Err(Error::Validation(format!(
                "invalid test score {score}/{total}"
            )));
        }
        Ok((u64::from(score) * 100 / u64::from(total)) as u32)
    }
}

impl StageRewards {
    /// Stars earned for completing `stage` with `outcome`
    pub fn stars_for(&self, stage: Stage, outcome: &StageOutcome) -> Result<u32> {
        match stage {
            Stage::Watch => Ok(self.watch),
            Stage::Practice => Ok(self.practice),
            Stage::Teach => Ok(self.teach),
            Stage::Test => {
                if self.passes(outcome.percent()?) {
                    Ok(self.test)
                } else {
                    Ok(0)
                }
            }
        }
    }

    /// Whether a test percentage reaches the pass mark
    pub fn passes(&self, percent: u32) -> bool {
        percent >= self.test_pass_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_awards() {
        let rewards = StageRewards::default();
        let none = StageOutcome::default();
        assert_eq!(rewards.stars_for(Stage::Watch, &none).unwrap(), 1);
        assert_eq!(rewards.stars_for(Stage::Practice, &none).unwrap(), 1);
        assert_eq!(rewards.stars_for(Stage::Teach, &none).unwrap(), 2);
    }

    #[test]
    fn test_pass_threshold() {
        let rewards = StageRewards::default();
        assert_eq!(rewards.stars_for(Stage::Test, &StageOutcome::scored(7, 10)).unwrap(), 1);
        assert_eq!(rewards.stars_for(Stage::Test, &StageOutcome::scored(6, 10)).unwrap(), 0);
        assert_eq!(rewards.stars_for(Stage::Test, &StageOutcome::scored(4, 5)).unwrap(), 1);
    }

    #[test]
    fn test_invalid_scores() {
        let rewards = StageRewards::default();
        assert!(rewards.stars_for(Stage::Test, &StageOutcome::default()).is_err());
        assert!(rewards.stars_for(Stage::Test, &StageOutcome::scored(6, 5)).is_err());
        assert!(rewards.stars_for(Stage::Test, &StageOutcome::scored(0, 0)).is_err());
    }

    #[test]
    fn test_percent_rounds_down() {
        assert_eq!(StageOutcome::scored(2, 3).percent().unwrap(), 66);
        assert!(!StageRewards::default().passes(69));
        assert!(StageRewards::default().passes(70));
    }
}
