//! Learner accounts

use crate::{Error, Result, UserId};
use serde::{Deserialize, Serialize};

/// Role assigned to accounts created through registration
pub const DEFAULT_ROLE: &str = "student";

/// Lowest and highest supported school grade
pub const GRADE_RANGE: std::ops::RangeInclusive<u8> = 1..=4;

/// A learner account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier, assigned at creation
    pub id: UserId,
    /// Login name
    pub username: String,
    /// Opaque credential hash owned by the auth layer
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Name shown in the header and dashboards
    pub display_name: Option<String>,
    /// School grade (1-4)
    pub grade: Option<u8>,
    /// Account role
    pub role: String,
    /// Running star total
    pub stars: u32,
}

/// Fields accepted when registering a new account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub grade: Option<u8>,
}

impl NewUser {
    /// Create registration fields with only the required values
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            display_name: None,
            grade: None,
        }
    }

    /// Set the display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the grade
    pub fn with_grade(mut self, grade: u8) -> Self {
        self.grade = Some(grade);
        self
    }

    /// Reject empty usernames and grades outside 1-4
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::Validation("username must not be empty".to_string()));
        }
        if let Some(grade) = self.grade {
            if !GRADE_RANGE.contains(&grade) {
                return Err(Error::Validation(format!(
                    "grade must be between {} and {}, got {}",
                    GRADE_RANGE.start(),
                    GRADE_RANGE.end(),
                    grade
                )));
            }
        }
        Ok(())
    }

    /// Build the stored record with defaults applied
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            password: self.password,
            display_name: self.display_name,
            grade: self.grade,
            role: DEFAULT_ROLE.to_string(),
            stars: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let user = NewUser::new("kit", "hash").into_user(UserId::new(4));
        assert_eq!(user.role, "student");
        assert_eq!(user.stars, 0);
        assert_eq!(user.display_name, None);
        assert_eq!(user.grade, None);
    }

    #[test]
    fn test_grade_validation() {
        assert!(NewUser::new("kit", "hash").with_grade(4).validate().is_ok());
        assert!(NewUser::new("kit", "hash").with_grade(5).validate().is_err());
        assert!(NewUser::new("kit", "hash").with_grade(0).validate().is_err());
        assert!(NewUser::new("  ", "hash").validate().is_err());
    }

    #[test]
    fn test_password_not_serialized() {
        let user = NewUser::new("kit", "secret").into_user(UserId::new(1));
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"displayName\":null"));
    }
}
