use serde::{Deserialize, Serialize};
use validator::Validate;

use super::RecommendError;

pub const ANY: &str = "Any";

fn any() -> String {
    ANY.to_string()
}

fn default_true() -> bool {
    true
}

/// What a student is looking for. Field names follow the public JSON API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentPreferences {
    #[validate(length(min = 1, max = 50))]
    pub exam: String,
    #[validate(range(min = 1))]
    pub rank: i64,
    /// Shown back to the student; never used to exclude a college.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub budget_min: i64,
    #[validate(range(min = 1))]
    pub budget_max: i64,
    #[serde(default = "any")]
    pub state: String,
    #[validate(length(min = 1, max = 50))]
    pub course: String,
    #[serde(default = "any")]
    pub college_type: String,
    #[serde(rename = "useAI", default = "default_true")]
    pub use_ai: bool,
}

impl StudentPreferences {
    pub fn new(exam: &str, course: &str, rank: i64, budget_max: i64) -> Self {
        Self {
            exam: exam.to_string(),
            rank,
            budget_min: 0,
            budget_max,
            state: any(),
            course: course.to_string(),
            college_type: any(),
            use_ai: true,
        }
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = state.to_string();
        self
    }

    pub fn with_college_type(mut self, college_type: &str) -> Self {
        self.college_type = college_type.to_string();
        self
    }

    pub fn with_ai(mut self, use_ai: bool) -> Self {
        self.use_ai = use_ai;
        self
    }

    /// Rejects preferences that would only produce meaningless scores.
    pub fn check(&self) -> Result<(), RecommendError> {
        if self.rank <= 0 {
            return Err(RecommendError::InvalidPreferences(format!(
                "rank must be positive, got {}",
                self.rank
            )));
        }
        if self.budget_max <= 0 {
            return Err(RecommendError::InvalidPreferences(format!(
                "maximum budget must be positive, got {}",
                self.budget_max
            )));
        }
        if self.exam.trim().is_empty() {
            return Err(RecommendError::InvalidPreferences("exam is required".to_string()));
        }
        if self.course.trim().is_empty() {
            return Err(RecommendError::InvalidPreferences("course is required".to_string()));
        }
        Ok(())
    }

    pub fn any_state(&self) -> bool {
        self.state == ANY
    }

    pub fn any_college_type(&self) -> bool {
        self.college_type == ANY
    }
}
