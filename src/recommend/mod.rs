pub mod filter;
pub mod preferences;
pub mod scoring;

pub use filter::{filter_colleges, is_eligible, RANK_MARGIN};
pub use preferences::{StudentPreferences, ANY};
pub use scoring::{classify, score, AdmissionChance};

use serde::Serialize;
use thiserror::Error;

use crate::catalog::CollegeRecord;

/// Number of colleges returned per request.
pub const TOP_N: usize = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    #[error("Invalid preferences: {0}")]
    InvalidPreferences(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub college: CollegeRecord,
    pub match_score: u8,
    pub admission_chance: AdmissionChance,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recommendation {
    /// Every eligible college, before the top-N cut.
    pub total_filtered: usize,
    pub candidates: Vec<ScoredCandidate>,
}

impl Recommendation {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn count(&self, chance: AdmissionChance) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.admission_chance == chance)
            .count()
    }

    pub fn summary(&self, catalog_size: usize) -> String {
        if self.total_filtered == 0 {
            return "No colleges found matching your criteria. \
                    Try increasing your budget or removing the state filter."
                .to_string();
        }

        format!(
            "Found {} eligible colleges from {} in our database. \
             Showing top {}: {} Safe, {} Target, {} Dream colleges.",
            self.total_filtered,
            catalog_size,
            self.candidates.len(),
            self.count(AdmissionChance::Safe),
            self.count(AdmissionChance::Target),
            self.count(AdmissionChance::Dream),
        )
    }
}

/// Filters, scores and ranks the catalog for one student.
///
/// Candidates are ordered by score, highest first; equal scores keep
/// catalog order. At most [`TOP_N`] are returned.
pub fn recommend(
    colleges: &[CollegeRecord],
    prefs: &StudentPreferences,
) -> Result<Recommendation, RecommendError> {
    prefs.check()?;

    let eligible = filter_colleges(colleges, prefs);
    let total_filtered = eligible.len();

    let mut candidates: Vec<ScoredCandidate> = eligible
        .into_iter()
        .map(|college| ScoredCandidate {
            match_score: score(college, prefs),
            admission_chance: classify(prefs.rank, college.closing_rank),
            college: college.clone(),
        })
        .collect();

    candidates.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    candidates.truncate(TOP_N);

    Ok(Recommendation {
        total_filtered,
        candidates,
    })
}
