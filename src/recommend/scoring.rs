use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::CollegeRecord;

use super::filter::rank_margin;
use super::preferences::StudentPreferences;

const RANK_WEIGHT: f64 = 0.4;
const NIRF_WEIGHT: f64 = 0.2;
const PLACEMENT_WEIGHT: f64 = 0.2;
const BUDGET_WEIGHT: f64 = 0.2;

const SAFE_RATIO: f64 = 0.7;
const TARGET_RATIO: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdmissionChance {
    Safe,
    Target,
    Dream,
}

impl AdmissionChance {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionChance::Safe => "Safe",
            AdmissionChance::Target => "Target",
            AdmissionChance::Dream => "Dream",
        }
    }
}

impl fmt::Display for AdmissionChance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Safe up to 70% of the closing rank, Target up to 100%, Dream beyond.
pub fn classify(student_rank: i64, closing_rank: u32) -> AdmissionChance {
    let ratio = student_rank as f64 / closing_rank as f64;
    if ratio <= SAFE_RATIO {
        AdmissionChance::Safe
    } else if ratio <= TARGET_RATIO {
        AdmissionChance::Target
    } else {
        AdmissionChance::Dream
    }
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Scores round half to even: 62.5 becomes 62 and 63.5 becomes 64.
pub fn round_score(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 100.0) as u8
}

/// Match score in 0..=100.
pub fn score(college: &CollegeRecord, prefs: &StudentPreferences) -> u8 {
    let rank = prefs.rank as f64;
    let rank_proximity =
        clamp_unit(1.0 - rank / (college.closing_rank as f64 + rank_margin(prefs.rank)));
    let nirf_score = clamp_unit((100.0 - college.nirf_ranking as f64) / 100.0);
    let placement_score = clamp_unit(college.placement_rate as f64 / 100.0);
    let budget_fit = if prefs.budget_max > 0 {
        clamp_unit(1.0 - college.average_fees as f64 / prefs.budget_max as f64)
    } else {
        0.0
    };

    let weighted = RANK_WEIGHT * rank_proximity
        + NIRF_WEIGHT * nirf_score
        + PLACEMENT_WEIGHT * placement_score
        + BUDGET_WEIGHT * budget_fit;

    round_score(weighted * 100.0)
}
