use crate::catalog::CollegeRecord;

use super::preferences::StudentPreferences;

/// Fraction of the student's own rank they may exceed a closing rank by.
pub const RANK_MARGIN: f64 = 0.3;

pub fn rank_margin(rank: i64) -> f64 {
    rank as f64 * RANK_MARGIN
}

pub fn is_eligible(college: &CollegeRecord, prefs: &StudentPreferences) -> bool {
    college.exam == prefs.exam
        && college.course == prefs.course
        && u64::try_from(prefs.budget_max).is_ok_and(|budget| college.average_fees <= budget)
        && (prefs.any_state() || college.state == prefs.state)
        && (prefs.any_college_type() || college.college_type.as_str() == prefs.college_type)
        && prefs.rank as f64 <= college.closing_rank as f64 + rank_margin(prefs.rank)
}

/// Colleges the student can apply to, in catalog order.
pub fn filter_colleges<'a>(
    colleges: &'a [CollegeRecord],
    prefs: &StudentPreferences,
) -> Vec<&'a CollegeRecord> {
    colleges
        .iter()
        .filter(|college| is_eligible(college, prefs))
        .collect()
}
