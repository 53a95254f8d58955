use crate::catalog::{group_thousands, CollegeRecord};

/// The sentence a college is embedded as.
pub fn college_text(college: &CollegeRecord) -> String {
    format!(
        "{} located in {}, {}. \
         Offers {} via {} exam. \
         Closing rank: {}. \
         Annual fees: ₹{}. \
         NIRF national ranking: #{}. \
         Placement rate: {}%. \
         College type: {}.",
        college.college_name,
        college.city,
        college.state,
        college.course,
        college.exam,
        college.closing_rank,
        group_thousands(college.average_fees),
        college.nirf_ranking,
        college.placement_rate,
        college.college_type,
    )
}
