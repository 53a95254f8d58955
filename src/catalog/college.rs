use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollegeType {
    Government,
    Private,
}

impl CollegeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollegeType::Government => "Government",
            CollegeType::Private => "Private",
        }
    }
}

impl fmt::Display for CollegeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollegeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Government" => Ok(CollegeType::Government),
            "Private" => Ok(CollegeType::Private),
            other => Err(format!("Unknown college type: {}", other)),
        }
    }
}

/// One row of the admission catalog. Loaded once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollegeRecord {
    pub id: u32,
    pub college_name: String,
    pub state: String,
    pub city: String,
    pub course: String,
    pub exam: String,
    /// Worst rank admitted in the previous cycle. Lower is more competitive.
    pub closing_rank: u32,
    pub average_fees: u64,
    pub college_type: CollegeType,
    /// Lower is better.
    pub nirf_ranking: u32,
    pub placement_rate: u8,
}

/// Renders an integer with `,` between every group of three digits.
pub fn group_thousands(value: impl Into<i128>) -> String {
    let value: i128 = value.into();
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
