pub mod college;

pub use college::{group_thousands, CollegeRecord, CollegeType};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use thiserror::Error;

const BUNDLED_COLLEGES: &str = include_str!("../../data/colleges.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Catalog contains no colleges")]
    Empty,
    #[error("Duplicate college id: {0}")]
    DuplicateId(u32),
    #[error("Invalid college {id}: {reason}")]
    InvalidRecord { id: u32, reason: String },
}

/// Dropdown values derived from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogMeta {
    pub exams: Vec<String>,
    pub courses: BTreeMap<String, Vec<String>>,
    pub states: Vec<String>,
    pub college_types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    colleges: Vec<CollegeRecord>,
}

impl Catalog {
    pub fn new(colleges: Vec<CollegeRecord>) -> Result<Self, CatalogError> {
        if colleges.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(colleges.len());
        for college in &colleges {
            if !seen.insert(college.id) {
                return Err(CatalogError::DuplicateId(college.id));
            }
            validate_record(college)?;
        }

        Ok(Self { colleges })
    }

    /// The catalog shipped with the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json_str(BUNDLED_COLLEGES)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let colleges: Vec<CollegeRecord> = serde_json::from_str(json)?;
        Self::new(colleges)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn colleges(&self) -> &[CollegeRecord] {
        &self.colleges
    }

    pub fn len(&self) -> usize {
        self.colleges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colleges.is_empty()
    }

    pub fn meta(&self) -> CatalogMeta {
        let mut exams = BTreeSet::new();
        let mut courses: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut states = BTreeSet::new();

        for college in &self.colleges {
            exams.insert(college.exam.clone());
            courses
                .entry(college.exam.clone())
                .or_default()
                .insert(college.course.clone());
            states.insert(college.state.clone());
        }

        CatalogMeta {
            exams: exams.into_iter().collect(),
            courses: courses
                .into_iter()
                .map(|(exam, set)| (exam, set.into_iter().collect()))
                .collect(),
            states: states.into_iter().collect(),
            college_types: vec![
                "Any".to_string(),
                CollegeType::Government.to_string(),
                CollegeType::Private.to_string(),
            ],
        }
    }
}

fn validate_record(college: &CollegeRecord) -> Result<(), CatalogError> {
    let reason = if college.closing_rank == 0 {
        Some("closing rank must be positive")
    } else if college.nirf_ranking == 0 {
        Some("NIRF ranking must be positive")
    } else if college.placement_rate > 100 {
        Some("placement rate must be a percentage")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CatalogError::InvalidRecord {
            id: college.id,
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
