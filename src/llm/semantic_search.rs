use std::sync::Arc;

use crate::catalog::{group_thousands, CollegeRecord};
use crate::database::vector_db::{SearchHit, VectorStore};
use crate::recommend::StudentPreferences;

/// Similar colleges pulled into each explanation prompt.
pub const RAG_TOP_K: usize = 3;

/// The free-text query used to find colleges comparable to `candidate`.
pub fn rag_query(candidate: &CollegeRecord, prefs: &StudentPreferences) -> String {
    format!(
        "Student with rank {} looking for {} via {} in {}, budget ₹{}, considering {}",
        prefs.rank,
        prefs.course,
        prefs.exam,
        prefs.state,
        group_thousands(prefs.budget_max),
        candidate.college_name,
    )
}

pub fn format_college_line(college: &CollegeRecord) -> String {
    format!(
        "- {} ({}): Exam={}, Course={}, ClosingRank={}, Fees=₹{}, NIRF=#{}, Placement={}%, Type={}",
        college.college_name,
        college.state,
        college.exam,
        college.course,
        college.closing_rank,
        group_thousands(college.average_fees),
        college.nirf_ranking,
        college.placement_rate,
        college.college_type,
    )
}

pub fn format_results(colleges: &[&CollegeRecord]) -> String {
    colleges
        .iter()
        .map(|college| format_college_line(college))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Context block for the explanation prompt of one recommended college.
pub fn build_context(
    store: &VectorStore,
    candidate: &CollegeRecord,
    prefs: &StudentPreferences,
) -> String {
    let similar = store.query(&rag_query(candidate, prefs), RAG_TOP_K);
    format_results(&similar)
}

#[derive(Clone)]
pub struct SemanticSearch {
    store: Arc<VectorStore>,
}

impl SemanticSearch {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }

    pub fn context_for(&self, candidate: &CollegeRecord, prefs: &StudentPreferences) -> String {
        build_context(&self.store, candidate, prefs)
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit<'_>> {
        self.store.search(query, limit)
    }
}
