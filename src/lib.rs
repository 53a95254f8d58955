pub mod api;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod database;
pub mod llm;
pub mod providers;
pub mod recommend;

// Re-export commonly used items
pub use catalog::{Catalog, CollegeRecord, CollegeType};
pub use database::VectorStore;
pub use recommend::{
    recommend, AdmissionChance, Recommendation, RecommendError, ScoredCandidate,
    StudentPreferences,
};

/// Builds the similarity index over the whole catalog. Called once at startup.
pub fn build_index(colleges: &[CollegeRecord]) -> VectorStore {
    VectorStore::build(colleges.to_vec())
}

/// Similar-college context for one recommended college.
pub fn rag_context(
    store: &VectorStore,
    candidate: &CollegeRecord,
    prefs: &StudentPreferences,
) -> String {
    llm::semantic_search::build_context(store, candidate, prefs)
}
