pub mod corpus;
pub mod embeddings;
pub mod explain;
pub mod semantic_search;

pub use embeddings::{Embedding, EmbeddingGenerator, Vocabulary};
pub use explain::ExplanationService;
pub use semantic_search::SemanticSearch;
