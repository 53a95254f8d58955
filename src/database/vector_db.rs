use crate::catalog::CollegeRecord;
use crate::llm::corpus::college_text;
use crate::llm::embeddings::{dot, Embedding, EmbeddingGenerator, Vocabulary};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<'a> {
    pub college: &'a CollegeRecord,
    pub score: f64,
}

/// In-memory similarity index over the college catalog.
///
/// Records, vocabulary, IDF and embeddings are always built together; there
/// is no way to add or remove a single entry.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    colleges: Vec<CollegeRecord>,
    generator: EmbeddingGenerator,
    embeddings: Vec<Embedding>,
}

impl VectorStore {
    pub fn build(colleges: Vec<CollegeRecord>) -> Self {
        let texts: Vec<String> = colleges.iter().map(college_text).collect();
        let generator = EmbeddingGenerator::from_corpus(&texts);
        let embeddings = generator.generate_batch_embeddings(&texts);

        log::debug!(
            "Vector store built: {} colleges, {} dimensions",
            colleges.len(),
            generator.dimensions()
        );

        Self {
            colleges,
            generator,
            embeddings,
        }
    }

    pub fn rebuild(&mut self, colleges: Vec<CollegeRecord>) {
        *self = Self::build(colleges);
    }

    /// Up to `k` colleges, most similar first. Equal scores keep catalog
    /// order. A query that embeds to zero returns the first `k` colleges.
    pub fn query(&self, query_text: &str, k: usize) -> Vec<&CollegeRecord> {
        self.search(query_text, k)
            .into_iter()
            .map(|hit| hit.college)
            .collect()
    }

    pub fn search(&self, query_text: &str, k: usize) -> Vec<SearchHit<'_>> {
        let k = k.min(self.colleges.len());
        let query = self.generator.generate_embedding(query_text);

        if query.iter().all(|&x| x == 0.0) {
            return self.colleges[..k]
                .iter()
                .map(|college| SearchHit { college, score: 0.0 })
                .collect();
        }

        let mut scored: Vec<(usize, f64)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, embedding)| (i, dot(embedding, &query)))
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(k)
            .map(|(i, score)| SearchHit {
                college: &self.colleges[i],
                score,
            })
            .collect()
    }

    pub fn colleges(&self) -> &[CollegeRecord] {
        &self.colleges
    }

    pub fn embedding(&self, position: usize) -> Option<&Embedding> {
        self.embeddings.get(position)
    }

    pub fn generator(&self) -> &EmbeddingGenerator {
        &self.generator
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.generator.vocabulary()
    }

    pub fn len(&self) -> usize {
        self.colleges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colleges.is_empty()
    }
}
