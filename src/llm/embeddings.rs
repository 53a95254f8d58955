//! TF-IDF embeddings for the college corpus.
//!
//! Text is lower-cased and split on whitespace. The vocabulary holds every
//! distinct corpus token, indexed in sorted order, so two builds over the
//! same corpus always agree on dimensions.

use std::collections::{BTreeMap, BTreeSet};

pub type Embedding = Vec<f64>;

/// Token to dimension index, in ascending token order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    index: BTreeMap<String, usize>,
}

impl Vocabulary {
    pub fn get(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }
}

pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Builds the vocabulary and per-token IDF weights from the whole corpus.
///
/// `idf(t) = ln((N + 1) / (df(t) + 1)) + 1`
pub fn build_vocabulary<S: AsRef<str>>(corpus: &[S]) -> (Vocabulary, Vec<f64>) {
    let documents: Vec<BTreeSet<String>> = corpus
        .iter()
        .map(|text| tokenize(text.as_ref()).into_iter().collect())
        .collect();

    let all_tokens: BTreeSet<&String> = documents.iter().flatten().collect();
    let index: BTreeMap<String, usize> = all_tokens
        .into_iter()
        .enumerate()
        .map(|(i, token)| (token.clone(), i))
        .collect();

    let mut doc_freq = vec![0usize; index.len()];
    for document in &documents {
        for token in document {
            if let Some(&i) = index.get(token) {
                doc_freq[i] += 1;
            }
        }
    }

    let n = documents.len() as f64;
    let idf = doc_freq
        .into_iter()
        .map(|df| ((n + 1.0) / (df as f64 + 1.0)).ln() + 1.0)
        .collect();

    (Vocabulary { index }, idf)
}

/// Embeds `text` against a vocabulary. Out-of-vocabulary tokens still count
/// toward the term-frequency denominator but add no weight. The result is
/// unit length, or all zeros when nothing matched.
pub fn embed(text: &str, vocabulary: &Vocabulary, idf: &[f64]) -> Embedding {
    let tokens = tokenize(text);
    let mut vector = vec![0.0; vocabulary.len()];
    if tokens.is_empty() {
        return vector;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for token in &tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }

    let total = tokens.len() as f64;
    for (token, count) in counts {
        if let Some(i) = vocabulary.get(token) {
            vector[i] = (count as f64 / total) * idf[i];
        }
    }

    normalize(&mut vector);
    vector
}

pub fn norm(vector: &[f64]) -> f64 {
    vector.iter().map(|x| x * x).sum::<f64>().sqrt()
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalize(vector: &mut [f64]) {
    let length = norm(vector);
    if length > 0.0 {
        for x in vector.iter_mut() {
            *x /= length;
        }
    }
}

/// A fitted vocabulary plus IDF weights.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingGenerator {
    vocabulary: Vocabulary,
    idf: Vec<f64>,
}

impl EmbeddingGenerator {
    pub fn from_corpus<S: AsRef<str>>(corpus: &[S]) -> Self {
        let (vocabulary, idf) = build_vocabulary(corpus);
        Self { vocabulary, idf }
    }

    pub fn generate_embedding(&self, text: &str) -> Embedding {
        embed(text, &self.vocabulary, &self.idf)
    }

    pub fn generate_batch_embeddings<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Embedding> {
        texts
            .iter()
            .map(|text| self.generate_embedding(text.as_ref()))
            .collect()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }
}
