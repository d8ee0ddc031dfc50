use crate::matrix::{CsrMatrix, SparseVector};
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdfScheme {
    /// `ln((1 + n) / (1 + df)) + 1`, as if one extra document held every term.
    #[default]
    Smooth,
    /// `ln(n / df) + 1`
    Plain,
}

impl IdfScheme {
    fn weight(self, n: usize, df: u32) -> f64 {
        let (n, df) = (n as f64, df as f64);
        match self {
            IdfScheme::Smooth => ((1.0 + n) / (1.0 + df)).ln() + 1.0,
            IdfScheme::Plain => (n / df.max(1.0)).ln() + 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerOptions {
    pub idf: IdfScheme,
    /// Terms shorter than this many chars are not indexed.
    pub min_term_len: usize,
}

impl Default for VectorizerOptions {
    fn default() -> Self { Self { idf: IdfScheme::Smooth, min_term_len: 2 } }
}

/// Fitted TF-IDF model over whitespace separated token strings.
///
/// Columns follow sorted term order and every sum runs in column order, so
/// fitting the same corpus twice gives bit-identical weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    options: VectorizerOptions,
    vocabulary: BTreeMap<String, TermId>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn vocabulary and IDF from `docs` and weight them in one pass.
    pub fn fit_transform(options: VectorizerOptions, docs: &[String]) -> (Self, CsrMatrix) {
        let analyzed: Vec<Vec<&str>> = docs.iter().map(|d| analyze(&options, d)).collect();

        let mut df: BTreeMap<&str, u32> = BTreeMap::new();
        for terms in &analyzed {
            let unique: BTreeSet<&str> = terms.iter().copied().collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let n = docs.len();
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(df.len());
        for (col, (term, df_t)) in df.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), col as TermId);
            idf.push(options.idf.weight(n, df_t));
        }

        let vectorizer = Self { options, vocabulary, idf };
        let rows = analyzed.iter().map(|terms| vectorizer.weigh(terms)).collect();
        let matrix = CsrMatrix::from_rows(rows, vectorizer.n_features());
        tracing::debug!(num_docs = n, num_terms = vectorizer.n_features(), nnz = matrix.nnz(), "fitted tf-idf");
        (vectorizer, matrix)
    }

    /// Project one document into the fitted space. Unknown terms are ignored.
    pub fn transform(&self, doc: &str) -> SparseVector {
        self.weigh(&analyze(&self.options, doc))
    }

    pub fn n_features(&self) -> usize { self.idf.len() }
    pub fn options(&self) -> VectorizerOptions { self.options }
    pub fn vocabulary(&self) -> &BTreeMap<String, TermId> { &self.vocabulary }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&col| self.idf[col as usize])
    }

    /// Vocabulary and IDF table agree with each other.
    pub fn is_well_formed(&self) -> bool {
        self.vocabulary.len() == self.idf.len()
            && self.vocabulary.values().all(|&col| (col as usize) < self.idf.len())
    }

    // tf = count / doc length, times idf, then L2-normalized.
    fn weigh(&self, terms: &[&str]) -> SparseVector {
        let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in terms {
            if let Some(&col) = self.vocabulary.get(*term) {
                *counts.entry(col).or_insert(0) += 1;
            }
        }
        if counts.is_empty() {
            return SparseVector::default();
        }
        let len = terms.len() as f64;
        let mut entries: Vec<(TermId, f64)> = counts
            .into_iter()
            .map(|(col, c)| (col, (c as f64 / len) * self.idf[col as usize]))
            .collect();
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() { *w /= norm; }
        }
        SparseVector::from_sorted(entries)
    }
}

fn analyze<'a>(options: &VectorizerOptions, doc: &'a str) -> Vec<&'a str> {
    doc.split_whitespace()
        .filter(|t| t.chars().count() >= options.min_term_len)
        .collect()
}
