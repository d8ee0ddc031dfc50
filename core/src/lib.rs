//! Lexical retrieval over a directory of plain-text papers.
//!
//! Pipeline: [`corpus`] loads and lowercases documents, [`preprocess`] turns
//! them into token streams on a [`executor::ParallelMap`], [`vectorizer`]
//! fits TF-IDF weights, [`persist`] caches the fitted index and [`search`]
//! ranks documents against a query by cosine similarity.

pub mod corpus;
pub mod error;
pub mod executor;
pub mod index;
pub mod matrix;
pub mod persist;
pub mod preprocess;
pub mod search;
pub mod tokenizer;
pub mod vectorizer;

pub use error::{Error, Result};
pub use index::{build_index, corpus_fingerprint, IndexArtifact, IndexOptions};
pub use preprocess::Preprocessor;
pub use search::{search, Ranked, SearchHit, SearchIndex};

/// Row index of a document in the corpus and in the TF-IDF matrix.
pub type DocId = usize;
/// Column index of a term in the fitted vocabulary.
pub type TermId = u32;
