use crate::corpus::Corpus;
use crate::executor::ParallelMap;
use crate::matrix::CsrMatrix;
use crate::preprocess::{PreprocessOptions, Preprocessor};
use crate::vectorizer::{IdfScheme, TfidfVectorizer, VectorizerOptions};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Everything that shapes a built index besides the documents themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    pub preprocess: PreprocessOptions,
    pub vectorizer: VectorizerOptions,
}

impl IndexOptions {
    pub fn preprocessor(&self) -> Preprocessor { Preprocessor::from_options(&self.preprocess) }
}

/// A built search index. `titles[i]` names the document in matrix row `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexArtifact {
    /// Hash of the corpus and of every option used to build it.
    pub fingerprint: String,
    /// [`Preprocessor::signature`] of the pipeline the corpus went through.
    pub pipeline_signature: String,
    pub titles: Vec<String>,
    pub vectorizer: TfidfVectorizer,
    pub matrix: CsrMatrix,
}

impl IndexArtifact {
    pub fn num_docs(&self) -> usize { self.titles.len() }
    pub fn num_terms(&self) -> usize { self.vectorizer.n_features() }

    pub fn is_current(&self, fingerprint: &str) -> bool { self.fingerprint == fingerprint }

    /// Titles, vectorizer and matrix describe the same documents and vocabulary.
    pub fn check_consistency(&self) -> Result<()> {
        if !self.matrix.is_well_formed() {
            return Err(Error::CacheInconsistency("matrix structure is corrupt".into()));
        }
        if !self.vectorizer.is_well_formed() {
            return Err(Error::CacheInconsistency("vectorizer vocabulary and idf table disagree".into()));
        }
        if self.titles.len() != self.matrix.n_rows() {
            return Err(Error::CacheInconsistency(format!(
                "{} titles but {} matrix rows",
                self.titles.len(),
                self.matrix.n_rows()
            )));
        }
        if self.vectorizer.n_features() != self.matrix.n_cols() {
            return Err(Error::CacheInconsistency(format!(
                "{} vocabulary terms but {} matrix columns",
                self.vectorizer.n_features(),
                self.matrix.n_cols()
            )));
        }
        Ok(())
    }
}

/// SHA-1 over the ordered documents, the preprocessing signature and the
/// vectorizer options. Changes whenever a rebuild would produce a different index.
pub fn corpus_fingerprint(corpus: &Corpus, preprocessor: &Preprocessor, options: &VectorizerOptions) -> String {
    let mut hasher = Sha1::new();
    hasher.update((corpus.len() as u64).to_le_bytes());
    for (name, text) in corpus.iter() {
        hasher.update((name.len() as u64).to_le_bytes());
        hasher.update(name.as_bytes());
        hasher.update((text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
    }
    hasher.update(preprocessor.signature().as_bytes());
    let idf = match options.idf {
        IdfScheme::Smooth => "smooth",
        IdfScheme::Plain => "plain",
    };
    hasher.update(format!("idf={idf}\nmin_term_len={}\n", options.min_term_len));
    format!("{:x}", hasher.finalize())
}

/// Preprocess every document on `executor`, then fit TF-IDF over the result.
pub fn build_index<E: ParallelMap>(
    corpus: &Corpus,
    preprocessor: &Preprocessor,
    options: VectorizerOptions,
    executor: &E,
) -> Result<IndexArtifact> {
    let tokens = preprocessor.preprocess_all(&corpus.texts, executor)?;
    if tokens.len() != corpus.len() {
        return Err(Error::Worker(format!("{} documents in, {} out", corpus.len(), tokens.len())));
    }
    let joined: Vec<String> = tokens.iter().map(|t| t.join(" ")).collect();
    let (vectorizer, matrix) = TfidfVectorizer::fit_transform(options, &joined);

    let artifact = IndexArtifact {
        fingerprint: corpus_fingerprint(corpus, preprocessor, &options),
        pipeline_signature: preprocessor.signature().to_string(),
        titles: corpus.filenames.clone(),
        vectorizer,
        matrix,
    };
    tracing::info!(num_docs = artifact.num_docs(), num_terms = artifact.num_terms(), "built index");
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Sequential, ThreadPool};

    fn corpus() -> Corpus {
        let mut c = Corpus::new();
        c.push("doc1.txt", "Deep learning models for image classification");
        c.push("doc2.txt", "Cooking recipes for bread and pastry");
        c
    }

    #[test]
    fn build_aligns_titles_and_rows() {
        let pre = Preprocessor::english();
        let idx = build_index(&corpus(), &pre, VectorizerOptions::default(), &Sequential).unwrap();
        assert_eq!(idx.titles, vec!["doc1.txt", "doc2.txt"]);
        assert_eq!(idx.matrix.n_rows(), 2);
        assert_eq!(idx.pipeline_signature, pre.signature());
        idx.check_consistency().unwrap();
    }

    #[test]
    fn executor_does_not_change_the_index() {
        let pre = Preprocessor::english();
        let a = build_index(&corpus(), &pre, VectorizerOptions::default(), &Sequential).unwrap();
        let b = build_index(&corpus(), &pre, VectorizerOptions::default(), &ThreadPool::new(3).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_changes_with_inputs() {
        let pre = Preprocessor::english();
        let opts = VectorizerOptions::default();
        let base = corpus_fingerprint(&corpus(), &pre, &opts);
        assert_eq!(base, corpus_fingerprint(&corpus(), &pre, &opts));

        let mut more = corpus();
        more.push("doc3.txt", "another paper");
        assert_ne!(base, corpus_fingerprint(&more, &pre, &opts));

        let unstemmed = IndexOptions { preprocess: PreprocessOptions { stemming: false, ..Default::default() }, ..Default::default() };
        assert_ne!(base, corpus_fingerprint(&corpus(), &unstemmed.preprocessor(), &opts));

        let plain = VectorizerOptions { idf: IdfScheme::Plain, ..Default::default() };
        assert_ne!(base, corpus_fingerprint(&corpus(), &pre, &plain));
    }

    #[test]
    fn empty_corpus_builds_empty_index() {
        let idx = build_index(&Corpus::new(), &Preprocessor::english(), VectorizerOptions::default(), &Sequential).unwrap();
        assert_eq!(idx.num_docs(), 0);
        assert_eq!(idx.matrix.n_rows(), 0);
        idx.check_consistency().unwrap();
    }

    #[test]
    fn detects_row_title_mismatch() {
        let mut idx = build_index(&corpus(), &Preprocessor::english(), VectorizerOptions::default(), &Sequential).unwrap();
        idx.titles.pop();
        assert!(matches!(idx.check_consistency(), Err(Error::CacheInconsistency(_))));
    }
}
