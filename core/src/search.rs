use crate::corpus::file_name_to_title;
use crate::index::IndexArtifact;
use crate::matrix::CsrMatrix;
use crate::preprocess::Preprocessor;
use crate::vectorizer::TfidfVectorizer;
use crate::{DocId, Error, Result};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ranked {
    pub doc: DocId,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc: DocId,
    pub filename: String,
    pub title: String,
    pub score: f64,
}

/// Rank every matrix row against already preprocessed `query_tokens`.
///
/// Returns `min(top_n, rows)` entries by descending cosine similarity, equal
/// scores in ascending document order. A query with no known terms scores
/// 0.0 everywhere.
pub fn search(query_tokens: &[String], matrix: &CsrMatrix, vectorizer: &TfidfVectorizer, top_n: usize) -> Result<Vec<Ranked>> {
    if top_n == 0 {
        return Err(Error::InvalidTopN);
    }
    let query = vectorizer.transform(&query_tokens.join(" "));
    let q = query.view();
    let mut ranked: Vec<Ranked> = matrix
        .rows()
        .enumerate()
        .map(|(doc, row)| Ranked { doc, score: q.cosine(&row) })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then(a.doc.cmp(&b.doc)));
    ranked.truncate(top_n);
    Ok(ranked)
}

/// A loaded index bound to the preprocessor its corpus was built with.
#[derive(Debug)]
pub struct SearchIndex {
    artifact: IndexArtifact,
    preprocessor: Preprocessor,
}

impl SearchIndex {
    /// Fails with [`Error::PipelineMismatch`] if `preprocessor` is not the one
    /// that produced the index, and with [`Error::CacheInconsistency`] if the
    /// titles, vectorizer and matrix disagree.
    pub fn new(artifact: IndexArtifact, preprocessor: Preprocessor) -> Result<Self> {
        artifact.check_consistency()?;
        if artifact.pipeline_signature != preprocessor.signature() {
            return Err(Error::PipelineMismatch {
                index: artifact.pipeline_signature.clone(),
                query: preprocessor.signature().to_string(),
            });
        }
        Ok(Self { artifact, preprocessor })
    }

    pub fn artifact(&self) -> &IndexArtifact { &self.artifact }
    pub fn preprocessor(&self) -> &Preprocessor { &self.preprocessor }
    pub fn len(&self) -> usize { self.artifact.num_docs() }
    pub fn is_empty(&self) -> bool { self.artifact.num_docs() == 0 }

    pub fn query(&self, text: &str, top_n: usize) -> Result<Vec<SearchHit>> {
        let tokens = self.preprocessor.preprocess_query(text);
        tracing::debug!(?tokens, "query tokens");
        let ranked = search(&tokens, &self.artifact.matrix, &self.artifact.vectorizer, top_n)?;
        Ok(ranked
            .into_iter()
            .map(|r| {
                let filename = self.artifact.titles[r.doc].clone();
                SearchHit { doc: r.doc, title: file_name_to_title(&filename), filename, score: r.score }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::VectorizerOptions;

    fn fit(docs: &[&str]) -> (TfidfVectorizer, CsrMatrix) {
        let docs: Vec<String> = docs.iter().map(|s| s.to_string()).collect();
        TfidfVectorizer::fit_transform(VectorizerOptions::default(), &docs)
    }

    fn toks(s: &str) -> Vec<String> { s.split_whitespace().map(String::from).collect() }

    #[test]
    fn ranks_by_descending_score() {
        let (v, m) = fit(&["graph node", "graph graph graph", "bread"]);
        let r = search(&toks("graph"), &m, &v, 3).unwrap();
        assert_eq!(r.iter().map(|x| x.doc).collect::<Vec<_>>(), vec![1, 0, 2]);
        assert!((r[0].score - 1.0).abs() < 1e-9);
        assert_eq!(r[2].score, 0.0);
    }

    #[test]
    fn ties_break_on_document_index() {
        let (v, m) = fit(&["bread", "graph", "graph", "cake"]);
        let r = search(&toks("graph"), &m, &v, 4).unwrap();
        assert_eq!(r.iter().map(|x| x.doc).collect::<Vec<_>>(), vec![1, 2, 0, 3]);
    }

    #[test]
    fn top_n_is_capped_by_corpus_size() {
        let (v, m) = fit(&["graph", "tree"]);
        assert_eq!(search(&toks("graph"), &m, &v, 10).unwrap().len(), 2);
        assert_eq!(search(&toks("graph"), &m, &v, 1).unwrap().len(), 1);
    }

    #[test]
    fn zero_top_n_is_rejected() {
        let (v, m) = fit(&["graph"]);
        assert!(matches!(search(&toks("graph"), &m, &v, 0), Err(Error::InvalidTopN)));
    }

    #[test]
    fn empty_query_scores_zero() {
        let (v, m) = fit(&["graph", "tree"]);
        let r = search(&[], &m, &v, 5).unwrap();
        assert_eq!(r.len(), 2);
        assert!(r.iter().all(|x| x.score == 0.0));
    }

    #[test]
    fn empty_index_returns_nothing() {
        let (v, m) = fit(&[]);
        assert!(search(&toks("graph"), &m, &v, 5).unwrap().is_empty());
    }

    mod bound_index {
        use super::super::*;
        use crate::corpus::Corpus;
        use crate::executor::Sequential;
        use crate::index::build_index;
        use crate::preprocess::PreprocessOptions;
        use crate::vectorizer::VectorizerOptions;

        fn artifact(pre: &Preprocessor) -> IndexArtifact {
            let mut corpus = Corpus::new();
            corpus.push("Cooking.txt", "bread and pastry recipes");
            corpus.push("Vision.txt", "image classification models");
            build_index(&corpus, pre, VectorizerOptions::default(), &Sequential).unwrap()
        }

        fn unstemmed() -> Preprocessor {
            Preprocessor::from_options(&PreprocessOptions { stemming: false, ..Default::default() })
        }

        #[test]
        fn rejects_titles_out_of_step_with_rows() {
            let pre = Preprocessor::english();
            let mut art = artifact(&pre);
            art.titles.pop();
            assert!(matches!(SearchIndex::new(art, pre), Err(Error::CacheInconsistency(_))));
        }

        #[test]
        fn rejects_a_different_pipeline() {
            let art = artifact(&Preprocessor::english());
            match SearchIndex::new(art, unstemmed()) {
                Err(Error::PipelineMismatch { index, query }) => assert_ne!(index, query),
                other => panic!("expected PipelineMismatch, got {other:?}"),
            }
        }

        #[test]
        fn accepts_the_building_pipeline() {
            let pre = unstemmed();
            let index = SearchIndex::new(artifact(&pre), unstemmed()).unwrap();
            let hits = index.query("bread", 5).unwrap();
            assert_eq!(hits[0].filename, "Cooking.txt");
            assert_eq!(hits[0].title, "Cooking");
        }
    }
}
