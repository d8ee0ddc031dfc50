use crate::corpus::clean_text;
use crate::executor::ParallelMap;
use crate::tokenizer::{is_alphabetic, Language, StopWords, TreebankTokenizer, WordTokenizer};
use crate::Result;
use rust_stemmers::Stemmer;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessOptions {
    pub language: Language,
    pub stemming: bool,
    /// Replaces the built-in stop-word list for `language` when set.
    pub stopwords: Option<Vec<String>>,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self { language: Language::English, stemming: true, stopwords: None }
    }
}

/// Tokenizer, stop words and stemmer shared by indexing and querying.
///
/// Scores are only meaningful when the corpus and the query went through the
/// same preprocessor; [`Preprocessor::signature`] identifies it and is stored
/// with every built index.
pub struct Preprocessor {
    tokenizer: Box<dyn WordTokenizer>,
    stopwords: StopWords,
    language: Language,
    stemmer: Option<Stemmer>,
    signature: String,
}

impl Preprocessor {
    pub fn new(tokenizer: Box<dyn WordTokenizer>, stopwords: StopWords, language: Language, stemming: bool) -> Self {
        let signature = signature_of(tokenizer.as_ref(), &stopwords, language, stemming);
        let stemmer = stemming.then(|| Stemmer::create(language.algorithm()));
        Self { tokenizer, stopwords, language, stemmer, signature }
    }

    pub fn from_options(opts: &PreprocessOptions) -> Self {
        let stopwords = match &opts.stopwords {
            Some(words) => StopWords::from_words(words),
            None => StopWords::for_language(opts.language).unwrap_or_else(|| {
                tracing::warn!(language = opts.language.as_str(), "no built-in stop words for language, filtering none");
                StopWords::none()
            }),
        };
        Self::new(Box::new(TreebankTokenizer), stopwords, opts.language, opts.stemming)
    }

    /// English stop words with Snowball stemming.
    pub fn english() -> Self { Self::from_options(&PreprocessOptions::default()) }

    pub fn signature(&self) -> &str { &self.signature }
    pub fn language(&self) -> Language { self.language }
    pub fn is_stemming(&self) -> bool { self.stemmer.is_some() }
    pub fn stopwords(&self) -> &StopWords { &self.stopwords }

    /// Tokens of already lowercased text: alphabetic, not a stop word, stemmed if enabled.
    pub fn preprocess(&self, text: &str) -> Vec<String> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .filter(|t| is_alphabetic(t) && !self.stopwords.contains(t))
            .map(|t| match &self.stemmer {
                Some(stemmer) => stemmer.stem(&t).into_owned(),
                None => t,
            })
            .collect()
    }

    /// Same pipeline as the corpus, starting from raw user input.
    pub fn preprocess_query(&self, raw: &str) -> Vec<String> {
        self.preprocess(&clean_text(raw))
    }

    /// Preprocess a batch on `executor`; output `i` belongs to `texts[i]`.
    pub fn preprocess_all<E: ParallelMap>(&self, texts: &[String], executor: &E) -> Result<Vec<Vec<String>>> {
        let processed = executor.try_map(texts, |text| Ok(self.preprocess(text)))?;
        tracing::debug!(
            num_docs = processed.len(),
            num_tokens = processed.iter().map(Vec::len).sum::<usize>(),
            "preprocessed corpus"
        );
        Ok(processed)
    }
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("tokenizer", &self.tokenizer.name())
            .field("language", &self.language)
            .field("stemming", &self.is_stemming())
            .field("stopwords", &self.stopwords.len())
            .field("signature", &self.signature)
            .finish()
    }
}

fn signature_of(tokenizer: &dyn WordTokenizer, stopwords: &StopWords, language: Language, stemming: bool) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("tokenizer={}\nlanguage={}\nstemming={}\n", tokenizer.name(), language.as_str(), stemming));
    for word in stopwords.sorted() {
        hasher.update(word.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Sequential, ThreadPool};

    fn plain() -> Preprocessor {
        Preprocessor::from_options(&PreprocessOptions { stemming: false, ..Default::default() })
    }

    #[test]
    fn drops_non_alphabetic_and_stopwords() {
        let toks = plain().preprocess("the 2 models of covid-19, and graphs.");
        assert_eq!(toks, vec!["models", "graphs"]);
    }

    #[test]
    fn stems_when_enabled() {
        let toks = Preprocessor::english().preprocess("learning images running");
        assert_eq!(toks, vec!["learn", "imag", "run"]);
    }

    #[test]
    fn query_is_lowercased_first() {
        assert_eq!(plain().preprocess_query("The NEURAL Networks"), vec!["neural", "networks"]);
    }

    #[test]
    fn signature_tracks_configuration() {
        let a = Preprocessor::english();
        let b = Preprocessor::english();
        assert_eq!(a.signature(), b.signature());
        assert_ne!(a.signature(), plain().signature());
        let custom = Preprocessor::from_options(&PreprocessOptions { stopwords: Some(vec!["graph".into()]), ..Default::default() });
        assert_ne!(a.signature(), custom.signature());
    }

    #[test]
    fn custom_stopwords_replace_builtin() {
        let p = Preprocessor::from_options(&PreprocessOptions {
            stemming: false,
            stopwords: Some(vec!["Graph".into()]),
            ..Default::default()
        });
        assert_eq!(p.preprocess("the graph"), vec!["the"]);
    }

    #[test]
    fn batch_matches_single_document_calls() {
        let p = Preprocessor::english();
        let texts: Vec<String> = (0..40).map(|i| format!("document {i} about topic{} and learning models", i % 3)).collect();
        let expected: Vec<Vec<String>> = texts.iter().map(|t| p.preprocess(t)).collect();
        assert_eq!(p.preprocess_all(&texts, &Sequential).unwrap(), expected);
        assert_eq!(p.preprocess_all(&texts, &ThreadPool::new(4).unwrap()).unwrap(), expected);
    }
}
