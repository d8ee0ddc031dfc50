use anyhow::{Context, Result};
use papersift_core::IndexOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory of extracted `.txt` papers.
    pub text_dir: PathBuf,
    /// Where the cached index lives.
    #[serde(alias = "preprocessed_path")]
    pub index_dir: PathBuf,
    pub top_n: usize,
    /// Preprocessing threads; all available cores when unset.
    pub workers: Option<usize>,
    pub index: IndexOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            text_dir: PathBuf::from("./data/text"),
            index_dir: PathBuf::from("./data/index"),
            top_n: 5,
            workers: None,
            index: IndexOptions::default(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read `path`. A missing file is only an error when `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papersift_core::tokenizer::Language;
    use papersift_core::vectorizer::IdfScheme;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn reads_legacy_keys_and_ignores_download_settings() {
        let cfg = Config::from_toml(
            r#"
            search_query = "cat:cs.LG"
            max_results = 50
            pdf_dir = "./pdf"
            text_dir = "./txt"
            preprocessed_path = "./cache"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.text_dir, PathBuf::from("./txt"));
        assert_eq!(cfg.index_dir, PathBuf::from("./cache"));
        assert_eq!(cfg.top_n, 5);
    }

    #[test]
    fn reads_index_options() {
        let cfg = Config::from_toml(
            r#"
            top_n = 10
            workers = 3

            [index.preprocess]
            language = "german"
            stemming = false
            stopwords = ["und", "der"]

            [index.vectorizer]
            idf = "plain"
            min_term_len = 3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.top_n, 10);
        assert_eq!(cfg.workers, Some(3));
        assert_eq!(cfg.index.preprocess.language, Language::German);
        assert!(!cfg.index.preprocess.stemming);
        assert_eq!(cfg.index.preprocess.stopwords, Some(vec!["und".to_string(), "der".to_string()]));
        assert_eq!(cfg.index.vectorizer.idf, IdfScheme::Plain);
        assert_eq!(cfg.index.vectorizer.min_term_len, 3);
    }

    #[test]
    fn missing_optional_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert_eq!(Config::load(&path, false).unwrap(), Config::default());
        assert!(Config::load(&path, true).is_err());
    }
}
