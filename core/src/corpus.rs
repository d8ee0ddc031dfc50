use crate::{Error, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Suffix of the documents the loader picks up.
pub const TEXT_EXTENSION: &str = ".txt";

/// Filename-safe stand-in for `/` used when papers are saved under their title.
const SAFE_SLASH: char = '\u{29F8}';

/// Documents of one indexing run. `texts[i]` was read from `filenames[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    pub texts: Vec<String>,
    pub filenames: Vec<String>,
}

impl Corpus {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, filename: impl Into<String>, raw: &str) {
        self.filenames.push(filename.into());
        self.texts.push(clean_text(raw));
    }

    pub fn len(&self) -> usize { self.texts.len() }
    pub fn is_empty(&self) -> bool { self.texts.is_empty() }

    /// `(filename, normalized text)` pairs in corpus order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filenames.iter().map(String::as_str).zip(self.texts.iter().map(String::as_str))
    }
}

/// Load-time normalization. Case folding only.
pub fn clean_text(text: &str) -> String {
    text.to_lowercase()
}

/// Read every `.txt` file directly inside `dir`, sorted by file name.
///
/// A directory without matching files yields an empty corpus rather than an
/// error; later stages handle zero documents.
pub fn load_text_files<P: AsRef<Path>>(dir: P) -> Result<Corpus> {
    let dir = dir.as_ref();
    let mut corpus = Corpus::new();
    let walker = WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true).sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|source| Error::CorpusDir { path: dir.to_path_buf(), source })?;
        if !entry.file_type().is_file() { continue; }
        let Some(name) = entry.file_name().to_str() else {
            tracing::debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        if !name.ends_with(TEXT_EXTENSION) { continue; }
        let raw = fs::read_to_string(entry.path())
            .map_err(|source| Error::ReadDocument { path: entry.path().to_path_buf(), source })?;
        corpus.push(name, &raw);
    }

    if corpus.is_empty() {
        tracing::warn!(dir = %dir.display(), "no {TEXT_EXTENSION} documents found, index will be empty");
    } else {
        tracing::debug!(dir = %dir.display(), num_docs = corpus.len(), "loaded corpus");
    }
    Ok(corpus)
}

/// Display title for a stored document: no directory, nothing from the first
/// `.` on, underscores and the filename-safe slash as spaces.
pub fn file_name_to_title(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let stem = base.split('.').next().unwrap_or(base);
    stem.replace("\n__", " ").replace(['_', SAFE_SLASH], " ")
}
