use crate::index::IndexArtifact;
use crate::matrix::CsrMatrix;
use crate::vectorizer::TfidfVectorizer;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, create_dir_all};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

/// Bumped whenever the on-disk layout of any part changes.
pub const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub fingerprint: String,
    pub pipeline_signature: String,
    pub num_docs: usize,
    pub num_terms: usize,
    pub created_at: String,
}

/// Locations of the persisted parts. The manifest is written last and marks
/// a complete index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub titles: PathBuf,
    pub vectorizer: PathBuf,
    pub matrix: PathBuf,
    pub manifest: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            titles: root.join("titles.bin"),
            vectorizer: root.join("vectorizer.bin"),
            matrix: root.join("matrix.bin"),
            manifest: root.join("manifest.json"),
        }
    }

    pub fn exists(&self) -> bool { self.manifest.is_file() }

    fn parts(&self) -> [&Path; 4] {
        [&self.titles, &self.vectorizer, &self.matrix, &self.manifest]
    }
}

#[derive(Serialize)]
struct PartRef<'a, T> {
    version: u32,
    fingerprint: &'a str,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Part<T> {
    version: u32,
    fingerprint: String,
    payload: T,
}

/// Persist titles, vectorizer and matrix as one unit.
///
/// The previous manifest is removed before any part is replaced, so a reader
/// never sees a manifest next to a half-written set of parts.
pub fn save_index(paths: &IndexPaths, artifact: &IndexArtifact) -> Result<()> {
    artifact.check_consistency()?;
    for p in paths.parts() {
        if let Some(dir) = p.parent() {
            create_dir_all(dir)?;
        }
    }
    match fs::remove_file(&paths.manifest) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }

    let fp = artifact.fingerprint.as_str();
    save_part(&paths.titles, fp, &artifact.titles)?;
    save_part(&paths.vectorizer, fp, &artifact.vectorizer)?;
    save_part(&paths.matrix, fp, &artifact.matrix)?;

    let manifest = Manifest {
        version: INDEX_FORMAT_VERSION,
        fingerprint: artifact.fingerprint.clone(),
        pipeline_signature: artifact.pipeline_signature.clone(),
        num_docs: artifact.num_docs(),
        num_terms: artifact.num_terms(),
        created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    write_atomic(&paths.manifest, json.as_bytes())?;

    tracing::info!(
        manifest = %paths.manifest.display(),
        num_docs = manifest.num_docs,
        num_terms = manifest.num_terms,
        "saved index"
    );
    Ok(())
}

/// Load all parts and verify they belong together. Any missing, corrupt or
/// mismatched part fails the whole load with [`Error::CacheInconsistency`].
pub fn load_index(paths: &IndexPaths) -> Result<IndexArtifact> {
    let manifest = load_manifest(paths)?;
    if manifest.version != INDEX_FORMAT_VERSION {
        return Err(Error::CacheInconsistency(format!(
            "manifest version {} (expected {INDEX_FORMAT_VERSION})",
            manifest.version
        )));
    }

    let titles: Vec<String> = load_part(&paths.titles, "titles", &manifest)?;
    let vectorizer: TfidfVectorizer = load_part(&paths.vectorizer, "vectorizer", &manifest)?;
    let matrix: CsrMatrix = load_part(&paths.matrix, "matrix", &manifest)?;

    let artifact = IndexArtifact {
        fingerprint: manifest.fingerprint.clone(),
        pipeline_signature: manifest.pipeline_signature.clone(),
        titles,
        vectorizer,
        matrix,
    };
    artifact.check_consistency()?;
    if artifact.num_docs() != manifest.num_docs || artifact.num_terms() != manifest.num_terms {
        return Err(Error::CacheInconsistency(format!(
            "manifest lists {} docs / {} terms, parts hold {} / {}",
            manifest.num_docs,
            manifest.num_terms,
            artifact.num_docs(),
            artifact.num_terms()
        )));
    }
    tracing::info!(num_docs = artifact.num_docs(), num_terms = artifact.num_terms(), created_at = %manifest.created_at, "loaded index");
    Ok(artifact)
}

pub fn load_manifest(paths: &IndexPaths) -> Result<Manifest> {
    let bytes = read_part_file(&paths.manifest, "manifest")?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::CacheInconsistency(format!("manifest at {} is corrupt: {e}", paths.manifest.display())))
}

fn save_part<T: Serialize>(path: &Path, fingerprint: &str, payload: &T) -> Result<()> {
    let bytes = bincode::serialize(&PartRef { version: INDEX_FORMAT_VERSION, fingerprint, payload })?;
    write_atomic(path, &bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote index part");
    Ok(())
}

fn load_part<T: DeserializeOwned>(path: &Path, name: &str, manifest: &Manifest) -> Result<T> {
    let bytes = read_part_file(path, name)?;
    let part: Part<T> = bincode::deserialize(&bytes)
        .map_err(|e| Error::CacheInconsistency(format!("{name} part at {} is corrupt: {e}", path.display())))?;
    if part.version != INDEX_FORMAT_VERSION {
        return Err(Error::CacheInconsistency(format!("{name} part has format version {}", part.version)));
    }
    if part.fingerprint != manifest.fingerprint {
        return Err(Error::CacheInconsistency(format!("{name} part belongs to a different build")));
    }
    Ok(part.payload)
}

fn read_part_file(path: &Path, name: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::CacheInconsistency(format!("{name} part missing at {}", path.display())),
        _ => Error::Io(e),
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let written = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
