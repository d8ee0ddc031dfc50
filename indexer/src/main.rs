mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Config, DEFAULT_CONFIG};
use papersift_core::corpus::{load_text_files, Corpus};
use papersift_core::executor::ThreadPool;
use papersift_core::persist::{load_index, save_index, IndexPaths};
use papersift_core::{build_index, corpus_fingerprint, IndexArtifact, Preprocessor, SearchIndex};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "papersift")]
#[command(about = "Index a folder of paper texts and rank them against a query", long_about = None)]
struct Cli {
    /// TOML config file (defaults apply if ./config.toml is absent)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory of .txt documents
    #[arg(long, global = true)]
    text_dir: Option<PathBuf>,
    /// Index directory
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,
    /// Preprocessing worker threads
    #[arg(long, global = true)]
    workers: Option<usize>,
    /// Disable stemming for indexing and querying
    #[arg(long, global = true, default_value_t = false)]
    no_stem: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index from the text directory
    Build,
    /// Rank documents against a free-text query
    Search {
        query: String,
        /// Number of results
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
        /// Rebuild the index before searching
        #[arg(long, default_value_t = false)]
        rebuild: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    let cfg = settings(&cli)?;
    let preprocessor = cfg.index.preprocessor();

    match cli.command {
        Commands::Build => {
            let corpus = read_corpus(&cfg)?;
            let artifact = rebuild(&cfg, &preprocessor, &corpus)?;
            println!("Indexed {} documents ({} terms) into {}", artifact.num_docs(), artifact.num_terms(), cfg.index_dir.display());
        }
        Commands::Search { query, top_n, rebuild: force } => {
            let artifact = open_index(&cfg, &preprocessor, force)?;
            let index = SearchIndex::new(artifact, preprocessor)?;
            let hits = index.query(&query, top_n.unwrap_or(cfg.top_n))?;
            if index.is_empty() {
                println!("No documents indexed from {}", cfg.text_dir.display());
                return Ok(());
            }
            println!("\nTop documents for query '{query}':");
            for hit in hits {
                println!("{} (Score: {:.4})", hit.title, hit.score);
            }
        }
    }
    Ok(())
}

fn settings(cli: &Cli) -> Result<Config> {
    let mut cfg = match &cli.config {
        Some(path) => Config::load(path, true)?,
        None => Config::load(Path::new(DEFAULT_CONFIG), false)?,
    };
    if let Some(dir) = &cli.text_dir { cfg.text_dir = dir.clone(); }
    if let Some(dir) = &cli.index_dir { cfg.index_dir = dir.clone(); }
    if cli.workers.is_some() { cfg.workers = cli.workers; }
    if cli.no_stem { cfg.index.preprocess.stemming = false; }
    Ok(cfg)
}

fn read_corpus(cfg: &Config) -> Result<Corpus> {
    load_text_files(&cfg.text_dir).with_context(|| format!("loading documents from {}", cfg.text_dir.display()))
}

fn rebuild(cfg: &Config, preprocessor: &Preprocessor, corpus: &Corpus) -> Result<IndexArtifact> {
    let pool = match cfg.workers {
        Some(n) => ThreadPool::new(n)?,
        None => ThreadPool::with_available_parallelism()?,
    };
    tracing::info!(num_docs = corpus.len(), workers = pool.workers(), "building index");
    let artifact = build_index(corpus, preprocessor, cfg.index.vectorizer, &pool)?;
    save_index(&IndexPaths::new(&cfg.index_dir), &artifact)
        .with_context(|| format!("writing index to {}", cfg.index_dir.display()))?;
    Ok(artifact)
}

/// Cached index if it matches the current documents and options, otherwise a fresh build.
fn open_index(cfg: &Config, preprocessor: &Preprocessor, force: bool) -> Result<IndexArtifact> {
    let paths = IndexPaths::new(&cfg.index_dir);
    let corpus = read_corpus(cfg)?;
    if force || !paths.exists() {
        return rebuild(cfg, preprocessor, &corpus);
    }
    let cached = load_index(&paths)
        .with_context(|| format!("index at {} is unusable, rerun with --rebuild", cfg.index_dir.display()))?;
    let current = corpus_fingerprint(&corpus, preprocessor, &cfg.index.vectorizer);
    if !cached.is_current(&current) {
        tracing::warn!(index = %cfg.index_dir.display(), "documents or options changed since the index was built, rebuilding");
        return rebuild(cfg, preprocessor, &corpus);
    }
    Ok(cached)
}
