use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cinevec",
    about = "pgvector movie toolkit: import embeddings, seed benchmark vectors, query by similarity",
    version,
    after_help = "Examples:\n  cinevec import --csv TMDB_movie_dataset_v11.csv\n  cinevec query \"A sci-fi movie about space travel\" 10 cosine\n  cinevec seed --rows 1000\n  cinevec analogy\n\nEnvironment:\n  CINEVEC_EXPLAIN=1  write query plan analysis to a timestamped file\n  CINEVEC_VERT=1     vertical record-by-record output\n  CINEVEC_DEBUG=1    echo parsed query inputs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import the TMDB CSV, embedding each movie overview
    Import(ImportArgs),

    /// Fill benchmark tables with random vectors (appends on re-run)
    Seed(SeedArgs),

    /// Find movies whose overview is closest to a text query
    Query(QueryArgs),

    /// Offline word-vector arithmetic check (king - man + woman)
    Analogy,

    /// Show or create the configuration file
    Config,
}

#[derive(Parser)]
pub struct ImportArgs {
    /// CSV file to import (overrides the configured path)
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SeedArgs {
    /// Rows per table (overrides the configured count)
    #[arg(long)]
    pub rows: Option<usize>,
}

#[derive(Parser)]
pub struct QueryArgs {
    /// Text to search for
    pub query: Option<String>,

    /// Number of results (default 5; non-numeric values warn and fall back)
    pub limit: Option<String>,

    /// Distance metric: 'euclidean' (default) or 'cosine'
    pub metric: Option<String>,
}
