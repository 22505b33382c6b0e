use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub seed: SeedConfig,
}

/// Connection parameters for the PostgreSQL instance hosting pgvector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_dbname")]
    pub dbname: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Path to the TMDB movie dataset CSV.
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,

    #[serde(default = "default_movies_table")]
    pub movies_table: String,

    #[serde(default = "default_embeddings_table")]
    pub embeddings_table: String,

    /// Records per transaction; a progress line is printed at each commit.
    #[serde(default = "default_import_batch_size")]
    pub batch_size: usize,

    /// What to do when a single row fails to parse or insert.
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

/// Row-level failure policy for the bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Report the row, roll back the current batch, keep going.
    #[default]
    Skip,
    /// Roll back the current batch and abort the run.
    FailFast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Benchmark tables to fill with random vectors.
    #[serde(default = "default_seed_tables")]
    pub tables: Vec<SeedTable>,

    /// Rows inserted into each table.
    #[serde(default = "default_seed_rows")]
    pub rows: usize,

    #[serde(default = "default_seed_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedTable {
    pub table: String,
    pub dimension: usize,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    5432
}
fn default_dbname() -> String {
    "postgres".to_string()
}
fn default_user() -> String {
    "postgres".to_string()
}
fn default_csv_path() -> PathBuf {
    PathBuf::from("TMDB_movie_dataset_v11.csv")
}
fn default_movies_table() -> String {
    "movies_tmdb".to_string()
}
fn default_embeddings_table() -> String {
    "movies_tmdb_embeddings".to_string()
}
fn default_import_batch_size() -> usize {
    2000
}
fn default_seed_tables() -> Vec<SeedTable> {
    vec![
        SeedTable {
            table: "vectors_400".to_string(),
            dimension: 400,
        },
        SeedTable {
            table: "vectors_500".to_string(),
            dimension: 500,
        },
    ]
}
fn default_seed_rows() -> usize {
    100_000
}
fn default_seed_batch_size() -> usize {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dbname: default_dbname(),
            user: default_user(),
            password: String::new(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            movies_table: default_movies_table(),
            embeddings_table: default_embeddings_table(),
            batch_size: default_import_batch_size(),
            on_error: ErrorPolicy::default(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            tables: default_seed_tables(),
            rows: default_seed_rows(),
            batch_size: default_seed_batch_size(),
        }
    }
}

impl DatabaseConfig {
    /// Builds the client configuration for a blocking connection.
    pub fn pg_config(&self) -> postgres::Config {
        let mut cfg = postgres::Config::new();
        cfg.host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .password(&self.password);
        cfg
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path).context("Failed to read config file")?;
            let config: Config = toml::from_str(&content).context("Failed to parse config")?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, content).context("Failed to write config file")?;
        Ok(())
    }
}

pub fn cinevec_dir() -> PathBuf {
    dirs::home_dir()
        .expect("Could not determine home directory")
        .join(".cinevec")
}

pub fn config_path() -> PathBuf {
    cinevec_dir().join("config.toml")
}

/// Reads an integer-valued environment toggle; any nonzero value enables it.
pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.import.movies_table, "movies_tmdb");
        assert_eq!(config.import.batch_size, 2000);
        assert_eq!(config.import.on_error, ErrorPolicy::Skip);
        assert_eq!(config.seed.rows, 100_000);
        assert_eq!(config.seed.tables.len(), 2);
        assert_eq!(config.seed.tables[0].dimension, 400);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [database]
            host = "db.internal"
            password = "hunter2"

            [import]
            batch_size = 10
            on_error = "fail-fast"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.user, "postgres");
        assert_eq!(config.import.batch_size, 10);
        assert_eq!(config.import.on_error, ErrorPolicy::FailFast);
        assert_eq!(config.seed.batch_size, 5000);
    }

    #[test]
    fn test_env_flag() {
        std::env::set_var("CINEVEC_TEST_FLAG_ON", "1");
        std::env::set_var("CINEVEC_TEST_FLAG_OFF", "0");
        std::env::set_var("CINEVEC_TEST_FLAG_TWO", "2");
        std::env::set_var("CINEVEC_TEST_FLAG_WORD", "yes");
        assert!(env_flag("CINEVEC_TEST_FLAG_ON"));
        assert!(!env_flag("CINEVEC_TEST_FLAG_OFF"));
        // Any nonzero integer counts, non-integers do not
        assert!(env_flag("CINEVEC_TEST_FLAG_TWO"));
        assert!(!env_flag("CINEVEC_TEST_FLAG_WORD"));
        assert!(!env_flag("CINEVEC_TEST_FLAG_UNSET"));
    }
}
