pub mod batch;
pub mod queries;
pub mod schema;

use anyhow::{Context, Result};
use postgres::{Client, NoTls};

use crate::config::DatabaseConfig;

/// Wrapper around the single blocking PostgreSQL connection.
///
/// The loader and the query tool each own exactly one of these for the
/// lifetime of the process; the connection is closed when it drops, which
/// also rolls back anything left uncommitted.
pub struct Database {
    client: Client,
}

impl Database {
    /// Connects using the configured host/dbname/user/password.
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let client = config.pg_config().connect(NoTls).with_context(|| {
            format!(
                "Database connection error ({}:{}/{})",
                config.host, config.port, config.dbname
            )
        })?;
        Ok(Self { client })
    }

    /// Mutable access to the underlying client for statements and batches.
    pub fn client(&mut self) -> &mut Client {
        &mut self.client
    }

    // Delegated schema/query methods

    pub fn create_movie_tables(
        &mut self,
        movies_table: &str,
        embeddings_table: &str,
        dimension: usize,
    ) -> Result<()> {
        schema::create_movie_tables(&mut self.client, movies_table, embeddings_table, dimension)
    }

    pub fn create_seed_table(&mut self, table: &str, dimension: usize) -> Result<()> {
        schema::create_seed_table(&mut self.client, table, dimension)
    }

    pub fn nearest_movies(
        &mut self,
        movies_table: &str,
        embeddings_table: &str,
        query_vector: &str,
        operator: &str,
        limit: i64,
    ) -> Result<Vec<queries::MovieHit>> {
        queries::nearest_movies(
            &mut self.client,
            movies_table,
            embeddings_table,
            query_vector,
            operator,
            limit,
        )
    }

    pub fn explain_nearest_movies(
        &mut self,
        movies_table: &str,
        embeddings_table: &str,
        query_vector: &str,
        operator: &str,
        limit: i64,
    ) -> Result<(String, Vec<String>)> {
        queries::explain_nearest_movies(
            &mut self.client,
            movies_table,
            embeddings_table,
            query_vector,
            operator,
            limit,
        )
    }
}
