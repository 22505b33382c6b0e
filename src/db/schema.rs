use anyhow::{Context, Result};
use postgres::Client;

/// Creates the movie table and its companion embeddings table.
///
/// Table names come from config, so they are interpolated rather than
/// bound; both tables key on the TMDB movie id.
pub fn create_movie_tables(
    client: &mut Client,
    movies_table: &str,
    embeddings_table: &str,
    dimension: usize,
) -> Result<()> {
    client
        .batch_execute(&format!(
            "
            CREATE TABLE IF NOT EXISTS {movies_table} (
                id BIGINT PRIMARY KEY,
                title TEXT,
                vote_average DOUBLE PRECISION,
                vote_count BIGINT,
                status TEXT,
                release_date DATE,
                revenue BIGINT,
                runtime INTEGER,
                adult BOOLEAN,
                backdrop_path TEXT,
                budget BIGINT,
                homepage TEXT,
                imdb_id TEXT,
                original_language TEXT,
                original_title TEXT,
                overview TEXT,
                popularity DOUBLE PRECISION,
                poster_path TEXT,
                tagline TEXT,
                genres TEXT,
                production_companies TEXT,
                production_countries TEXT,
                spoken_languages TEXT,
                keywords TEXT
            );

            CREATE TABLE IF NOT EXISTS {embeddings_table} (
                id BIGINT PRIMARY KEY,
                overview_embedding VECTOR({dimension})
            );
            "
        ))
        .with_context(|| format!("Failed to create tables {movies_table}/{embeddings_table}"))?;
    Ok(())
}

/// Creates one synthetic benchmark table: serial key plus a vector column.
pub fn create_seed_table(client: &mut Client, table: &str, dimension: usize) -> Result<()> {
    client
        .batch_execute(&format!(
            "
            CREATE TABLE IF NOT EXISTS {table} (
                id SERIAL PRIMARY KEY,
                embedding VECTOR({dimension})
            );
            "
        ))
        .with_context(|| format!("Failed to create table {table}"))?;
    Ok(())
}
