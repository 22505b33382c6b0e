use anyhow::{Context, Result};
use chrono::NaiveDate;
use postgres::Client;

use crate::loader::movie::MovieRecord;

/// One result row of the nearest-neighbor movie query.
#[derive(Debug, Clone)]
pub struct MovieHit {
    pub id: i64,
    pub title: Option<String>,
    pub vote_average: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub runtime: Option<i32>,
    pub overview: Option<String>,
    pub imdb_url: String,
    pub distance: f64,
}

/// Inserts a movie row, skipping ids that already exist.
///
/// Returns the number of rows written (0 when the id conflicted).
pub fn insert_movie(client: &mut Client, table: &str, movie: &MovieRecord) -> Result<u64> {
    let sql = format!(
        "INSERT INTO {table} (
            id, title, vote_average, vote_count, status, release_date, revenue,
            runtime, adult, backdrop_path, budget, homepage, imdb_id,
            original_language, original_title, overview, popularity, poster_path,
            tagline, genres, production_companies, production_countries,
            spoken_languages, keywords
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                  $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
        ON CONFLICT (id) DO NOTHING"
    );

    let written = client
        .execute(
            sql.as_str(),
            &[
                &movie.id,
                &movie.title,
                &movie.vote_average,
                &movie.vote_count,
                &movie.status,
                &movie.release_date,
                &movie.revenue,
                &movie.runtime,
                &movie.adult,
                &movie.backdrop_path,
                &movie.budget,
                &movie.homepage,
                &movie.imdb_id,
                &movie.original_language,
                &movie.original_title,
                &movie.overview,
                &movie.popularity,
                &movie.poster_path,
                &movie.tagline,
                &movie.genres,
                &movie.production_companies,
                &movie.production_countries,
                &movie.spoken_languages,
                &movie.keywords,
            ],
        )
        .with_context(|| format!("Failed to insert movie {}", movie.id))?;

    Ok(written)
}

/// Inserts an overview embedding keyed by the movie id, skipping conflicts.
pub fn insert_embedding(
    client: &mut Client,
    table: &str,
    id: i64,
    vector_literal: &str,
) -> Result<u64> {
    let sql = format!(
        "INSERT INTO {table} (id, overview_embedding) VALUES ($1, $2::vector)
         ON CONFLICT (id) DO NOTHING"
    );
    let written = client
        .execute(sql.as_str(), &[&id, &vector_literal])
        .with_context(|| format!("Failed to insert embedding for movie {id}"))?;
    Ok(written)
}

/// Inserts one synthetic vector; the serial key is assigned by the database.
pub fn insert_seed_vector(client: &mut Client, table: &str, vector_literal: &str) -> Result<u64> {
    let sql = format!("INSERT INTO {table} (embedding) VALUES ($1::vector)");
    let written = client
        .execute(sql.as_str(), &[&vector_literal])
        .with_context(|| format!("Failed to insert vector into {table}"))?;
    Ok(written)
}

/// SQL for the ordered-by-distance movie lookup.
///
/// The distance operator is part of the statement text; the query vector and
/// the limit are bound parameters.
pub fn nearest_movies_sql(movies_table: &str, embeddings_table: &str, operator: &str) -> String {
    format!(
        "SELECT
            m.id,
            m.title,
            m.vote_average,
            m.release_date,
            m.runtime,
            m.overview,
            CASE WHEN m.imdb_id IS NULL OR m.imdb_id = '' THEN 'N/A'
                 ELSE 'https://www.imdb.com/title/' || m.imdb_id END AS imdb_url,
            ($1::vector {operator} e.overview_embedding) AS distance
        FROM {movies_table} m
        JOIN {embeddings_table} e ON m.id = e.id
        ORDER BY distance ASC
        LIMIT $2"
    )
}

/// Runs the nearest-neighbor query and maps the rows.
pub fn nearest_movies(
    client: &mut Client,
    movies_table: &str,
    embeddings_table: &str,
    query_vector: &str,
    operator: &str,
    limit: i64,
) -> Result<Vec<MovieHit>> {
    let sql = nearest_movies_sql(movies_table, embeddings_table, operator);
    let rows = client
        .query(sql.as_str(), &[&query_vector, &limit])
        .context("Nearest-neighbor query failed")?;

    let mut hits = Vec::with_capacity(rows.len());
    for row in rows {
        hits.push(MovieHit {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            vote_average: row.try_get("vote_average")?,
            release_date: row.try_get("release_date")?,
            runtime: row.try_get("runtime")?,
            overview: row.try_get("overview")?,
            imdb_url: row.try_get("imdb_url")?,
            distance: row.try_get("distance")?,
        });
    }
    Ok(hits)
}

/// Runs `EXPLAIN (ANALYZE, ...)` over the nearest-neighbor query.
///
/// The vector literal and limit are spliced into the statement text here:
/// both are generated by this program, and the planner output is clearer
/// with concrete values. Returns the explained SQL and the plan lines.
pub fn explain_nearest_movies(
    client: &mut Client,
    movies_table: &str,
    embeddings_table: &str,
    query_vector: &str,
    operator: &str,
    limit: i64,
) -> Result<(String, Vec<String>)> {
    let sql = nearest_movies_sql(movies_table, embeddings_table, operator)
        .replace("$1", &format!("'{query_vector}'"))
        .replace("$2", &limit.to_string());
    let explain_sql = format!("EXPLAIN (ANALYZE, VERBOSE, BUFFERS, COSTS) {sql}");

    let rows = client
        .query(explain_sql.as_str(), &[])
        .context("EXPLAIN query failed")?;

    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        lines.push(row.try_get::<_, String>(0)?);
    }
    Ok((explain_sql, lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_sql_uses_operator_and_ordering() {
        let sql = nearest_movies_sql("movies_tmdb", "movies_tmdb_embeddings", "<=>");
        assert!(sql.contains("$1::vector <=> e.overview_embedding"));
        assert!(sql.contains("ORDER BY distance ASC"));
        assert!(sql.contains("LIMIT $2"));
        assert!(sql.contains("JOIN movies_tmdb_embeddings e ON m.id = e.id"));
    }

    #[test]
    fn test_nearest_sql_euclidean_operator() {
        let sql = nearest_movies_sql("movies_tmdb", "movies_tmdb_embeddings", "<->");
        assert!(sql.contains("<->"));
        assert!(!sql.contains("<=>"));
    }
}
