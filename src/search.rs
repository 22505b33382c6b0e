use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::ImportConfig;
use crate::db::queries::MovieHit;
use crate::db::Database;
use crate::embedder::Embedder;
use crate::vector;

pub const DEFAULT_LIMIT: i64 = 5;

/// pgvector distance operator to order results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Euclidean,
    Cosine,
}

impl Metric {
    pub fn operator(self) -> &'static str {
        match self {
            Metric::Euclidean => "<->",
            Metric::Cosine => "<=>",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::Cosine => "cosine",
        }
    }

    /// Parses a user-supplied metric name. Unrecognized values warn and
    /// fall back to Euclidean rather than failing the invocation.
    pub fn parse_or_default(raw: Option<&str>) -> Metric {
        match raw {
            None => Metric::Euclidean,
            Some(s) => match s.to_lowercase().as_str() {
                "euclidean" => Metric::Euclidean,
                "cosine" => Metric::Cosine,
                _ => {
                    eprintln!(
                        "{} Invalid distance metric provided, using default of 'euclidean'",
                        "Warning:".yellow()
                    );
                    Metric::Euclidean
                }
            },
        }
    }
}

/// Parses a user-supplied result limit, warning and falling back to
/// [`DEFAULT_LIMIT`] when the value is not an integer. Parsed values pass
/// through untouched (`LIMIT 0` legitimately returns no rows); the
/// database enforces its own rules on negatives.
pub fn parse_limit(raw: Option<&str>) -> i64 {
    match raw {
        None => DEFAULT_LIMIT,
        Some(s) => match s.parse::<i64>() {
            Ok(n) => n,
            Err(_) => {
                eprintln!(
                    "{} Invalid limit provided, using default of {}",
                    "Warning:".yellow(),
                    DEFAULT_LIMIT
                );
                DEFAULT_LIMIT
            }
        },
    }
}

/// A fully parsed query invocation.
#[derive(Debug)]
pub struct SearchRequest {
    pub query: String,
    pub limit: i64,
    pub metric: Metric,
    pub explain: bool,
}

/// Embeds the query text and issues the single ordered-by-distance lookup.
///
/// With `explain` set, also runs the plan analysis and writes it to a
/// timestamped file in the working directory.
pub fn search_movies(
    db: &mut Database,
    embedder: &mut Embedder,
    config: &ImportConfig,
    request: &SearchRequest,
) -> Result<Vec<MovieHit>> {
    let embedding = embedder.embed(&request.query)?;
    let literal = vector::to_literal(&embedding);
    let operator = request.metric.operator();

    let hits = db.nearest_movies(
        &config.movies_table,
        &config.embeddings_table,
        &literal,
        operator,
        request.limit,
    )?;

    if request.explain {
        let (sql, plan) = db.explain_nearest_movies(
            &config.movies_table,
            &config.embeddings_table,
            &literal,
            operator,
            request.limit,
        )?;
        let path = write_explain(&sql, &plan)?;
        println!("\n## Query EXPLAIN sent to {}", path.display());
    }

    Ok(hits)
}

/// Writes the query plan to `explain_output_{timestamp}.out`.
fn write_explain(sql: &str, plan: &[String]) -> Result<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = PathBuf::from(format!("explain_output_{timestamp}.out"));

    let mut content = format!("Query: {sql}\n");
    for line in plan {
        content.push_str(line);
        content.push('\n');
    }
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parse() {
        assert_eq!(Metric::parse_or_default(None), Metric::Euclidean);
        assert_eq!(Metric::parse_or_default(Some("cosine")), Metric::Cosine);
        assert_eq!(Metric::parse_or_default(Some("COSINE")), Metric::Cosine);
        assert_eq!(
            Metric::parse_or_default(Some("euclidean")),
            Metric::Euclidean
        );
    }

    #[test]
    fn test_metric_falls_back_on_unknown() {
        assert_eq!(
            Metric::parse_or_default(Some("manhattan")),
            Metric::Euclidean
        );
    }

    #[test]
    fn test_metric_operators() {
        assert_eq!(Metric::Euclidean.operator(), "<->");
        assert_eq!(Metric::Cosine.operator(), "<=>");
    }

    #[test]
    fn test_limit_parse() {
        assert_eq!(parse_limit(None), 5);
        assert_eq!(parse_limit(Some("10")), 10);
    }

    #[test]
    fn test_limit_passes_integers_through() {
        assert_eq!(parse_limit(Some("0")), 0);
        assert_eq!(parse_limit(Some("-3")), -3);
    }

    #[test]
    fn test_limit_falls_back_on_garbage() {
        assert_eq!(parse_limit(Some("abc")), 5);
        assert_eq!(parse_limit(Some("4.5")), 5);
    }
}
