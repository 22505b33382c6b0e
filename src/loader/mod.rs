pub mod movie;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::config::{ErrorPolicy, ImportConfig, SeedConfig, SeedTable};
use crate::db::batch::BatchWriter;
use crate::db::{queries, Database};
use crate::embedder::Embedder;
use crate::vector;

use movie::MovieRecord;

/// Outcome counters for one CSV import run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Movies written for the first time, committed.
    pub inserted: usize,
    /// Movies whose id already existed (insert was a no-op).
    pub already_present: usize,
    /// Rows dropped by the skip policy (parse or insert failure).
    pub errored: usize,
    /// Rows whose insert was undone when a later failure rolled back the batch.
    pub rolled_back: usize,
}

/// Provisional counters for the currently open batch. Rows count toward
/// [`ImportStats`] only once their transaction commits; a rollback
/// reclassifies fresh inserts as lost.
#[derive(Debug, Default)]
struct BatchCounts {
    inserted: usize,
    already_present: usize,
}

impl BatchCounts {
    fn note(&mut self, freshly_inserted: bool) {
        if freshly_inserted {
            self.inserted += 1;
        } else {
            self.already_present += 1;
        }
    }

    /// Folds the batch into the totals after a successful commit.
    fn commit_into(&mut self, stats: &mut ImportStats) {
        stats.inserted += self.inserted;
        stats.already_present += self.already_present;
        *self = Self::default();
    }

    /// Folds the batch into the totals after a rollback. Conflict no-ops
    /// never wrote anything, so those rows are still present; fresh inserts
    /// were undone.
    fn rollback_into(&mut self, stats: &mut ImportStats) {
        stats.rolled_back += self.inserted;
        stats.already_present += self.already_present;
        *self = Self::default();
    }
}

/// Outcome of seeding one benchmark table.
#[derive(Debug)]
pub struct SeedStats {
    pub table: String,
    pub dimension: usize,
    pub inserted: usize,
}

/// Streams the TMDB CSV into the movies and embeddings tables.
///
/// Makes one full pre-scan to learn the total record count for progress
/// reporting, then reads the file a second time, embedding each overview
/// and writing movie + embedding together through a checkpointed batch.
pub fn import_csv(
    db: &mut Database,
    embedder: &mut Embedder,
    config: &ImportConfig,
) -> Result<ImportStats> {
    let total = count_csv_records(&config.csv_path)?;
    eprintln!(
        "Opened {} ({} records)",
        config.csv_path.display(),
        total
    );

    db.create_movie_tables(
        &config.movies_table,
        &config.embeddings_table,
        Embedder::DIMENSION,
    )?;

    let mut reader = csv::Reader::from_path(&config.csv_path)
        .with_context(|| format!("Failed to open {}", config.csv_path.display()))?;

    let mut stats = ImportStats::default();
    let mut batch = BatchCounts::default();
    let mut writer = BatchWriter::new(db.client(), config.batch_size);
    let mut row_number = 0usize;

    for record in reader.deserialize::<MovieRecord>() {
        row_number += 1;

        let movie = match record {
            Ok(m) => m,
            Err(e) => {
                row_failure(row_number, &anyhow::Error::from(e), config.on_error, &mut stats)?;
                continue;
            }
        };

        let embedding = embedder.embed(&movie.overview)?;
        let literal = vector::to_literal(&embedding);

        let mut movie_written = 0u64;
        let added = writer.add(|client| {
            movie_written = queries::insert_movie(client, &config.movies_table, &movie)?;
            queries::insert_embedding(client, &config.embeddings_table, movie.id, &literal)?;
            Ok(())
        });

        match added {
            Ok(checkpointed) => {
                batch.note(movie_written > 0);
                if checkpointed {
                    batch.commit_into(&mut stats);
                    println!("{}", progress_line(writer.committed(), total));
                }
            }
            Err(e) => {
                // The writer rolled back the open batch; rows pending in it
                // never reached the table.
                batch.rollback_into(&mut stats);
                row_failure(row_number, &e, config.on_error, &mut stats)?;
            }
        }
    }

    writer.flush()?;
    batch.commit_into(&mut stats);
    println!("{}", progress_line(writer.committed(), total));

    Ok(stats)
}

/// Fills each configured benchmark table with uniform random vectors.
///
/// A failure on one table is reported and does not stop the others.
pub fn seed_tables(db: &mut Database, config: &SeedConfig) -> Result<Vec<SeedStats>> {
    let mut rng = rand::rng();
    let mut all_stats = Vec::with_capacity(config.tables.len());

    for target in &config.tables {
        match seed_one(db, config, target, &mut rng) {
            Ok(stats) => all_stats.push(stats),
            Err(e) => eprintln!("{} {:#}", "Error:".red(), e),
        }
    }

    Ok(all_stats)
}

fn seed_one(
    db: &mut Database,
    config: &SeedConfig,
    target: &SeedTable,
    rng: &mut impl rand::Rng,
) -> Result<SeedStats> {
    db.create_seed_table(&target.table, target.dimension)?;

    eprintln!(
        "Inserting {} rows of dimension {} into {}...",
        config.rows, target.dimension, target.table
    );

    let mut writer = BatchWriter::new(db.client(), config.batch_size);

    for _ in 0..config.rows {
        let literal = vector::to_literal(&vector::random_vector(target.dimension, rng));
        match writer.add(|client| {
            queries::insert_seed_vector(client, &target.table, &literal).map(|_| ())
        }) {
            Ok(true) => println!("{}", progress_line(writer.committed(), config.rows)),
            Ok(false) => {}
            Err(e) => eprintln!("{} {:#}", "Warning:".yellow(), e),
        }
    }

    writer.flush()?;
    println!("{}", progress_line(writer.committed(), config.rows));

    Ok(SeedStats {
        table: target.table.clone(),
        dimension: target.dimension,
        // Only committed rows count; a rollback drops its whole batch.
        inserted: writer.committed(),
    })
}

/// Applies the configured row-failure policy: skip counts and continues,
/// fail-fast propagates.
fn row_failure(
    row_number: usize,
    error: &anyhow::Error,
    policy: ErrorPolicy,
    stats: &mut ImportStats,
) -> Result<()> {
    match policy {
        ErrorPolicy::Skip => {
            eprintln!("{} row {}: {:#}", "Warning:".yellow(), row_number, error);
            stats.errored += 1;
            Ok(())
        }
        ErrorPolicy::FailFast => Err(anyhow::anyhow!("row {}: {:#}", row_number, error)),
    }
}

/// Counts data records with a full scan (the progress denominator).
fn count_csv_records(path: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut count = 0usize;
    for record in reader.byte_records() {
        if let Err(e) = record {
            // Unreadable records still occupy a row; the import pass reports them.
            log::debug!("pre-scan: {}", e);
        }
        count += 1;
    }
    Ok(count)
}

/// Checkpoint progress line: running count, total, percentage, timestamp.
fn progress_line(committed: usize, total: usize) -> String {
    let pct = if total > 0 {
        committed as f64 / total as f64 * 100.0
    } else {
        100.0
    };
    let now = chrono::Local::now().format("%H:%M:%S");
    format!("Committed {committed}/{total} rows ({pct:.1}%) at {now}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_progress_line_format() {
        let line = progress_line(1000, 2000);
        assert!(line.starts_with("Committed 1000/2000 rows (50.0%) at "));

        let line = progress_line(3, 9);
        assert!(line.contains("(33.3%)"));
    }

    #[test]
    fn test_progress_line_zero_total() {
        assert!(progress_line(0, 0).contains("(100.0%)"));
    }

    #[test]
    fn test_batch_counts_fold_on_commit() {
        let mut stats = ImportStats::default();
        let mut batch = BatchCounts::default();
        batch.note(true);
        batch.note(true);
        batch.note(false);
        batch.commit_into(&mut stats);
        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.already_present, 1);
        assert_eq!(stats.rolled_back, 0);

        // Counters start over for the next batch
        batch.note(true);
        batch.commit_into(&mut stats);
        assert_eq!(stats.inserted, 3);
    }

    #[test]
    fn test_rollback_reclassifies_fresh_inserts_as_lost() {
        let mut stats = ImportStats::default();
        let mut batch = BatchCounts::default();
        // Row 1500 of a 2000-row batch fails: 1499 pending rows roll back,
        // one of which was a conflict no-op that is still in the table.
        for _ in 0..1498 {
            batch.note(true);
        }
        batch.note(false);
        batch.rollback_into(&mut stats);
        assert_eq!(stats.inserted, 0);
        assert_eq!(stats.rolled_back, 1498);
        assert_eq!(stats.already_present, 1);

        // A later batch that commits counts normally
        batch.note(true);
        batch.commit_into(&mut stats);
        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.rolled_back, 1498);
    }

    #[test]
    fn test_row_failure_skip_counts_and_continues() {
        let mut stats = ImportStats::default();
        let err = anyhow::anyhow!("duplicate key");
        assert!(row_failure(7, &err, ErrorPolicy::Skip, &mut stats).is_ok());
        assert_eq!(stats.errored, 1);
    }

    #[test]
    fn test_row_failure_fail_fast_aborts_with_row_number() {
        let mut stats = ImportStats::default();
        let err = anyhow::anyhow!("duplicate key");
        let e = row_failure(7, &err, ErrorPolicy::FailFast, &mut stats).unwrap_err();
        assert!(e.to_string().contains("row 7"));
        assert_eq!(stats.errored, 0);
    }

    #[test]
    fn test_count_csv_records_skips_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,title").unwrap();
        writeln!(file, "1,First").unwrap();
        writeln!(file, "2,\"Second,\nwith a newline\"").unwrap();
        file.flush().unwrap();

        // Quoted newlines span physical lines but count as one record.
        assert_eq!(count_csv_records(file.path()).unwrap(), 2);
    }
}
