use anyhow::{Context, Result};
use postgres::Client;

/// Pure commit-boundary bookkeeping for [`BatchWriter`].
///
/// Counts records into the current batch and reports when a commit is due,
/// so the boundary arithmetic can be tested without a database.
#[derive(Debug)]
pub struct Checkpointer {
    batch_size: usize,
    pending: usize,
    committed: usize,
}

impl Checkpointer {
    pub fn new(batch_size: usize) -> Self {
        Self {
            // A zero batch size would never commit; treat it as 1.
            batch_size: batch_size.max(1),
            pending: 0,
            committed: 0,
        }
    }

    /// Counts one record; returns true when the batch is full.
    pub fn note(&mut self) -> bool {
        self.pending += 1;
        self.pending >= self.batch_size
    }

    /// Moves the pending count into the committed total.
    pub fn commit_pending(&mut self) {
        self.committed += self.pending;
        self.pending = 0;
    }

    /// Discards the pending count after a rollback; returns how many
    /// records were lost with it.
    pub fn drop_pending(&mut self) -> usize {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn committed(&self) -> usize {
        self.committed
    }
}

/// Checkpointed batch writer: records are added one at a time and committed
/// in fixed-size transactions.
///
/// Transactions are managed with explicit BEGIN/COMMIT/ROLLBACK statements
/// so the writer can hold the client across batches. If the connection
/// drops with a batch open, the server rolls it back, losing at most
/// `batch_size - 1` records past the last checkpoint.
pub struct BatchWriter<'a> {
    client: &'a mut Client,
    checkpoint: Checkpointer,
    in_tx: bool,
}

impl<'a> BatchWriter<'a> {
    pub fn new(client: &'a mut Client, batch_size: usize) -> Self {
        Self {
            client,
            checkpoint: Checkpointer::new(batch_size),
            in_tx: false,
        }
    }

    /// Runs one record's statements inside the current batch transaction.
    ///
    /// Returns `Ok(true)` when the record filled the batch and a checkpoint
    /// commit was issued. On error the open transaction is rolled back and
    /// the error returned; records pending since the last checkpoint are
    /// lost with it.
    pub fn add<F>(&mut self, write: F) -> Result<bool>
    where
        F: FnOnce(&mut Client) -> Result<()>,
    {
        self.begin()?;

        if let Err(e) = write(self.client) {
            self.rollback();
            return Err(e);
        }

        if self.checkpoint.note() {
            self.commit()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Commits any partial batch. Call after the last record.
    pub fn flush(&mut self) -> Result<()> {
        self.commit()
    }

    /// Records committed so far across all batches.
    pub fn committed(&self) -> usize {
        self.checkpoint.committed()
    }

    fn begin(&mut self) -> Result<()> {
        if !self.in_tx {
            self.client
                .batch_execute("BEGIN")
                .context("Failed to open batch transaction")?;
            self.in_tx = true;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.in_tx {
            self.client
                .batch_execute("COMMIT")
                .context("Failed to commit batch")?;
            self.in_tx = false;
            self.checkpoint.commit_pending();
        }
        Ok(())
    }

    fn rollback(&mut self) {
        if self.in_tx {
            if let Err(e) = self.client.batch_execute("ROLLBACK") {
                log::warn!("Rollback failed: {}", e);
            }
            self.in_tx = false;
            let lost = self.checkpoint.drop_pending();
            if lost > 0 {
                log::warn!("Rolled back {} uncommitted record(s)", lost);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_due_at_exact_multiples() {
        let mut cp = Checkpointer::new(3);
        assert!(!cp.note());
        assert!(!cp.note());
        assert!(cp.note());
        cp.commit_pending();
        assert_eq!(cp.committed(), 3);
        assert_eq!(cp.pending(), 0);

        // Second batch behaves identically
        assert!(!cp.note());
        assert!(!cp.note());
        assert!(cp.note());
        cp.commit_pending();
        assert_eq!(cp.committed(), 6);
    }

    #[test]
    fn test_partial_batch_flushes() {
        let mut cp = Checkpointer::new(5);
        assert!(!cp.note());
        assert!(!cp.note());
        assert_eq!(cp.pending(), 2);
        cp.commit_pending();
        assert_eq!(cp.committed(), 2);
        assert_eq!(cp.pending(), 0);
    }

    #[test]
    fn test_rollback_loses_at_most_batch_minus_one() {
        let mut cp = Checkpointer::new(4);
        cp.note();
        cp.note();
        cp.note();
        cp.commit_pending(); // simulate an early flush
        cp.note();
        cp.note();
        let lost = cp.drop_pending();
        assert_eq!(lost, 2);
        assert!(lost < 4);
        assert_eq!(cp.committed(), 3);
    }

    #[test]
    fn test_zero_batch_size_commits_every_record() {
        let mut cp = Checkpointer::new(0);
        assert!(cp.note());
    }
}
