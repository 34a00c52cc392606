//! Boundary to whatever actually runs statements

use crate::scanner::{Destination, Scanner};
use crate::{Batch, Options, Result, Statement};

/// Row iterator handed to a [`Scanner`] by an executor. The scanner closes
/// it.
pub trait Cursor {
    /// Fill `destinations` from the next row, one per statement column.
    /// Returns false when the rows are exhausted or scanning failed; the
    /// failure is reported by [`Cursor::close`].
    fn scan(&mut self, destinations: &mut [Destination]) -> bool;

    /// Finish iteration, surfacing any error hit while scanning
    fn close(&mut self) -> Result<()>;
}

/// Runs compiled statements. Implemented by driver adapters.
///
/// Options carry the consistency level and cancellation context for the
/// call; implementations decide how to honour them. Failures are reported
/// as [`CassaError::Execution`](crate::CassaError::Execution) and passed
/// through to callers untouched.
pub trait QueryExecutor: Send + Sync {
    /// Run a read, handing its cursor to [`Scanner::scan_iter`]
    fn query(&self, stmt: &Statement, scanner: &mut dyn Scanner) -> Result<()> {
        self.query_with_options(&Options::default(), stmt, scanner)
    }

    fn query_with_options(
        &self,
        options: &Options,
        stmt: &Statement,
        scanner: &mut dyn Scanner,
    ) -> Result<()>;

    /// Run a write or schema statement
    fn execute(&self, stmt: &Statement) -> Result<()> {
        self.execute_with_options(&Options::default(), stmt)
    }

    fn execute_with_options(&self, options: &Options, stmt: &Statement) -> Result<()>;

    /// Run every statement of `batch` as one logged batch
    fn execute_atomically(&self, batch: &Batch) -> Result<()> {
        self.execute_atomically_with_options(&Options::default(), batch)
    }

    fn execute_atomically_with_options(&self, options: &Options, batch: &Batch) -> Result<()>;
}
