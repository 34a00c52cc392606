use crate::cursor::MemoryCursor;
use crate::store::Store;
use crate::MemoryError;
use cassa_core::{Batch, Consistency, Options, QueryExecutor, Result, Scanner, Statement};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

/// [`QueryExecutor`] over an in-process store.
///
/// Tables exist once a `CREATE TABLE` statement has been executed. Reads
/// take a shared lock; writes and batches take the write lock, so a batch
/// is applied as one unit.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    store: RwLock<Store>,
    last_consistency: Mutex<Option<Consistency>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualified names of every table created so far
    pub fn table_names(&self) -> Vec<String> {
        self.store.read().table_names()
    }

    /// Rows stored in `table`, or `None` when it does not exist
    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.store.read().row_count(table)
    }

    /// Consistency requested by the most recent call
    pub fn last_consistency(&self) -> Option<Consistency> {
        *self.last_consistency.lock()
    }

    fn begin(&self, options: &Options) -> std::result::Result<(), MemoryError> {
        *self.last_consistency.lock() = options.consistency;
        match &options.context {
            Some(ctx) if ctx.is_cancelled() => Err(MemoryError::Cancelled),
            Some(ctx) if ctx.is_expired() => Err(MemoryError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

impl QueryExecutor for MemoryExecutor {
    fn query_with_options(
        &self,
        options: &Options,
        stmt: &Statement,
        scanner: &mut dyn Scanner,
    ) -> Result<()> {
        self.begin(options)?;
        debug!(query = stmt.query(), params = stmt.values().len(), "query");
        let (columns, rows) = self.store.read().select(stmt)?;
        let mut cursor = MemoryCursor::new(columns, rows);
        scanner.scan_iter(&mut cursor)?;
        Ok(())
    }

    fn execute_with_options(&self, options: &Options, stmt: &Statement) -> Result<()> {
        self.begin(options)?;
        debug!(query = stmt.query(), params = stmt.values().len(), "execute");
        self.store.write().apply(stmt)?;
        Ok(())
    }

    fn execute_atomically_with_options(&self, options: &Options, batch: &Batch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.begin(options)?;
        debug!(statements = batch.len(), "execute batch");

        let mut store = self.store.write();
        let mut staged = store.clone();
        for stmt in batch.statements() {
            staged.apply(stmt)?;
        }
        *store = staged;
        Ok(())
    }
}
