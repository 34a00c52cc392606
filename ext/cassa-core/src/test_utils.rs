//! Test utilities for cassa-core

#[cfg(test)]
pub mod test {
    use crate::executor::Cursor;
    use crate::scanner::{Destination, Scanner};
    use crate::{Batch, CassaError, CqlValue, Options, QueryExecutor, Result, Statement};
    use bytes::Bytes;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Customer {
        pub id: String,
        pub name: String,
    }

    crate::record!(Customer { id, name });

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Customer2 {
        pub id: String,
        pub name: String,
        pub tag: String,
    }

    crate::record!(Customer2 { id, name, tag });

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct UserBasic {
        pub id: String,
        pub metadata: Bytes,
    }

    crate::record!(UserBasic { id, metadata });

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct UserWithPhone {
        pub id: String,
        pub phone_number: Option<String>,
        pub metadata: Bytes,
    }

    crate::record!(UserWithPhone {
        id,
        phone_number,
        metadata
    });

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct UserWithName {
        pub id: String,
        pub name: String,
        pub metadata: Bytes,
        pub status: HashMap<String, String>,
    }

    crate::record!(UserWithName {
        id,
        name,
        metadata,
        status
    });

    /// Cursor over fixed rows. Values are placed positionally without type
    /// checks.
    #[derive(Debug, Default)]
    pub struct StaticCursor {
        rows: VecDeque<Vec<CqlValue>>,
        failure: Option<String>,
        closed: bool,
        seen_ignored: bool,
    }

    impl StaticCursor {
        pub fn new(rows: Vec<Vec<CqlValue>>) -> Self {
            Self {
                rows: rows.into(),
                ..Default::default()
            }
        }

        /// A cursor with no rows whose close reports `message`
        pub fn failing(message: &str) -> Self {
            Self::failing_after(vec![], message)
        }

        /// Yields `rows`, then reports `message` on close
        pub fn failing_after(rows: Vec<Vec<CqlValue>>, message: &str) -> Self {
            Self {
                rows: rows.into(),
                failure: Some(message.to_string()),
                ..Default::default()
            }
        }

        pub fn is_closed(&self) -> bool {
            self.closed
        }

        /// Whether any scanned value landed on an ignored destination
        pub fn seen_ignored(&self) -> bool {
            self.seen_ignored
        }
    }

    impl Cursor for StaticCursor {
        fn scan(&mut self, destinations: &mut [Destination]) -> bool {
            let Some(row) = self.rows.pop_front() else {
                return false;
            };
            for (destination, value) in destinations.iter_mut().zip(row) {
                if destination.is_ignored() {
                    self.seen_ignored = true;
                }
                destination.put(value);
            }
            true
        }

        fn close(&mut self) -> Result<()> {
            self.closed = true;
            match &self.failure {
                Some(message) => Err(CassaError::execution(message.clone())),
                None => Ok(()),
            }
        }
    }

    /// Executor that records what it is asked to run. Reads are answered
    /// with the configured rows.
    #[derive(Debug, Default)]
    pub struct RecordingExecutor {
        rows: Vec<Vec<CqlValue>>,
        executed: Mutex<Vec<Statement>>,
        queried: Mutex<Vec<Statement>>,
        batches: Mutex<Vec<usize>>,
        last_options: Mutex<Option<(Options, String)>>,
    }

    impl RecordingExecutor {
        pub fn with_rows(rows: Vec<Vec<CqlValue>>) -> Self {
            Self {
                rows,
                ..Default::default()
            }
        }

        pub fn executed(&self) -> Vec<Statement> {
            self.executed.lock().unwrap().clone()
        }

        pub fn queried(&self) -> Vec<Statement> {
            self.queried.lock().unwrap().clone()
        }

        /// Statement count of each batch run
        pub fn batches(&self) -> Vec<usize> {
            self.batches.lock().unwrap().clone()
        }

        /// Options and query text of the last call
        pub fn last_options(&self) -> Option<(Options, String)> {
            self.last_options.lock().unwrap().clone()
        }

        fn remember(&self, options: &Options, query: &str) {
            *self.last_options.lock().unwrap() = Some((options.clone(), query.to_string()));
        }
    }

    impl QueryExecutor for RecordingExecutor {
        fn query_with_options(
            &self,
            options: &Options,
            stmt: &Statement,
            scanner: &mut dyn Scanner,
        ) -> Result<()> {
            self.remember(options, stmt.query());
            self.queried.lock().unwrap().push(stmt.clone());
            let mut cursor = StaticCursor::new(self.rows.clone());
            scanner.scan_iter(&mut cursor).map(|_| ())
        }

        fn execute_with_options(&self, options: &Options, stmt: &Statement) -> Result<()> {
            self.remember(options, stmt.query());
            self.executed.lock().unwrap().push(stmt.clone());
            Ok(())
        }

        fn execute_atomically_with_options(&self, options: &Options, batch: &Batch) -> Result<()> {
            self.remember(options, "BATCH");
            self.batches.lock().unwrap().push(batch.len());
            Ok(())
        }
    }
}
