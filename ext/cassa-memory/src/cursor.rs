use crate::MemoryError;
use cassa_core::{CassaError, Cursor, CqlValue, Destination, Result};
use std::collections::VecDeque;

/// Cursor over rows already selected from the store.
///
/// Each value is checked against the destination's column type before it is
/// handed over; a mismatch stops the scan and is reported by `close`.
#[derive(Debug)]
pub struct MemoryCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<CqlValue>>,
    error: Option<MemoryError>,
}

impl MemoryCursor {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CqlValue>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
            error: None,
        }
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Cursor for MemoryCursor {
    fn scan(&mut self, destinations: &mut [Destination]) -> bool {
        if self.error.is_some() {
            return false;
        }
        let Some(row) = self.rows.pop_front() else {
            return false;
        };

        for (i, (destination, value)) in destinations.iter_mut().zip(row).enumerate() {
            if let Some(column_type) = destination.column_type() {
                if !column_type.accepts(&value) {
                    self.error = Some(MemoryError::TypeMismatch {
                        column: self.columns.get(i).cloned().unwrap_or_default(),
                        expected: column_type.to_string(),
                        found: value.type_name(),
                    });
                    return false;
                }
            }
            destination.put(value);
        }
        true
    }

    fn close(&mut self) -> Result<()> {
        self.rows.clear();
        match self.error.take() {
            Some(err) => Err(CassaError::from(err)),
            None => Ok(()),
        }
    }
}
