//! Row codec: decodes cursor rows into records

use crate::executor::Cursor;
use crate::{CassaError, ColumnType, CqlValue, ErrorContext, FieldMap, Record, Result};
use tracing::{debug, trace};

/// Per-column slot a cursor fills when scanning a row
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    /// Column maps to a record field of this type
    Field {
        column_type: ColumnType,
        value: CqlValue,
    },
    /// Column has no field in the record; whatever is scanned is dropped
    Ignore,
}

impl Destination {
    pub fn field(column_type: ColumnType) -> Self {
        Destination::Field {
            column_type,
            value: CqlValue::Null,
        }
    }

    pub fn column_type(&self) -> Option<&ColumnType> {
        match self {
            Destination::Field { column_type, .. } => Some(column_type),
            Destination::Ignore => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Destination::Ignore)
    }

    /// Store a scanned value. A no-op for [`Destination::Ignore`].
    pub fn put(&mut self, scanned: CqlValue) {
        if let Destination::Field { value, .. } = self {
            *value = scanned;
        }
    }

    fn take(&mut self) -> CqlValue {
        match self {
            Destination::Field { value, .. } => std::mem::replace(value, CqlValue::Null),
            Destination::Ignore => CqlValue::Null,
        }
    }
}

/// Consumes a cursor on behalf of a query.
///
/// Executors call [`Scanner::scan_iter`] once with the cursor they opened.
/// The scanner drains it and closes it.
pub trait Scanner {
    /// Scan rows, close the cursor and return how many rows were decoded.
    ///
    /// The target is only written when every row decodes and the cursor
    /// closes cleanly. A close error takes precedence over
    /// [`CassaError::RowNotFound`].
    fn scan_iter(&mut self, cursor: &mut dyn Cursor) -> Result<usize>;
}

/// Where decoded rows go
pub enum Target<'a, R> {
    /// Read exactly one row; no row is [`CassaError::RowNotFound`]
    One(&'a mut R),
    /// Replace the contents with every row
    Many(&'a mut Vec<R>),
    /// Like `Many`, with boxed elements
    ManyBoxed(&'a mut Vec<Box<R>>),
}

impl<R> Target<'_, R> {
    pub fn reborrow(&mut self) -> Target<'_, R> {
        match self {
            Target::One(record) => Target::One(&mut **record),
            Target::Many(records) => Target::Many(&mut **records),
            Target::ManyBoxed(records) => Target::ManyBoxed(&mut **records),
        }
    }
}

/// Where a statement column lands in the record
struct Slot {
    column: String,
    index: usize,
    column_type: ColumnType,
}

/// [`Scanner`] decoding the columns of a statement into records of type `R`
pub struct RowScanner<'a, R> {
    columns: Vec<String>,
    target: Target<'a, R>,
    row_count: usize,
}

impl<'a, R: Record> RowScanner<'a, R> {
    /// `columns` are the statement's field names, in result order
    pub fn new(columns: &[String], target: Target<'a, R>) -> Self {
        Self {
            columns: columns.to_vec(),
            target,
            row_count: 0,
        }
    }

    /// Rows decoded by the last scan
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    fn slots(&self) -> Result<Vec<Option<Slot>>> {
        let fields = FieldMap::of::<R>().map_err(|e| {
            CassaError::decode(format!(
                "could not decode into {}: {}",
                std::any::type_name::<R>(),
                e
            ))
        })?;

        Ok(self
            .columns
            .iter()
            .map(|column| {
                fields.get(column).map(|f| Slot {
                    column: f.name.clone(),
                    index: f.index,
                    column_type: f.column_type.clone(),
                })
            })
            .collect())
    }
}

fn destinations(slots: &[Option<Slot>]) -> Vec<Destination> {
    slots
        .iter()
        .map(|slot| match slot {
            Some(slot) => Destination::field(slot.column_type.clone()),
            None => Destination::Ignore,
        })
        .collect()
}

fn decode_into<R: Record>(record: &mut R, slots: &[Option<Slot>], row: &mut [Destination]) -> Result<()> {
    for (slot, destination) in slots.iter().zip(row.iter_mut()) {
        let Some(slot) = slot else { continue };
        record
            .set_value(slot.index, destination.take())
            .with_context(|| format!("column '{}' ({})", slot.column, slot.column_type))?;
    }
    Ok(())
}

fn decode<R: Record>(slots: &[Option<Slot>], row: &mut [Destination]) -> Result<R> {
    let mut record = R::default();
    decode_into(&mut record, slots, row)?;
    Ok(record)
}

/// Rows decoded but not yet handed to the target
enum Staged<R> {
    /// Field index and value of every projected column, already known to
    /// decode
    One(Vec<(usize, CqlValue)>),
    Many(Vec<R>),
}

impl<'a, R: Record> RowScanner<'a, R> {
    fn stage(&self, cursor: &mut dyn Cursor, slots: &[Option<Slot>]) -> Result<Staged<R>> {
        let mut row = destinations(slots);
        match self.target {
            Target::One(_) => {
                if !cursor.scan(&mut row) {
                    return Err(CassaError::RowNotFound);
                }
                let values: Vec<(usize, CqlValue)> = slots
                    .iter()
                    .zip(row.iter_mut())
                    .filter_map(|(slot, destination)| slot.as_ref().map(|s| (s.index, destination.take())))
                    .collect();
                let mut scratch = R::default();
                for ((index, value), slot) in values.iter().zip(slots.iter().flatten()) {
                    scratch
                        .set_value(*index, value.clone())
                        .with_context(|| format!("column '{}' ({})", slot.column, slot.column_type))?;
                }
                Ok(Staged::One(values))
            }
            Target::Many(_) | Target::ManyBoxed(_) => {
                let mut records = Vec::new();
                while cursor.scan(&mut row) {
                    records.push(decode(slots, &mut row)?);
                    row = destinations(slots);
                }
                Ok(Staged::Many(records))
            }
        }
    }

    /// Hand staged rows to the target. Only called once the cursor closed
    /// cleanly.
    fn commit(&mut self, staged: Staged<R>) -> Result<usize> {
        match (&mut self.target, staged) {
            (Target::One(record), Staged::One(values)) => {
                for (index, value) in values {
                    record.set_value(index, value)?;
                }
                Ok(1)
            }
            (Target::Many(records), Staged::Many(decoded)) => {
                **records = decoded;
                Ok(records.len())
            }
            (Target::ManyBoxed(records), Staged::Many(decoded)) => {
                **records = decoded.into_iter().map(Box::new).collect();
                Ok(records.len())
            }
            _ => Err(CassaError::internal("staged rows do not match the scan target")),
        }
    }
}

impl<R: Record> Scanner for RowScanner<'_, R> {
    fn scan_iter(&mut self, cursor: &mut dyn Cursor) -> Result<usize> {
        self.row_count = 0;
        let staged = self.slots().and_then(|slots| self.stage(cursor, &slots));
        let closed = cursor.close();

        let staged = match staged {
            Ok(staged) => {
                closed?;
                staged
            }
            // a broken read is never reported as an absent row
            Err(e) if e.is_row_not_found() => {
                closed?;
                return Err(e);
            }
            Err(e) => {
                if let Err(close) = closed {
                    debug!(error = %close, "cursor close failed after decode error");
                }
                return Err(e);
            }
        };

        self.row_count = self.commit(staged)?;
        trace!(
            record = std::any::type_name::<R>(),
            rows = self.row_count,
            "decoded rows"
        );
        Ok(self.row_count)
    }
}
