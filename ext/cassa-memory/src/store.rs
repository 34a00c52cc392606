//! Wide-column tables held in memory
//!
//! Partitions are keyed by their partition key values and hold rows keyed by
//! clustering values. Key columns live in the keys; every other column is a
//! cell on the row. An absent cell reads as null.

use crate::{MemoryError, Result};
use cassa_core::statement::{Assignment, AssignmentOp, Predicate};
use cassa_core::{ClusteringOrderColumn, ColumnType, Command, Comparator, CqlValue, Direction, Statement};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::trace;

type Key = Vec<CqlValue>;

/// Positional parameters, consumed in the order the query text binds them
struct Params<'a> {
    values: std::slice::Iter<'a, CqlValue>,
}

impl<'a> Params<'a> {
    fn new(values: &'a [CqlValue]) -> Self {
        Self {
            values: values.iter(),
        }
    }

    fn next(&mut self) -> Result<CqlValue> {
        self.values
            .next()
            .cloned()
            .ok_or_else(|| MemoryError::invalid("fewer parameters than placeholders"))
    }

    fn take(&mut self, n: usize) -> Result<Vec<CqlValue>> {
        (0..n).map(|_| self.next()).collect()
    }

    fn finish(self) -> Result<()> {
        match self.values.len() {
            0 => Ok(()),
            n => Err(MemoryError::invalid(format!("{} unused parameters", n))),
        }
    }
}

#[derive(Debug, Clone)]
struct Restriction {
    column: String,
    comparator: Comparator,
    terms: Vec<CqlValue>,
}

impl Restriction {
    fn matches(&self, value: &CqlValue) -> bool {
        if value.is_null() {
            return false;
        }
        let Some(term) = self.terms.first() else {
            return false;
        };
        match self.comparator {
            Comparator::Eq => value == term,
            Comparator::In => self.terms.contains(value),
            Comparator::Gt => value > term,
            Comparator::Gte => value >= term,
            Comparator::Lt => value < term,
            Comparator::Lte => value <= term,
        }
    }

    fn is_equality(&self) -> bool {
        matches!(self.comparator, Comparator::Eq | Comparator::In)
    }
}

fn restrictions(predicates: &[Predicate], params: &mut Params<'_>) -> Result<Vec<Restriction>> {
    predicates
        .iter()
        .map(|p| -> Result<Restriction> {
            Ok(Restriction {
                column: p.column.clone(),
                comparator: p.comparator,
                terms: params.take(p.arity)?,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Schema {
    name: String,
    columns: IndexMap<String, ColumnType>,
    partition_keys: Vec<String>,
    clustering_columns: Vec<String>,
    descending: Vec<bool>,
}

impl Schema {
    fn column_type(&self, column: &str) -> Result<&ColumnType> {
        self.columns
            .get(column)
            .ok_or_else(|| MemoryError::UnknownColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    fn check(&self, column: &str, value: &CqlValue) -> Result<()> {
        let column_type = self.column_type(column)?;
        if column_type.accepts(value) {
            Ok(())
        } else {
            Err(MemoryError::TypeMismatch {
                column: column.to_string(),
                expected: column_type.to_string(),
                found: value.type_name(),
            })
        }
    }

    fn is_partition_key(&self, column: &str) -> bool {
        self.partition_keys.iter().any(|k| k == column)
    }

    fn is_key(&self, column: &str) -> bool {
        self.is_partition_key(column) || self.clustering_columns.iter().any(|k| k == column)
    }

    fn missing_key(&self, column: &str) -> MemoryError {
        MemoryError::MissingKey {
            table: self.name.clone(),
            column: column.to_string(),
        }
    }

    fn compare_clustering(&self, a: &Key, b: &Key) -> Ordering {
        for ((x, y), desc) in a.iter().zip(b.iter()).zip(self.descending.iter()) {
            let ord = if *desc { y.cmp(x) } else { x.cmp(y) };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Whether answering these restrictions means scanning more than the
    /// partitions they name
    fn needs_filtering(&self, restrictions: &[Restriction]) -> bool {
        if restrictions
            .iter()
            .any(|r| !self.is_key(&r.column) || (self.is_partition_key(&r.column) && !r.is_equality()))
        {
            return true;
        }
        let restricted = self
            .partition_keys
            .iter()
            .filter(|k| restrictions.iter().any(|r| &r.column == *k))
            .count();
        if restricted == 0 {
            !restrictions.is_empty()
        } else {
            restricted < self.partition_keys.len()
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Row {
    cells: BTreeMap<String, CqlValue>,
}

/// Sets are sorted and deduplicated; maps are sorted by key with the last
/// write for a key winning
fn normalise(value: CqlValue) -> CqlValue {
    match value {
        CqlValue::Set(mut items) => {
            items.sort();
            items.dedup();
            CqlValue::Set(items)
        }
        CqlValue::Map(entries) => {
            let map: BTreeMap<CqlValue, CqlValue> = entries.into_iter().collect();
            CqlValue::Map(map.into_iter().collect())
        }
        other => other,
    }
}

fn items(value: Option<CqlValue>) -> Vec<CqlValue> {
    match value {
        Some(CqlValue::List(items)) | Some(CqlValue::Set(items)) => items,
        _ => Vec::new(),
    }
}

fn entries(value: Option<CqlValue>) -> Vec<(CqlValue, CqlValue)> {
    match value {
        Some(CqlValue::Map(entries)) => entries,
        _ => Vec::new(),
    }
}

impl Row {
    /// Null and empty collections delete the cell
    fn write(&mut self, column: &str, value: CqlValue) {
        if value.is_empty() {
            self.cells.remove(column);
        } else {
            self.cells.insert(column.to_string(), normalise(value));
        }
    }

    fn assign(&mut self, assignment: &Assignment, operands: Vec<CqlValue>) -> Result<()> {
        let column = assignment.column.as_str();
        let current = self.cells.get(column).cloned();
        let next = match (assignment.op, <[CqlValue; 1]>::try_from(operands.clone())) {
            (AssignmentOp::Set, Ok([value])) => value,
            (AssignmentOp::ListAppend, Ok([value])) => {
                let mut list = items(current);
                list.extend(items(Some(value)));
                CqlValue::List(list)
            }
            (AssignmentOp::ListPrepend, Ok([value])) => {
                let mut list = items(Some(value));
                list.extend(items(current));
                CqlValue::List(list)
            }
            (AssignmentOp::ListRemove, Ok([value])) => {
                let remove = items(Some(value));
                CqlValue::List(items(current).into_iter().filter(|v| !remove.contains(v)).collect())
            }
            (AssignmentOp::MapSetFields, Ok([value])) => {
                let mut map = entries(current);
                map.extend(entries(Some(value)));
                CqlValue::Map(map)
            }
            (AssignmentOp::MapSetField, _) => match <[CqlValue; 2]>::try_from(operands) {
                Ok([key, value]) => {
                    let mut map: Vec<_> = entries(current).into_iter().filter(|(k, _)| *k != key).collect();
                    if !value.is_null() {
                        map.push((key, value));
                    }
                    CqlValue::Map(map)
                }
                Err(_) => return Err(MemoryError::invalid(format!("bad operands for {}[?]", column))),
            },
            (op, _) => {
                return Err(MemoryError::invalid(format!(
                    "bad operands for {:?} on {}",
                    op, column
                )))
            }
        };
        self.write(column, next);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Table {
    schema: Schema,
    partitions: BTreeMap<Key, BTreeMap<Key, Row>>,
}

impl Table {
    /// Partition and clustering values fixed by equality restrictions.
    /// Writes must name exactly one row and may not restrict other columns.
    fn primary_key(&self, restrictions: &[Restriction]) -> Result<(Key, Key)> {
        if let Some(r) = restrictions.iter().find(|r| !self.schema.is_key(&r.column)) {
            return Err(MemoryError::invalid(format!(
                "non primary key column '{}' in the WHERE clause of a write",
                r.column
            )));
        }
        let value_of = |column: &String| -> Result<CqlValue> {
            restrictions
                .iter()
                .find(|r| &r.column == column && r.comparator == Comparator::Eq)
                .and_then(|r| r.terms.first())
                .filter(|v| !v.is_null())
                .cloned()
                .ok_or_else(|| self.schema.missing_key(column))
        };
        let partition = self
            .schema
            .partition_keys
            .iter()
            .map(value_of)
            .collect::<Result<Key>>()?;
        let clustering = self
            .schema
            .clustering_columns
            .iter()
            .map(value_of)
            .collect::<Result<Key>>()?;
        for r in restrictions {
            for term in &r.terms {
                self.schema.check(&r.column, term)?;
            }
        }
        Ok((partition, clustering))
    }

    fn insert(&mut self, columns: &[String], params: &mut Params<'_>) -> Result<()> {
        let mut values = BTreeMap::new();
        for column in columns {
            let value = params.next()?;
            self.schema.check(column, &value)?;
            values.insert(column.clone(), value);
        }

        let mut key_of = |column: &String| -> Result<CqlValue> {
            values
                .remove(column)
                .filter(|v| !v.is_null())
                .ok_or_else(|| self.schema.missing_key(column))
        };
        let partition = self
            .schema
            .partition_keys
            .iter()
            .map(&mut key_of)
            .collect::<Result<Key>>()?;
        let clustering = self
            .schema
            .clustering_columns
            .iter()
            .map(&mut key_of)
            .collect::<Result<Key>>()?;

        let row = self
            .partitions
            .entry(partition)
            .or_default()
            .entry(clustering)
            .or_default();
        for (column, value) in values {
            row.write(&column, value);
        }
        Ok(())
    }

    fn check_assignment(&self, assignment: &Assignment, operands: &[CqlValue]) -> Result<()> {
        let column = &assignment.column;
        if self.schema.is_key(column) {
            return Err(MemoryError::invalid(format!(
                "primary key column '{}' cannot be updated",
                column
            )));
        }
        match (assignment.op, self.schema.column_type(column)?, operands) {
            (AssignmentOp::MapSetField, ColumnType::Map(key_type, value_type), [key, value]) => {
                if key.is_null() || !key_type.accepts(key) || !value_type.accepts(value) {
                    return Err(MemoryError::TypeMismatch {
                        column: column.clone(),
                        expected: self.schema.column_type(column)?.to_string(),
                        found: value.type_name(),
                    });
                }
                Ok(())
            }
            (AssignmentOp::MapSetField, other, _) => Err(MemoryError::invalid(format!(
                "column '{}' is {}, not a map",
                column, other
            ))),
            (_, _, operands) => operands
                .iter()
                .try_for_each(|operand| self.schema.check(column, operand)),
        }
    }

    fn update(&mut self, assignments: Vec<(&Assignment, Vec<CqlValue>)>, restrictions: &[Restriction]) -> Result<()> {
        let (partition, clustering) = self.primary_key(restrictions)?;
        for (assignment, operands) in &assignments {
            self.check_assignment(assignment, operands)?;
        }
        let row = self
            .partitions
            .entry(partition)
            .or_default()
            .entry(clustering)
            .or_default();
        for (assignment, operands) in assignments {
            row.assign(assignment, operands)?;
        }
        Ok(())
    }

    fn delete(&mut self, restrictions: &[Restriction]) -> Result<()> {
        if let Some(r) = restrictions.iter().find(|r| !self.schema.is_key(&r.column)) {
            return Err(MemoryError::invalid(format!(
                "non primary key column '{}' in the WHERE clause of a delete",
                r.column
            )));
        }
        for key in &self.schema.partition_keys {
            if !restrictions.iter().any(|r| &r.column == key && r.is_equality()) {
                return Err(self.schema.missing_key(key));
            }
        }

        let schema = &self.schema;
        let clustering: Vec<&Restriction> = restrictions
            .iter()
            .filter(|r| !schema.is_partition_key(&r.column))
            .collect();

        for (partition, rows) in self.partitions.iter_mut() {
            if !partition_matches(schema, partition, restrictions) {
                continue;
            }
            if clustering.is_empty() {
                rows.clear();
            } else {
                rows.retain(|ck, _| !clustering.iter().all(|r| r.matches(clustering_value(schema, ck, &r.column))));
            }
        }
        self.partitions.retain(|_, rows| !rows.is_empty());
        Ok(())
    }

    fn delete_map_keys(
        &mut self,
        column: &str,
        keys: Vec<CqlValue>,
        restrictions: &[Restriction],
    ) -> Result<()> {
        let ColumnType::Map(key_type, _) = self.schema.column_type(column)? else {
            return Err(MemoryError::invalid(format!("column '{}' is not a map", column)));
        };
        if let Some(bad) = keys.iter().find(|k| !key_type.accepts(k)) {
            return Err(MemoryError::TypeMismatch {
                column: column.to_string(),
                expected: key_type.to_string(),
                found: bad.type_name(),
            });
        }
        let (partition, clustering) = self.primary_key(restrictions)?;
        let Some(row) = self
            .partitions
            .get_mut(&partition)
            .and_then(|rows| rows.get_mut(&clustering))
        else {
            return Ok(());
        };
        let remaining: Vec<_> = entries(row.cells.get(column).cloned())
            .into_iter()
            .filter(|(k, _)| !keys.contains(k))
            .collect();
        row.write(column, CqlValue::Map(remaining));
        Ok(())
    }

    fn value(&self, partition: &Key, clustering: &Key, row: &Row, column: &str) -> CqlValue {
        if let Some(i) = self.schema.partition_keys.iter().position(|k| k == column) {
            return partition.get(i).cloned().unwrap_or(CqlValue::Null);
        }
        if let Some(i) = self.schema.clustering_columns.iter().position(|k| k == column) {
            return clustering.get(i).cloned().unwrap_or(CqlValue::Null);
        }
        row.cells.get(column).cloned().unwrap_or(CqlValue::Null)
    }
}

fn partition_matches(schema: &Schema, partition: &Key, restrictions: &[Restriction]) -> bool {
    schema
        .partition_keys
        .iter()
        .zip(partition.iter())
        .all(|(column, value)| {
            restrictions
                .iter()
                .filter(|r| &r.column == column)
                .all(|r| r.matches(value))
        })
}

fn clustering_value<'k>(schema: &Schema, clustering: &'k Key, column: &str) -> &'k CqlValue {
    schema
        .clustering_columns
        .iter()
        .position(|c| c == column)
        .and_then(|i| clustering.get(i))
        .unwrap_or(&CqlValue::Null)
}

/// Every table of the store, keyed by qualified name
#[derive(Debug, Clone, Default)]
pub(crate) struct Store {
    tables: BTreeMap<String, Table>,
}

impl Store {
    fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| MemoryError::UnconfiguredTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| MemoryError::UnconfiguredTable(name.to_string()))
    }

    pub(crate) fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub(crate) fn row_count(&self, name: &str) -> Option<usize> {
        self.tables
            .get(name)
            .map(|t| t.partitions.values().map(BTreeMap::len).sum())
    }

    fn create(
        &mut self,
        name: &str,
        if_not_exists: bool,
        columns: &[(String, ColumnType)],
        partition_keys: &[String],
        clustering_columns: &[String],
        clustering_order: &[ClusteringOrderColumn],
    ) -> Result<()> {
        if self.tables.contains_key(name) {
            return if if_not_exists {
                Ok(())
            } else {
                Err(MemoryError::TableExists(name.to_string()))
            };
        }
        let columns: IndexMap<String, ColumnType> = columns.iter().cloned().collect();
        for key in partition_keys.iter().chain(clustering_columns) {
            if !columns.contains_key(key) {
                return Err(MemoryError::UnknownColumn {
                    table: name.to_string(),
                    column: key.clone(),
                });
            }
        }
        let descending = clustering_columns
            .iter()
            .map(|c| {
                clustering_order
                    .iter()
                    .any(|o| &o.column == c && o.direction == Direction::Desc)
            })
            .collect();

        self.tables.insert(
            name.to_string(),
            Table {
                schema: Schema {
                    name: name.to_string(),
                    columns,
                    partition_keys: partition_keys.to_vec(),
                    clustering_columns: clustering_columns.to_vec(),
                    descending,
                },
                partitions: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Apply a write or schema statement
    pub(crate) fn apply(&mut self, stmt: &Statement) -> Result<()> {
        let mut params = Params::new(stmt.values());
        match stmt.command() {
            Command::CreateTable {
                table,
                if_not_exists,
                columns,
                partition_keys,
                clustering_columns,
                clustering_order,
            } => self.create(
                table,
                *if_not_exists,
                columns,
                partition_keys,
                clustering_columns,
                clustering_order,
            )?,
            Command::Insert { table, columns } => {
                self.table_mut(table)?.insert(columns, &mut params)?
            }
            Command::Update {
                table,
                assignments,
                predicates,
            } => {
                let assignments = assignments
                    .iter()
                    .map(|a| -> Result<(&Assignment, Vec<CqlValue>)> {
                        Ok((a, params.take(a.op.arity())?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let restrictions = restrictions(predicates, &mut params)?;
                self.table_mut(table)?.update(assignments, &restrictions)?
            }
            Command::Delete { table, predicates } => {
                let restrictions = restrictions(predicates, &mut params)?;
                self.table_mut(table)?.delete(&restrictions)?
            }
            Command::DeleteMapKeys {
                table,
                column,
                key_count,
                predicates,
            } => {
                let keys = params.take(*key_count)?;
                let restrictions = restrictions(predicates, &mut params)?;
                self.table_mut(table)?
                    .delete_map_keys(column, keys, &restrictions)?
            }
            Command::Select { .. } => {
                return Err(MemoryError::invalid("a read cannot be executed as a write"))
            }
        }
        params.finish()
    }

    /// Rows of a select, projected onto its columns
    pub(crate) fn select(&self, stmt: &Statement) -> Result<(Vec<String>, Vec<Vec<CqlValue>>)> {
        let Command::Select {
            table,
            columns,
            predicates,
            limit,
            allow_filtering,
        } = stmt.command()
        else {
            return Err(MemoryError::invalid("only a select can be queried"));
        };

        let mut params = Params::new(stmt.values());
        let restrictions = restrictions(predicates, &mut params)?;
        params.finish()?;

        let table = self.table(table)?;
        let schema = &table.schema;
        for column in columns {
            schema.column_type(column)?;
        }
        for r in &restrictions {
            for term in &r.terms {
                schema.check(&r.column, term)?;
            }
        }
        if !allow_filtering && schema.needs_filtering(&restrictions) {
            return Err(MemoryError::FilteringRequired);
        }

        let limit = limit.unwrap_or(usize::MAX);
        let mut out = Vec::new();
        'partitions: for (partition, rows) in &table.partitions {
            if !partition_matches(schema, partition, &restrictions) {
                continue;
            }
            let mut ordered: Vec<(&Key, &Row)> = rows.iter().collect();
            if schema.descending.iter().any(|d| *d) {
                ordered.sort_by(|a, b| schema.compare_clustering(a.0, b.0));
            }
            for (clustering, row) in ordered {
                let matches = restrictions
                    .iter()
                    .filter(|r| !schema.is_partition_key(&r.column))
                    .all(|r| r.matches(&table.value(partition, clustering, row, &r.column)));
                if !matches {
                    continue;
                }
                out.push(
                    columns
                        .iter()
                        .map(|c| table.value(partition, clustering, row, c))
                        .collect(),
                );
                if out.len() >= limit {
                    break 'partitions;
                }
            }
        }

        trace!(table = schema.name.as_str(), rows = out.len(), "selected rows");
        Ok((columns.clone(), out))
    }
}
