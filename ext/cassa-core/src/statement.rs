//! Compiled statements and the building blocks the compiler accepts

use crate::{CassaError, ClusteringOrderColumn, ColumnType, ColumnValue, CqlValue, Result};
use indexmap::IndexMap;
use std::fmt;

/// Comparison used by a [`Relation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::In => "IN",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
        }
    }
}

/// A restriction on one field in a WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    field: String,
    comparator: Comparator,
    terms: Vec<CqlValue>,
}

impl Relation {
    pub fn new<S: Into<String>>(field: S, comparator: Comparator, terms: Vec<CqlValue>) -> Self {
        Self {
            field: field.into(),
            comparator,
            terms,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    pub fn terms(&self) -> &[CqlValue] {
        &self.terms
    }
}

/// `field = ?`
pub fn eq<V: ColumnValue>(field: &str, value: V) -> Relation {
    Relation::new(field, Comparator::Eq, vec![value.to_cql()])
}

/// `field IN (?, ...)`
pub fn in_list<V: ColumnValue>(field: &str, values: &[V]) -> Relation {
    Relation::new(
        field,
        Comparator::In,
        values.iter().map(ColumnValue::to_cql).collect(),
    )
}

pub fn gt<V: ColumnValue>(field: &str, value: V) -> Relation {
    Relation::new(field, Comparator::Gt, vec![value.to_cql()])
}

pub fn gte<V: ColumnValue>(field: &str, value: V) -> Relation {
    Relation::new(field, Comparator::Gte, vec![value.to_cql()])
}

pub fn lt<V: ColumnValue>(field: &str, value: V) -> Relation {
    Relation::new(field, Comparator::Lt, vec![value.to_cql()])
}

pub fn lte<V: ColumnValue>(field: &str, value: V) -> Relation {
    Relation::new(field, Comparator::Lte, vec![value.to_cql()])
}

/// Change applied to one column by an UPDATE
#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    /// `c = ?`
    Set(CqlValue),
    /// `c = c + ?`, operand is a list
    ListAppend(CqlValue),
    /// `c = ? + c`, operand is a list
    ListPrepend(CqlValue),
    /// `c = c - ?`, operand is a list
    ListRemove(CqlValue),
    /// `c[?] = ?`
    MapSetField(CqlValue, CqlValue),
    /// `c = c + ?`, operand is a map
    MapSetFields(CqlValue),
}

impl Modifier {
    pub fn set<V: ColumnValue>(value: V) -> Self {
        Modifier::Set(value.to_cql())
    }

    /// Append one element. Use [`Modifier::list_append_all`] for several;
    /// a `Vec` passed here is a single (nested) element.
    pub fn list_append<V: ColumnValue>(value: V) -> Self {
        Modifier::ListAppend(CqlValue::List(vec![value.to_cql()]))
    }

    pub fn list_append_all<V: ColumnValue>(values: &[V]) -> Self {
        Modifier::ListAppend(list_of(values))
    }

    pub fn list_prepend<V: ColumnValue>(value: V) -> Self {
        Modifier::ListPrepend(CqlValue::List(vec![value.to_cql()]))
    }

    pub fn list_prepend_all<V: ColumnValue>(values: &[V]) -> Self {
        Modifier::ListPrepend(list_of(values))
    }

    pub fn list_remove<V: ColumnValue>(value: V) -> Self {
        Modifier::ListRemove(CqlValue::List(vec![value.to_cql()]))
    }

    /// Remove every occurrence of each of `values`
    pub fn list_remove_all<V: ColumnValue>(values: &[V]) -> Self {
        Modifier::ListRemove(list_of(values))
    }

    pub fn map_set_field<K: ColumnValue, V: ColumnValue>(key: K, value: V) -> Self {
        Modifier::MapSetField(key.to_cql(), value.to_cql())
    }

    pub fn map_set_fields<M: ColumnValue>(entries: M) -> Self {
        Modifier::MapSetFields(entries.to_cql())
    }

    pub(crate) fn op(&self) -> AssignmentOp {
        match self {
            Modifier::Set(_) => AssignmentOp::Set,
            Modifier::ListAppend(_) => AssignmentOp::ListAppend,
            Modifier::ListPrepend(_) => AssignmentOp::ListPrepend,
            Modifier::ListRemove(_) => AssignmentOp::ListRemove,
            Modifier::MapSetField(_, _) => AssignmentOp::MapSetField,
            Modifier::MapSetFields(_) => AssignmentOp::MapSetFields,
        }
    }
}

fn list_of<V: ColumnValue>(values: &[V]) -> CqlValue {
    CqlValue::List(values.iter().map(ColumnValue::to_cql).collect())
}

/// Field name to modifier, applied in insertion order
pub type Updates = IndexMap<String, Modifier>;

/// Assignment kinds in a compiled UPDATE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOp {
    Set,
    ListAppend,
    ListPrepend,
    ListRemove,
    MapSetField,
    MapSetFields,
}

impl AssignmentOp {
    /// Placeholders consumed by this assignment
    pub fn arity(&self) -> usize {
        match self {
            AssignmentOp::MapSetField => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub op: AssignmentOp,
}

/// A WHERE term in a compiled statement; consumes `arity` placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub comparator: Comparator,
    pub arity: usize,
}

/// Structured form of a compiled statement.
///
/// Placeholders are consumed from [`Statement::values`] in the order they
/// appear in the query text: assignments (or map keys) first, then
/// predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTable {
        table: String,
        if_not_exists: bool,
        columns: Vec<(String, ColumnType)>,
        partition_keys: Vec<String>,
        clustering_columns: Vec<String>,
        clustering_order: Vec<ClusteringOrderColumn>,
    },
    Insert {
        table: String,
        columns: Vec<String>,
    },
    Update {
        table: String,
        assignments: Vec<Assignment>,
        predicates: Vec<Predicate>,
    },
    Delete {
        table: String,
        predicates: Vec<Predicate>,
    },
    DeleteMapKeys {
        table: String,
        column: String,
        key_count: usize,
        predicates: Vec<Predicate>,
    },
    Select {
        table: String,
        columns: Vec<String>,
        predicates: Vec<Predicate>,
        limit: Option<usize>,
        allow_filtering: bool,
    },
}

impl Command {
    pub fn table(&self) -> &str {
        match self {
            Command::CreateTable { table, .. }
            | Command::Insert { table, .. }
            | Command::Update { table, .. }
            | Command::Delete { table, .. }
            | Command::DeleteMapKeys { table, .. }
            | Command::Select { table, .. } => table,
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Command::Select { .. })
    }

    /// Number of positional parameters the command consumes
    pub fn placeholder_count(&self) -> usize {
        let predicates = |ps: &[Predicate]| ps.iter().map(|p| p.arity).sum::<usize>();
        match self {
            Command::CreateTable { .. } => 0,
            Command::Insert { columns, .. } => columns.len(),
            Command::Update {
                assignments,
                predicates: ps,
                ..
            } => assignments.iter().map(|a| a.op.arity()).sum::<usize>() + predicates(ps),
            Command::Delete { predicates: ps, .. } => predicates(ps),
            Command::DeleteMapKeys {
                key_count,
                predicates: ps,
                ..
            } => key_count + predicates(ps),
            Command::Select { predicates: ps, .. } => predicates(ps),
        }
    }
}

/// Query text, positional parameters and the column names the statement
/// reads or writes
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    query: String,
    values: Vec<CqlValue>,
    field_names: Vec<String>,
    command: Command,
}

impl Statement {
    pub(crate) fn new(
        query: String,
        values: Vec<CqlValue>,
        field_names: Vec<String>,
        command: Command,
    ) -> Result<Self> {
        let placeholders = query.matches('?').count();
        if placeholders != values.len() || placeholders != command.placeholder_count() {
            return Err(CassaError::internal(format!(
                "statement has {} placeholders but {} values: {}",
                placeholders,
                values.len(),
                query
            )));
        }
        Ok(Self {
            query,
            values,
            field_names,
            command,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn values(&self) -> &[CqlValue] {
        &self.values
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}

/// Statements executed as one logged batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    statements: Vec<Statement>,
}

impl Batch {
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Group write statements into a logged batch. Reads cannot be batched.
pub fn batch(statements: Vec<Statement>) -> Result<Batch> {
    if let Some(read) = statements.iter().find(|s| s.command().is_read()) {
        return Err(CassaError::configuration(format!(
            "cannot batch a read: {}",
            read.query()
        )));
    }
    Ok(Batch { statements })
}
