use crate::compiler;
use crate::scanner::Target;
use crate::{Connection, Keys, Op, Options, Record, Relation, Result, Statement, TableDescriptor, Updates};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// A table of `R` records.
///
/// Cheap to clone; clones share the descriptor and connection.
pub struct Table<R> {
    conn: Connection,
    desc: Arc<TableDescriptor>,
    options: Options,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Table<R> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            desc: Arc::clone(&self.desc),
            options: self.options.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("desc", &self.desc)
            .field("options", &self.options)
            .finish()
    }
}

impl<R: Record> Table<R> {
    pub(crate) fn new(conn: &Connection, key_space: &str, name: &str, keys: Keys) -> Result<Self> {
        let desc = TableDescriptor::new::<R>(key_space, name, keys)?;
        Ok(Self {
            conn: conn.clone(),
            desc: Arc::new(desc),
            options: conn.options().clone(),
            _record: PhantomData,
        })
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.desc
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Physical table name: the override from the options, if any
    pub fn name(&self) -> &str {
        self.options
            .table_name
            .as_deref()
            .unwrap_or_else(|| self.desc.name())
    }

    /// A copy of this table with `options` layered over its own
    pub fn with_options(&self, options: Options) -> Self {
        Self {
            options: self.options.merge(&options),
            ..self.clone()
        }
    }

    /// Write a record. See [`compiler::insert`] for how the statement is
    /// shaped.
    pub fn set(&self, record: &R) -> Op<'static> {
        Op::write(&self.conn, &self.desc, &self.options, record.values())
    }

    pub fn filter(&self, relations: Vec<Relation>) -> Filter<R> {
        Filter {
            table: self.clone(),
            relations,
        }
    }

    pub fn create_statement(&self) -> Result<Statement> {
        compiler::create_table(&self.desc, &self.options)
    }

    pub fn create(&self) -> Result<()> {
        self.run_schema(self.create_statement()?)
    }

    pub fn create_if_not_exists(&self) -> Result<()> {
        self.run_schema(compiler::create_table_if_not_exists(&self.desc, &self.options)?)
    }

    fn run_schema(&self, stmt: Statement) -> Result<()> {
        debug!(table = stmt.command().table(), query = stmt.query(), "creating table");
        self.conn.executor().execute_with_options(&self.options, &stmt)
    }
}

/// Rows of a table selected by relations
pub struct Filter<R> {
    table: Table<R>,
    relations: Vec<Relation>,
}

impl<R: Record> Filter<R> {
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn table(&self) -> &Table<R> {
        &self.table
    }

    /// Read every matching row into `out`, replacing its contents
    pub fn read<'a>(&self, out: &'a mut Vec<R>) -> Op<'a> {
        self.read_into(Target::Many(out))
    }

    /// Read the first matching row. No match fails the op with
    /// [`CassaError::RowNotFound`](crate::CassaError::RowNotFound).
    pub fn read_one<'a>(&self, out: &'a mut R) -> Op<'a> {
        self.read_into(Target::One(out))
    }

    pub fn read_into<'a>(&self, target: Target<'a, R>) -> Op<'a> {
        let t = &self.table;
        Op::read(&t.conn, &t.desc, &t.options, self.relations.clone(), target)
    }

    pub fn update(&self, updates: Updates) -> Op<'static> {
        let t = &self.table;
        Op::update(&t.conn, &t.desc, &t.options, self.relations.clone(), updates)
    }

    pub fn delete(&self) -> Op<'static> {
        let t = &self.table;
        Op::delete(&t.conn, &t.desc, &t.options, self.relations.clone())
    }

    /// Remove entries of map column `field` from matching rows
    pub fn delete_map_keys(&self, field: &str, keys: Vec<crate::CqlValue>) -> Op<'static> {
        let t = &self.table;
        Op::delete_map_keys(&t.conn, &t.desc, &t.options, self.relations.clone(), field, keys)
    }
}
