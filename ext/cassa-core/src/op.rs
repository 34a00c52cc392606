//! Deferred operations

use crate::compiler;
use crate::observer::{Operation, Outcome, OutcomeEvent};
use crate::scanner::{RowScanner, Target};
use crate::statement::batch;
use crate::{
    CassaError, Connection, Context, CqlValue, Options, QueryExecutor, Record, Relation, Result,
    Statement, TableDescriptor, Updates,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs a read and decodes into whatever the caller handed over
trait ReadInto {
    fn query(
        &mut self,
        executor: &dyn QueryExecutor,
        options: &Options,
        stmt: &Statement,
    ) -> Result<()>;
}

impl<R: Record> ReadInto for Target<'_, R> {
    fn query(
        &mut self,
        executor: &dyn QueryExecutor,
        options: &Options,
        stmt: &Statement,
    ) -> Result<()> {
        let mut scanner = RowScanner::new(stmt.field_names(), self.reborrow());
        executor.query_with_options(options, stmt, &mut scanner)
    }
}

enum Action<'a> {
    Write(Vec<CqlValue>),
    Update {
        relations: Vec<Relation>,
        updates: Updates,
    },
    Delete(Vec<Relation>),
    DeleteMapKeys {
        relations: Vec<Relation>,
        field: String,
        keys: Vec<CqlValue>,
    },
    Read {
        relations: Vec<Relation>,
        into: Box<dyn ReadInto + 'a>,
    },
}

struct SingleOp<'a> {
    conn: Connection,
    table: Arc<TableDescriptor>,
    options: Options,
    action: Action<'a>,
}

impl SingleOp<'_> {
    fn operation(&self) -> Operation {
        match self.action {
            Action::Write(_) => Operation::Insert,
            Action::Update { .. } => Operation::Update,
            Action::Delete(_) | Action::DeleteMapKeys { .. } => Operation::Delete,
            Action::Read { .. } => Operation::Read,
        }
    }

    fn statement(&self) -> Result<Statement> {
        let (desc, opts) = (self.table.as_ref(), &self.options);
        match &self.action {
            Action::Write(values) => compiler::write_values(desc, opts, values.clone()),
            Action::Update { relations, updates } => {
                compiler::update(desc, opts, relations, updates)
            }
            Action::Delete(relations) => compiler::delete(desc, opts, relations),
            Action::DeleteMapKeys {
                relations,
                field,
                keys,
            } => compiler::delete_map_keys(desc, opts, relations, field, keys),
            Action::Read { relations, .. } => {
                compiler::select(desc, opts, relations, &opts.select)
            }
        }
    }

    fn execute(&mut self) -> Result<()> {
        let stmt = self.statement()?;
        debug!(
            table = stmt.command().table(),
            query = stmt.query(),
            params = stmt.values().len(),
            "executing statement"
        );
        let executor = self.conn.executor();
        match &mut self.action {
            Action::Read { into, .. } => into.query(executor, &self.options, &stmt),
            _ => executor.execute_with_options(&self.options, &stmt),
        }
    }

    fn run(&mut self) -> Result<()> {
        let result = self.execute();
        let operation = self.operation();
        self.conn.observe(operation, &result);
        match &result {
            Err(e) if e.is_row_not_found() => {
                debug!(table = self.table.name(), %operation, "no row found");
            }
            Err(e) => {
                warn!(table = self.table.name(), %operation, error = %e, "operation failed");
            }
            Ok(()) => {}
        }
        result
    }
}

/// A unit of work against one or more tables.
///
/// Nothing touches the executor until [`Op::run`] or [`Op::run_atomically`].
/// Statements are compiled at that point, so options added with
/// [`Op::with_options`] still shape the statement text.
#[must_use = "an Op does nothing until it is run"]
pub struct Op<'a> {
    ops: Vec<SingleOp<'a>>,
}

impl<'a> Op<'a> {
    fn single(conn: &Connection, table: &Arc<TableDescriptor>, options: &Options, action: Action<'a>) -> Self {
        Op {
            ops: vec![SingleOp {
                conn: conn.clone(),
                table: Arc::clone(table),
                options: options.clone(),
                action,
            }],
        }
    }

    pub(crate) fn write(
        conn: &Connection,
        table: &Arc<TableDescriptor>,
        options: &Options,
        values: Vec<CqlValue>,
    ) -> Self {
        Self::single(conn, table, options, Action::Write(values))
    }

    pub(crate) fn update(
        conn: &Connection,
        table: &Arc<TableDescriptor>,
        options: &Options,
        relations: Vec<Relation>,
        updates: Updates,
    ) -> Self {
        Self::single(conn, table, options, Action::Update { relations, updates })
    }

    pub(crate) fn delete(
        conn: &Connection,
        table: &Arc<TableDescriptor>,
        options: &Options,
        relations: Vec<Relation>,
    ) -> Self {
        Self::single(conn, table, options, Action::Delete(relations))
    }

    pub(crate) fn delete_map_keys(
        conn: &Connection,
        table: &Arc<TableDescriptor>,
        options: &Options,
        relations: Vec<Relation>,
        field: &str,
        keys: Vec<CqlValue>,
    ) -> Self {
        let action = Action::DeleteMapKeys {
            relations,
            field: field.to_string(),
            keys,
        };
        Self::single(conn, table, options, action)
    }

    pub(crate) fn read<R: Record>(
        conn: &Connection,
        table: &Arc<TableDescriptor>,
        options: &Options,
        relations: Vec<Relation>,
        target: Target<'a, R>,
    ) -> Self {
        let into: Box<dyn ReadInto + 'a> = Box::new(target);
        Self::single(conn, table, options, Action::Read { relations, into })
    }

    /// An op that does nothing
    pub fn noop() -> Self {
        Op { ops: Vec::new() }
    }

    /// Layer `options` over the options of every operation in this op
    pub fn with_options(mut self, options: Options) -> Self {
        for op in &mut self.ops {
            op.options = op.options.merge(&options);
        }
        self
    }

    /// Append the operations of `other`, to run after these
    pub fn add(mut self, other: Op<'a>) -> Self {
        self.ops.extend(other.ops);
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Run every operation in order, stopping at the first failure
    pub fn run(mut self) -> Result<()> {
        for op in &mut self.ops {
            op.run()?;
        }
        Ok(())
    }

    pub fn run_with_context(self, context: Context) -> Result<()> {
        self.with_options(Options::new().with_context(context)).run()
    }

    /// Run every write as one logged batch on the executor of the first
    /// operation. Reads cannot be part of an atomic op.
    pub fn run_atomically(self) -> Result<()> {
        let Some(first) = self.ops.first() else {
            return Ok(());
        };
        if self.ops.iter().any(|op| matches!(op.action, Action::Read { .. })) {
            return Err(CassaError::configuration(
                "reads cannot be executed atomically",
            ));
        }

        let batch = batch(self.generate_statements()?)?;
        debug!(statements = batch.len(), "executing logged batch");
        let result = first
            .conn
            .executor()
            .execute_atomically_with_options(&first.options, &batch);

        for op in &self.ops {
            op.conn.observe(op.operation(), &result);
        }
        if let Err(e) = &result {
            warn!(statements = batch.len(), error = %e, "logged batch failed");
        }
        result
    }

    pub fn run_atomically_with_context(self, context: Context) -> Result<()> {
        self.with_options(Options::new().with_context(context))
            .run_atomically()
    }

    /// Compile the statements this op would run, in order
    pub fn generate_statements(&self) -> Result<Vec<Statement>> {
        self.ops.iter().map(SingleOp::statement).collect()
    }
}

impl Connection {
    fn observe(&self, operation: Operation, result: &Result<()>) {
        let outcome = match result {
            Ok(()) => Outcome::Success,
            Err(_) => Outcome::Error,
        };
        self.observer().observe(OutcomeEvent { operation, outcome });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test::{Customer, RecordingExecutor};
    use crate::{eq, Consistency, Keys, OutcomeCounters};

    fn setup() -> (Arc<RecordingExecutor>, Arc<OutcomeCounters>, Connection) {
        let executor = Arc::new(RecordingExecutor::default());
        let counters = Arc::new(OutcomeCounters::new());
        let conn = Connection::builder()
            .with_observer(counters.clone())
            .build(executor.clone());
        (executor, counters, conn)
    }

    #[test]
    fn test_statements_compiled_at_run_time() {
        let (executor, _, conn) = setup();
        let table = conn
            .key_space("ks")
            .table::<Customer>("customer", Keys::partition(["id"]))
            .unwrap();

        let op = table
            .set(&Customer {
                id: "1".to_string(),
                name: "Joe".to_string(),
            })
            .with_options(Options::new().with_table_name("customer_by_id"));
        let stmts = op.generate_statements().unwrap();
        assert_eq!(
            stmts[0].query(),
            "UPDATE ks.customer_by_id SET name = ? WHERE id = ?"
        );
        assert!(executor.executed().is_empty());

        op.run().unwrap();
        assert_eq!(executor.executed().len(), 1);
    }

    #[test]
    fn test_options_reach_executor() {
        let (executor, _, conn) = setup();
        let table = conn
            .key_space("ks")
            .table::<Customer>("customer", Keys::partition(["id"]))
            .unwrap();
        let context = Context::new();

        table
            .filter(vec![eq("id", "1".to_string())])
            .delete()
            .with_options(Options::new().with_consistency(Consistency::All))
            .run_with_context(context.clone())
            .unwrap();

        let (options, _) = executor.last_options().unwrap();
        assert_eq!(options.consistency, Some(Consistency::All));
        assert_eq!(options.context, Some(context));
    }

    #[test]
    fn test_atomic_rejects_reads() {
        let (executor, _, conn) = setup();
        let table = conn
            .key_space("ks")
            .table::<Customer>("customer", Keys::partition(["id"]))
            .unwrap();
        let mut out = Vec::new();
        let op = table
            .set(&Customer::default())
            .add(table.filter(vec![]).read(&mut out));
        let err = op.run_atomically().unwrap_err();
        assert!(matches!(err, CassaError::Configuration(_)));
        assert!(executor.batches().is_empty());
    }

    #[test]
    fn test_empty_atomic_is_noop() {
        Op::noop().run_atomically().unwrap();
        Op::noop().run().unwrap();
    }

    #[test]
    fn test_atomic_batches_writes_and_observes() {
        let (executor, counters, conn) = setup();
        let table = conn
            .key_space("ks")
            .table::<Customer>("customer", Keys::partition(["id"]))
            .unwrap();
        let joe = Customer {
            id: "1".to_string(),
            name: "Joe".to_string(),
        };
        table
            .set(&joe)
            .add(table.filter(vec![eq("id", "2".to_string())]).delete())
            .run_atomically()
            .unwrap();

        assert_eq!(executor.batches(), vec![2]);
        assert_eq!(counters.count(Operation::Insert, Outcome::Success), 1);
        assert_eq!(counters.count(Operation::Delete, Outcome::Success), 1);
        assert_eq!(counters.total(Outcome::Success), 2);
    }

    #[test]
    fn test_compile_error_counted_and_returned() {
        let (executor, counters, conn) = setup();
        let table = conn
            .key_space("ks")
            .table::<Customer>("customer", Keys::partition(["id"]))
            .unwrap();
        let err = table
            .filter(vec![eq("email", "x".to_string())])
            .delete()
            .run()
            .unwrap_err();
        assert!(matches!(err, CassaError::Configuration(_)));
        assert!(executor.executed().is_empty());
        assert_eq!(counters.count(Operation::Delete, Outcome::Error), 1);
    }

    #[test]
    fn test_row_not_found_counted_and_returned() {
        let (executor, counters, conn) = setup();
        let table = conn
            .key_space("ks")
            .table::<Customer>("customer", Keys::partition(["id"]))
            .unwrap();
        let mut out = Customer::default();
        let err = table
            .filter(vec![eq("id", "1".to_string())])
            .read_one(&mut out)
            .run()
            .unwrap_err();
        assert!(err.is_row_not_found());
        assert_eq!(executor.queried().len(), 1);
        assert_eq!(counters.count(Operation::Read, Outcome::Error), 1);
        assert_eq!(out, Customer::default());
    }
}
