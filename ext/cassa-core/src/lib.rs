//! Statement compiler and record codec for wide-column stores
//!
//! `cassa-core` turns typed records and table descriptors into query
//! statements with positional `?` parameters, and decodes result rows back
//! into records. It does not speak any wire protocol: statements are handed
//! to an injected [`QueryExecutor`] supplied by a driver adapter.
//!
//! # Key Components
//!
//! - **Records**: the [`Record`] trait declares a type's columns once
//!   - [`record!`] implements it from a field list
//!   - [`ColumnValue`] maps each field type to a column type and value
//!   - [`FieldMap`] is the ordered, case-insensitive view used everywhere else
//!
//! - **Compiler**: pure functions in [`compiler`] producing [`Statement`]s
//!   - Create table with composite, compound or clustered primary keys
//!   - Insert or sparse update, depending on which nullable fields are set
//!   - Select, update, delete and map-key deletion over [`Relation`]s
//!
//! - **Scanner**: [`scanner::RowScanner`] decodes cursor rows into one record
//!   or a vector of records, ignoring columns the record does not map
//!
//! - **Tables**: [`Table`], [`MapTable`] and [`MultimapTable`] build deferred
//!   [`Op`]s that compile and run statements against a [`Connection`]
//!
//! # Example Usage
//!
//! ```ignore
//! use cassa_core::{eq, record, Connection, Keys};
//!
//! #[derive(Debug, Default)]
//! struct Customer {
//!     id: String,
//!     name: String,
//! }
//!
//! record!(Customer { id, name });
//!
//! let conn = Connection::new(executor);
//! let customers = conn.key_space("shop").table::<Customer>("customer", Keys::partition(["id"]))?;
//! customers.set(&Customer { id: "1".into(), name: "Joe".into() }).run()?;
//!
//! let mut found = Customer::default();
//! customers.filter(vec![eq("id", "1".to_string())]).read_one(&mut found).run()?;
//! ```

pub mod compiler;
pub mod connection;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod map_table;
pub mod observer;
pub mod op;
pub mod options;
pub mod scanner;
pub mod schema;
pub mod statement;
pub mod table;
pub mod traits;
pub mod value;

#[cfg(test)]
pub mod test_utils;

pub use connection::{Connection, ConnectionBuilder, KeySpace};
pub use descriptor::{Keys, TableDescriptor};
pub use error::{CassaError, ErrorContext, ExecutorError, Result};
pub use executor::{Cursor, QueryExecutor};
pub use map_table::{MapTable, MultimapTable};
pub use observer::{NoopObserver, Observer, Operation, Outcome, OutcomeCounters, OutcomeEvent};
pub use op::Op;
pub use options::{ClusteringOrderColumn, Consistency, Context, Direction, Options};
pub use scanner::{Destination, RowScanner, Scanner, Target};
pub use schema::{Column, ColumnType, FieldDescriptor, FieldKind, FieldMap};
pub use statement::{
    batch, eq, gt, gte, in_list, lt, lte, Batch, Command, Comparator, Modifier, Relation,
    Statement, Updates,
};
pub use table::{Filter, Table};
pub use traits::{ColumnValue, Record};
pub use value::{CqlValue, Decimal};
