use crate::observer::{NoopObserver, Observer};
use crate::{
    CassaError, Keys, MapTable, MultimapTable, Options, QueryExecutor, Record, Result, Table,
};
use std::sync::Arc;

/// Executor, observer and default options shared by every table handed out
#[derive(Clone)]
pub struct Connection {
    executor: Arc<dyn QueryExecutor>,
    observer: Arc<dyn Observer>,
    options: Options,
}

impl Connection {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        ConnectionBuilder::new().build(executor)
    }

    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    pub fn key_space<S: Into<String>>(&self, name: S) -> KeySpace {
        KeySpace {
            name: name.into(),
            conn: self.clone(),
        }
    }

    pub fn executor(&self) -> &dyn QueryExecutor {
        self.executor.as_ref()
    }

    pub fn observer(&self) -> &dyn Observer {
        self.observer.as_ref()
    }

    /// Options every table starts from
    pub fn options(&self) -> &Options {
        &self.options
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

pub struct ConnectionBuilder {
    observer: Arc<dyn Observer>,
    options: Options,
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self {
            observer: Arc::new(NoopObserver),
            options: Options::default(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Default options, layered under table and per-operation options
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn build(self, executor: Arc<dyn QueryExecutor>) -> Connection {
        Connection {
            executor,
            observer: self.observer,
            options: self.options,
        }
    }
}

/// A named keyspace; tables created from it are qualified with its name
#[derive(Debug, Clone)]
pub struct KeySpace {
    name: String,
    conn: Connection,
}

impl KeySpace {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// A table of `R` records with the given primary key layout
    pub fn table<R: Record>(&self, name: &str, keys: Keys) -> Result<Table<R>> {
        Table::new(&self.conn, &self.name, name, keys)
    }

    /// A table keyed by a single field, named `<prefix>_map_<field>`
    pub fn map_table<R: Record>(&self, prefix: &str, partition_field: &str) -> Result<MapTable<R>> {
        MapTable::new(self, prefix, partition_field)
    }

    /// A table partitioned by one field and clustered by another, named
    /// `<prefix>_multimap_<field>_<id>`
    pub fn multimap_table<R: Record>(
        &self,
        prefix: &str,
        partition_field: &str,
        id_field: &str,
    ) -> Result<MultimapTable<R>> {
        if partition_field.eq_ignore_ascii_case(id_field) {
            return Err(CassaError::configuration(format!(
                "multimap table '{}' needs distinct partition and id fields",
                prefix
            )));
        }
        MultimapTable::new(self, prefix, partition_field, id_field)
    }
}
