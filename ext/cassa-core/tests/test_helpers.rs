#![allow(dead_code)]

use bytes::Bytes;
use cassa_core::*;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Customer {
    pub id: String,
    pub name: String,
}

record!(Customer { id, name });

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Customer2 {
    pub id: String,
    pub name: String,
    pub tag: String,
}

record!(Customer2 { id, name, tag });

/// A record touching every supported field shape
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Account {
    pub id: uuid::Uuid,
    pub owner: String,
    pub balance: i64,
    pub rate: f64,
    pub active: bool,
    pub opened_at: jiff::Timestamp,
    pub nickname: Option<String>,
    pub avatar: Bytes,
    pub labels: BTreeSet<String>,
    pub history: Vec<i32>,
    pub limits: HashMap<String, i64>,
}

record!(Account {
    id,
    owner,
    balance,
    rate,
    active,
    opened_at,
    nickname,
    avatar,
    labels,
    history,
    limits
});

pub fn descriptor<R: Record>(key_space: &str, name: &str, keys: Keys) -> TableDescriptor {
    TableDescriptor::new::<R>(key_space, name, keys).expect("valid descriptor")
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Records every statement it receives and answers reads with no rows
#[derive(Debug, Default)]
pub struct StatementLog {
    statements: Mutex<Vec<String>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl StatementLog {
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

struct EmptyCursor;

impl Cursor for EmptyCursor {
    fn scan(&mut self, _destinations: &mut [Destination]) -> bool {
        false
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl QueryExecutor for StatementLog {
    fn query_with_options(
        &self,
        _options: &Options,
        stmt: &Statement,
        scanner: &mut dyn Scanner,
    ) -> Result<()> {
        self.statements.lock().unwrap().push(stmt.query().to_string());
        scanner.scan_iter(&mut EmptyCursor)?;
        Ok(())
    }

    fn execute_with_options(&self, _options: &Options, stmt: &Statement) -> Result<()> {
        self.statements.lock().unwrap().push(stmt.query().to_string());
        Ok(())
    }

    fn execute_atomically_with_options(&self, _options: &Options, batch: &Batch) -> Result<()> {
        let queries = batch.statements().iter().map(|s| s.query().to_string()).collect();
        self.batches.lock().unwrap().push(queries);
        Ok(())
    }
}

pub fn logged_connection() -> (Arc<StatementLog>, Connection) {
    let log = Arc::new(StatementLog::default());
    let conn = Connection::new(log.clone());
    (log, conn)
}
