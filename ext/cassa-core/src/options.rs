//! Per-call execution options and the cancellation context threaded through
//! to executors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Replica acknowledgement level requested for a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Consistency {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    LocalOne,
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Consistency::Any => "ANY",
            Consistency::One => "ONE",
            Consistency::Two => "TWO",
            Consistency::Three => "THREE",
            Consistency::Quorum => "QUORUM",
            Consistency::All => "ALL",
            Consistency::LocalQuorum => "LOCAL_QUORUM",
            Consistency::EachQuorum => "EACH_QUORUM",
            Consistency::Serial => "SERIAL",
            Consistency::LocalSerial => "LOCAL_SERIAL",
            Consistency::LocalOne => "LOCAL_ONE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("ASC"),
            Direction::Desc => f.write_str("DESC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringOrderColumn {
    pub column: String,
    pub direction: Direction,
}

/// Cancellation handle with an optional deadline.
///
/// Clones share the cancellation flag. Nothing in this crate cancels a
/// context; it is handed to the executor as given.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled) && self.deadline == other.deadline
    }
}

/// Options that shape statement text and execution.
///
/// Layers are combined with [`Options::merge`]: connection defaults, then
/// table options, then per-operation options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Unset means the executor's connection default
    pub consistency: Option<Consistency>,
    #[serde(skip)]
    pub context: Option<Context>,
    /// Physical table name to use instead of the descriptor's name
    pub table_name: Option<String>,
    /// Append `ALLOW FILTERING` to selects. Never inferred.
    pub allow_filtering: bool,
    /// `WITH CLUSTERING ORDER BY` directives for create table
    pub clustering_order: Vec<ClusteringOrderColumn>,
    pub limit: Option<usize>,
    /// Columns to read; empty means every record column
    pub select: Vec<String>,
    pub compact_storage: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_table_name<S: Into<String>>(mut self, name: S) -> Self {
        self.table_name = Some(name.into());
        self
    }

    pub fn with_allow_filtering(mut self) -> Self {
        self.allow_filtering = true;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_select<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.select = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_compact_storage(mut self) -> Self {
        self.compact_storage = true;
        self
    }

    pub fn append_clustering_order<S: Into<String>>(mut self, column: S, direction: Direction) -> Self {
        self.clustering_order.push(ClusteringOrderColumn {
            column: column.into(),
            direction,
        });
        self
    }

    /// Layer `other` over `self`. Values set in `other` win; lists replace
    /// when non-empty; flags are OR-ed.
    pub fn merge(&self, other: &Options) -> Options {
        Options {
            consistency: other.consistency.or(self.consistency),
            context: other.context.clone().or_else(|| self.context.clone()),
            table_name: other.table_name.clone().or_else(|| self.table_name.clone()),
            allow_filtering: self.allow_filtering || other.allow_filtering,
            clustering_order: if other.clustering_order.is_empty() {
                self.clustering_order.clone()
            } else {
                other.clustering_order.clone()
            },
            limit: other.limit.or(self.limit),
            select: if other.select.is_empty() {
                self.select.clone()
            } else {
                other.select.clone()
            },
            compact_storage: self.compact_storage || other.compact_storage,
        }
    }
}
