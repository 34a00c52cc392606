//! Typed outcome events for single operations

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => f.write_str("read"),
            Operation::Insert => f.write_str("insert"),
            Operation::Update => f.write_str("update"),
            Operation::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutcomeEvent {
    pub operation: Operation,
    pub outcome: Outcome,
}

/// Receives an event after every operation an [`Op`](crate::Op) runs.
/// Implementations decide what to record.
pub trait Observer: Send + Sync {
    fn observe(&self, event: OutcomeEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn observe(&self, _event: OutcomeEvent) {}
}

#[derive(Debug, Default)]
struct Counter {
    success: AtomicU64,
    error: AtomicU64,
}

impl Counter {
    fn record(&self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.success.fetch_add(1, Ordering::Relaxed),
            Outcome::Error => self.error.fetch_add(1, Ordering::Relaxed),
        };
    }

    fn get(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Success => self.success.load(Ordering::Relaxed),
            Outcome::Error => self.error.load(Ordering::Relaxed),
        }
    }
}

/// Success and error counts per operation, plus totals
#[derive(Debug, Default)]
pub struct OutcomeCounters {
    read: Counter,
    insert: Counter,
    update: Counter,
    delete: Counter,
    total: Counter,
}

impl OutcomeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, operation: Operation) -> &Counter {
        match operation {
            Operation::Read => &self.read,
            Operation::Insert => &self.insert,
            Operation::Update => &self.update,
            Operation::Delete => &self.delete,
        }
    }

    pub fn count(&self, operation: Operation, outcome: Outcome) -> u64 {
        self.counter(operation).get(outcome)
    }

    pub fn total(&self, outcome: Outcome) -> u64 {
        self.total.get(outcome)
    }
}

impl Observer for OutcomeCounters {
    fn observe(&self, event: OutcomeEvent) {
        self.counter(event.operation).record(event.outcome);
        self.total.record(event.outcome);
    }
}
