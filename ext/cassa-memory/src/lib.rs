//! In-memory executor for cassa-core
//!
//! This crate runs compiled statements against tables held in process
//! memory. It interprets the structured [`cassa_core::Command`] carried by
//! every statement rather than parsing query text.
//!
//! # Overview
//!
//! - [`MemoryExecutor`] implements [`cassa_core::QueryExecutor`]
//!   - Tables come into being through executed `CREATE TABLE` statements
//!   - Inserts write every listed column; updates touch only the columns
//!     they assign
//!   - Selects enforce `ALLOW FILTERING`, clustering order and `LIMIT`
//!   - Batches apply all statements or none
//!   - Cancelled or expired contexts fail before the store is touched
//!
//! - [`MemoryCursor`] type-checks every value against the destination column
//!   before handing it to the scanner
//!
//! Store failures surface as [`cassa_core::CassaError::Execution`] wrapping
//! a [`MemoryError`].

pub mod cursor;
pub mod error;
pub mod executor;
mod store;

pub use cursor::MemoryCursor;
pub use error::{MemoryError, Result};
pub use executor::MemoryExecutor;
