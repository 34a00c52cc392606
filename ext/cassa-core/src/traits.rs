pub mod record;

pub use record::{ColumnValue, Record};
