//! Static table metadata: keys plus the record's field map

use crate::{CassaError, FieldDescriptor, FieldMap, Options, Record, Result};
use serde::{Deserialize, Serialize};

/// Primary key layout of a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keys {
    pub partition_keys: Vec<String>,
    pub clustering_columns: Vec<String>,
    /// Emit `PRIMARY KEY (a, b)` instead of `PRIMARY KEY ((a, b))` when there
    /// are no clustering columns
    pub compound: bool,
}

impl Keys {
    pub fn partition<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            partition_keys: keys.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_clustering<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.clustering_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn compound(mut self) -> Self {
        self.compound = true;
        self
    }
}

/// Everything the statement compiler needs to know about a table
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    key_space: String,
    name: String,
    keys: Keys,
    fields: FieldMap,
}

impl TableDescriptor {
    pub fn new<R: Record>(key_space: &str, name: &str, keys: Keys) -> Result<Self> {
        Self::with_fields(key_space, name, keys, FieldMap::of::<R>()?)
    }

    /// Validate `keys` against `fields` and canonicalise key names to their
    /// lower-cased column names
    pub fn with_fields(key_space: &str, name: &str, keys: Keys, fields: FieldMap) -> Result<Self> {
        if name.is_empty() {
            return Err(CassaError::configuration("table name must not be empty"));
        }
        if keys.partition_keys.is_empty() {
            return Err(CassaError::configuration(format!(
                "table '{}' needs at least one partition key",
                name
            )));
        }

        let resolve = |names: &[String]| -> Result<Vec<String>> {
            names
                .iter()
                .map(|n| fields.resolve(n).map(|f| f.name.clone()))
                .collect()
        };
        let partition_keys = resolve(&keys.partition_keys)?;
        let clustering_columns = resolve(&keys.clustering_columns)?;

        let mut seen = Vec::with_capacity(partition_keys.len() + clustering_columns.len());
        for key in partition_keys.iter().chain(clustering_columns.iter()) {
            if seen.contains(&key) {
                return Err(CassaError::configuration(format!(
                    "column '{}' appears more than once in the primary key of '{}'",
                    key, name
                )));
            }
            seen.push(key);
        }

        Ok(Self {
            key_space: key_space.to_string(),
            name: name.to_string(),
            keys: Keys {
                partition_keys,
                clustering_columns,
                compound: keys.compound,
            },
            fields,
        })
    }

    pub fn key_space(&self) -> &str {
        &self.key_space
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn partition_keys(&self) -> &[String] {
        &self.keys.partition_keys
    }

    pub fn clustering_columns(&self) -> &[String] {
        &self.keys.clustering_columns
    }

    /// Partition keys followed by clustering columns
    pub fn key_columns(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.keys
            .partition_keys
            .iter()
            .chain(self.keys.clustering_columns.iter())
            .filter_map(|k| self.fields.get(k))
    }

    pub fn is_key(&self, column: &str) -> bool {
        let column = column.to_lowercase();
        self.keys.partition_keys.contains(&column) || self.keys.clustering_columns.contains(&column)
    }

    /// `keyspace.table`, honouring a per-call table name override
    pub fn qualified_name(&self, options: &Options) -> String {
        let table = options.table_name.as_deref().unwrap_or(&self.name);
        if self.key_space.is_empty() {
            table.to_string()
        } else {
            format!("{}.{}", self.key_space, table)
        }
    }
}
