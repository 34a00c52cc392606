//! Tables addressed by one key field (`MapTable`) or by a partition field
//! plus an id (`MultimapTable`)

use crate::{
    eq, gte, in_list, ColumnValue, KeySpace, Keys, Op, Options, Record, Result, Statement, Table,
    Updates,
};

/// Records keyed by a single partition field
pub struct MapTable<R> {
    table: Table<R>,
    partition_field: String,
}

impl<R> Clone for MapTable<R> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            partition_field: self.partition_field.clone(),
        }
    }
}

impl<R: Record> MapTable<R> {
    pub(crate) fn new(key_space: &KeySpace, prefix: &str, partition_field: &str) -> Result<Self> {
        let name = format!("{}_map_{}", prefix, partition_field.to_lowercase());
        let table = Table::new(
            key_space.connection(),
            key_space.name(),
            &name,
            Keys::partition([partition_field]),
        )?;
        Ok(Self {
            table,
            partition_field: partition_field.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn table(&self) -> &Table<R> {
        &self.table
    }

    pub fn with_options(&self, options: Options) -> Self {
        Self {
            table: self.table.with_options(options),
            partition_field: self.partition_field.clone(),
        }
    }

    pub fn set(&self, record: &R) -> Op<'static> {
        self.table.set(record)
    }

    pub fn update<K: ColumnValue>(&self, id: K, updates: Updates) -> Op<'static> {
        self.table
            .filter(vec![eq(&self.partition_field, id)])
            .update(updates)
    }

    pub fn delete<K: ColumnValue>(&self, id: K) -> Op<'static> {
        self.table.filter(vec![eq(&self.partition_field, id)]).delete()
    }

    pub fn read<'a, K: ColumnValue>(&self, id: K, out: &'a mut R) -> Op<'a> {
        self.table
            .filter(vec![eq(&self.partition_field, id)])
            .read_one(out)
    }

    pub fn multi_read<'a, K: ColumnValue>(&self, ids: &[K], out: &'a mut Vec<R>) -> Op<'a> {
        self.table
            .filter(vec![in_list(&self.partition_field, ids)])
            .read(out)
    }

    /// Remove `keys` from map column `field` of one record
    pub fn delete_keys_from_map<K: ColumnValue, M: ColumnValue>(
        &self,
        id: K,
        field: &str,
        keys: &[M],
    ) -> Op<'static> {
        self.table
            .filter(vec![eq(&self.partition_field, id)])
            .delete_map_keys(field, keys.iter().map(ColumnValue::to_cql).collect())
    }

    pub fn create_statement(&self) -> Result<Statement> {
        self.table.create_statement()
    }

    pub fn create(&self) -> Result<()> {
        self.table.create()
    }

    pub fn create_if_not_exists(&self) -> Result<()> {
        self.table.create_if_not_exists()
    }
}

/// Records grouped under a partition field and ordered by an id field
pub struct MultimapTable<R> {
    table: Table<R>,
    partition_field: String,
    id_field: String,
}

impl<R> Clone for MultimapTable<R> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            partition_field: self.partition_field.clone(),
            id_field: self.id_field.clone(),
        }
    }
}

impl<R: Record> MultimapTable<R> {
    pub(crate) fn new(
        key_space: &KeySpace,
        prefix: &str,
        partition_field: &str,
        id_field: &str,
    ) -> Result<Self> {
        let name = format!(
            "{}_multimap_{}_{}",
            prefix,
            partition_field.to_lowercase(),
            id_field.to_lowercase()
        );
        let table = Table::new(
            key_space.connection(),
            key_space.name(),
            &name,
            Keys::partition([partition_field]).with_clustering([id_field]),
        )?;
        Ok(Self {
            table,
            partition_field: partition_field.to_string(),
            id_field: id_field.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn table(&self) -> &Table<R> {
        &self.table
    }

    pub fn with_options(&self, options: Options) -> Self {
        Self {
            table: self.table.with_options(options),
            ..self.clone()
        }
    }

    pub fn set(&self, record: &R) -> Op<'static> {
        self.table.set(record)
    }

    pub fn update<F: ColumnValue, I: ColumnValue>(
        &self,
        field: F,
        id: I,
        updates: Updates,
    ) -> Op<'static> {
        self.table
            .filter(vec![eq(&self.partition_field, field), eq(&self.id_field, id)])
            .update(updates)
    }

    pub fn delete<F: ColumnValue, I: ColumnValue>(&self, field: F, id: I) -> Op<'static> {
        self.table
            .filter(vec![eq(&self.partition_field, field), eq(&self.id_field, id)])
            .delete()
    }

    /// Delete every record of one partition
    pub fn delete_all<F: ColumnValue>(&self, field: F) -> Op<'static> {
        self.table.filter(vec![eq(&self.partition_field, field)]).delete()
    }

    pub fn read<'a, F: ColumnValue, I: ColumnValue>(
        &self,
        field: F,
        id: I,
        out: &'a mut R,
    ) -> Op<'a> {
        self.table
            .filter(vec![eq(&self.partition_field, field), eq(&self.id_field, id)])
            .read_one(out)
    }

    pub fn multi_read<'a, F: ColumnValue, I: ColumnValue>(
        &self,
        field: F,
        ids: &[I],
        out: &'a mut Vec<R>,
    ) -> Op<'a> {
        self.table
            .filter(vec![eq(&self.partition_field, field), in_list(&self.id_field, ids)])
            .read(out)
    }

    /// Records of one partition in id order, starting at `start` when given.
    /// A `limit` of zero reads the whole partition.
    pub fn list<'a, F: ColumnValue, I: ColumnValue>(
        &self,
        field: F,
        start: Option<I>,
        limit: usize,
        out: &'a mut Vec<R>,
    ) -> Op<'a> {
        let mut relations = vec![eq(&self.partition_field, field)];
        if let Some(start) = start {
            relations.push(gte(&self.id_field, start));
        }
        let op = self.table.filter(relations).read(out);
        if limit > 0 {
            op.with_options(Options::new().with_limit(limit))
        } else {
            op
        }
    }

    pub fn delete_keys_from_map<F: ColumnValue, I: ColumnValue, M: ColumnValue>(
        &self,
        field: F,
        id: I,
        map_field: &str,
        keys: &[M],
    ) -> Op<'static> {
        self.table
            .filter(vec![eq(&self.partition_field, field), eq(&self.id_field, id)])
            .delete_map_keys(map_field, keys.iter().map(ColumnValue::to_cql).collect())
    }

    pub fn create_statement(&self) -> Result<Statement> {
        self.table.create_statement()
    }

    pub fn create(&self) -> Result<()> {
        self.table.create()
    }

    pub fn create_if_not_exists(&self) -> Result<()> {
        self.table.create_if_not_exists()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::test::{Customer, Customer2, RecordingExecutor};
    use crate::Connection;
    use std::sync::Arc;

    #[test]
    fn test_map_table_statements() {
        let executor = Arc::new(RecordingExecutor::default());
        let tbl = Connection::new(executor.clone())
            .key_space("ks")
            .map_table::<Customer>("customer83", "Id")
            .unwrap();

        let mut out = Vec::new();
        let ids = ["33".to_string(), "34".to_string()];
        let stmts = tbl.multi_read(&ids, &mut out).generate_statements().unwrap();
        assert_eq!(
            stmts[0].query(),
            "SELECT id, name FROM ks.customer83_map_id WHERE id IN (?, ?)"
        );

        let stmts = tbl.delete("33".to_string()).generate_statements().unwrap();
        assert_eq!(stmts[0].query(), "DELETE FROM ks.customer83_map_id WHERE id = ?");
    }

    #[test]
    fn test_multimap_list() {
        let executor = Arc::new(RecordingExecutor::default());
        let tbl = Connection::new(executor.clone())
            .key_space("ks")
            .multimap_table::<Customer2>("customer", "Name", "Id")
            .unwrap();

        let create = tbl.create_statement().unwrap();
        assert!(create.query().contains("PRIMARY KEY ((name), id)"));

        let mut out = Vec::new();
        let stmts = tbl
            .list("Joe".to_string(), Some("10".to_string()), 5, &mut out)
            .generate_statements()
            .unwrap();
        assert_eq!(
            stmts[0].query(),
            "SELECT id, name, tag FROM ks.customer_multimap_name_id \
             WHERE name = ? AND id >= ? LIMIT 5"
        );

        let mut out = Vec::new();
        let stmts = tbl
            .list("Joe".to_string(), None::<String>, 0, &mut out)
            .generate_statements()
            .unwrap();
        assert!(!stmts[0].query().contains("LIMIT"));
    }

    #[test]
    fn test_multimap_delete_all() {
        let executor = Arc::new(RecordingExecutor::default());
        let tbl = Connection::new(executor.clone())
            .key_space("ks")
            .multimap_table::<Customer2>("customer", "Name", "Id")
            .unwrap();
        tbl.delete_all("Joe".to_string()).run().unwrap();
        assert_eq!(
            executor.executed()[0].query(),
            "DELETE FROM ks.customer_multimap_name_id WHERE name = ?"
        );
    }
}
