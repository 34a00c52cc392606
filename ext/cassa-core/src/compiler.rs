//! Statement compiler
//!
//! Turns a [`TableDescriptor`], caller [`Options`] and record values or
//! relations into [`Statement`]s. Every function is pure: options are read,
//! never modified, and each call builds a fresh statement.
//!
//! Unknown field names anywhere (keys, relations, projections, update
//! targets) fail with [`CassaError::Configuration`].

use crate::statement::{Assignment, AssignmentOp, Command, Predicate};
use crate::{
    CassaError, ClusteringOrderColumn, ColumnType, Comparator, CqlValue, FieldDescriptor, Keys,
    Modifier, Options, Record, Relation, Result, Statement, TableDescriptor, Updates,
};
use itertools::Itertools;

/// `CREATE TABLE` for every column of the descriptor's record
pub fn create_table(desc: &TableDescriptor, options: &Options) -> Result<Statement> {
    create(desc, options, false)
}

/// `CREATE TABLE IF NOT EXISTS`
pub fn create_table_if_not_exists(desc: &TableDescriptor, options: &Options) -> Result<Statement> {
    create(desc, options, true)
}

fn create(desc: &TableDescriptor, options: &Options, if_not_exists: bool) -> Result<Statement> {
    let table = desc.qualified_name(options);
    let columns: Vec<(String, ColumnType)> = desc
        .fields()
        .iter()
        .map(|f| (f.name.clone(), f.column_type.clone()))
        .collect();

    let clustering_order = options
        .clustering_order
        .iter()
        .map(|o| {
            let field = desc.fields().resolve(&o.column)?;
            if !desc.clustering_columns().contains(&field.name) {
                return Err(CassaError::configuration(format!(
                    "clustering order names '{}', which is not a clustering column of '{}'",
                    field.name,
                    desc.name()
                )));
            }
            Ok(ClusteringOrderColumn {
                column: field.name.clone(),
                direction: o.direction,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut query = format!(
        "CREATE TABLE {}{} ({}, {})",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        table,
        columns
            .iter()
            .map(|(name, ty)| format!("{} {}", name, ty))
            .join(", "),
        primary_key(desc.keys()),
    );

    let mut with = Vec::new();
    if !clustering_order.is_empty() {
        with.push(format!(
            "CLUSTERING ORDER BY ({})",
            clustering_order
                .iter()
                .map(|o| format!("{} {}", o.column, o.direction))
                .join(", ")
        ));
    }
    if options.compact_storage {
        with.push("COMPACT STORAGE".to_string());
    }
    if !with.is_empty() {
        query.push_str(" WITH ");
        query.push_str(&with.join(" AND "));
    }

    let field_names = columns.iter().map(|(name, _)| name.clone()).collect();
    Statement::new(
        query,
        Vec::new(),
        field_names,
        Command::CreateTable {
            table,
            if_not_exists,
            columns,
            partition_keys: desc.partition_keys().to_vec(),
            clustering_columns: desc.clustering_columns().to_vec(),
            clustering_order,
        },
    )
}

/// Primary key clause.
///
/// With clustering columns the partition keys are always grouped and the
/// compound flag is ignored.
fn primary_key(keys: &Keys) -> String {
    let partition = keys.partition_keys.join(", ");
    if !keys.clustering_columns.is_empty() {
        format!(
            "PRIMARY KEY (({}), {})",
            partition,
            keys.clustering_columns.join(", ")
        )
    } else if keys.compound {
        format!("PRIMARY KEY ({})", partition)
    } else {
        format!("PRIMARY KEY (({}))", partition)
    }
}

/// Write a record.
///
/// When every non-key field is nullable and empty the record is written as a
/// full `INSERT`. Otherwise it becomes an `UPDATE` of the non-key columns
/// that hold a value, keyed by the primary key, so columns the record leaves
/// empty keep whatever the store already has. Required fields are always
/// written, even at their zero value.
pub fn insert<R: Record>(desc: &TableDescriptor, options: &Options, record: &R) -> Result<Statement> {
    write_values(desc, options, record.values())
}

/// Same write shaping as [`insert`]; writes to the store are upserts either
/// way.
pub fn upsert<R: Record>(desc: &TableDescriptor, options: &Options, record: &R) -> Result<Statement> {
    insert(desc, options, record)
}

/// [`insert`] over values already extracted from a record, in field order
pub fn write_values(
    desc: &TableDescriptor,
    options: &Options,
    values: Vec<CqlValue>,
) -> Result<Statement> {
    let fields = desc.fields();
    if values.len() != fields.len() {
        return Err(CassaError::internal(format!(
            "{} values supplied for {} columns of {}",
            values.len(),
            fields.len(),
            fields.type_name()
        )));
    }

    let is_unset = |f: &FieldDescriptor| f.kind.is_nullable() && values[f.index].is_empty();
    let non_key: Vec<&FieldDescriptor> = fields.iter().filter(|f| !desc.is_key(&f.name)).collect();

    if non_key.iter().all(|f| is_unset(*f)) {
        return insert_row(desc, options, values);
    }

    let table = desc.qualified_name(options);
    let set: Vec<&FieldDescriptor> = non_key.into_iter().filter(|f| !is_unset(*f)).collect();
    let keys: Vec<&FieldDescriptor> = desc.key_columns().collect();

    let query = format!(
        "UPDATE {} SET {} WHERE {}",
        table,
        set.iter().map(|f| format!("{} = ?", f.name)).join(", "),
        keys.iter().map(|f| format!("{} = ?", f.name)).join(" AND "),
    );

    let mut bound = Vec::with_capacity(set.len() + keys.len());
    let mut field_names = Vec::with_capacity(set.len() + keys.len());
    for f in set.iter().chain(keys.iter()) {
        bound.push(values[f.index].clone());
        field_names.push(f.name.clone());
    }

    Statement::new(
        query,
        bound,
        field_names,
        Command::Update {
            table,
            assignments: set
                .iter()
                .map(|f| Assignment {
                    column: f.name.clone(),
                    op: AssignmentOp::Set,
                })
                .collect(),
            predicates: keys
                .iter()
                .map(|f| Predicate {
                    column: f.name.clone(),
                    comparator: Comparator::Eq,
                    arity: 1,
                })
                .collect(),
        },
    )
}

fn insert_row(desc: &TableDescriptor, options: &Options, values: Vec<CqlValue>) -> Result<Statement> {
    let table = desc.qualified_name(options);
    let columns = desc.fields().names();
    let query = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        std::iter::repeat("?").take(columns.len()).join(", ")
    );
    Statement::new(
        query,
        values,
        columns.clone(),
        Command::Insert { table, columns },
    )
}

/// `UPDATE ... SET <modifiers> WHERE <relations>`
pub fn update(
    desc: &TableDescriptor,
    options: &Options,
    relations: &[Relation],
    updates: &Updates,
) -> Result<Statement> {
    if updates.is_empty() {
        return Err(CassaError::configuration(format!(
            "update of '{}' has nothing to set",
            desc.name()
        )));
    }

    let table = desc.qualified_name(options);
    let mut values = Vec::new();
    let mut fragments = Vec::with_capacity(updates.len());
    let mut assignments = Vec::with_capacity(updates.len());
    let mut field_names = Vec::with_capacity(updates.len());

    for (name, modifier) in updates {
        let field = desc.fields().resolve(name)?;
        if desc.is_key(&field.name) {
            return Err(CassaError::configuration(format!(
                "primary key column '{}' cannot be updated",
                field.name
            )));
        }
        check_modifier(field, modifier)?;

        let column = &field.name;
        let fragment = match modifier {
            Modifier::Set(v) => {
                values.push(v.clone());
                format!("{} = ?", column)
            }
            Modifier::ListAppend(v) | Modifier::MapSetFields(v) => {
                values.push(v.clone());
                format!("{0} = {0} + ?", column)
            }
            Modifier::ListPrepend(v) => {
                values.push(v.clone());
                format!("{0} = ? + {0}", column)
            }
            Modifier::ListRemove(v) => {
                values.push(v.clone());
                format!("{0} = {0} - ?", column)
            }
            Modifier::MapSetField(k, v) => {
                values.push(k.clone());
                values.push(v.clone());
                format!("{}[?] = ?", column)
            }
        };
        fragments.push(fragment);
        assignments.push(Assignment {
            column: column.clone(),
            op: modifier.op(),
        });
        field_names.push(column.clone());
    }

    let (clause, predicates) = where_clause(desc, relations, &mut values)?;
    if predicates.is_empty() {
        return Err(CassaError::configuration(format!(
            "update of '{}' needs a WHERE clause",
            desc.name()
        )));
    }

    Statement::new(
        format!("UPDATE {} SET {}{}", table, fragments.join(", "), clause),
        values,
        field_names,
        Command::Update {
            table,
            assignments,
            predicates,
        },
    )
}

fn check_modifier(field: &FieldDescriptor, modifier: &Modifier) -> Result<()> {
    let ok = match (modifier, &field.column_type) {
        (Modifier::Set(v), ty) => ty.accepts(v),
        (Modifier::ListAppend(v), ty @ ColumnType::List(_))
        | (Modifier::ListPrepend(v), ty @ ColumnType::List(_))
        | (Modifier::ListRemove(v), ty @ ColumnType::List(_))
        | (Modifier::MapSetFields(v), ty @ ColumnType::Map(_, _)) => ty.accepts(v),
        (Modifier::MapSetField(k, v), ColumnType::Map(key, value)) => {
            !k.is_null() && key.accepts(k) && value.accepts(v)
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(CassaError::configuration(format!(
            "{:?} does not fit column '{}' of type {}",
            modifier.op(),
            field.name,
            field.column_type
        )))
    }
}

/// `SELECT <projection> FROM <table> [WHERE ...] [LIMIT n] [ALLOW FILTERING]`
///
/// An empty projection selects every record column. The projection order is
/// kept so decoding can pair values with columns positionally.
pub fn select(
    desc: &TableDescriptor,
    options: &Options,
    relations: &[Relation],
    projection: &[String],
) -> Result<Statement> {
    let table = desc.qualified_name(options);
    let columns: Vec<String> = if projection.is_empty() {
        desc.fields().names()
    } else {
        projection
            .iter()
            .map(|name| desc.fields().resolve(name).map(|f| f.name.clone()))
            .collect::<Result<_>>()?
    };

    let mut values = Vec::new();
    let (clause, predicates) = where_clause(desc, relations, &mut values)?;

    let mut query = format!("SELECT {} FROM {}{}", columns.join(", "), table, clause);
    if let Some(limit) = options.limit {
        if limit == 0 {
            return Err(CassaError::configuration("limit must be greater than zero"));
        }
        query.push_str(&format!(" LIMIT {}", limit));
    }
    if options.allow_filtering {
        query.push_str(" ALLOW FILTERING");
    }

    Statement::new(
        query,
        values,
        columns.clone(),
        Command::Select {
            table,
            columns,
            predicates,
            limit: options.limit,
            allow_filtering: options.allow_filtering,
        },
    )
}

/// `DELETE FROM <table> WHERE <relations>`
pub fn delete(desc: &TableDescriptor, options: &Options, relations: &[Relation]) -> Result<Statement> {
    let table = desc.qualified_name(options);
    let mut values = Vec::new();
    let (clause, predicates) = where_clause(desc, relations, &mut values)?;
    if predicates.is_empty() {
        return Err(CassaError::configuration(format!(
            "delete from '{}' needs a WHERE clause",
            desc.name()
        )));
    }

    Statement::new(
        format!("DELETE FROM {}{}", table, clause),
        values,
        Vec::new(),
        Command::Delete { table, predicates },
    )
}

/// `DELETE m[?], m[?] FROM <table> WHERE <relations>`: drop entries of a map
/// column without rewriting the rest of it
pub fn delete_map_keys(
    desc: &TableDescriptor,
    options: &Options,
    relations: &[Relation],
    map_field: &str,
    keys: &[CqlValue],
) -> Result<Statement> {
    let field = desc.fields().resolve(map_field)?;
    let key_type = match &field.column_type {
        ColumnType::Map(key, _) => key,
        other => {
            return Err(CassaError::configuration(format!(
                "column '{}' is {}, not a map",
                field.name, other
            )))
        }
    };
    if keys.is_empty() {
        return Err(CassaError::configuration(format!(
            "no keys given to delete from '{}'",
            field.name
        )));
    }
    if let Some(bad) = keys.iter().find(|k| k.is_null() || !key_type.accepts(k)) {
        return Err(CassaError::configuration(format!(
            "{} is not a valid key for '{}' ({})",
            bad.type_name(),
            field.name,
            field.column_type
        )));
    }

    let table = desc.qualified_name(options);
    let mut values = keys.to_vec();
    let (clause, predicates) = where_clause(desc, relations, &mut values)?;
    if predicates.is_empty() {
        return Err(CassaError::configuration(format!(
            "delete from '{}' needs a WHERE clause",
            desc.name()
        )));
    }

    let targets = std::iter::repeat(format!("{}[?]", field.name))
        .take(keys.len())
        .join(", ");
    Statement::new(
        format!("DELETE {} FROM {}{}", targets, table, clause),
        values,
        vec![field.name.clone()],
        Command::DeleteMapKeys {
            table,
            column: field.name.clone(),
            key_count: keys.len(),
            predicates,
        },
    )
}

/// Render relations as ` WHERE a = ? AND b IN (?, ?)`, appending their terms
/// to `values`. No relations renders nothing.
fn where_clause(
    desc: &TableDescriptor,
    relations: &[Relation],
    values: &mut Vec<CqlValue>,
) -> Result<(String, Vec<Predicate>)> {
    if relations.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let mut terms = Vec::with_capacity(relations.len());
    let mut predicates = Vec::with_capacity(relations.len());
    for relation in relations {
        let field = desc.fields().resolve(relation.field())?;
        let arity = relation.terms().len();
        match relation.comparator() {
            Comparator::In if arity == 0 => {
                return Err(CassaError::configuration(format!(
                    "IN relation on '{}' has no values",
                    field.name
                )))
            }
            Comparator::In => terms.push(format!(
                "{} IN ({})",
                field.name,
                std::iter::repeat("?").take(arity).join(", ")
            )),
            other if arity == 1 => terms.push(format!("{} {} ?", field.name, other.symbol())),
            other => {
                return Err(CassaError::configuration(format!(
                    "'{}' relation on '{}' takes one value, got {}",
                    other.symbol(),
                    field.name,
                    arity
                )))
            }
        }
        values.extend(relation.terms().iter().cloned());
        predicates.push(Predicate {
            column: field.name.clone(),
            comparator: relation.comparator(),
            arity,
        });
    }

    Ok((format!(" WHERE {}", terms.join(" AND ")), predicates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test::{Customer, Customer2, UserBasic, UserWithName, UserWithPhone};
    use crate::{eq, gte, in_list, Direction};
    use bytes::Bytes;

    fn table<R: Record>(ks: &str, name: &str, keys: Keys) -> TableDescriptor {
        TableDescriptor::new::<R>(ks, name, keys).unwrap()
    }

    #[test]
    fn test_composite_partition_key() {
        let desc = table::<Customer>("ks", "composite_keys", Keys::partition(["Id", "Name"]));
        let stmt = create_table(&desc, &Options::default()).unwrap();
        assert_eq!(
            stmt.query(),
            "CREATE TABLE ks.composite_keys (id text, name text, PRIMARY KEY ((id, name)))"
        );
    }

    #[test]
    fn test_compound_partition_key() {
        let desc = table::<Customer>(
            "ks",
            "compound_keys",
            Keys::partition(["Id", "Name"]).compound(),
        );
        let stmt = create_table(&desc, &Options::default()).unwrap();
        assert!(stmt.query().contains("PRIMARY KEY (id, name)"));
    }

    #[test]
    fn test_clustering_ignores_compound() {
        for keys in [
            Keys::partition(["Id"]).with_clustering(["Name"]),
            Keys::partition(["Id"]).with_clustering(["Name"]).compound(),
        ] {
            let desc = table::<Customer>("ks", "clustering_keys", keys);
            let stmt = create_table(&desc, &Options::default()).unwrap();
            assert!(stmt.query().contains("PRIMARY KEY ((id), name)"), "{}", stmt);
        }
    }

    #[test]
    fn test_clustering_order_only_when_given() {
        let desc = table::<Customer2>(
            "ks",
            "customer_by_name2",
            Keys::partition(["Name"]).with_clustering(["Tag", "Id"]),
        );
        let plain = create_table(&desc, &Options::default()).unwrap();
        assert!(!plain.query().contains("WITH"));

        let opts = Options::default()
            .append_clustering_order("Tag", Direction::Desc)
            .append_clustering_order("Id", Direction::Desc);
        let ordered = create_table(&desc, &opts).unwrap();
        assert!(ordered
            .query()
            .ends_with(" WITH CLUSTERING ORDER BY (tag DESC, id DESC)"));
    }

    #[test]
    fn test_clustering_order_on_partition_key_rejected() {
        let desc = table::<Customer>("ks", "c", Keys::partition(["Id"]));
        let opts = Options::default().append_clustering_order("Id", Direction::Asc);
        let err = create_table(&desc, &opts).unwrap_err();
        assert!(matches!(err, CassaError::Configuration(_)));
    }

    #[test]
    fn test_create_with_compact_storage_and_table_override() {
        let desc = table::<Customer>("ks", "something", Keys::partition(["Id"]).with_clustering(["Name"]));
        let opts = Options::default()
            .with_table_name("funky")
            .with_compact_storage()
            .append_clustering_order("Name", Direction::Asc);
        let stmt = create_table_if_not_exists(&desc, &opts).unwrap();
        assert!(stmt.query().starts_with("CREATE TABLE IF NOT EXISTS ks.funky ("));
        assert!(stmt
            .query()
            .ends_with("WITH CLUSTERING ORDER BY (name ASC) AND COMPACT STORAGE"));
    }

    #[test]
    fn test_insert_when_nullable_fields_empty() {
        let desc = table::<UserBasic>("", "t", Keys::partition(["Id"]));
        let user = UserBasic {
            id: "100".to_string(),
            metadata: Bytes::new(),
        };
        let stmt = insert(&desc, &Options::default(), &user).unwrap();
        assert_eq!(stmt.query(), "INSERT INTO t (id, metadata) VALUES (?, ?)");
        assert_eq!(stmt.values().len(), 2);
        assert_eq!(stmt.field_names(), &["id", "metadata"]);
    }

    #[test]
    fn test_update_when_nullable_field_set() {
        let desc = table::<UserBasic>("", "t", Keys::partition(["Id"]));
        let user = UserBasic {
            id: "100".to_string(),
            metadata: Bytes::from_static(&[0x02]),
        };
        let stmt = upsert(&desc, &Options::default(), &user).unwrap();
        assert_eq!(stmt.query(), "UPDATE t SET metadata = ? WHERE id = ?");
        assert_eq!(
            stmt.values(),
            &[
                CqlValue::Blob(Bytes::from_static(&[0x02])),
                CqlValue::text("100")
            ]
        );
    }

    #[test]
    fn test_optional_field_counts_as_nullable() {
        let desc = table::<UserWithPhone>("user", "user", Keys::partition(["Id"]));
        let opts = Options::default().with_table_name("user_by_id");

        let unset = UserWithPhone {
            id: "100".to_string(),
            ..Default::default()
        };
        let stmt = insert(&desc, &opts, &unset).unwrap();
        assert_eq!(
            stmt.query(),
            "INSERT INTO user.user_by_id (id, phone_number, metadata) VALUES (?, ?, ?)"
        );

        let with_phone = UserWithPhone {
            id: "100".to_string(),
            phone_number: Some("01189998819991197253".to_string()),
            ..Default::default()
        };
        let stmt = insert(&desc, &opts, &with_phone).unwrap();
        assert_eq!(
            stmt.query(),
            "UPDATE user.user_by_id SET phone_number = ? WHERE id = ?"
        );
    }

    #[test]
    fn test_update_keyed_by_partition_and_clustering() {
        let desc = table::<UserWithName>(
            "user",
            "user",
            Keys::partition(["Id"]).with_clustering(["Name"]),
        );
        let opts = Options::default().with_table_name("user_by_id");

        let moss = UserWithName {
            id: "100".to_string(),
            name: "Moss".to_string(),
            ..Default::default()
        };
        let stmt = insert(&desc, &opts, &moss).unwrap();
        assert_eq!(
            stmt.query(),
            "INSERT INTO user.user_by_id (id, name, metadata, status) VALUES (?, ?, ?, ?)"
        );

        let with_status = UserWithName {
            status: [("foo".to_string(), "bar".to_string())].into_iter().collect(),
            ..moss
        };
        let stmt = insert(&desc, &opts, &with_status).unwrap();
        assert_eq!(
            stmt.query(),
            "UPDATE user.user_by_id SET status = ? WHERE id = ? AND name = ?"
        );
        assert_eq!(stmt.values()[1], CqlValue::text("100"));
        assert_eq!(stmt.values()[2], CqlValue::text("Moss"));
    }

    #[test]
    fn test_required_fields_always_written() {
        // name is a plain string, so even "" is written
        let desc = table::<Customer>("ks", "customer", Keys::partition(["Id"]));
        let c = Customer {
            id: "1".to_string(),
            name: String::new(),
        };
        let stmt = insert(&desc, &Options::default(), &c).unwrap();
        assert_eq!(stmt.query(), "UPDATE ks.customer SET name = ? WHERE id = ?");
        assert_eq!(stmt.values()[0], CqlValue::text(""));
    }

    #[test]
    fn test_all_key_record_inserts() {
        let desc = table::<Customer>("ks", "customer", Keys::partition(["Id", "Name"]));
        let c = Customer {
            id: "1001".to_string(),
            name: "Joe".to_string(),
        };
        let stmt = insert(&desc, &Options::default(), &c).unwrap();
        assert_eq!(stmt.query(), "INSERT INTO ks.customer (id, name) VALUES (?, ?)");
    }

    #[test]
    fn test_select_projection_and_filtering() {
        let desc = table::<Customer2>(
            "ks",
            "allow_filtering",
            Keys::partition(["Name"]).with_clustering(["Tag", "Id"]),
        );
        let stmt = select(&desc, &Options::default(), &[eq("Name", "Brian".to_string())], &[]).unwrap();
        assert_eq!(
            stmt.query(),
            "SELECT id, name, tag FROM ks.allow_filtering WHERE name = ?"
        );
        assert!(!stmt.query().contains("ALLOW FILTERING"));

        let opts = Options::default().with_allow_filtering();
        let projection = vec!["Tag".to_string(), "ID".to_string()];
        let stmt = select(&desc, &opts, &[eq("tag", "A".to_string())], &projection).unwrap();
        assert_eq!(
            stmt.query(),
            "SELECT tag, id FROM ks.allow_filtering WHERE tag = ? ALLOW FILTERING"
        );
        assert_eq!(stmt.field_names(), &["tag", "id"]);
    }

    #[test]
    fn test_select_in_and_range_with_limit() {
        let desc = table::<Customer2>(
            "ks",
            "c2",
            Keys::partition(["Name"]).with_clustering(["Id"]),
        );
        let opts = Options::default().with_limit(5);
        let ids = ["1".to_string(), "2".to_string()];
        let stmt = select(
            &desc,
            &opts,
            &[in_list("name", &ids), gte("id", "1000".to_string())],
            &[],
        )
        .unwrap();
        assert_eq!(
            stmt.query(),
            "SELECT id, name, tag FROM ks.c2 WHERE name IN (?, ?) AND id >= ? LIMIT 5"
        );
        assert_eq!(stmt.values().len(), 3);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let desc = table::<Customer>("ks", "customer", Keys::partition(["Id"]));
        let opts = Options::default();

        let err = select(&desc, &opts, &[eq("", "".to_string())], &[]).unwrap_err();
        assert!(matches!(err, CassaError::Configuration(_)));

        let err = select(&desc, &opts, &[], &["email".to_string()]).unwrap_err();
        assert!(err.to_string().contains("email"));

        let err = delete(&desc, &opts, &[eq("email", "x".to_string())]).unwrap_err();
        assert!(matches!(err, CassaError::Configuration(_)));
    }

    #[test]
    fn test_delete() {
        let desc = table::<Customer>("ks", "customer", Keys::partition(["Id"]));
        let stmt = delete(&desc, &Options::default(), &[eq("Id", "33".to_string())]).unwrap();
        assert_eq!(stmt.query(), "DELETE FROM ks.customer WHERE id = ?");
        assert!(delete(&desc, &Options::default(), &[]).is_err());
    }

    #[test]
    fn test_delete_map_keys() {
        let desc = table::<UserWithName>("ks", "map_testing", Keys::partition(["Id"]));
        let stmt = delete_map_keys(
            &desc,
            &Options::default(),
            &[eq("Id", "1".to_string())],
            "Status",
            &[CqlValue::text("A"), CqlValue::text("B")],
        )
        .unwrap();
        assert_eq!(
            stmt.query(),
            "DELETE status[?], status[?] FROM ks.map_testing WHERE id = ?"
        );
        assert_eq!(
            stmt.values(),
            &[CqlValue::text("A"), CqlValue::text("B"), CqlValue::text("1")]
        );

        let err = delete_map_keys(
            &desc,
            &Options::default(),
            &[eq("Id", "1".to_string())],
            "Name",
            &[CqlValue::text("A")],
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a map"));
    }

    #[test]
    fn test_update_modifiers() {
        let desc = table::<UserWithName>("ks", "users", Keys::partition(["Id"]));
        let mut updates = Updates::new();
        updates.insert("Name".to_string(), Modifier::set("John".to_string()));
        updates.insert(
            "status".to_string(),
            Modifier::map_set_field("k".to_string(), "v".to_string()),
        );
        let stmt = update(&desc, &Options::default(), &[eq("id", "1".to_string())], &updates).unwrap();
        assert_eq!(
            stmt.query(),
            "UPDATE ks.users SET name = ?, status[?] = ? WHERE id = ?"
        );
        assert_eq!(stmt.values().len(), 4);
    }

    #[test]
    fn test_update_rejects_keys_and_type_mismatch() {
        let desc = table::<UserWithName>("ks", "users", Keys::partition(["Id"]));
        let where_id = [eq("id", "1".to_string())];

        let keyed: Updates = [("id".to_string(), Modifier::set("2".to_string()))]
            .into_iter()
            .collect();
        assert!(update(&desc, &Options::default(), &where_id, &keyed).is_err());

        let wrong: Updates = [("name".to_string(), Modifier::set(5i32))].into_iter().collect();
        let err = update(&desc, &Options::default(), &where_id, &wrong).unwrap_err();
        assert!(err.to_string().contains("does not fit column 'name'"));

        let list_op_on_map: Updates = [("status".to_string(), Modifier::list_append("x".to_string()))]
            .into_iter()
            .collect();
        assert!(update(&desc, &Options::default(), &where_id, &list_op_on_map).is_err());

        assert!(update(&desc, &Options::default(), &where_id, &Updates::new()).is_err());
    }
}
