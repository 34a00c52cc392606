use crate::{CassaError, CqlValue, Record, Result};
use indexmap::IndexMap;
use std::fmt;

/// Column data types understood by the statement compiler
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    // Integer types
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Varint,

    // Floating point and decimal types
    Float,
    Double,
    Decimal,

    // Other basic types
    Boolean,
    Text,
    Blob,
    Uuid,
    Timestamp,

    // Collections
    List(Box<ColumnType>),
    Set(Box<ColumnType>),
    Map(Box<ColumnType>, Box<ColumnType>),
}

impl ColumnType {
    /// Whether a value may be stored in a column of this type. Null fits
    /// every column.
    pub fn accepts(&self, value: &CqlValue) -> bool {
        match (self, value) {
            (_, CqlValue::Null) => true,
            (ColumnType::TinyInt, CqlValue::TinyInt(_))
            | (ColumnType::SmallInt, CqlValue::SmallInt(_))
            | (ColumnType::Int, CqlValue::Int(_))
            | (ColumnType::BigInt, CqlValue::BigInt(_))
            | (ColumnType::Varint, CqlValue::Varint(_))
            | (ColumnType::Float, CqlValue::Float(_))
            | (ColumnType::Double, CqlValue::Double(_))
            | (ColumnType::Decimal, CqlValue::Decimal(_, _))
            | (ColumnType::Boolean, CqlValue::Boolean(_))
            | (ColumnType::Text, CqlValue::Text(_))
            | (ColumnType::Blob, CqlValue::Blob(_))
            | (ColumnType::Uuid, CqlValue::Uuid(_))
            | (ColumnType::Timestamp, CqlValue::Timestamp(_)) => true,
            (ColumnType::List(item), CqlValue::List(items))
            | (ColumnType::Set(item), CqlValue::Set(items)) => {
                items.iter().all(|v| !v.is_null() && item.accepts(v))
            }
            (ColumnType::Map(key, value), CqlValue::Map(entries)) => entries
                .iter()
                .all(|(k, v)| !k.is_null() && key.accepts(k) && value.accepts(v)),
            _ => false,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            ColumnType::List(_) | ColumnType::Set(_) | ColumnType::Map(_, _)
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::TinyInt => write!(f, "tinyint"),
            ColumnType::SmallInt => write!(f, "smallint"),
            ColumnType::Int => write!(f, "int"),
            ColumnType::BigInt => write!(f, "bigint"),
            ColumnType::Varint => write!(f, "varint"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Double => write!(f, "double"),
            ColumnType::Decimal => write!(f, "decimal"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Blob => write!(f, "blob"),
            ColumnType::Uuid => write!(f, "uuid"),
            ColumnType::Timestamp => write!(f, "timestamp"),
            ColumnType::List(item) => write!(f, "list<{}>", item),
            ColumnType::Set(item) => write!(f, "set<{}>", item),
            ColumnType::Map(key, value) => write!(f, "map<{}, {}>", key, value),
        }
    }
}

/// Shape of the Rust field backing a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Scalars and strings; always written
    Required,
    /// `Option<T>`
    Optional,
    /// Variable-length sequences: lists, sets, blobs
    Sequence,
    /// Maps
    Associative,
    /// `[T; N]`
    FixedArray(usize),
}

impl FieldKind {
    /// Nullable fields treat an empty value as "not set" when shaping writes
    pub fn is_nullable(&self) -> bool {
        match self {
            FieldKind::Optional | FieldKind::Sequence | FieldKind::Associative => true,
            FieldKind::FixedArray(len) => *len == 0,
            FieldKind::Required => false,
        }
    }
}

/// A column as declared by a [`Record`] implementation
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub kind: FieldKind,
}

impl Column {
    pub fn new<S: Into<String>>(name: S, column_type: ColumnType, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            column_type,
            kind,
        }
    }

    /// Describe a column from the static type of `_sample`
    pub fn sampled<T: crate::ColumnValue>(name: &str, _sample: &T) -> Self {
        Self::new(name, T::column_type(), T::kind())
    }
}

/// A resolved column: lower-cased name plus its position in the record
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub column_type: ColumnType,
    pub kind: FieldKind,
    pub index: usize,
}

/// Ordered, case-insensitive map from column name to field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap {
    type_name: &'static str,
    fields: IndexMap<String, FieldDescriptor>,
}

impl FieldMap {
    /// Build the field map of a record type
    pub fn of<R: Record>() -> Result<Self> {
        Self::from_columns(std::any::type_name::<R>(), R::columns())
    }

    pub fn from_columns(type_name: &'static str, columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(CassaError::configuration(format!(
                "{} declares no columns",
                type_name
            )));
        }

        let mut fields = IndexMap::with_capacity(columns.len());
        for (index, column) in columns.into_iter().enumerate() {
            let name = column.name.to_lowercase();
            if fields.contains_key(&name) {
                return Err(CassaError::configuration(format!(
                    "{} declares column '{}' more than once",
                    type_name, name
                )));
            }
            fields.insert(
                name.clone(),
                FieldDescriptor {
                    name,
                    column_type: column.column_type,
                    kind: column.kind,
                    index,
                },
            );
        }

        Ok(Self { type_name, fields })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Look up a field, ignoring case
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name.to_lowercase().as_str())
    }

    /// Look up a field or fail with a configuration error naming it
    pub fn resolve(&self, name: &str) -> Result<&FieldDescriptor> {
        self.get(name).ok_or_else(|| {
            CassaError::configuration(format!(
                "{} has no field named '{}'",
                self.type_name, name
            ))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
