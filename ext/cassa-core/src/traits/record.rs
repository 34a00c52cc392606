use crate::{CassaError, Column, ColumnType, CqlValue, Decimal, FieldKind, Result};
use bytes::Bytes;
use num::BigInt;
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

/// A row type with a declared column mapping.
///
/// Implementations list their columns once, in declaration order; `values`
/// and `set_value` use the same positions. The [`record!`](crate::record)
/// macro writes all three methods from a field list.
pub trait Record: Default {
    /// Declared columns, in declaration order
    fn columns() -> Vec<Column>;

    /// Current field values, positionally matching [`Record::columns`]
    fn values(&self) -> Vec<CqlValue>;

    /// Overwrite the field at `index` with a decoded value
    fn set_value(&mut self, index: usize, value: CqlValue) -> Result<()>;
}

/// Conversion between a Rust field type and a column value
pub trait ColumnValue: Sized {
    fn column_type() -> ColumnType;

    fn kind() -> FieldKind {
        FieldKind::Required
    }

    fn to_cql(&self) -> CqlValue;

    /// Decode a value read from a cursor. Null decodes to the type's empty
    /// or default value.
    fn from_cql(value: CqlValue) -> Result<Self>;
}

fn mismatch<T>(value: &CqlValue) -> CassaError {
    CassaError::decode(format!(
        "cannot decode {} into {}",
        value.type_name(),
        std::any::type_name::<T>()
    ))
}

/// Implement [`Record`] for a struct whose fields all implement
/// [`ColumnValue`]. Column names are the field names.
///
/// ```ignore
/// #[derive(Debug, Default)]
/// struct Customer {
///     id: String,
///     name: String,
/// }
///
/// cassa_core::record!(Customer { id, name });
/// ```
#[macro_export]
macro_rules! record {
    ($record:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::Record for $record {
            fn columns() -> ::std::vec::Vec<$crate::Column> {
                let sample = <$record as ::std::default::Default>::default();
                ::std::vec![
                    $($crate::Column::sampled(::std::stringify!($field), &sample.$field)),+
                ]
            }

            fn values(&self) -> ::std::vec::Vec<$crate::CqlValue> {
                ::std::vec![$($crate::ColumnValue::to_cql(&self.$field)),+]
            }

            #[allow(unused_assignments)]
            fn set_value(
                &mut self,
                index: usize,
                value: $crate::CqlValue,
            ) -> $crate::Result<()> {
                let mut position = 0usize;
                $(
                    if index == position {
                        self.$field = $crate::ColumnValue::from_cql(value)?;
                        return ::std::result::Result::Ok(());
                    }
                    position += 1;
                )+
                ::std::result::Result::Err($crate::CassaError::decode(::std::format!(
                    "{} has no field at position {}",
                    ::std::stringify!($record),
                    index
                )))
            }
        }
    };
}

macro_rules! copy_column {
    ($ty:ty, $variant:ident, $column:ident, $default:expr) => {
        impl ColumnValue for $ty {
            fn column_type() -> ColumnType {
                ColumnType::$column
            }

            fn to_cql(&self) -> CqlValue {
                CqlValue::$variant(*self)
            }

            fn from_cql(value: CqlValue) -> Result<Self> {
                match value {
                    CqlValue::$variant(v) => Ok(v),
                    CqlValue::Null => Ok($default),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    };
}

copy_column!(i8, TinyInt, TinyInt, 0);
copy_column!(i16, SmallInt, SmallInt, 0);
copy_column!(i32, Int, Int, 0);
copy_column!(i64, BigInt, BigInt, 0);
copy_column!(bool, Boolean, Boolean, false);
copy_column!(uuid::Uuid, Uuid, Uuid, uuid::Uuid::nil());
copy_column!(jiff::Timestamp, Timestamp, Timestamp, jiff::Timestamp::UNIX_EPOCH);

impl ColumnValue for f32 {
    fn column_type() -> ColumnType {
        ColumnType::Float
    }

    fn to_cql(&self) -> CqlValue {
        CqlValue::Float(OrderedFloat(*self))
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        match value {
            CqlValue::Float(f) => Ok(f.into_inner()),
            CqlValue::Null => Ok(0.0),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ColumnValue for f64 {
    fn column_type() -> ColumnType {
        ColumnType::Double
    }

    fn to_cql(&self) -> CqlValue {
        CqlValue::Double(OrderedFloat(*self))
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        match value {
            CqlValue::Double(f) => Ok(f.into_inner()),
            CqlValue::Null => Ok(0.0),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ColumnValue for String {
    fn column_type() -> ColumnType {
        ColumnType::Text
    }

    fn to_cql(&self) -> CqlValue {
        CqlValue::Text(Arc::from(self.as_str()))
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        match value {
            CqlValue::Text(s) => Ok(s.to_string()),
            CqlValue::Null => Ok(String::new()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ColumnValue for BigInt {
    fn column_type() -> ColumnType {
        ColumnType::Varint
    }

    fn to_cql(&self) -> CqlValue {
        CqlValue::Varint(self.clone())
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        match value {
            CqlValue::Varint(v) => Ok(v),
            CqlValue::Null => Ok(BigInt::default()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ColumnValue for Decimal {
    fn column_type() -> ColumnType {
        ColumnType::Decimal
    }

    fn to_cql(&self) -> CqlValue {
        CqlValue::Decimal(self.unscaled.clone(), self.scale)
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        match value {
            CqlValue::Decimal(unscaled, scale) => Ok(Decimal { unscaled, scale }),
            CqlValue::Null => Ok(Decimal::default()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ColumnValue for Bytes {
    fn column_type() -> ColumnType {
        ColumnType::Blob
    }

    fn kind() -> FieldKind {
        FieldKind::Sequence
    }

    fn to_cql(&self) -> CqlValue {
        CqlValue::Blob(self.clone())
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        match value {
            CqlValue::Blob(b) => Ok(b),
            CqlValue::Null => Ok(Bytes::new()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    fn column_type() -> ColumnType {
        T::column_type()
    }

    fn kind() -> FieldKind {
        FieldKind::Optional
    }

    fn to_cql(&self) -> CqlValue {
        match self {
            Some(v) => v.to_cql(),
            None => CqlValue::Null,
        }
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        match value {
            CqlValue::Null => Ok(None),
            other => T::from_cql(other).map(Some),
        }
    }
}

fn decode_items<T: ColumnValue>(value: CqlValue) -> Result<Vec<T>> {
    match value {
        CqlValue::List(items) | CqlValue::Set(items) => {
            items.into_iter().map(T::from_cql).collect()
        }
        CqlValue::Null => Ok(Vec::new()),
        other => Err(mismatch::<Vec<T>>(&other)),
    }
}

fn decode_entries<K: ColumnValue, V: ColumnValue>(value: CqlValue) -> Result<Vec<(K, V)>> {
    match value {
        CqlValue::Map(entries) => entries
            .into_iter()
            .map(|(k, v)| Ok((K::from_cql(k)?, V::from_cql(v)?)))
            .collect(),
        CqlValue::Null => Ok(Vec::new()),
        other => Err(mismatch::<Vec<(K, V)>>(&other)),
    }
}

impl<T: ColumnValue> ColumnValue for Vec<T> {
    fn column_type() -> ColumnType {
        ColumnType::List(Box::new(T::column_type()))
    }

    fn kind() -> FieldKind {
        FieldKind::Sequence
    }

    fn to_cql(&self) -> CqlValue {
        CqlValue::List(self.iter().map(ColumnValue::to_cql).collect())
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        decode_items(value)
    }
}

impl<T: ColumnValue, const N: usize> ColumnValue for [T; N] {
    fn column_type() -> ColumnType {
        ColumnType::List(Box::new(T::column_type()))
    }

    fn kind() -> FieldKind {
        FieldKind::FixedArray(N)
    }

    fn to_cql(&self) -> CqlValue {
        CqlValue::List(self.iter().map(ColumnValue::to_cql).collect())
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        let items = decode_items::<T>(value)?;
        let len = items.len();
        <[T; N]>::try_from(items).map_err(|_| {
            CassaError::decode(format!(
                "expected a list of {} elements, got {}",
                N, len
            ))
        })
    }
}

impl<T: ColumnValue + Ord> ColumnValue for BTreeSet<T> {
    fn column_type() -> ColumnType {
        ColumnType::Set(Box::new(T::column_type()))
    }

    fn kind() -> FieldKind {
        FieldKind::Sequence
    }

    fn to_cql(&self) -> CqlValue {
        CqlValue::Set(self.iter().map(ColumnValue::to_cql).collect())
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        Ok(decode_items::<T>(value)?.into_iter().collect())
    }
}

impl<T: ColumnValue + Hash + Eq> ColumnValue for HashSet<T> {
    fn column_type() -> ColumnType {
        ColumnType::Set(Box::new(T::column_type()))
    }

    fn kind() -> FieldKind {
        FieldKind::Sequence
    }

    fn to_cql(&self) -> CqlValue {
        let mut items: Vec<CqlValue> = self.iter().map(ColumnValue::to_cql).collect();
        items.sort();
        CqlValue::Set(items)
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        Ok(decode_items::<T>(value)?.into_iter().collect())
    }
}

impl<K: ColumnValue + Ord, V: ColumnValue> ColumnValue for BTreeMap<K, V> {
    fn column_type() -> ColumnType {
        ColumnType::Map(Box::new(K::column_type()), Box::new(V::column_type()))
    }

    fn kind() -> FieldKind {
        FieldKind::Associative
    }

    fn to_cql(&self) -> CqlValue {
        CqlValue::Map(self.iter().map(|(k, v)| (k.to_cql(), v.to_cql())).collect())
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        Ok(decode_entries::<K, V>(value)?.into_iter().collect())
    }
}

impl<K: ColumnValue + Hash + Eq, V: ColumnValue> ColumnValue for HashMap<K, V> {
    fn column_type() -> ColumnType {
        ColumnType::Map(Box::new(K::column_type()), Box::new(V::column_type()))
    }

    fn kind() -> FieldKind {
        FieldKind::Associative
    }

    fn to_cql(&self) -> CqlValue {
        let mut entries: Vec<(CqlValue, CqlValue)> =
            self.iter().map(|(k, v)| (k.to_cql(), v.to_cql())).collect();
        entries.sort();
        CqlValue::Map(entries)
    }

    fn from_cql(value: CqlValue) -> Result<Self> {
        Ok(decode_entries::<K, V>(value)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Profile {
        id: String,
        age: i32,
        nickname: Option<String>,
        tags: Vec<String>,
        scores: HashMap<String, i64>,
        avatar: Bytes,
        pair: [i16; 2],
    }

    crate::record!(Profile {
        id,
        age,
        nickname,
        tags,
        scores,
        avatar,
        pair
    });

    #[test]
    fn test_record_columns() {
        let columns = Profile::columns();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "age", "nickname", "tags", "scores", "avatar", "pair"]
        );
        assert_eq!(columns[1].column_type, ColumnType::Int);
        assert_eq!(columns[2].kind, FieldKind::Optional);
        assert_eq!(columns[3].column_type.to_string(), "list<text>");
        assert_eq!(columns[4].column_type.to_string(), "map<text, bigint>");
        assert_eq!(columns[4].kind, FieldKind::Associative);
        assert_eq!(columns[5].kind, FieldKind::Sequence);
        assert_eq!(columns[6].kind, FieldKind::FixedArray(2));
    }

    #[test]
    fn test_values_and_set_value() {
        let mut profile = Profile {
            id: "p1".to_string(),
            age: 41,
            ..Default::default()
        };
        let values = profile.values();
        assert_eq!(values[0], CqlValue::text("p1"));
        assert_eq!(values[2], CqlValue::Null);
        assert_eq!(values[6], CqlValue::List(vec![CqlValue::SmallInt(0); 2]));

        profile.set_value(2, CqlValue::text("moss")).unwrap();
        assert_eq!(profile.nickname.as_deref(), Some("moss"));

        let err = profile.set_value(1, CqlValue::text("old")).unwrap_err();
        assert!(matches!(err, CassaError::Decode(_)));

        assert!(profile.set_value(99, CqlValue::Null).is_err());
    }

    #[test]
    fn test_null_decodes_to_empty() {
        assert_eq!(String::from_cql(CqlValue::Null).unwrap(), "");
        assert_eq!(Option::<i32>::from_cql(CqlValue::Null).unwrap(), None);
        assert!(Vec::<i32>::from_cql(CqlValue::Null).unwrap().is_empty());
        assert!(HashMap::<String, i32>::from_cql(CqlValue::Null)
            .unwrap()
            .is_empty());
        assert_eq!(<[i32; 0]>::from_cql(CqlValue::Null).unwrap(), []);
    }

    #[test]
    fn test_fixed_array_length_checked() {
        let value = CqlValue::List(vec![CqlValue::Int(1)]);
        let err = <[i32; 2]>::from_cql(value).unwrap_err();
        assert!(err.to_string().contains("expected a list of 2 elements, got 1"));
    }

    #[test]
    fn test_hash_collections_encode_sorted() {
        let map: HashMap<String, i32> = [("b".to_string(), 2), ("a".to_string(), 1)]
            .into_iter()
            .collect();
        assert_eq!(
            map.to_cql(),
            CqlValue::Map(vec![
                (CqlValue::text("a"), CqlValue::Int(1)),
                (CqlValue::text("b"), CqlValue::Int(2)),
            ])
        );
    }

    #[test]
    fn test_decimal_keeps_scale() {
        assert_eq!(Decimal::column_type(), ColumnType::Decimal);
        let price = Decimal::new(12345, 2);
        assert_eq!(price.to_cql(), CqlValue::Decimal(BigInt::from(12345), 2));
        assert_eq!(Decimal::from_cql(price.to_cql()).unwrap(), price);
        assert_eq!(Decimal::from_cql(CqlValue::Null).unwrap(), Decimal::default());

        let err = Decimal::from_cql(CqlValue::Varint(BigInt::from(1))).unwrap_err();
        assert!(matches!(err, CassaError::Decode(_)));
    }
}
