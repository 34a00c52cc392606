use bytes::Bytes;
use num::BigInt;
use ordered_float::OrderedFloat;
use std::sync::Arc;

/// A single column value as bound to a statement or returned by a cursor.
///
/// The ordering is total so values can key partitions and clustering rows;
/// values of different kinds order by variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CqlValue {
    // Numeric types
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Varint(BigInt),
    Decimal(BigInt, i32), // unscaled value, scale

    // Basic types
    Boolean(bool),
    Text(Arc<str>),
    Blob(Bytes),
    Uuid(uuid::Uuid),
    Timestamp(jiff::Timestamp),

    // Collections
    List(Vec<CqlValue>),
    Set(Vec<CqlValue>),
    Map(Vec<(CqlValue, CqlValue)>), // Vec of pairs keeps a deterministic order

    Null,
}

impl CqlValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }

    /// Null, or a blob or collection with no elements.
    ///
    /// Only meaningful for nullable fields: an empty value there means the
    /// field is unset for write shaping.
    pub fn is_empty(&self) -> bool {
        match self {
            CqlValue::Null => true,
            CqlValue::Blob(b) => b.is_empty(),
            CqlValue::List(items) | CqlValue::Set(items) => items.is_empty(),
            CqlValue::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Get the type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            CqlValue::TinyInt(_) => "TinyInt",
            CqlValue::SmallInt(_) => "SmallInt",
            CqlValue::Int(_) => "Int",
            CqlValue::BigInt(_) => "BigInt",
            CqlValue::Float(_) => "Float",
            CqlValue::Double(_) => "Double",
            CqlValue::Varint(_) => "Varint",
            CqlValue::Decimal(_, _) => "Decimal",
            CqlValue::Boolean(_) => "Boolean",
            CqlValue::Text(_) => "Text",
            CqlValue::Blob(_) => "Blob",
            CqlValue::Uuid(_) => "Uuid",
            CqlValue::Timestamp(_) => "Timestamp",
            CqlValue::List(_) => "List",
            CqlValue::Set(_) => "Set",
            CqlValue::Map(_) => "Map",
            CqlValue::Null => "Null",
        }
    }

    pub fn text<S: AsRef<str>>(s: S) -> Self {
        CqlValue::Text(Arc::from(s.as_ref()))
    }
}

/// Arbitrary precision decimal: `unscaled * 10^-scale`.
///
/// Values are compared by representation, so `1.0` and `1.00` differ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Decimal {
    pub unscaled: BigInt,
    pub scale: i32,
}

impl Decimal {
    pub fn new(unscaled: impl Into<BigInt>, scale: i32) -> Self {
        Self {
            unscaled: unscaled.into(),
            scale,
        }
    }
}
