//! Structured fields attached to log records

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

/// Key used when a value is bound without a name
pub const DEFAULT_FIELD_NAME: &str = "-";

/// A field value. Anything without a native arm renders through `Opaque`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Text
    Str(Cow<'static, str>),
    /// Signed integer
    I64(i64),
    /// Unsigned integer
    U64(u64),
    /// Floating point
    F64(f64),
    /// Boolean
    Bool(bool),
    /// Point in time
    Time(DateTime<Utc>),
    /// Elapsed time
    Duration(Duration),
    /// Nested mapping, insertion ordered
    Map(Vec<(String, Value)>),
    /// Nested sequence
    Seq(Vec<Value>),
    /// Best-effort string form of a value with no native representation
    Opaque(String),
}

impl Value {
    /// Capture a value through its `Display` implementation
    pub fn display(value: impl fmt::Display) -> Self {
        Self::Opaque(value.to_string())
    }

    /// Capture a value through its `Debug` implementation
    pub fn debug(value: impl fmt::Debug) -> Self {
        Self::Opaque(format!("{value:?}"))
    }

    /// Capture any serializable value. Serialization failures are folded into
    /// an opaque description instead of being returned.
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => json.into(),
            Err(e) => Self::Opaque(format!("<unrepresentable: {e}>")),
        }
    }

    /// Borrow the text of a `Str` value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($arm:ident: $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$arm(value.into())
                }
            }
        )*
    };
}

value_from!(I64: i8, i16, i32, i64);
value_from!(U64: u8, u16, u32, u64);
value_from!(F64: f32, f64);
value_from!(Bool: bool);
value_from!(Time: DateTime<Utc>);
value_from!(Duration: Duration);

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        Self::I64(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::U64(value as u64)
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Self::Str(Cow::Borrowed(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(Cow::Owned(value))
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Str(Cow::Owned(value.clone()))
    }
}

impl From<Cow<'static, str>> for Value {
    fn from(value: Cow<'static, str>) -> Self {
        Self::Str(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::Seq(values.into_iter().map(Into::into).collect())
    }
}

impl From<Fields> for Value {
    fn from(fields: Fields) -> Self {
        Self::Map(fields.0.into_iter().collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::I64(i)
                } else if let Some(u) = n.as_u64() {
                    Self::U64(u)
                } else {
                    Self::F64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::Str(Cow::Owned(s)),
            serde_json::Value::Array(items) => {
                Self::Seq(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// A named value
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub key: Cow<'static, str>,
    /// Field value
    pub value: Value,
}

impl Field {
    /// Create a field
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Shorthand for [`Field::new`]
pub fn field(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Field {
    Field::new(key, value)
}

/// Named field mapping, kept in insertion order.
///
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(IndexMap<String, Value>);

impl Fields {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert into an ordered field list
    pub fn into_list(self) -> Vec<Field> {
        self.0
            .into_iter()
            .map(|(key, value)| Field {
                key: Cow::Owned(key),
                value,
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Fields {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Serialize)]
    struct Endpoint {
        host: &'static str,
        port: u16,
    }

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(Value::from(-3i32), Value::I64(-3));
        assert_eq!(Value::from(7usize), Value::U64(7));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("x"), Value::Str(Cow::Borrowed("x")));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(
            Value::from(vec![1u8, 2]),
            Value::Seq(vec![Value::U64(1), Value::U64(2)])
        );
    }

    #[test]
    fn test_serialize_produces_ordered_map() {
        let value = Value::serialize(&Endpoint {
            host: "localhost",
            port: 8080,
        });
        let Value::Map(entries) = value else {
            panic!("expected a map");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"host"));
        assert!(entries.contains(&("port".to_string(), Value::I64(8080))));
    }

    #[test]
    fn test_opaque_fallbacks() {
        assert_eq!(
            Value::debug(Some(1)),
            Value::Opaque("Some(1)".to_string())
        );
        assert_eq!(
            Value::display(std::net::Ipv4Addr::LOCALHOST),
            Value::Opaque("127.0.0.1".to_string())
        );

        // Maps with non-string keys cannot be represented as JSON objects.
        let mut bad = std::collections::BTreeMap::new();
        bad.insert(vec![1], 1);
        assert!(matches!(Value::serialize(&bad), Value::Opaque(_)));
    }

    #[test]
    fn test_fields_keep_insertion_order_and_replace_in_place() {
        let fields = Fields::new()
            .with("b", 1)
            .with("a", 2)
            .with("b", 3);
        let list = fields.into_list();
        assert_eq!(list, vec![Field::new("b", 3), Field::new("a", 2)]);
    }
}
