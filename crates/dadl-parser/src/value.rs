//! Parsed tree values.

use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A node of the parsed tree.
///
/// Maps preserve insertion order (`IndexMap`), which for lists and sequences
/// is part of the contract: items appear in the order they were read. `Null`
/// marks a slot that has been allocated but not yet written; a fully parsed
/// document never exposes one except for list placeholders a failed parse
/// would have filled.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Attempt to view the value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempt to view the value as a machine int.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempt to view the value as a map.
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Attempt to view the value as a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::BigInt(v) => serialize_bigint(v, serializer),
            Value::Number(v) => serializer.serialize_f64(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// Big integers serialize as native integers while they fit; past that they
/// degrade to their decimal string form, which every target format accepts.
fn serialize_bigint<S: Serializer>(v: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
    if let Ok(small) = i64::try_from(v.clone()) {
        serializer.serialize_i64(small)
    } else if let Ok(unsigned) = u64::try_from(v.clone()) {
        serializer.serialize_u64(unsigned)
    } else {
        serializer.serialize_str(&v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_insertion_order() {
        let mut map = IndexMap::new();
        map.insert("zebra".to_string(), Value::Int(1));
        map.insert("alpha".to_string(), Value::Int(2));
        let value = Value::Map(map);

        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"zebra":1,"alpha":2}"#);
    }

    #[test]
    fn bigint_beyond_u64_serializes_as_string() {
        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        let json = serde_json::to_string(&Value::BigInt(big)).unwrap();
        assert_eq!(json, r#""123456789012345678901234567890""#);
    }

    #[test]
    fn bigint_within_i64_serializes_as_number() {
        let json = serde_json::to_string(&Value::BigInt(BigInt::from(42))).unwrap();
        assert_eq!(json, "42");
    }
}
