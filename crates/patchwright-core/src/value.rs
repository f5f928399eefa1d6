//! Loosely-typed JSON values as they arrive from clients and models.
//!
//! Shapes are only pinned down at validation time, so every validator branch
//! narrows a `PatchValue` explicitly instead of poking at an untyped document.

use crate::util::format_number;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PatchValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<PatchValue>),
    /// Entries keep the order they appeared in the source document.
    Object(Vec<(String, PatchValue)>),
}

impl PatchValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PatchValue::Null => "null",
            PatchValue::Bool(_) => "boolean",
            PatchValue::Number(_) => "number",
            PatchValue::String(_) => "string",
            PatchValue::Array(_) => "array",
            PatchValue::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PatchValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PatchValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PatchValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PatchValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PatchValue]> {
        match self {
            PatchValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, PatchValue)]> {
        match self {
            PatchValue::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// A number, or a string that parses as a finite number.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            PatchValue::Number(n) => Some(*n),
            PatchValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Look up an object entry by exact key.
    pub fn get(&self, key: &str) -> Option<&PatchValue> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Stringified form used as the observed value in validation errors.
    /// Strings are reported bare, everything else as compact JSON.
    pub fn render(&self) -> String {
        match self {
            PatchValue::Null => "null".to_string(),
            PatchValue::Bool(b) => b.to_string(),
            PatchValue::Number(n) => format_number(*n),
            PatchValue::String(s) => s.clone(),
            PatchValue::Array(_) | PatchValue::Object(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

impl From<serde_json::Value> for PatchValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PatchValue::Null,
            serde_json::Value::Bool(b) => PatchValue::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(PatchValue::Null, PatchValue::Number),
            serde_json::Value::String(s) => PatchValue::String(s),
            serde_json::Value::Array(items) => {
                PatchValue::Array(items.into_iter().map(PatchValue::from).collect())
            }
            serde_json::Value::Object(map) => PatchValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, PatchValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<f64> for PatchValue {
    fn from(value: f64) -> Self {
        PatchValue::Number(value)
    }
}

impl From<&str> for PatchValue {
    fn from(value: &str) -> Self {
        PatchValue::String(value.to_string())
    }
}

impl From<bool> for PatchValue {
    fn from(value: bool) -> Self {
        PatchValue::Bool(value)
    }
}

impl Serialize for PatchValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PatchValue::Null => serializer.serialize_unit(),
            PatchValue::Bool(b) => serializer.serialize_bool(*b),
            PatchValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            PatchValue::String(s) => serializer.serialize_str(s),
            PatchValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            PatchValue::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

struct PatchValueVisitor;

impl<'de> Visitor<'de> for PatchValueVisitor {
    type Value = PatchValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<PatchValue, E> {
        Ok(PatchValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<PatchValue, E> {
        Ok(PatchValue::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<PatchValue, E> {
        Ok(PatchValue::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<PatchValue, E> {
        Ok(PatchValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<PatchValue, E> {
        Ok(PatchValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<PatchValue, E> {
        Ok(PatchValue::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<PatchValue, E> {
        Ok(PatchValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<PatchValue, E> {
        Ok(PatchValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<PatchValue, D::Error> {
        PatchValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<PatchValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(PatchValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<PatchValue, A::Error> {
        let mut entries: Vec<(String, PatchValue)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, PatchValue>()? {
            // Later duplicates win, matching serde_json::Value.
            if let Some(existing) = entries.iter_mut().find(|(k, _)| *k == key) {
                existing.1 = value;
            } else {
                entries.push((key, value));
            }
        }
        Ok(PatchValue::Object(entries))
    }
}

impl<'de> Deserialize<'de> for PatchValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PatchValueVisitor)
    }
}
