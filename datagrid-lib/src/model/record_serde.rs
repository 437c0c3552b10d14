//! Custom serialization for Record.
//!
//! ## Human-readable formats (JSON)
//!
//! A record is a flat JSON object. Nested objects are related records,
//! strings holding UUIDs or dates are read into their typed variants:
//! `{"id": 1, "customer": {"name": "Contoso"}, "created": "2024-01-05"}`.
//!
//! ## Binary formats (bincode cache entries)
//!
//! A record is a map of field name to the externally tagged [`Value`], so
//! every variant round-trips without type inference.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;

use super::Record;
use super::Value;

impl Record {
    /// Builds a record from a JSON value.
    ///
    /// Objects map field by field. Any other JSON value becomes a record with
    /// a single `value` field, so arrays of scalars still form a grid.
    pub fn from_json(json: serde_json::Value) -> Record {
        match json {
            serde_json::Value::Object(map) => Record::from_json_map(map),
            other => Record::new().set("value", Value::from_json(other)),
        }
    }

    /// Builds a record from a JSON object.
    pub fn from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Record {
        map.into_iter()
            .map(|(key, value)| (key, Value::from_json(value)))
            .collect()
    }

    /// Converts the record into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let readable = serializer.is_human_readable();
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;

        for (key, value) in &self.fields {
            if readable {
                map.serialize_entry(key, &value.to_json())?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            deserializer.deserialize_map(JsonRecordVisitor)
        } else {
            let fields = HashMap::<String, Value>::deserialize(deserializer)?;
            Ok(Record { fields })
        }
    }
}

struct JsonRecordVisitor;

impl<'de> Visitor<'de> for JsonRecordVisitor {
    type Value = Record;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map representing a grid record")
    }

    fn visit_map<M>(self, mut map: M) -> Result<Record, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut record = Record::new();

        while let Some(key) = map.next_key::<String>()? {
            let value: serde_json::Value = map.next_value()?;
            record.fields.insert(key, Value::from_json(value));
        }

        Ok(record)
    }
}
