//! Core types for resource mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The six standard relationship properties shared by every mapper.
///
/// Each property `R` has a companion identifier key `R_id` resolved
/// against the ancestor context during a dump.
pub const STANDARD_PROPERTIES: &[&str] = &["project", "spider", "schema", "item", "sample", "field"];

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resource type of an entity kind.
///
/// The string forms are part of the wire contract and must not be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Projects,
    Schemas,
    Fields,
    Spiders,
    Samples,
    Items,
    Annotations,
    ItemAnnotations,
    Extractors,
    Html,
}

impl ResourceType {
    /// Returns the wire type string for this resource.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Projects => "projects",
            ResourceType::Schemas => "schemas",
            ResourceType::Fields => "fields",
            ResourceType::Spiders => "spiders",
            ResourceType::Samples => "samples",
            ResourceType::Items => "items",
            ResourceType::Annotations => "annotations",
            ResourceType::ItemAnnotations => "item_annotations",
            ResourceType::Extractors => "extractors",
            ResourceType::Html => "html",
        }
    }

    /// Parse a wire type string.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "projects" => Some(ResourceType::Projects),
            "schemas" => Some(ResourceType::Schemas),
            "fields" => Some(ResourceType::Fields),
            "spiders" => Some(ResourceType::Spiders),
            "samples" => Some(ResourceType::Samples),
            "items" => Some(ResourceType::Items),
            "annotations" => Some(ResourceType::Annotations),
            "item_annotations" => Some(ResourceType::ItemAnnotations),
            "extractors" => Some(ResourceType::Extractors),
            "html" => Some(ResourceType::Html),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored-model record: an attribute map with explicit presence queries.
///
/// Mapping logic never probes raw JSON objects; it goes through `is_set`
/// (present and non-null) or `contains` (key present, null included) so
/// the two notions of "missing" stay distinct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Record(Map::new())
    }

    /// Build a record from a JSON value. Returns `None` unless the value
    /// is an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(|m| Record(m.clone()))
    }

    /// Key present, regardless of value (null counts as present).
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Key present with a non-null value.
    pub fn is_set(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(v) if !v.is_null())
    }

    /// The value under `key`, if present and non-null.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// The string value under `key`, if present, non-null, and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// The non-empty string value under `key`. Identifier lookups use
    /// this: an empty id is treated the same as an absent one.
    pub fn get_id(&self, key: &str) -> Option<&str> {
        self.get_str(key).filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Record(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}
