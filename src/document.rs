//! Dump and load pipelines - between stored records and resource documents.
//!
//! Dump runs a fixed pipeline per record: the entity transform (login
//! flattening, extractor derivation, sample items defaulting, parent
//! resolution), then relationship derivation against the context, then
//! attribute projection with dump defaults, then envelope assembly. Load
//! runs the reverse: envelope parsing, attribute validation, projection
//! with identifier aliasing, relationship folding, then the entity load
//! transform.

use serde_json::{json, Map, Value};

use crate::context::Context;
use crate::error::{DumpError, LoadError};
use crate::mappers::{LinkKind, Mapper, ParamSource, RelSpec};
use crate::types::{json_type_name, Record};
use crate::validator::validate_attributes;

/// The envelope returned for a no-content response: `{"meta": {}}`.
pub fn empty_document() -> Value {
    json!({ "meta": {} })
}

impl Mapper {
    /// Dump one stored record to a resource document.
    ///
    /// The context supplies ancestor ids for relationship resolution and
    /// receives opportunistic write-backs of ids read off the record, so
    /// it must be owned by the in-flight request.
    ///
    /// # Errors
    ///
    /// Returns `DumpError` when the record is not an object or an
    /// entity transform hits a contract violation (incomplete extractor).
    pub fn dump(&self, record: &Value, context: &mut Context) -> Result<Value, DumpError> {
        let resource = self.dump_resource(record, context)?;
        Ok(json!({ "data": resource, "meta": {} }))
    }

    /// Dump a list of stored records to a collection document.
    ///
    /// Records share the context, so an id adopted from one record is
    /// visible while dumping its later siblings.
    pub fn dump_many(&self, records: &[Value], context: &mut Context) -> Result<Value, DumpError> {
        let resources = records
            .iter()
            .map(|record| self.dump_resource(record, context))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({ "data": resources, "meta": {} }))
    }

    fn dump_resource(&self, record: &Value, context: &mut Context) -> Result<Value, DumpError> {
        let mut rec = Record::from_value(record).ok_or_else(|| DumpError::InvalidRecord {
            actual: json_type_name(record).to_string(),
        })?;

        self.run_dump_transform(&mut rec, context)?;
        if !self.skips_relationships() {
            crate::resolver::derive_relationships(&mut rec, context);
        }

        let id = self.dump_id(&rec);

        let mut data = Map::new();
        data.insert("type".to_string(), Value::String(self.kind().as_str().to_string()));
        if let Some(id) = &id {
            data.insert("id".to_string(), Value::String(id.clone()));
        }
        data.insert("attributes".to_string(), self.project_attributes(&rec));

        if !self.skips_relationships() {
            let relationships = self.project_relationships(&rec, id.as_deref());
            if !relationships.is_empty() {
                data.insert("relationships".to_string(), Value::Object(relationships));
            }
        }

        Ok(Value::Object(data))
    }

    fn dump_id(&self, rec: &Record) -> Option<String> {
        let spec = self.attrs().iter().find(|spec| spec.name == "id")?;
        let source = spec.dump_from.unwrap_or(spec.name);
        rec.get_str(source).map(str::to_string)
    }

    fn project_attributes(&self, rec: &Record) -> Value {
        let mut attributes = Map::new();
        for spec in self.attrs() {
            if spec.name == "id" {
                continue;
            }
            let source = spec.dump_from.unwrap_or(spec.name);
            let value = match rec.get(source) {
                Some(value) => value.clone(),
                None => match spec.default {
                    Some(default) => default.to_value(),
                    None => continue,
                },
            };
            attributes.insert(spec.name.to_string(), value);
        }
        Value::Object(attributes)
    }

    fn project_relationships(&self, rec: &Record, own_id: Option<&str>) -> Map<String, Value> {
        let mut relationships = Map::new();
        for rel in self.rels() {
            let Some(value) = rec.get(rel.name) else {
                continue;
            };
            let data = if rel.many {
                let Some(entries) = value.as_array() else {
                    continue;
                };
                let linkages: Vec<Value> = entries
                    .iter()
                    .filter_map(|entry| linkage(rel, entry))
                    .collect();
                Value::Array(linkages)
            } else {
                match linkage(rel, value) {
                    Some(linkage) => linkage,
                    None => continue,
                }
            };

            let mut body = Map::new();
            if let Some(url) = fill_link(rel, rec, own_id) {
                let name = match rel.link.as_ref().map(|link| link.kind) {
                    Some(LinkKind::SelfLink) => "self",
                    _ => "related",
                };
                let mut links = Map::new();
                links.insert(name.to_string(), Value::String(url));
                body.insert("links".to_string(), Value::Object(links));
            }
            body.insert("data".to_string(), data);
            relationships.insert(rel.name.to_string(), Value::Object(body));
        }
        relationships
    }

    /// Load a resource payload back into a plain attribute record.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` for malformed envelopes, resource type
    /// mismatches, and attribute validation failures (all violations
    /// collected).
    pub fn load(&self, payload: &Value) -> Result<Record, LoadError> {
        let data = payload.get("data").ok_or(LoadError::MissingData)?;
        let data = data.as_object().ok_or_else(|| LoadError::InvalidData {
            actual: json_type_name(data).to_string(),
        })?;

        let actual = data
            .get("type")
            .and_then(Value::as_str)
            .ok_or(LoadError::MissingType)?;
        if actual != self.kind().as_str() {
            return Err(LoadError::WrongResourceType {
                expected: self.kind().as_str().to_string(),
                actual: actual.to_string(),
            });
        }

        let attributes = match data.get("attributes") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(LoadError::InvalidAttributes {
                    actual: json_type_name(other).to_string(),
                })
            }
        };

        // Flat load input: the resource id alongside its attributes, so
        // identifier aliasing can read either.
        let mut flat = Map::new();
        if let Some(id) = data.get("id").filter(|v| !v.is_null()) {
            flat.insert("id".to_string(), id.clone());
        }
        for (name, value) in &attributes {
            flat.insert(name.clone(), value.clone());
        }

        validate_attributes(self.attrs(), &flat)?;

        let flat = Record::from(flat);
        let mut out = Record::new();
        for spec in self.attrs() {
            if spec.dump_only {
                continue;
            }
            let source = spec.load_from.unwrap_or(spec.name);
            if let Some(value) = flat.get(source) {
                out.set(spec.name, value.clone());
            }
        }

        if !self.skips_relationships() {
            fold_relationships(self.rels(), data.get("relationships"), &mut out);
        }

        self.run_load_transform(&mut out);
        Ok(out)
    }
}

/// Convert a stored relationship value (an id string or an id-bearing
/// stub) into a `{type, id}` resource linkage.
fn linkage(rel: &RelSpec, value: &Value) -> Option<Value> {
    let id = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("id")?.as_str()?,
        _ => return None,
    };
    if id.is_empty() {
        return None;
    }
    Some(json!({ "type": rel.kind.as_str(), "id": id }))
}

/// Fill a relationship's templated URL. Emitted only when every
/// placeholder resolves from the record's ids.
fn fill_link(rel: &RelSpec, rec: &Record, own_id: Option<&str>) -> Option<String> {
    let link = rel.link.as_ref()?;
    let mut url = link.template.to_string();
    for param in link.params {
        let value = match param.source {
            ParamSource::OwnId => own_id?,
            ParamSource::Key(key) => rec.get_id(key)?,
        };
        url = url.replace(&format!("{{{}}}", param.name), value);
    }
    Some(url)
}

/// Fold payload relationships back to plain ids: to-one becomes a single
/// id under the relationship name, to-many a list of ids.
fn fold_relationships(rels: &[RelSpec], relationships: Option<&Value>, out: &mut Record) {
    let Some(relationships) = relationships.and_then(Value::as_object) else {
        return;
    };
    for rel in rels {
        let Some(data) = relationships.get(rel.name).and_then(|r| r.get("data")) else {
            continue;
        };
        if rel.many {
            let Some(entries) = data.as_array() else {
                continue;
            };
            let ids: Vec<Value> = entries
                .iter()
                .filter_map(|entry| entry.get("id").and_then(Value::as_str))
                .map(|id| Value::String(id.to_string()))
                .collect();
            out.set(rel.name, Value::Array(ids));
        } else if let Some(id) = data.get("id").and_then(Value::as_str) {
            out.set(rel.name, Value::String(id.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{PROJECT_ID, SCHEMA_ID};
    use crate::types::ResourceType;

    #[test]
    fn empty_document_is_bare_meta() {
        assert_eq!(empty_document(), json!({ "meta": {} }));
    }

    #[test]
    fn dump_wraps_data_and_meta() {
        let mapper = Mapper::new(ResourceType::Html);
        let mut ctx = Context::new();
        let doc = mapper
            .dump(&json!({"id": "s1", "html": "<html></html>"}), &mut ctx)
            .unwrap();

        assert_eq!(doc["data"]["type"], "html");
        assert_eq!(doc["data"]["id"], "s1");
        assert_eq!(doc["data"]["attributes"]["html"], "<html></html>");
        assert_eq!(doc["meta"], json!({}));
    }

    #[test]
    fn dump_rejects_non_object_record() {
        let mapper = Mapper::new(ResourceType::Projects);
        let mut ctx = Context::new();
        let result = mapper.dump(&json!(["p1"]), &mut ctx);
        assert!(matches!(result, Err(DumpError::InvalidRecord { .. })));
    }

    #[test]
    fn dump_many_shares_context_across_siblings() {
        let mapper = Mapper::new(ResourceType::Fields);
        let mut ctx = Context::new();
        let doc = mapper
            .dump_many(
                &[
                    json!({"id": "f1", "name": "title", "schema_id": "s1"}),
                    json!({"id": "f2", "name": "price"}),
                ],
                &mut ctx,
            )
            .unwrap();

        // f2 carries no schema_id of its own; it reuses f1's write-back.
        assert_eq!(doc["data"][1]["relationships"]["schema"]["data"]["id"], "s1");
    }

    #[test]
    fn dump_fills_related_links_when_ids_resolve() {
        let mapper = Mapper::new(ResourceType::Fields);
        let mut ctx = Context::new().with(PROJECT_ID, "p1").with(SCHEMA_ID, "s1");
        let doc = mapper
            .dump(&json!({"id": "f1", "name": "title"}), &mut ctx)
            .unwrap();

        assert_eq!(
            doc["data"]["relationships"]["schema"]["links"]["related"],
            "/api/projects/p1/schemas/s1"
        );
    }

    #[test]
    fn dump_omits_links_with_unresolved_placeholders() {
        let mapper = Mapper::new(ResourceType::Fields);
        let mut ctx = Context::new().with(SCHEMA_ID, "s1");
        let doc = mapper
            .dump(&json!({"id": "f1", "name": "title"}), &mut ctx)
            .unwrap();

        let schema = &doc["data"]["relationships"]["schema"];
        assert_eq!(schema["data"]["id"], "s1");
        assert!(schema.get("links").is_none());
    }

    #[test]
    fn load_rejects_missing_data() {
        let mapper = Mapper::new(ResourceType::Samples);
        assert!(matches!(
            mapper.load(&json!({"meta": {}})),
            Err(LoadError::MissingData)
        ));
    }

    #[test]
    fn load_rejects_wrong_type() {
        let mapper = Mapper::new(ResourceType::Samples);
        let payload = json!({"data": {"type": "spiders", "attributes": {}}});
        assert!(matches!(
            mapper.load(&payload),
            Err(LoadError::WrongResourceType { expected, actual })
                if expected == "samples" && actual == "spiders"
        ));
    }

    #[test]
    fn load_folds_to_one_relationship_to_plain_id() {
        let mapper = Mapper::new(ResourceType::Items);
        let payload = json!({
            "data": {
                "type": "items",
                "id": "i1",
                "attributes": {},
                "relationships": {
                    "schema": { "data": { "type": "schemas", "id": "s9" } }
                }
            }
        });
        let rec = mapper.load(&payload).unwrap();
        assert_eq!(rec.get_str("schema"), Some("s9"));
    }

    #[test]
    fn load_skip_relationships_drops_folding() {
        let mapper = Mapper::new(ResourceType::Items).skip_relationships(true);
        let payload = json!({
            "data": {
                "type": "items",
                "id": "i1",
                "attributes": {},
                "relationships": {
                    "schema": { "data": { "type": "schemas", "id": "s9" } }
                }
            }
        });
        let rec = mapper.load(&payload).unwrap();
        assert!(!rec.contains("schema"));
    }
}
