//! Relationship resolution - derives linkage from records and ancestor context.
//!
//! Two algorithms live here. [`derive_relationships`] fills in the six
//! standard relationship properties before serialization: an id carried on
//! the record wins and is written back into the context, otherwise the id
//! is read from the context, and a minimal `{id}` stub is synthesized so
//! output never carries a bare id without a resource object.
//! [`resolve_parent`] picks a node's structural parent among the inline
//! stub, its own container attribute, and the ambient container/item ids,
//! suppressing self-referencing candidates.

use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::context::{Context, CONTAINER_ID, ITEM_ID};
use crate::types::{Record, STANDARD_PROPERTIES};

/// Derive the standard relationship properties on a record.
///
/// For each property `R` with companion key `R_id`:
/// 1. an `R_id` already on the record is adopted and written back into the
///    context, so descendants dumped under the same context see it;
/// 2. otherwise `R_id` is read from the context;
/// 3. a missing or empty `R_id` leaves the relationship alone - it will be
///    omitted from output rather than emitted as a dangling link;
/// 4. when `R_id` resolved but the record has no inline `R` stub, a
///    minimal `{"id": R_id}` stub is synthesized.
///
/// Never fails: partial context degrades to a link-sparse record.
pub fn derive_relationships(record: &mut Record, context: &mut Context) {
    for prop in STANDARD_PROPERTIES {
        let id_key = format!("{prop}_id");
        if let Some(id) = record.get_id(&id_key) {
            context.set(id_key.clone(), id.to_string());
        } else if let Some(id) = context.get(&id_key) {
            record.set(id_key.clone(), Value::String(id.to_string()));
        } else {
            trace!(relation = *prop, "relationship omitted: no id on record or in context");
            continue;
        }
        if !record.is_set(prop) {
            if let Some(id) = record.get_id(&id_key).map(str::to_string) {
                record.set(*prop, json!({ "id": id }));
            }
        }
    }
}

/// Context fallback used by parent resolution.
///
/// Annotations fall back to the ambient container id, then the ambient
/// item id. Items fall back to the ambient container id only; an item with
/// neither yields no parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentScope {
    Annotation,
    Item,
}

/// Resolve a node's structural parent, preferring the most specific
/// information available.
///
/// Order: inline `parent` stub id, then the record's own `container_id`
/// attribute (when the key is present), then the scope's context fallback.
/// The winning candidate is written as `parent = {"id": ...}` and, when
/// `parent_id` was not already set, as `parent_id` too.
///
/// A candidate that would point the node at itself is dropped entirely:
/// both ids are split on the `#` variant separator and the node's base is
/// compared against the candidate's base, and the candidate's base against
/// the node's full id. The comparison is deliberately asymmetric; callers
/// depend on the exact two directions checked.
pub fn resolve_parent(record: &mut Record, context: &Context, scope: ParentScope) {
    let own_id = record.get_str("id").unwrap_or_default().to_string();

    let mut candidate = record
        .get("parent")
        .and_then(|p| p.get("id"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    if candidate.is_none() {
        candidate = if record.contains("container_id") {
            record.get_str("container_id").map(str::to_string)
        } else {
            context_parent(context, scope).map(str::to_string)
        };
    }

    let candidate = candidate.unwrap_or_default();
    if candidate.is_empty() {
        record.remove("parent");
        return;
    }

    if base_id(&own_id) == base_id(&candidate) || base_id(&candidate) == own_id {
        debug!(id = %own_id, parent = %candidate, "parent suppressed: self-reference");
        record.remove("parent");
        record.remove("parent_id");
        return;
    }

    record.set("parent", json!({ "id": candidate.clone() }));
    if !record.is_set("parent_id") {
        record.set("parent_id", Value::String(candidate));
    }
}

fn context_parent(context: &Context, scope: ParentScope) -> Option<&str> {
    match scope {
        ParentScope::Annotation => context.get(CONTAINER_ID).or_else(|| context.get(ITEM_ID)),
        ParentScope::Item => context.get(CONTAINER_ID),
    }
}

/// The portion of an identifier before its `#`-delimited variant suffix.
fn base_id(id: &str) -> &str {
    id.split('#').next().unwrap_or(id)
}
