//! Per-request ancestor identifier store.
//!
//! The routing collaborator knows which ancestor ids appear in the request
//! path and seeds a [`Context`] with them before any mapping call. Mappers
//! read ancestor ids from the context and write one back only when they
//! adopt an id carried on the record currently being dumped, so sibling
//! resolution within the same dump can reuse it. Each in-flight request
//! must use its own instance.

use std::collections::HashMap;

/// Ancestor identifier key: `project_id`.
pub const PROJECT_ID: &str = "project_id";
/// Ancestor identifier key: `spider_id`.
pub const SPIDER_ID: &str = "spider_id";
/// Ancestor identifier key: `sample_id`.
pub const SAMPLE_ID: &str = "sample_id";
/// Ancestor identifier key: `schema_id`.
pub const SCHEMA_ID: &str = "schema_id";
/// Ancestor identifier key: `item_id`.
pub const ITEM_ID: &str = "item_id";
/// Ancestor identifier key: `field_id`.
pub const FIELD_ID: &str = "field_id";
/// Auxiliary key consumed by parent disambiguation, set by the routing
/// layer when the request is scoped to a container.
pub const CONTAINER_ID: &str = "container_id";

/// The ancestor identifier keys a context is expected to carry.
pub const CONTEXT_KEYS: &[&str] = &[PROJECT_ID, SPIDER_ID, SAMPLE_ID, SCHEMA_ID, ITEM_ID, FIELD_ID];

/// Mapping from ancestor-identifier keys to string values.
///
/// Missing keys resolve to absent, never an error. Empty strings are
/// treated as absent so a blank path segment cannot fabricate a link.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: HashMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    /// The value under `key`, if set and non-empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str).filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style insertion for seeding a context.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Context {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut ctx = Context::new();
        for (k, v) in iter {
            ctx.set(k, v);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_absent() {
        let ctx = Context::new();
        assert_eq!(ctx.get(PROJECT_ID), None);
    }

    #[test]
    fn empty_value_is_absent() {
        let ctx = Context::new().with(SPIDER_ID, "");
        assert_eq!(ctx.get(SPIDER_ID), None);
    }

    #[test]
    fn set_then_get() {
        let mut ctx = Context::new();
        ctx.set(PROJECT_ID, "p1");
        assert_eq!(ctx.get(PROJECT_ID), Some("p1"));
    }

    #[test]
    fn from_iterator_seeds_all_keys() {
        let ctx: Context = [(PROJECT_ID, "p1"), (SCHEMA_ID, "s1")].into_iter().collect();
        assert_eq!(ctx.get(PROJECT_ID), Some("p1"));
        assert_eq!(ctx.get(SCHEMA_ID), Some("s1"));
        assert_eq!(ctx.get(ITEM_ID), None);
    }
}
