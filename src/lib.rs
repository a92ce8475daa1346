//! Spindle API resource mapping
//!
//! Bidirectional mapping between a hierarchical scraping project model
//! (project → spider → sample → item → annotation, plus
//! schemas/fields/extractors) and JSON:API-shaped resource documents.
//!
//! Entity identity is partly implicit: a spider does not store its
//! `project_id`, a field does not store its `schema_id`. The routing
//! layer seeds a per-request [`Context`] with the ancestor ids it knows,
//! and each [`Mapper`] resolves relationship linkage from the record and
//! that context, omitting anything unresolvable rather than emitting
//! dangling links.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use spindle_api::{Context, Mapper, ResourceType};
//!
//! let mut context = Context::new()
//!     .with("project_id", "shop")
//!     .with("schema_id", "products");
//!
//! let mapper = Mapper::new(ResourceType::Fields);
//! let doc = mapper
//!     .dump(&json!({"id": "f1", "name": "title"}), &mut context)
//!     .unwrap();
//!
//! assert_eq!(doc["data"]["type"], "fields");
//! assert_eq!(doc["data"]["relationships"]["project"]["data"]["id"], "shop");
//! // No sample in the request path, so no sample link is fabricated.
//! assert!(doc["data"]["relationships"].get("sample").is_none());
//! ```
//!
//! # Relationship resolution
//!
//! For each standard relationship property `R` with companion `R_id`:
//!
//! | Record state | Effect |
//! |--------------|--------|
//! | `R_id` on record | adopted, written back into the context |
//! | `R_id` only in context | derived onto the record |
//! | `R_id` nowhere | relationship omitted entirely |
//! | id without inline stub | minimal `{"id": ...}` stub synthesized |
//!
//! Mapping is purely functional per invocation: no I/O, no state beyond
//! the caller-supplied context. Concurrent requests must use independent
//! `Context` instances.

mod context;
mod document;
mod error;
mod loader;
mod mappers;
mod resolver;
mod types;
mod validator;

pub use context::{
    Context, CONTAINER_ID, CONTEXT_KEYS, FIELD_ID, ITEM_ID, PROJECT_ID, SAMPLE_ID, SCHEMA_ID,
    SPIDER_ID,
};
pub use document::empty_document;
pub use error::{AttributeError, DumpError, InputError, LoadError};
pub use loader::{is_url, load_input, load_input_auto, load_input_str};
pub use mappers::{
    AttrDefault, AttrKind, AttrSpec, LinkKind, Mapper, ParamSource, RelLink, RelSpec, UrlParam,
};
pub use resolver::{derive_relationships, resolve_parent, ParentScope};
pub use types::{json_type_name, Record, ResourceType, STANDARD_PROPERTIES};
pub use validator::{attributes_schema, validate_attributes};

#[cfg(feature = "remote")]
pub use loader::load_input_url;
