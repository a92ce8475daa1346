//! Integration tests for loading resource payloads into stored records.

use serde_json::json;
use spindle_api::{Context, LoadError, Mapper, ResourceType};

// === Validation Tests ===

mod validation {
    use super::*;

    #[test]
    fn sample_without_url_is_invalid() {
        let mapper = Mapper::new(ResourceType::Samples);
        let payload = json!({
            "data": {
                "type": "samples",
                "attributes": { "name": "home" }
            }
        });

        match mapper.load(&payload) {
            Err(LoadError::Invalid { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "url");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn annotation_missing_required_attributes_all_reported() {
        let mapper = Mapper::new(ResourceType::Annotations);
        let payload = json!({
            "data": {
                "type": "annotations",
                "id": "a1",
                "attributes": { "selector": ".price" }
            }
        });

        match mapper.load(&payload) {
            Err(LoadError::Invalid { errors }) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert!(fields.contains(&"attribute"));
                assert!(fields.contains(&"tagid"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn annotation_tagid_must_be_an_integer() {
        let mapper = Mapper::new(ResourceType::Annotations);
        let payload = json!({
            "data": {
                "type": "annotations",
                "attributes": { "attribute": "content", "tagid": "12" }
            }
        });

        match mapper.load(&payload) {
            Err(LoadError::Invalid { errors }) => {
                assert!(errors.iter().any(|e| e.field == "tagid"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn valid_annotation_loads() {
        let mapper = Mapper::new(ResourceType::Annotations);
        let payload = json!({
            "data": {
                "type": "annotations",
                "id": "a1",
                "attributes": {
                    "attribute": "content",
                    "tagid": 12,
                    "accept_selectors": [".price"]
                }
            }
        });

        let rec = mapper.load(&payload).unwrap();
        assert_eq!(rec.get_str("id"), Some("a1"));
        assert_eq!(rec.get("tagid"), Some(&json!(12)));
        assert_eq!(rec.get("accept_selectors"), Some(&json!([".price"])));
    }
}

// === Envelope Tests ===

mod envelope {
    use super::*;

    #[test]
    fn missing_data_rejected() {
        let mapper = Mapper::new(ResourceType::Projects);
        assert!(matches!(
            mapper.load(&json!({"meta": {}})),
            Err(LoadError::MissingData)
        ));
    }

    #[test]
    fn non_object_data_rejected() {
        let mapper = Mapper::new(ResourceType::Projects);
        let result = mapper.load(&json!({"data": []}));
        assert!(matches!(result, Err(LoadError::InvalidData { actual }) if actual == "array"));
    }

    #[test]
    fn type_mismatch_rejected() {
        let mapper = Mapper::new(ResourceType::Spiders);
        let payload = json!({"data": {"type": "samples", "attributes": {}}});
        assert!(matches!(
            mapper.load(&payload),
            Err(LoadError::WrongResourceType { .. })
        ));
    }
}

// === Identifier Aliasing Tests ===

mod aliasing {
    use super::*;

    #[test]
    fn project_id_loads_from_name() {
        let mapper = Mapper::new(ResourceType::Projects);
        let payload = json!({
            "data": {
                "type": "projects",
                "attributes": { "name": "shop" }
            }
        });

        let rec = mapper.load(&payload).unwrap();
        assert_eq!(rec.get_str("id"), Some("shop"));
        assert_eq!(rec.get_str("name"), Some("shop"));
    }

    #[test]
    fn spider_name_loads_from_payload_id() {
        let mapper = Mapper::new(ResourceType::Spiders);
        let payload = json!({
            "data": {
                "type": "spiders",
                "id": "shop-crawler",
                "attributes": { "start_urls": ["http://x"] }
            }
        });

        let rec = mapper.load(&payload).unwrap();
        assert_eq!(rec.get_str("name"), Some("shop-crawler"));
        // id is dump-only on spiders; the stored record carries only name.
        assert!(!rec.contains("id"));
    }

    #[test]
    fn sample_id_is_dump_only() {
        let mapper = Mapper::new(ResourceType::Samples);
        let payload = json!({
            "data": {
                "type": "samples",
                "id": "s1",
                "attributes": { "url": "http://x" }
            }
        });

        let rec = mapper.load(&payload).unwrap();
        assert!(!rec.contains("id"));
        assert_eq!(rec.get_str("url"), Some("http://x"));
    }
}

// === Spider Login Tests ===

mod spider_login {
    use super::*;

    #[test]
    fn complete_triple_nests_into_one_init_request() {
        let mapper = Mapper::new(ResourceType::Spiders);
        let payload = json!({
            "data": {
                "type": "spiders",
                "id": "shop-crawler",
                "attributes": {
                    "login_url": "http://x/login",
                    "login_user": "a",
                    "login_password": "b"
                }
            }
        });

        let rec = mapper.load(&payload).unwrap();
        let requests = rec.get("init_requests").unwrap().as_array().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0],
            json!({
                "type": "login",
                "loginurl": "http://x/login",
                "username": "a",
                "password": "b"
            })
        );
        assert!(!rec.contains("login_url"));
        assert!(!rec.contains("login_user"));
        assert!(!rec.contains("login_password"));
    }

    #[test]
    fn partial_triple_is_stripped_without_error() {
        let mapper = Mapper::new(ResourceType::Spiders);
        let payload = json!({
            "data": {
                "type": "spiders",
                "id": "shop-crawler",
                "attributes": { "login_url": "http://x/login", "login_user": "a" }
            }
        });

        let rec = mapper.load(&payload).unwrap();
        assert!(!rec.contains("init_requests"));
        assert!(!rec.contains("login_url"));
        assert!(!rec.contains("login_user"));
    }

    #[test]
    fn round_trip_reproduces_flat_values() {
        let mapper = Mapper::new(ResourceType::Spiders);
        let payload = json!({
            "data": {
                "type": "spiders",
                "id": "shop-crawler",
                "attributes": {
                    "login_url": "http://x/login",
                    "login_user": "a",
                    "login_password": "b"
                }
            }
        });

        let stored = mapper.load(&payload).unwrap();
        let doc = mapper.dump(&stored.into(), &mut Context::new()).unwrap();

        let attrs = &doc["data"]["attributes"];
        assert_eq!(attrs["login_url"], "http://x/login");
        assert_eq!(attrs["login_user"], "a");
        assert_eq!(attrs["login_password"], "b");
        assert!(attrs.get("init_requests").is_none());
    }
}

// === Relationship Folding Tests ===

mod folding {
    use super::*;

    #[test]
    fn to_one_folds_to_plain_id() {
        let mapper = Mapper::new(ResourceType::Annotations);
        let payload = json!({
            "data": {
                "type": "annotations",
                "id": "a1",
                "attributes": { "attribute": "content", "tagid": 3 },
                "relationships": {
                    "field": { "data": { "type": "fields", "id": "f1" } }
                }
            }
        });

        let rec = mapper.load(&payload).unwrap();
        assert_eq!(rec.get_str("field"), Some("f1"));
    }

    #[test]
    fn to_many_folds_to_id_list() {
        let mapper = Mapper::new(ResourceType::Annotations);
        let payload = json!({
            "data": {
                "type": "annotations",
                "id": "a1",
                "attributes": { "attribute": "content", "tagid": 3 },
                "relationships": {
                    "extractors": {
                        "data": [
                            { "type": "extractors", "id": "e1" },
                            { "type": "extractors", "id": "e2" }
                        ]
                    }
                }
            }
        });

        let rec = mapper.load(&payload).unwrap();
        assert_eq!(rec.get("extractors"), Some(&json!(["e1", "e2"])));
    }

    #[test]
    fn undeclared_relationships_ignored() {
        let mapper = Mapper::new(ResourceType::Html);
        let payload = json!({
            "data": {
                "type": "html",
                "id": "s1",
                "attributes": { "html": "<p></p>" },
                "relationships": {
                    "sample": { "data": { "type": "samples", "id": "s1" } }
                }
            }
        });

        let rec = mapper.load(&payload).unwrap();
        assert!(!rec.contains("sample"));
    }
}
