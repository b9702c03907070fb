use super::*;
use serde_json::json;

#[test]
fn discriminate_prefers_method_then_attribute_then_node() {
    assert_eq!(discriminate(&json!({"params": {}, "returns": {}})), ElementKind::Method);
    assert_eq!(discriminate(&json!({"schema": {"type": "string"}})), ElementKind::Attribute);
    assert_eq!(discriminate(&json!({"child": {}})), ElementKind::Node);
}

#[test]
fn filter_by_kind_splits_a_mixed_subtree() {
    let subtree = json!({
        "name": {"schema": {"type": "string"}, "value": "X"},
        "scan": {"params": {"schema": {"type": "array", "items": []}}, "returns": {"schema": {"type": "null"}}},
        "child": {"grand": {"schema": {"type": "integer"}}},
    });

    assert_eq!(filter_by_kind(&subtree, ElementKind::Attribute).len(), 1);
    assert_eq!(filter_by_kind(&subtree, ElementKind::Method).len(), 1);
    assert_eq!(filter_by_kind(&subtree, ElementKind::Node).len(), 1);
}

#[test]
fn json_pointer_builds_slash_separated_path() {
    assert_eq!(json_pointer(&[]), "");
    assert_eq!(json_pointer(&["dev", "name"]), "/dev/name");
}

#[test]
fn object_entries_empty_for_non_objects() {
    assert!(object_entries(&json!("scalar")).is_empty());
    assert_eq!(object_entries(&json!({"a": 1})).len(), 1);
}
