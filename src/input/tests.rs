use super::core::bracket_path;
use super::{Channel, Input};
use serde_json::{json, Value};

#[test]
fn test_nested_get() {
    let input = Input::from_value(json!({"arr1": {"0": "zero", "arr2": {"test": 1}}}));
    assert_eq!(input.get("arr1.0"), Some(&json!("zero")));
    assert_eq!(input.get("arr1.arr2.test"), Some(&json!(1)));
    assert_eq!(input.get("arr1.undefined"), None);
}

#[test]
fn test_get_indexes_sequences() {
    let input = Input::from_value(json!({"tags": ["a", "b"]}));
    assert_eq!(input.get_str("tags.1"), Some("b"));
    assert_eq!(input.get("tags.5"), None);
    assert_eq!(input.get("tags.x"), None);
}

#[test]
fn test_get_through_scalar_returns_none() {
    let input = Input::from_value(json!({"a": "scalar"}));
    assert_eq!(input.get("a.b"), None);
    let fallback = Value::Null;
    assert_eq!(input.get_or("a.b", &fallback), &Value::Null);
}

#[test]
fn test_setter_creates_intermediates() {
    let mut input = Input::new();
    input.set("foo.bar", "baz");
    assert_eq!(input.to_value()["foo"]["bar"], json!("baz"));
    input.set("config.db.adapter", "PDO");
    assert_eq!(input.to_value()["config"]["db"]["adapter"], json!("PDO"));
}

#[test]
fn test_setter_overwrites_scalar_intermediate() {
    let mut input = Input::from_value(json!({"a": 1}));
    input.set("a.b", 2);
    assert_eq!(input.get("a.b"), Some(&json!(2)));
}

#[test]
fn test_merge_is_deep_and_right_biased() {
    let mut left = Input::from_value(json!({"user": {"id": "1", "name": "ada"}, "page": 1}));
    let right = Input::from_value(json!({"user": {"id": "42"}, "sort": "asc"}));
    left.merge(&right);

    assert_eq!(left.get_str("user.id"), Some("42"));
    assert_eq!(left.get_str("user.name"), Some("ada"));
    assert_eq!(left.get("page"), Some(&json!(1)));
    assert_eq!(left.get_str("sort"), Some("asc"));
}

#[test]
fn test_merge_replaces_non_mapping_values() {
    let mut left = Input::from_value(json!({"user": "guest"}));
    let right = Input::from_value(json!({"user": {"id": "7"}}));
    left.merge(&right);
    assert_eq!(left.get_str("user.id"), Some("7"));
}

#[test]
fn test_insertion_order_is_preserved() {
    let mut input = Input::new();
    input.set("zeta", 1);
    input.set("alpha", 2);
    let keys: Vec<&str> = input.keys().collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
}

#[test]
fn test_bracket_keys() {
    assert_eq!(bracket_path("plain"), ("plain".to_string(), false));
    assert_eq!(bracket_path("user[name]"), ("user.name".to_string(), false));
    assert_eq!(bracket_path("a[b][c]"), ("a.b.c".to_string(), false));
    assert_eq!(bracket_path("tags[]"), ("tags".to_string(), true));
}

#[test]
fn test_from_pairs_expands_brackets() {
    let input = Input::from_pairs([
        ("user[name]", "ada"),
        ("tags[]", "x"),
        ("tags[]", "y"),
        ("q", "rust"),
    ]);
    assert_eq!(input.get_str("user.name"), Some("ada"));
    assert_eq!(input.get("tags"), Some(&json!(["x", "y"])));
    assert_eq!(input.get_str("q"), Some("rust"));
}

#[test]
fn test_remove() {
    let mut input = Input::from_value(json!({"a": {"b": 1, "c": 2}}));
    assert_eq!(input.remove("a.b"), Some(json!(1)));
    assert!(!input.contains("a.b"));
    assert!(input.contains("a.c"));
    assert_eq!(input.remove("x.y"), None);
}

#[test]
fn test_channel_parse_and_display() {
    assert_eq!("uri".parse::<Channel>(), Ok(Channel::Uri));
    assert_eq!(Channel::Cookie.to_string(), "COOKIE");
    assert!("BODY".parse::<Channel>().is_err());
}
