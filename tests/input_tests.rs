use actiondispatch::input::{Channel, Input};
use actiondispatch::router::CompiledPattern;
use actiondispatch::server::{Request, RequestDescriptor};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,7}"
}

fn dot_path() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|segments| segments.join("."))
}

proptest! {
    #[test]
    fn set_then_get_returns_value(path in dot_path(), value in "\\PC{0,16}") {
        let mut input = Input::new();
        input.set(&path, value.clone());
        prop_assert_eq!(input.get(&path), Some(&Value::String(value)));
    }

    #[test]
    fn set_creates_every_intermediate(path in dot_path()) {
        let mut input = Input::new();
        input.set(&path, 1);
        let segments: Vec<&str> = path.split('.').collect();
        for depth in 1..segments.len() {
            let prefix = segments[..depth].join(".");
            prop_assert!(input.get(&prefix).map_or(false, Value::is_object), "missing {}", prefix);
        }
    }

    #[test]
    fn lookups_through_scalars_are_absent(path in dot_path(), tail in segment()) {
        let mut input = Input::new();
        input.set(&path, "leaf");
        prop_assert_eq!(input.get(&format!("{path}.{tail}")), None);
    }

    #[test]
    fn merge_is_right_biased(
        left in prop::collection::btree_map(segment(), "[a-z0-9]{0,6}", 0..6),
        right in prop::collection::btree_map(segment(), "[a-z0-9]{0,6}", 0..6),
    ) {
        let a = Input::from_pairs(left.clone());
        let b = Input::from_pairs(right.clone());
        let merged = a.merged(&b);

        for (key, value) in &right {
            prop_assert_eq!(merged.get_str(key), Some(value.as_str()));
        }
        for (key, value) in left.iter().filter(|(k, _)| !right.contains_key(*k)) {
            prop_assert_eq!(merged.get_str(key), Some(value.as_str()));
        }
        let mut keys: Vec<&String> = left.keys().chain(right.keys()).collect();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(merged.len(), keys.len());
    }

    #[test]
    fn reverse_then_match_recovers_params(
        a in "[^/]{1,12}",
        b in "[0-9]{1,6}",
        c in "[A-Za-z]{1,8}",
    ) {
        let pattern = CompiledPattern::compile("/x/{a}/<d:b>/<a:c>/", &HashMap::new()).unwrap();
        let path = pattern.reverse(&[a.as_str(), b.as_str(), c.as_str()]).unwrap();
        let params = pattern.match_path(&path).unwrap();
        prop_assert_eq!(params.get_str("a"), Some(a.as_str()));
        prop_assert_eq!(params.get_str("b"), Some(b.as_str()));
        prop_assert_eq!(params.get_str("c"), Some(c.as_str()));
    }
}

#[test]
fn test_nested_merge_keeps_siblings() {
    let base = Input::from_value(json!({ "user": { "name": "ada", "role": "admin" }, "page": "1" }));
    let over = Input::from_value(json!({ "user": { "name": "grace" } }));

    let merged = base.merged(&over);

    assert_eq!(
        merged.to_value(),
        json!({ "user": { "name": "grace", "role": "admin" }, "page": "1" })
    );
}

#[test]
fn test_sequence_index_in_path() {
    let input = Input::from_value(json!({ "tags": ["a", "b"] }));
    assert_eq!(input.get_str("tags.1"), Some("b"));
    assert_eq!(input.get("tags.2"), None);
    assert_eq!(input.get("tags.x"), None);
}

#[test]
fn test_bracket_form_keys_become_nested() {
    let request = Request::from_descriptor(
        RequestDescriptor::new("POST", "/signup")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("user[name]=ada&user[langs][]=rust&user[langs][]=ml"),
    )
    .unwrap();

    let post = request.post_input().unwrap();
    assert_eq!(post.get_str("user.name"), Some("ada"));
    assert_eq!(post.get("user.langs"), Some(&json!(["rust", "ml"])));
}

#[test]
fn test_controller_view_precedence() {
    let request = Request::from_descriptor(
        RequestDescriptor::new("POST", "/items?id=get&only_get=1")
            .header("Cookie", "id=cookie; session=s1")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("id=post"),
    )
    .unwrap();

    let view = request.controller_input(&[Channel::Get, Channel::Post, Channel::Cookie]);
    assert_eq!(view.get_str("id"), Some("cookie"));
    assert_eq!(view.get_str("only_get"), Some("1"));
    assert_eq!(view.get_str("session"), Some("s1"));

    let view = request.controller_input(&[Channel::Cookie, Channel::Get]);
    assert_eq!(view.get_str("id"), Some("get"));
}
