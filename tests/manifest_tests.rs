mod common;

use actiondispatch::controller::IsolationLevel;
use actiondispatch::echo::echo_dispatcher;
use actiondispatch::input::Channel;
use actiondispatch::server::HttpMethod;
use actiondispatch::validator::MethodTarget;
use actiondispatch::{ConfigError, Manifest};
use common::temp_files::{create_temp_file, create_temp_json, create_temp_yaml};

const FULL_MANIFEST: &str = r#"
app:
  env: prod
  hostname: example.com
  protocol: https
routers:
  - name: main
    path_prefix: /app
    actions:
      - name: profile_edit
        pattern: "/user/<d:user_id>/profile/edit/"
        methods: [GET, post]
        controller: users
        method: edit
        validator: { name: profile, methods: [POST] }
        transaction: { isolation: read_committed }
        input: [GET, POST, URI]
        defaults: { page: "1" }
        services: [mailer]
      - name: home
        pattern: /
        controller: pages
        method: home
  - name: admin
    hostname: admin.example.com
    protocol: http
    actions:
      - name: admin_home
        pattern: /
        controller: pages
        method: admin
"#;

#[test]
fn test_full_manifest_is_parsed() {
    let manifest = Manifest::from_yaml_str(FULL_MANIFEST).unwrap();

    assert_eq!(manifest.app().env, "prod");
    assert_eq!(manifest.app().hostname.as_deref(), Some("example.com"));
    assert_eq!(manifest.app().protocol, "https");
    assert_eq!(manifest.action_count(), 3);
    assert_eq!(manifest.controller_names(), vec!["pages", "users"]);

    let (main, actions) = &manifest.routers()[0];
    assert_eq!(main.name, "main");
    assert_eq!(main.path_prefix.as_deref(), Some("/app"));

    let edit = &actions[0];
    assert_eq!(edit.name, "profile_edit");
    assert_eq!(edit.methods, vec![HttpMethod::Get, HttpMethod::Post]);
    let validator = edit.validator.as_ref().unwrap();
    assert_eq!(validator.name, "profile");
    assert_eq!(validator.target, MethodTarget::Methods(vec![HttpMethod::Post]));
    assert_eq!(
        edit.transaction.as_ref().unwrap().isolation,
        Some(IsolationLevel::ReadCommitted)
    );
    assert_eq!(edit.channels, Some(vec![Channel::Get, Channel::Post, Channel::Uri]));
    assert_eq!(edit.defaults.get("page").map(String::as_str), Some("1"));
    assert_eq!(edit.services, vec!["mailer"]);

    let home = &actions[1];
    assert!(home.methods.is_empty());
    assert!(home.validator.is_none());
    assert!(home.transaction.is_none());
}

#[test]
fn test_router_scope_falls_back_to_app() {
    let manifest = Manifest::from_yaml_str(FULL_MANIFEST).unwrap();
    let dispatcher = echo_dispatcher(manifest).unwrap();

    let main = &dispatcher.routers()[0];
    assert_eq!(main.base_uri(), "https://example.com/app");
    let admin = &dispatcher.routers()[1];
    assert_eq!(admin.base_uri(), "http://admin.example.com/");

    assert_eq!(
        dispatcher.reverse_uri("profile_edit", &["9"]).unwrap(),
        "https://example.com/app/user/9/profile/edit/"
    );
}

#[test]
fn test_load_by_extension() {
    let yaml = create_temp_yaml(FULL_MANIFEST);
    assert_eq!(Manifest::load(yaml.path()).unwrap().action_count(), 3);

    let yml = create_temp_file(FULL_MANIFEST, "yml");
    assert_eq!(Manifest::load(yml.path()).unwrap().action_count(), 3);

    let json = create_temp_json(
        r#"{ "routers": [ { "name": "main", "actions": [
            { "name": "home", "pattern": "/", "methods": ["GET"], "controller": "pages", "method": "home" }
        ] } ] }"#,
    );
    let manifest = Manifest::load(json.path()).unwrap();
    assert_eq!(manifest.action_count(), 1);
    assert_eq!(manifest.app().env, "dev");
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Manifest::load("/definitely/not/here/routes.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::ManifestIo { .. }));
}

#[test]
fn test_malformed_text_is_parse_error() {
    assert!(matches!(
        Manifest::from_yaml_str("routers: [ {name: main, actions: oops} ]"),
        Err(ConfigError::ManifestParse(_))
    ));
    assert!(matches!(
        Manifest::from_json_str("{ not json"),
        Err(ConfigError::ManifestParse(_))
    ));
    // Actions need a controller and a method.
    assert!(matches!(
        Manifest::from_yaml_str("routers: [ {name: main, actions: [ {name: a, pattern: /} ]} ]"),
        Err(ConfigError::ManifestParse(_))
    ));
}

#[test]
fn test_unknown_tokens_fail_fast() {
    let bad_method = r"
routers:
  - name: main
    actions:
      - { name: a, pattern: /, methods: [FETCH], controller: c, method: m }
";
    assert!(matches!(
        Manifest::from_yaml_str(bad_method),
        Err(ConfigError::InvalidMethod(m)) if m.contains("FETCH")
    ));

    let bad_validator_method = r"
routers:
  - name: main
    actions:
      - { name: a, pattern: /, controller: c, method: m, validator: { name: v, methods: [SOMETIMES] } }
";
    assert!(matches!(
        Manifest::from_yaml_str(bad_validator_method),
        Err(ConfigError::InvalidMethod(m)) if m.contains("SOMETIMES")
    ));

    let bad_channel = r"
routers:
  - name: main
    actions:
      - { name: a, pattern: /, controller: c, method: m, input: [HEADER] }
";
    assert!(matches!(
        Manifest::from_yaml_str(bad_channel),
        Err(ConfigError::ManifestParse(_))
    ));
}

#[test]
fn test_bad_pattern_fails_build() {
    let manifest = Manifest::from_yaml_str(
        r#"
routers:
  - name: main
    actions:
      - { name: a, pattern: "/x/<q:id>", controller: c, method: m }
"#,
    )
    .unwrap();
    assert!(matches!(
        echo_dispatcher(manifest),
        Err(ConfigError::UnknownPlaceholderType { .. })
    ));
}

#[test]
fn test_duplicate_names_fail_build() {
    let duplicate_action = Manifest::from_yaml_str(
        r"
routers:
  - name: one
    actions:
      - { name: a, pattern: /a, controller: c, method: m }
  - name: two
    actions:
      - { name: a, pattern: /b, controller: c, method: m }
",
    )
    .unwrap();
    assert!(matches!(
        echo_dispatcher(duplicate_action),
        Err(ConfigError::DuplicateAction(name)) if name == "a"
    ));

    let duplicate_router = Manifest::from_yaml_str(
        r"
routers:
  - name: one
    actions: []
  - name: one
    actions: []
",
    )
    .unwrap();
    assert!(matches!(
        echo_dispatcher(duplicate_router),
        Err(ConfigError::DuplicateRouter(name)) if name == "one"
    ));
}
