//! Unit tests for CLI commands

use crate::cli::{descriptor, run, Cli, Commands};
use clap::Parser;
use std::io::Write;

const MANIFEST: &str = r"
routers:
  - name: main
    actions:
      - name: profile_edit
        pattern: /user/<d:user_id>/profile/edit/
        controller: users
        method: edit
";

fn manifest_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(MANIFEST.as_bytes()).unwrap();
    file
}

#[test]
fn test_reverse_command_parses() {
    let cli = Cli::try_parse_from([
        "actiondispatch",
        "reverse",
        "--manifest",
        "routes.yaml",
        "--action",
        "profile_edit",
        "42",
    ])
    .unwrap();

    match cli.command {
        Commands::Reverse { action, params, path_only, .. } => {
            assert_eq!(action, "profile_edit");
            assert_eq!(params, vec!["42"]);
            assert!(!path_only);
        }
        _ => panic!("Expected Reverse command"),
    }
}

#[test]
fn test_dispatch_command_with_headers() {
    let cli = Cli::try_parse_from([
        "actiondispatch",
        "dispatch",
        "-m",
        "routes.yaml",
        "--method",
        "POST",
        "--uri",
        "/user/1",
        "-H",
        "Content-Type: application/json",
        "--body",
        "{}",
    ])
    .unwrap();

    match cli.command {
        Commands::Dispatch { method, headers, body, .. } => {
            assert_eq!(method, "POST");
            assert_eq!(headers, vec!["Content-Type: application/json"]);
            assert_eq!(body.as_deref(), Some("{}"));
        }
        _ => panic!("Expected Dispatch command"),
    }
}

#[test]
fn test_dispatch_requires_uri_or_file() {
    assert!(Cli::try_parse_from(["actiondispatch", "dispatch", "-m", "routes.yaml"]).is_err());
}

#[test]
fn test_descriptor_rejects_bad_header() {
    assert!(descriptor("GET", "/", &["no-colon".to_string()], None).is_err());
    assert!(descriptor("GET", "/", &["X-A: 1".to_string()], Some("b".into())).is_ok());
}

#[test]
fn test_commands_run_against_manifest() {
    let file = manifest_file();
    let manifest = file.path().to_str().unwrap();

    for args in [
        vec!["actiondispatch", "routes", "--manifest", manifest],
        vec!["actiondispatch", "reverse", "--manifest", manifest, "--action", "profile_edit", "7"],
        vec![
            "actiondispatch",
            "dispatch",
            "--manifest",
            manifest,
            "--uri",
            "http://localhost/user/7/profile/edit/",
        ],
    ] {
        let cli = Cli::try_parse_from(&args).unwrap();
        assert!(run(cli).is_ok(), "command failed: {args:?}");
    }
}

#[test]
fn test_reverse_unknown_action_fails() {
    let file = manifest_file();
    let cli = Cli::try_parse_from([
        "actiondispatch",
        "reverse",
        "--manifest",
        file.path().to_str().unwrap(),
        "--action",
        "nope",
    ])
    .unwrap();
    assert!(run(cli).is_err());
}
