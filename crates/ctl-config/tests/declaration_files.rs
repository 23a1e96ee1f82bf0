// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loading configs and declarations from disk.

use ctl_config::{ConfigError, load_config, load_declaration, validate_config};
use std::io::Write;

#[test]
fn loads_json_declaration() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "name": "ccl-go",
            "version": "1.2.0",
            "supported_functions": ["parse", "get_list"],
            "behavior_choices": ["list_coercion_enabled"],
            "variant_choice": "proposed_behavior"
        }}"#
    )
    .unwrap();
    let decl = load_declaration(file.path()).unwrap();
    assert_eq!(decl.name, "ccl-go");
    assert!(decl.has_function("get_list"));
    assert!(decl.has_behavior("list_coercion_enabled"));
    assert!(decl.validate().is_ok());
}

#[test]
fn loads_toml_declaration() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
name = "ccl-ocaml"
supported_functions = ["parse"]
supported_features = ["unicode"]
"#
    )
    .unwrap();
    let decl = load_declaration(file.path()).unwrap();
    assert!(decl.has_feature("unicode"));
    assert_eq!(decl.variant_choice, "proposed_behavior");
}

#[test]
fn malformed_declaration_names_the_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = load_declaration(file.path()).unwrap_err();
    match &err {
        ConfigError::ParseError { path, .. } => {
            assert_eq!(path, &file.path().display().to_string());
        }
        other => panic!("expected ParseError, got {other:?}"),
    }
}

#[test]
fn config_file_with_embedded_implementation_validates() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
source_dir = "src-tests"
log_level = "warn"

[implementation]
name = "ccl-rs"
supported_functions = ["parse", "filter"]
supported_features = ["comments"]
"#
    )
    .unwrap();
    let cfg = load_config(Some(file.path())).unwrap();
    let warnings = validate_config(&cfg).unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");
    assert!(cfg.source_path().ends_with("src-tests"));
}
