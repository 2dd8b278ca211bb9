use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let options = CompilerOptions::default();
    assert!(!options.incrementalize);
    assert_eq!(options.function_name, "circuit");
}

#[test]
fn test_parse_partial_config() {
    let options = CompilerOptions::from_yaml_str("incrementalize: true\n").unwrap();
    assert!(options.incrementalize);
    assert_eq!(options.function_name, "circuit");
}

#[test]
fn test_unknown_field_rejected() {
    let err = CompilerOptions::from_yaml_str("incremental: true\n").unwrap_err();
    assert!(matches!(err, CompileError::Yaml(_)));
}

#[test]
fn test_invalid_function_name_rejected() {
    let err = CompilerOptions::from_yaml_str("function_name: 2fast\n").unwrap_err();
    assert!(matches!(err, CompileError::ConfigInvalid { .. }));
    let err = CompilerOptions::from_yaml_str("function_name: \"a-b\"\n").unwrap_err();
    assert!(err.to_string().contains("a-b"));
}

#[test]
fn test_load_from_dir_prefers_yml() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("zflow.yml"), "function_name: first\n").unwrap();
    fs::write(temp.path().join("zflow.yaml"), "function_name: second\n").unwrap();

    let options = CompilerOptions::load_from_dir(temp.path()).unwrap();
    assert_eq!(options.function_name, "first");
}

#[test]
fn test_load_from_dir_falls_back_to_yaml() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("zflow.yaml"),
        "incrementalize: true\nfunction_name: views\n",
    )
    .unwrap();

    let options = CompilerOptions::load_from_dir(temp.path()).unwrap();
    assert!(options.incrementalize);
    assert_eq!(options.function_name, "views");
}

#[test]
fn test_missing_config() {
    let temp = TempDir::new().unwrap();
    let err = CompilerOptions::load_from_dir(temp.path()).unwrap_err();
    assert!(matches!(err, CompileError::ConfigNotFound { .. }));

    let err = CompilerOptions::load(&temp.path().join("nope.yml")).unwrap_err();
    assert!(err.to_string().contains("nope.yml"));
}
