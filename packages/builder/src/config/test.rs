use std::path::Path;

use super::src::project::parse_build_configuration;
use compiler_api::ModuleKind;

#[test]
fn test_parses_files_and_options() {
    let content = r#"{
        "files": ["a.ts", "b.ts"],
        "compilerOptions": {
            "module": "es2015",
            "strict": true,
            "outDir": "dist"
        }
    }"#;
    let parsed = parse_build_configuration(content, "proj/buildconfig.json", Path::new("/proj"));

    assert!(parsed.errors.is_empty());
    assert_eq!(parsed.root_names, vec!["/proj/a.ts", "/proj/b.ts"]);
    assert_eq!(parsed.options.module, Some(ModuleKind::ES2015));
    assert_eq!(parsed.options.strict, Some(true));
    assert_eq!(parsed.options.out_dir.as_deref(), Some("dist"));
}

#[test]
fn test_out_file_enables_bundled_output() {
    let content = r#"{"compilerOptions": {"outFile": "bundle.js"}}"#;
    let parsed = parse_build_configuration(content, "buildconfig.json", Path::new("/"));

    assert_eq!(parsed.options.bundled_output(), Some("bundle.js"));
}

#[test]
fn test_tolerates_comment_lines() {
    let content = r#"{
        // bundled build for release
        "compilerOptions": {
            "out": "release.js"
        }
    }"#;
    let parsed = parse_build_configuration(content, "buildconfig.json", Path::new("/"));

    assert!(parsed.errors.is_empty());
    assert_eq!(parsed.options.bundled_output(), Some("release.js"));
}

#[test]
fn test_malformed_json_becomes_diagnostic() {
    let parsed = parse_build_configuration("{ not json", "buildconfig.json", Path::new("/"));

    assert_eq!(parsed.errors.len(), 1);
    assert!(parsed.errors[0].is_error());
    assert!(parsed.root_names.is_empty());
}

#[test]
fn test_unknown_module_value_becomes_diagnostic() {
    let content = r#"{"compilerOptions": {"module": "umd2"}}"#;
    let parsed = parse_build_configuration(content, "buildconfig.json", Path::new("/"));

    assert_eq!(parsed.errors.len(), 1);
    assert!(parsed.errors[0].message.contains("umd2"));
    assert_eq!(parsed.options.module, None);
}

#[test]
fn test_default_include_and_exclude_patterns() {
    let parsed = parse_build_configuration("{}", "buildconfig.json", Path::new("/"));

    assert_eq!(parsed.include, vec!["**/*.ts"]);
    assert_eq!(parsed.exclude, vec!["**/node_modules/**"]);
}
