use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const FRUIT_SCHEMA: &str = r##"{
    "title": "Fruit",
    "oneOf": [{ "$ref": "#/$defs/Apple" }],
    "discriminator": { "propertyName": "kind" },
    "$defs": {
        "Apple": {
            "type": "object",
            "properties": { "kind": { "const": "apple" }, "weight": { "type": "number" } }
        }
    }
}"##;

fn run(args: &[&OsStr]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_json-schema-classgen"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn json-schema-classgen")
}

fn write_schema(dir: &Path, text: &str) -> PathBuf {
    let path: PathBuf = dir.join("schema.json");
    fs::write(&path, text).expect("write schema");
    path
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf-8 stdout")
}

#[test]
fn generates_file_and_reports_success() {
    let dir: tempfile::TempDir = tempfile::tempdir().expect("tempdir");
    let schema: PathBuf = write_schema(dir.path(), FRUIT_SCHEMA);
    let out: PathBuf = dir.path().join("gen").join("fruit.rs");

    let output: Output = run(&[schema.as_os_str(), out.as_os_str()]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout_of(&output),
        format!("Rust types generated successfully at {}\n", out.display())
    );
    let generated: String = fs::read_to_string(&out).expect("read output");
    assert!(generated.starts_with("//! Generated by json-schema-classgen. Do not edit manually.\n"));
    assert!(generated.contains("\npub mod generated {\n"), "got:\n{generated}");
    assert!(generated.contains("    #[serde(tag = \"kind\")]\n    pub enum Fruit {"));
}

#[test]
fn empty_namespace_emits_items_at_top_level() {
    let dir: tempfile::TempDir = tempfile::tempdir().expect("tempdir");
    let schema: PathBuf = write_schema(dir.path(), FRUIT_SCHEMA);
    let out: PathBuf = dir.path().join("fruit.rs");

    let output: Output = run(&[
        schema.as_os_str(),
        out.as_os_str(),
        OsStr::new("-n"),
        OsStr::new(""),
    ]);

    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout_of(&output));
    let generated: String = fs::read_to_string(&out).expect("read output");
    assert!(!generated.contains("pub mod"), "got:\n{generated}");
    assert!(generated.contains("#[serde(tag = \"kind\")]\npub enum Fruit {"));
}

#[test]
fn namespace_wraps_items_in_modules() {
    let dir: tempfile::TempDir = tempfile::tempdir().expect("tempdir");
    let schema: PathBuf = write_schema(dir.path(), FRUIT_SCHEMA);
    let out: PathBuf = dir.path().join("fruit.rs");

    let output: Output = run(&[
        schema.as_os_str(),
        out.as_os_str(),
        OsStr::new("--namespace"),
        OsStr::new("Orchard.Fruit"),
    ]);

    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout_of(&output));
    let generated: String = fs::read_to_string(&out).expect("read output");
    assert!(generated.contains("pub mod orchard {\n    pub mod fruit {\n"));
    assert!(generated.ends_with("    }\n}\n"));
}

#[test]
fn invalid_schema_reports_error_and_exits_one() {
    let dir: tempfile::TempDir = tempfile::tempdir().expect("tempdir");
    let schema: PathBuf = write_schema(dir.path(), r#"{ "type": "string" }"#);
    let out: PathBuf = dir.path().join("out.rs");

    let output: Output = run(&[schema.as_os_str(), out.as_os_str()]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout_of(&output),
        "Error generating Rust code: Root schema must have type \"object\" or be a discriminated oneOf\n"
    );
    assert!(!out.exists(), "no output on failure");
}

#[test]
fn strict_flag_rejects_unsupported_keywords() {
    let dir: tempfile::TempDir = tempfile::tempdir().expect("tempdir");
    let schema: PathBuf = write_schema(
        dir.path(),
        r#"{ "type": "object", "properties": { "n": { "type": "integer", "multipleOf": 2 } } }"#,
    );
    let out: PathBuf = dir.path().join("out.rs");

    let lenient: Output = run(&[schema.as_os_str(), out.as_os_str()]);
    assert_eq!(lenient.status.code(), Some(0));

    let strict: Output = run(&[
        schema.as_os_str(),
        out.as_os_str(),
        OsStr::new("--deny-invalid-unknown-json-schema"),
    ]);
    assert_eq!(strict.status.code(), Some(1));
    let stdout: String = stdout_of(&strict);
    assert!(stdout.starts_with("Error generating Rust code: schema validation failed with 1 issue(s):"));
    assert!(stdout.contains("/properties/n/multipleOf: unsupported keyword \"multipleOf\""));
}

#[test]
fn missing_input_file_is_reported() {
    let dir: tempfile::TempDir = tempfile::tempdir().expect("tempdir");
    let missing: PathBuf = dir.path().join("nope.json");
    let out: PathBuf = dir.path().join("out.rs");

    let output: Output = run(&[missing.as_os_str(), out.as_os_str()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_of(&output).starts_with("Error generating Rust code: "));
}

#[test]
fn version_flag_prints_version() {
    let output: Output = run(&[OsStr::new("-v")]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout_of(&output),
        format!("json-schema-classgen {}\n", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn missing_arguments_are_a_usage_error() {
    let output: Output = run(&[]);
    assert_eq!(output.status.code(), Some(2));
}
