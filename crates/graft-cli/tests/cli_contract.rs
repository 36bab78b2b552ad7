// SPDX-License-Identifier: Apache-2.0

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn graft() -> Command {
    Command::new(env!("CARGO_BIN_EXE_graft"))
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("json stdout")
}

#[test]
fn id_encode_prints_the_opaque_identifier() {
    graft()
        .args(["id", "encode", "User", "42"])
        .assert()
        .success()
        .stdout("kz45VFVzZXI6NDI\n");
}

#[test]
fn id_decode_roundtrips_in_json_mode() {
    let output = graft()
        .args(["--json", "id", "decode", "kz45VFVzZXI6NDI"])
        .output()
        .expect("run decode");
    assert!(output.status.success());
    let payload = stdout_json(&output);
    assert_eq!(payload["type_name"], "User");
    assert_eq!(payload["local_id"], "42");
}

#[test]
fn id_decode_rejects_truncated_identifier_with_validation_exit() {
    let output = graft()
        .args(["--json", "id", "decode", "kz45VFVzZXI6ND"])
        .output()
        .expect("run decode");
    assert_eq!(output.status.code(), Some(3));
    let err: Value = serde_json::from_slice(&output.stderr).expect("json stderr");
    assert_eq!(err["code"], "InvalidIdentifier");
}

#[test]
fn id_encode_rejects_type_names_with_the_delimiter() {
    graft()
        .args(["id", "encode", "Us:er", "1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("InvalidIdentifier"));
}

#[test]
fn id_commands_accept_only_declared_types() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tags.json");
    std::fs::write(
        &path,
        r#"{"types": [{"type_name": "Tag", "fields": [
    {"name": "label", "kind": "string", "nullable": false, "updatable": true, "required_on_create": true}
  ]}]}"#,
    )
    .expect("write declaration");

    let output = graft()
        .args(["--json", "id", "decode", "kz45VFVzZXI6NDI", "--declaration"])
        .arg(&path)
        .output()
        .expect("run decode");
    assert_eq!(output.status.code(), Some(3));
    let err: Value = serde_json::from_slice(&output.stderr).expect("json stderr");
    assert_eq!(err["code"], "InvalidIdentifier");
    assert_eq!(err["details"]["reason"], "unknown_type");

    graft()
        .args(["id", "encode", "Invoice", "7"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("InvalidIdentifier"));

    let encoded = graft()
        .args(["id", "encode", "Tag", "7", "--declaration"])
        .arg(&path)
        .output()
        .expect("run encode");
    assert!(encoded.status.success());
    let opaque = String::from_utf8(encoded.stdout).expect("utf8");
    graft()
        .args(["--json", "id", "decode", opaque.trim(), "--declaration"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type_name\":\"Tag\""));
}

#[test]
fn registry_check_accepts_the_bundled_declaration() {
    let output = graft()
        .args(["--json", "registry", "check"])
        .output()
        .expect("run check");
    assert!(output.status.success());
    let payload = stdout_json(&output);
    assert_eq!(payload["status"], "ok");
    let fields: Vec<&str> = payload["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(fields.contains(&"Mutation.createPost"));
    assert!(fields.contains(&"User.displayName"));
}

#[test]
fn registry_check_reports_missing_and_orphan_resolvers_together() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("declaration.json");
    std::fs::write(
        &path,
        r#"{
  "types": [{"type_name": "Tag", "fields": [
    {"name": "label", "kind": "string", "nullable": false, "updatable": true, "required_on_create": true}
  ]}],
  "fields": ["Query.tag", "Query.tags", "Mutation.createTag", "Query.search"]
}"#,
    )
    .expect("write declaration");
    let output = graft()
        .args(["--json", "registry", "check"])
        .arg(&path)
        .output()
        .expect("run check");
    assert_eq!(output.status.code(), Some(3));
    let err: Value = serde_json::from_slice(&output.stderr).expect("json stderr");
    assert_eq!(err["code"], "MissingResolver");
    assert_eq!(err["details"]["count"], "2");
    let listed = err["details"]["violations"].as_str().expect("violations");
    assert!(listed.contains("MissingResolver(Query.search)"));
    assert!(listed.contains("OrphanResolver(update:Tag -> Mutation.updateTag)"));
}

#[test]
fn registry_check_rejects_unparseable_declarations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\"types\": 3}").expect("write declaration");
    graft()
        .args(["registry", "check"])
        .arg(&path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("declaration parse failed"));
}

#[test]
fn explain_list_uses_the_sort_index() {
    let output = graft()
        .args(["--json", "explain-list", "--type", "Post", "--sort-by", "title"])
        .output()
        .expect("run explain");
    assert!(output.status.success());
    let payload = stdout_json(&output);
    let plan = payload["plan"].as_array().expect("plan");
    assert!(plan
        .iter()
        .filter_map(Value::as_str)
        .any(|line| line.contains("idx_Post_title")));
}

#[test]
fn explain_list_refuses_float_sort_keys() {
    graft()
        .args(["explain-list", "--type", "Post", "--sort-by", "rating"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not sortable"));
}

#[test]
fn unknown_flag_returns_usage_exit_code_with_machine_error() {
    let output = graft()
        .args(["--json", "--unknown-flag"])
        .output()
        .expect("run bad cli");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    assert!(stderr.contains("InvalidArguments"));
}
