use std::path::{Path, PathBuf};

use schemac_core::SchemaCompiler;
use schemac_store::{SchemaStore, StoreConfig, StoreError};
use serde_json::json;

const ADDRESS: &str = r#"{
    "$id": "http://example.com/address.json",
    "type": "object",
    "properties": {"city": {"type": "string"}},
    "required": ["city"]
}"#;

const PERSON: &str = r#"{
    "$id": "http://example.com/person.json",
    "type": "object",
    "properties": {
        "name": {"type": "string"},
        "address": {"$ref": "address.json"}
    },
    "required": ["name"]
}"#;

fn make_temp_schema_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "schemac-store-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_schema(dir: &Path, file_name: &str, contents: &str) {
    std::fs::write(dir.join(file_name), contents.as_bytes()).unwrap();
}

#[test]
fn loads_directory_and_resolves_cross_document_refs() {
    let dir = make_temp_schema_dir("cross-refs");
    write_schema(&dir, "address.schema.json", ADDRESS);
    write_schema(&dir, "person.schema.json", PERSON);
    write_schema(&dir, "notes.json", "not even json");

    let store = SchemaStore::from_directory(&dir).unwrap();
    assert_eq!(store.len(), 2);

    let mut compiler = SchemaCompiler::default();
    let keys = store.install(&mut compiler).unwrap();
    assert_eq!(keys.len(), 2);

    let person = compiler
        .get_schema("http://example.com/person.json")
        .unwrap()
        .unwrap();
    assert!(person.is_valid(&json!({"name": "Ada", "address": {"city": "London"}})));

    let errors = person
        .validate(&json!({"name": "Ada", "address": {}}))
        .unwrap_err()
        .into_errors();
    assert_eq!(errors[0].keyword, "required");
    assert_eq!(errors[0].data_path, "/address");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn documents_without_id_use_file_stem() {
    let dir = make_temp_schema_dir("stem");
    write_schema(&dir, "port.schema.json", r#"{"type": "integer", "minimum": 1}"#);

    let store = SchemaStore::from_directory(&dir).unwrap();
    assert_eq!(store.keys().collect::<Vec<_>>(), vec!["port"]);

    let mut compiler = SchemaCompiler::default();
    store.install(&mut compiler).unwrap();
    let port = compiler.get_schema("port").unwrap().unwrap();
    assert!(!port.is_valid(&json!(0)));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failed_install_leaves_compiler_untouched() {
    let mut store = SchemaStore::new();
    store.insert("a", "{}").unwrap();
    store.insert("b", "{}").unwrap();

    let mut compiler = SchemaCompiler::default();
    compiler.add_schema(json!({}), Some("b")).unwrap();

    let err = store.install(&mut compiler).unwrap_err();
    assert!(matches!(err, StoreError::Schema(_)));
    assert_eq!(compiler.schema_keys().count(), 1);
}

#[test]
fn strict_mode_rejects_undeclared_properties() {
    let dir = make_temp_schema_dir("strict");
    write_schema(&dir, "address.schema.json", ADDRESS);

    let config = StoreConfig {
        strict_mode: true,
        ..StoreConfig::default()
    };
    let store = SchemaStore::from_directory_with_config(&dir, config).unwrap();
    let mut compiler = SchemaCompiler::default();
    store.install(&mut compiler).unwrap();

    let address = compiler
        .get_schema("http://example.com/address.json")
        .unwrap()
        .unwrap();
    assert!(address.is_valid(&json!({"city": "Oslo"})));
    assert!(!address.is_valid(&json!({"city": "Oslo", "zip": "0150"})));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn schema_count_limit_is_enforced() {
    let dir = make_temp_schema_dir("count-limit");
    write_schema(&dir, "a.schema.json", "{}");
    write_schema(&dir, "b.schema.json", "{}");

    let config = StoreConfig {
        max_schemas: 1,
        ..StoreConfig::default()
    };
    let result = SchemaStore::from_directory_with_config(&dir, config);
    assert!(matches!(result, Err(StoreError::LoadFailed(_))));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn schema_file_size_limit_is_enforced() {
    let dir = make_temp_schema_dir("size-limit");
    write_schema(&dir, "address.schema.json", ADDRESS);

    let config = StoreConfig {
        max_file_size: 8,
        ..StoreConfig::default()
    };
    let result = SchemaStore::from_directory_with_config(&dir, config);
    assert!(matches!(result, Err(StoreError::LoadFailed(_))));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_json_file_fails() {
    let dir = make_temp_schema_dir("invalid-json");
    write_schema(&dir, "broken.schema.json", "{\"type\":");

    let result = SchemaStore::from_directory(&dir);
    assert!(matches!(result, Err(StoreError::InvalidJson { .. })));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_directory_fails() {
    let dir = std::env::temp_dir().join("schemac-store-does-not-exist");
    assert!(matches!(
        SchemaStore::from_directory(&dir),
        Err(StoreError::LoadFailed(_))
    ));
}

#[cfg(unix)]
#[test]
fn symlinked_schema_is_rejected() {
    let dir = make_temp_schema_dir("symlink");
    let target = dir.join("target.json");
    std::fs::write(&target, ADDRESS.as_bytes()).unwrap();
    std::os::unix::fs::symlink(&target, dir.join("address.schema.json")).unwrap();

    let result = SchemaStore::from_directory(&dir);
    assert!(matches!(result, Err(StoreError::LoadFailed(_))));

    let _ = std::fs::remove_dir_all(&dir);
}
