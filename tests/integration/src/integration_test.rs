//! End-to-end integration test for the vertical slice
//!
//! Exercises the complete flow: manifest init -> add -> push -> remove,
//! checking the persisted document at each step.

use std::fs;

use pretty_assertions::assert_eq;
use serde_json::Value;

use datakit_manifest::{MANIFEST_FILENAME, Project};
use datakit_sync::{AddOptions, RemoteAdapter, SyncEngine};
use datakit_test_utils::{MemoryAdapter, TestProject};

#[test]
fn test_init_scaffolds_data_type_directories() {
    let test = TestProject::new();

    test.assert_file_exists(MANIFEST_FILENAME);
    test.assert_file_exists("data/core");
    test.assert_file_exists("data/auxiliary");
    test.assert_file_exists("results");

    let document: Value = serde_json::from_str(&test.manifest_text()).unwrap();
    assert_eq!(document["title"], "test-project");
    assert_eq!(document["resources"], Value::Array(vec![]));
}

#[test]
fn test_add_push_remove_round_trip() {
    let adapter = MemoryAdapter::new();
    let remote = adapter.create_project("test-project").unwrap();

    let test = TestProject::with_project_uri(&format!("syn:{}", remote.id));
    test.write_file("data/core/f.csv", "a,b\n1,2\n");
    let (_tmp, project) = test.into_parts();
    let mut engine = SyncEngine::new(project, Box::new(adapter.clone()));

    // Add: the manifest records the classified resource.
    engine
        .data_add("data/core/f.csv", AddOptions::default())
        .unwrap();
    let manifest_path = Project::manifest_path(engine.project().root());
    let document: Value = serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    assert_eq!(document["resources"][0]["rel_path"], "data/core/f.csv");
    assert_eq!(document["resources"][0]["data_type"], "core");
    assert_eq!(document["resources"][0]["remote_uri"], Value::Null);

    // Push: the remote URI is persisted.
    engine.data_push("data/core/f.csv").unwrap().unwrap();
    let document: Value = serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    let uri = document["resources"][0]["remote_uri"].as_str().unwrap();
    assert!(uri.starts_with("syn:"));

    // The bytes made it into the store.
    let remote_file = adapter
        .child_named(
            &adapter
                .child_named(
                    &adapter.child_named(&remote.id, "data").unwrap().id,
                    "core",
                )
                .unwrap()
                .id,
            "f.csv",
        )
        .unwrap();
    assert_eq!(adapter.file_bytes(&remote_file.id).unwrap(), b"a,b\n1,2\n");

    // Remove: the resource array empties, the local file stays.
    engine.data_remove("data/core/f.csv").unwrap();
    let document: Value = serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    assert_eq!(document["resources"], Value::Array(vec![]));
    assert!(engine.project().root().join("data/core/f.csv").is_file());
}

#[test]
fn test_manifest_survives_reload() {
    let adapter = MemoryAdapter::new();
    let remote = adapter.create_project("test-project").unwrap();

    let test = TestProject::with_project_uri(&format!("syn:{}", remote.id));
    test.write_file("data/core/f.csv", "x\n");
    let (tmp, project) = test.into_parts();

    let mut engine = SyncEngine::new(project, Box::new(adapter.clone()));
    engine
        .data_add("data/core/f.csv", AddOptions::default())
        .unwrap();
    engine.data_push_all().unwrap();
    let saved = engine.into_project();

    let reloaded = Project::load(tmp.path()).unwrap();
    assert_eq!(saved, reloaded);

    // A reloaded project keeps working against the same remote.
    let mut engine = SyncEngine::new(reloaded, Box::new(adapter));
    fs::remove_file(tmp.path().join("data/core/f.csv")).unwrap();
    engine.data_pull_all().unwrap();
    assert_eq!(fs::read(tmp.path().join("data/core/f.csv")).unwrap(), b"x\n");
}
