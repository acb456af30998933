//! Scenario tests for multi-step synchronization workflows.

use std::fs;

use assert_fs::prelude::*;
use predicates::prelude::*;
use pretty_assertions::assert_eq;

use datakit_manifest::{InitParams, Project};
use datakit_sync::{AddOptions, ChangeOptions, RemoteAdapter, SyncEngine};
use datakit_test_utils::{MemoryAdapter, TestProject};

/// Two working copies of the same remote project stay in sync: one pushes,
/// a fresh clone pulls the whole tree down.
#[test]
fn test_fresh_clone_pulls_pushed_tree() {
    let adapter = MemoryAdapter::new();
    let remote = adapter.create_project("shared").unwrap();
    let uri = format!("syn:{}", remote.id);

    let origin = TestProject::with_project_uri(&uri);
    origin.write_file("data/core/batch/a.csv", "a\n");
    origin.write_file("data/core/batch/sub/c.csv", "c\n");
    let (_origin_tmp, origin_project) = origin.into_parts();
    let mut pusher = SyncEngine::new(origin_project, Box::new(adapter.clone()));
    pusher
        .data_add("data/core/batch", AddOptions::default())
        .unwrap();
    pusher.data_push_all().unwrap();

    let batch_uri = pusher.project().resources[0].remote_uri.clone().unwrap();

    // The clone starts empty and only knows the remote URI.
    let clone_dir = assert_fs::TempDir::new().unwrap();
    let clone_project = Project::init(
        clone_dir.path(),
        InitParams {
            title: Some("shared".to_string()),
            project_uri: Some(uri),
            ..Default::default()
        },
    )
    .unwrap();
    let mut puller = SyncEngine::new(clone_project, Box::new(adapter));
    puller
        .data_add(&batch_uri, AddOptions::default())
        .unwrap();
    puller.data_pull(&batch_uri).unwrap().unwrap();

    clone_dir
        .child("data/core/batch/a.csv")
        .assert(predicate::path::is_file());
    clone_dir
        .child("data/core/batch/sub/c.csv")
        .assert(predicate::str::contains("c"));
    assert_eq!(puller.project().resources.len(), 4);
}

/// A pinned version pulls old content; clearing the pin pulls the latest.
#[test]
fn test_version_pin_round_trip() {
    let adapter = MemoryAdapter::new();
    let remote = adapter.create_project("pinning").unwrap();

    let test = TestProject::with_project_uri(&format!("syn:{}", remote.id));
    test.write_file("data/core/f.csv", "one\n");
    let (_tmp, project) = test.into_parts();
    let mut engine = SyncEngine::new(project, Box::new(adapter.clone()));

    engine
        .data_add("data/core/f.csv", AddOptions::default())
        .unwrap();
    engine.data_push("data/core/f.csv").unwrap().unwrap();

    let root = engine.project().root().to_path_buf();
    fs::write(root.join("data/core/f.csv"), "two\n").unwrap();
    engine.data_push("data/core/f.csv").unwrap().unwrap();

    engine
        .data_change(
            "data/core/f.csv",
            ChangeOptions {
                version: Some("1".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    engine.data_pull("data/core/f.csv").unwrap().unwrap();
    assert_eq!(fs::read(root.join("data/core/f.csv")).unwrap(), b"one\n");

    engine
        .data_change(
            "data/core/f.csv",
            ChangeOptions {
                clear_version: true,
                ..Default::default()
            },
        )
        .unwrap();
    engine.data_pull("data/core/f.csv").unwrap().unwrap();
    assert_eq!(fs::read(root.join("data/core/f.csv")).unwrap(), b"two\n");
}

/// Ignore patterns keep scratch files out of the missing-resource report.
#[test]
fn test_missing_resources_with_custom_ignores() {
    let mut test = TestProject::new();
    test.write_file("data/core/keep.csv", "a\n");
    test.write_file("data/core/scratch.tmp", "b\n");
    test.write_file("data/core/run.log", "c\n");
    test.write_file("results/summary.txt", "d\n");
    test.project_mut().add_data_ignore("*.log");
    test.project_mut().save().unwrap();

    let (_tmp, project) = test.into_parts();
    let root = project.root().to_path_buf();
    let engine = SyncEngine::new(project, Box::new(MemoryAdapter::new()));

    // *.tmp is a built-in default, *.log was added above.
    let missing = engine.find_missing_resources().unwrap();
    assert_eq!(
        missing,
        vec![
            root.join("data/core/keep.csv"),
            root.join("results/summary.txt"),
        ]
    );
}

/// Adding everything the detector reports leaves nothing missing.
#[test]
fn test_detect_then_track_converges() {
    let test = TestProject::new();
    test.write_file("data/core/a.csv", "a\n");
    test.write_file("results/out.txt", "r\n");
    let (_tmp, project) = test.into_parts();
    let mut engine = SyncEngine::new(project, Box::new(MemoryAdapter::new()));

    let missing = engine.find_missing_resources().unwrap();
    assert_eq!(missing.len(), 2);
    for path in missing {
        engine
            .data_add(path.to_str().unwrap(), AddOptions::default())
            .unwrap();
    }

    assert!(engine.find_missing_resources().unwrap().is_empty());
    assert_eq!(engine.project().resources.len(), 2);
}
