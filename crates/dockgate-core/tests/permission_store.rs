// crates/dockgate-core/tests/permission_store.rs
// ============================================================================
// Module: Permission Store Tests
// Description: Tests for self-healing load and role mutation semantics.
// Purpose: Ensure corruption heals to defaults and write failures surface.
// Dependencies: dockgate-core, serde_json, tempfile, tokio
// ============================================================================

//! ## Overview
//! Exercises [`dockgate_core::PermissionStore`] over the file backend and the
//! in-memory backend, including corrupt documents and failing writes.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::sync::Arc;

use dockgate_core::Action;
use dockgate_core::FilePermissionBackend;
use dockgate_core::InMemoryPermissionBackend;
use dockgate_core::PermissionError;
use dockgate_core::PermissionStore;
use dockgate_core::StoreError;
use dockgate_core::UnknownActionError;
use serde_json::Value;
use serde_json::json;

fn defaults() -> Vec<String> {
    vec!["ServerAdmin".to_string()]
}

fn file_store(path: &std::path::Path) -> PermissionStore {
    PermissionStore::new(Arc::new(FilePermissionBackend::new(path)), defaults())
}

/// Verifies a missing file is created with defaults on first load.
#[test]
fn missing_document_is_created_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("permissions.json");
    let store = file_store(&path);

    let set = store.load();
    for action in Action::ALL {
        assert_eq!(set.roles(action), ["ServerAdmin".to_string()]);
    }
    let written: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(written["announce"], json!(["ServerAdmin"]));
}

/// Verifies a corrupt document heals to defaults and is rewritten.
#[test]
fn corrupt_document_heals_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("permissions.json");
    fs::write(&path, b"{not json").unwrap();
    let store = file_store(&path);

    let set = store.load();
    assert_eq!(set.roles(Action::Stop), ["ServerAdmin".to_string()]);

    let rewritten = fs::read_to_string(&path).unwrap();
    let document: Value = serde_json::from_str(&rewritten).unwrap();
    assert_eq!(document["stop"], json!(["ServerAdmin"]));
    assert!(rewritten.contains("\n  \""), "document is indented by two spaces");
}

/// Verifies a wrongly shaped entry counts as corruption.
#[test]
fn wrongly_shaped_entry_heals_to_defaults() {
    let backend = InMemoryPermissionBackend::with_document(br#"{"start": "Ops"}"#.to_vec());
    let store = PermissionStore::new(Arc::new(backend.clone()), defaults());
    assert_eq!(store.load().roles(Action::Start), ["ServerAdmin".to_string()]);
    let stored: Value = serde_json::from_slice(&backend.snapshot().unwrap()).unwrap();
    assert_eq!(stored["start"], json!(["ServerAdmin"]));
}

/// Verifies read failures self-heal instead of surfacing.
#[test]
fn read_failure_is_treated_as_absent() {
    let backend = InMemoryPermissionBackend::new();
    backend.set_fail_reads(true);
    let store = PermissionStore::new(Arc::new(backend.clone()), defaults());
    assert_eq!(store.load().roles(Action::Restart), ["ServerAdmin".to_string()]);
    assert!(backend.snapshot().is_some());
}

/// Verifies add is idempotent and remove restores the original set.
#[test]
fn add_is_idempotent_and_remove_restores() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir.path().join("permissions.json"));
    let original = store.list();

    assert!(store.add_role("start", "Moderator").unwrap());
    assert!(!store.add_role("start", "Moderator").unwrap());
    let roles = store.list().roles(Action::Start).to_vec();
    assert_eq!(roles.iter().filter(|role| *role == "Moderator").count(), 1);

    assert!(store.remove_role("start", "Moderator").unwrap());
    assert!(!store.remove_role("start", "Moderator").unwrap());
    assert_eq!(store.list(), original);
}

/// Verifies role names may contain spaces and are trimmed.
#[test]
fn role_names_with_spaces_are_kept() {
    let store = PermissionStore::new(Arc::new(InMemoryPermissionBackend::new()), defaults());
    store.add_role("announce", "  Event Staff ").unwrap();
    assert!(store.list().roles(Action::Announce).contains(&"Event Staff".to_string()));
}

/// Verifies unknown actions and blank roles are rejected before any write.
#[test]
fn invalid_inputs_are_rejected() {
    let backend = InMemoryPermissionBackend::new();
    let store = PermissionStore::new(Arc::new(backend.clone()), defaults());
    assert_eq!(
        store.add_role("delete", "Ops"),
        Err(PermissionError::UnknownAction(UnknownActionError("delete".to_string())))
    );
    assert_eq!(store.remove_role("stop", "   "), Err(PermissionError::InvalidRole));
    assert!(backend.snapshot().is_none());
}

/// Verifies write failures are surfaced to the caller.
#[test]
fn write_failure_is_reported() {
    let backend = InMemoryPermissionBackend::new();
    let store = PermissionStore::new(Arc::new(backend.clone()), defaults());
    let _ = store.load();
    backend.set_fail_writes(true);
    let err = store.add_role("stop", "Ops").unwrap_err();
    assert!(matches!(err, PermissionError::Io(StoreError::Io(_))));
}

/// Verifies unknown document keys survive a mutation.
#[test]
fn unknown_keys_survive_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("permissions.json");
    fs::write(&path, br#"{"start": ["Ops"], "backup": ["Archivist"]}"#).unwrap();
    let store = file_store(&path);

    store.add_role("stop", "Ops").unwrap();
    let document: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(document["backup"], json!(["Archivist"]));
    assert_eq!(document["start"], json!(["Ops"]));
    assert_eq!(document["stop"], json!(["Ops"]));
}

/// Verifies the async variants read and write the same document as the
/// synchronous calls.
#[tokio::test(flavor = "current_thread")]
async fn async_access_matches_synchronous_calls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("permissions.json");
    let store = Arc::new(file_store(&path));

    let loaded = store.load_async().await;
    assert_eq!(loaded.roles(Action::Stop), ["ServerAdmin".to_string()]);
    assert!(path.exists());

    assert!(store.add_role_async("stop", "Ops").await.unwrap());
    assert!(!store.add_role_async("stop", "Ops").await.unwrap());
    assert!(store.list().roles(Action::Stop).contains(&"Ops".to_string()));
    assert_eq!(
        store.remove_role_async("delete", "Ops").await,
        Err(PermissionError::UnknownAction(UnknownActionError("delete".to_string())))
    );
    assert!(store.remove_role_async("stop", "Ops").await.unwrap());
    assert_eq!(store.load_async().await, loaded);
}
