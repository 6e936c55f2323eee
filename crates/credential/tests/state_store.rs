//! Integration tests for the durable state store
//!
//! These tests run the store against real files in a temporary directory.

use chrono::{TimeDelta, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rotor_credential::prelude::*;
use rotor_credential::state::{HandoffState, PendingRemoval};
use rotor_credential::StorageError;

fn id(n: u128) -> CredentialId {
    CredentialId::from_uuid(uuid::Uuid::from_u128(n))
}

fn sample_state() -> RotationState {
    let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 0).unwrap();
    RotationState::Handoff(HandoffState {
        current: Some(id(2)),
        pending_removals: vec![PendingRemoval {
            id: id(1),
            retire_at: t0 + TimeDelta::days(14),
        }],
        last_rotation: Some(t0),
    })
}

#[tokio::test]
async fn test_save_then_load() {
    // GIVEN: A store in an empty directory
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("uuid_state.json"));

    // WHEN: We save a state and load it back
    store.save(&sample_state()).await.unwrap();
    let loaded = store.load(RotationPolicy::Handoff).await.unwrap();

    // THEN: The loaded state equals the saved one
    assert_eq!(loaded, sample_state());
}

#[tokio::test]
async fn test_missing_file_is_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("absent.json"));

    let state = store.load(RotationPolicy::Accumulate).await.unwrap();

    assert_eq!(state, RotationState::empty(RotationPolicy::Accumulate));
}

#[tokio::test]
async fn test_corrupt_file_falls_back_to_empty_state() {
    // GIVEN: A state file with garbage in it
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("uuid_state.json");
    std::fs::write(&path, b"{ \"current_uuid\": \"not-a-uuid\" ").unwrap();
    let store = StateStore::new(&path);

    // WHEN: We load it
    let state = store.load(RotationPolicy::Handoff).await.unwrap();

    // THEN: The default state is returned and the file is left alone
    assert_eq!(state, RotationState::empty(RotationPolicy::Handoff));
    assert!(std::fs::read(&path).unwrap().starts_with(b"{ \"current_uuid\""));
}

#[tokio::test]
async fn test_load_strict_surfaces_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("uuid_state.json");
    std::fs::write(&path, br#"{ "active": [{ "uuid": "x" }] }"#).unwrap();

    let result = StateStore::new(&path)
        .load_strict(RotationPolicy::Accumulate)
        .await
        .unwrap();

    let err = result.unwrap_err();
    assert_eq!(err.path, path);
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("var").join("lib").join("rotor").join("state.json");
    let store = StateStore::new(&path);

    store.save(&sample_state()).await.unwrap();

    assert!(path.exists());
    let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(raw["current_uuid"], id(2).to_string());
}

#[tokio::test]
async fn test_save_overwrites_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));

    store.save(&RotationState::empty(RotationPolicy::Handoff)).await.unwrap();
    store.save(&sample_state()).await.unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["state.json".to_string()]);
    assert_eq!(store.load(RotationPolicy::Handoff).await.unwrap(), sample_state());
}

#[tokio::test]
async fn test_unreadable_state_is_storage_error() {
    // A directory where the file should be cannot be read as a file
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());

    let err = store.load(RotationPolicy::Handoff).await.unwrap_err();

    assert!(matches!(err, StorageError::ReadFailure { .. }), "{err:?}");
}

#[tokio::test]
async fn test_unwritable_state_is_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();
    let store = StateStore::new(blocker.join("state.json"));

    let err = store.save(&sample_state()).await.unwrap_err();

    assert!(matches!(err, StorageError::WriteFailure { .. }), "{err:?}");
}

#[tokio::test]
async fn test_state_of_other_policy_loads_without_its_records() {
    // GIVEN: A state file written under the handoff policy
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("uuid_state.json"));
    store.save(&sample_state()).await.unwrap();
    let bytes = std::fs::read(store.path()).unwrap();

    // WHEN: It is loaded for the accumulate policy
    let state = store.load(RotationPolicy::Accumulate).await.unwrap();

    // THEN: Only the shared field survives, and the dropped records are counted
    assert_eq!(state.policy(), RotationPolicy::Accumulate);
    assert!(state.tracked().is_empty());
    assert_eq!(state.last_rotation(), sample_state().last_rotation());
    assert_eq!(RotationState::foreign_records(&bytes, RotationPolicy::Accumulate), 2);
}
