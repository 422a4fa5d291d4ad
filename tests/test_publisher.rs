//! Publisher state machine tests
//!
//! Exercises the fetch-or-create reconciliation against a mock chat
//! platform: exactly one live leaderboard message at all times, edits
//! in place while the reference is valid, and recreation when the
//! referenced message disappears.

mod common;

use common::MockChatClient;
use modboard::publisher::publish;
use modboard::state::TrackerState;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;

const CHANNEL: &str = "leaderboard-channel";

fn snapshot_path(dir: &tempfile::TempDir) -> String {
    dir.path()
        .join("moderatorData.json")
        .to_string_lossy()
        .into_owned()
}

fn shared_state(state: TrackerState) -> Arc<RwLock<TrackerState>> {
    Arc::new(RwLock::new(state))
}

#[tokio::test]
async fn first_publish_creates_exactly_one_message() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockChatClient::new();
    let state = shared_state(TrackerState::new());

    publish(&state, &client, CHANNEL, &snapshot_path(&dir))
        .await
        .unwrap();

    assert_eq!(client.sends(), 1);
    assert_eq!(client.message_count(), 1);
    let state = state.read().await;
    assert!(state.leaderboard_message_id().is_some());
}

#[tokio::test]
async fn second_publish_edits_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockChatClient::new();
    let state = shared_state(TrackerState::new());
    let path = snapshot_path(&dir);

    publish(&state, &client, CHANNEL, &path).await.unwrap();
    let first_id = state
        .read()
        .await
        .leaderboard_message_id()
        .unwrap()
        .to_string();

    state.write().await.record_activity("mod_a");
    publish(&state, &client, CHANNEL, &path).await.unwrap();

    // No new message; the existing one was edited with fresh content
    assert_eq!(client.sends(), 1);
    assert_eq!(client.edits(), 1);
    assert_eq!(client.message_count(), 1);
    assert_eq!(
        state.read().await.leaderboard_message_id().unwrap(),
        first_id
    );

    let payload = client.payload_of(&first_id).unwrap();
    let ranking = &payload.embeds[0].fields.last().unwrap().value;
    assert!(ranking.contains("<@mod_a> - 1 points"));
}

#[tokio::test]
async fn vanished_message_is_recreated_once() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockChatClient::new();
    let state = shared_state(TrackerState::new());
    let path = snapshot_path(&dir);

    publish(&state, &client, CHANNEL, &path).await.unwrap();
    let first_id = state
        .read()
        .await
        .leaderboard_message_id()
        .unwrap()
        .to_string();

    // Someone deletes the leaderboard message out from under us
    client.delete_behind_back(&first_id);

    publish(&state, &client, CHANNEL, &path).await.unwrap();

    // Exactly one replacement; reference points at the new message
    assert_eq!(client.sends(), 2);
    assert_eq!(client.message_count(), 1);
    let new_id = state
        .read()
        .await
        .leaderboard_message_id()
        .unwrap()
        .to_string();
    assert_ne!(new_id, first_id);
    assert!(client.payload_of(&new_id).is_some());
}

#[tokio::test]
async fn stale_restored_reference_falls_back_to_create() {
    // Simulates startup recovery: the snapshot references a message the
    // channel no longer has
    let dir = tempfile::tempdir().unwrap();
    let client = MockChatClient::new();
    let mut restored = TrackerState::new();
    restored.set_leaderboard_message_id(Some("long-gone".to_string()));
    let state = shared_state(restored);

    publish(&state, &client, CHANNEL, &snapshot_path(&dir))
        .await
        .unwrap();

    assert_eq!(client.sends(), 1);
    assert_eq!(client.message_count(), 1);
    // Best-effort delete of the stale id was attempted (and ignored)
    assert_eq!(client.deletes(), 1);
    assert_ne!(
        state.read().await.leaderboard_message_id().unwrap(),
        "long-gone"
    );
}

#[tokio::test]
async fn transient_fetch_failure_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockChatClient::new();
    let state = shared_state(TrackerState::new());
    let path = snapshot_path(&dir);

    publish(&state, &client, CHANNEL, &path).await.unwrap();
    let first_id = state
        .read()
        .await
        .leaderboard_message_id()
        .unwrap()
        .to_string();

    // A 500-class failure is not NotFound: no recreation, reference kept
    client.fail_fetch.store(true, Ordering::SeqCst);
    let result = publish(&state, &client, CHANNEL, &path).await;
    assert!(result.is_err());
    assert_eq!(client.sends(), 1);
    assert_eq!(
        state.read().await.leaderboard_message_id().unwrap(),
        first_id
    );

    // Once the failure clears, the next publish self-heals via edit
    client.fail_fetch.store(false, Ordering::SeqCst);
    publish(&state, &client, CHANNEL, &path).await.unwrap();
    assert_eq!(client.sends(), 1);
    assert_eq!(client.edits(), 1);
}

#[tokio::test]
async fn created_reference_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockChatClient::new();
    let state = shared_state(TrackerState::new());
    let path = snapshot_path(&dir);

    publish(&state, &client, CHANNEL, &path).await.unwrap();

    let snapshot = modboard::persistence::load_snapshot(&path);
    assert_eq!(
        snapshot.leaderboard_message_id.as_deref(),
        state.read().await.leaderboard_message_id()
    );
}
