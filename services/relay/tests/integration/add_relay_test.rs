use std::time::Duration;

use bytes::Bytes;
use chrono::{TimeZone, Utc};

use xgds_domain::queue::DEFAULT_RELAY_CHANNEL;
use xgds_relay::domain::types::{RELAY_DELAY_CONSTANT, RELAY_PATH, RelayUpload};
use xgds_relay::usecase::guard::{ShardCheckPolicy, ShardGuard};
use xgds_relay::usecase::relay::{AddRelayInput, AddRelayUseCase};

use crate::helpers::{
    MemoryQueue, MockConstants, MockFileStore, MockRelayEventRepo, MockShardInfo, TEST_HOSTNAME,
    TestNote,
};

type TestAddRelay =
    AddRelayUseCase<MockRelayEventRepo, MockFileStore, MockConstants, MockShardInfo, MemoryQueue>;

struct Fixture {
    usecase: TestAddRelay,
    events: MockRelayEventRepo,
    queue: MemoryQueue,
}

fn fixture_with(shard: MockShardInfo, policy: ShardCheckPolicy, constants: MockConstants) -> Fixture {
    let events = MockRelayEventRepo::new();
    let queue = MemoryQueue::new();
    let usecase = AddRelayUseCase {
        events: events.clone(),
        files: MockFileStore::new(),
        constants,
        guard: ShardGuard { shard, policy },
        queue: queue.clone(),
        relay_channel: DEFAULT_RELAY_CHANNEL.to_owned(),
        hostname: TEST_HOSTNAME.to_owned(),
    };
    Fixture {
        usecase,
        events,
        queue,
    }
}

fn fixture(shard: MockShardInfo) -> Fixture {
    fixture_with(shard, ShardCheckPolicy::FailOpen, MockConstants::empty())
}

fn note_input(pk: i64) -> AddRelayInput {
    AddRelayInput::for_record(
        &TestNote {
            pk,
            event_time: None,
        },
        format!(r#"{{"content": "note {pk}"}}"#),
        RELAY_PATH.to_owned(),
    )
}

fn upload(key: &str, name: &str) -> RelayUpload {
    RelayUpload {
        file_key: key.to_owned(),
        file_name: name.to_owned(),
        bytes: Bytes::from_static(b"jpeg"),
    }
}

// ── dedup ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reuse_pending_event_for_repeated_adds() {
    let f = fixture(MockShardInfo::unsharded());

    let first = f
        .usecase
        .execute(note_input(13).with_files(vec![upload("image", "a.jpg")]))
        .await
        .unwrap()
        .unwrap();
    let second = f
        .usecase
        .execute(note_input(13).with_files(vec![upload("thumbnail", "b.jpg")]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(f.events.count(), 1);
    assert_eq!(f.events.files.lock().unwrap().len(), 2);
    assert_eq!(
        f.queue.entries(DEFAULT_RELAY_CHANNEL),
        vec![format!(r#"{{"relay_event_pk": {}}}"#, first.id)]
    );
    let stored = f.events.get(first.id).unwrap();
    assert!(stored.relay_start_time.is_some());
    assert_eq!(stored.hostname, TEST_HOSTNAME);
}

#[tokio::test]
async fn should_create_separate_events_for_different_records() {
    let f = fixture(MockShardInfo::unsharded());

    f.usecase.execute(note_input(13)).await.unwrap();
    f.usecase.execute(note_input(23)).await.unwrap();

    assert_eq!(f.events.count(), 2);
    assert_eq!(f.queue.entries(DEFAULT_RELAY_CHANNEL).len(), 2);
}

#[tokio::test]
async fn should_never_reuse_events_for_updates() {
    let f = fixture(MockShardInfo::unsharded());

    let a = f.usecase.execute(note_input(13).update()).await.unwrap().unwrap();
    let b = f.usecase.execute(note_input(13).update()).await.unwrap().unwrap();

    assert_ne!(a.id, b.id);
    assert!(a.is_update && b.is_update);
    assert_eq!(f.queue.entries(DEFAULT_RELAY_CHANNEL).len(), 2);
}

// ── echo guard ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_not_relay_record_minted_by_another_site() {
    let f = fixture(MockShardInfo::sharded(3, 10));

    let result = f.usecase.execute(note_input(14)).await.unwrap();

    assert!(result.is_none());
    assert_eq!(f.events.count(), 0);
    assert!(f.queue.entries(DEFAULT_RELAY_CHANNEL).is_empty());
}

#[tokio::test]
async fn should_relay_record_minted_locally() {
    let f = fixture(MockShardInfo::sharded(3, 10));

    let result = f.usecase.execute(note_input(13)).await.unwrap();

    assert!(result.is_some());
    assert_eq!(f.queue.entries(DEFAULT_RELAY_CHANNEL).len(), 1);
}

#[tokio::test]
async fn should_relay_updates_of_foreign_records() {
    let f = fixture(MockShardInfo::sharded(3, 10));

    let event = f.usecase.execute(note_input(14).update()).await.unwrap().unwrap();

    assert!(event.is_update);
    assert_eq!(f.events.count(), 1);
}

#[tokio::test]
async fn should_fail_open_when_shard_settings_unreadable() {
    let f = fixture(MockShardInfo::unavailable());

    assert!(f.usecase.execute(note_input(14)).await.unwrap().is_some());
}

#[tokio::test]
async fn should_fail_closed_when_configured() {
    let f = fixture_with(
        MockShardInfo::unavailable(),
        ShardCheckPolicy::FailClosed,
        MockConstants::empty(),
    );

    assert!(f.usecase.execute(note_input(14)).await.unwrap().is_none());
    assert_eq!(f.events.count(), 0);
}

// ── broadcast / fire ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_store_without_queueing_when_not_broadcast() {
    let f = fixture(MockShardInfo::unsharded());

    let event = f
        .usecase
        .execute(note_input(13).without_broadcast())
        .await
        .unwrap()
        .unwrap();

    assert!(f.queue.entries(DEFAULT_RELAY_CHANNEL).is_empty());
    assert!(f.events.get(event.id).unwrap().relay_start_time.is_none());

    // A later broadcast add of the same record fires the stored event.
    let again = f.usecase.execute(note_input(13)).await.unwrap().unwrap();
    assert_eq!(again.id, event.id);
    assert_eq!(f.queue.entries(DEFAULT_RELAY_CHANNEL).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn should_defer_fire_by_configured_delay() {
    let f = fixture_with(
        MockShardInfo::unsharded(),
        ShardCheckPolicy::FailOpen,
        MockConstants::with(RELAY_DELAY_CONSTANT, "5"),
    );

    let event = f.usecase.execute(note_input(13)).await.unwrap().unwrap();
    assert!(f.queue.entries(DEFAULT_RELAY_CHANNEL).is_empty());

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(f.queue.entries(DEFAULT_RELAY_CHANNEL).is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(f.queue.entries(DEFAULT_RELAY_CHANNEL).len(), 1);
    assert!(f.events.get(event.id).unwrap().relay_start_time.is_some());
}

#[tokio::test]
async fn should_fire_immediately_for_non_positive_delay() {
    let f = fixture_with(
        MockShardInfo::unsharded(),
        ShardCheckPolicy::FailOpen,
        MockConstants::with(RELAY_DELAY_CONSTANT, "0"),
    );

    f.usecase.execute(note_input(13)).await.unwrap();

    assert_eq!(f.queue.entries(DEFAULT_RELAY_CHANNEL).len(), 1);
}

#[tokio::test]
async fn should_keep_record_acquisition_time() {
    let f = fixture(MockShardInfo::unsharded());
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let input = AddRelayInput::for_record(
        &TestNote {
            pk: 13,
            event_time: Some(at),
        },
        "{}".to_owned(),
        RELAY_PATH.to_owned(),
    );

    let event = f.usecase.execute(input).await.unwrap().unwrap();

    assert_eq!(event.acquisition_time, Some(at));
}
