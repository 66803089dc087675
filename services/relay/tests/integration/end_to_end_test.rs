use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use xgds_core::shutdown;
use xgds_domain::content_type::ContentType;
use xgds_domain::id::RelayEventId;
use xgds_domain::queue::{Destination, QueueNames};
use xgds_relay::domain::types::{RELAY_PATH, RelayUpload};
use xgds_relay::infra::session::SessionRegistry;
use xgds_relay::router::relay_routes;
use xgds_relay::usecase::deliver::DeliverRelayUseCase;
use xgds_relay::usecase::guard::{ShardCheckPolicy, ShardGuard};
use xgds_relay::usecase::receive::HandlerRegistry;
use xgds_relay::usecase::relay::{AddRelayInput, AddRelayUseCase};
use xgds_relay::worker::dispatcher::Dispatcher;
use xgds_relay::worker::fanout::Fanout;
use xgds_relay::worker::supervisor::supervise;

use crate::helpers::{
    MemoryQueue, MockConstants, MockFileStore, MockRecordHandler, MockRelayEventRepo,
    MockShardInfo, TEST_HOSTNAME, TestNote, eventually, serve,
};

#[tokio::test]
async fn should_relay_local_change_to_remote_site() {
    // Receiving site.
    let handler = Arc::new(MockRecordHandler::new());
    let mut registry = HandlerRegistry::new();
    registry.register(ContentType::new("xgds_notes2", "note"), handler.clone());
    let remote = Destination::parse(&serve(relay_routes(Arc::new(registry))).await).unwrap();

    // Sending site.
    let events = MockRelayEventRepo::new();
    let files = MockFileStore::new();
    let queue = MemoryQueue::new();
    let queues = QueueNames::default();
    let add_relay = AddRelayUseCase {
        events: events.clone(),
        files: files.clone(),
        constants: MockConstants::empty(),
        guard: ShardGuard {
            shard: MockShardInfo::sharded(3, 10),
            policy: ShardCheckPolicy::FailOpen,
        },
        queue: queue.clone(),
        relay_channel: queues.relay_channel.clone(),
        hostname: TEST_HOSTNAME.to_owned(),
    };
    let fanout = Fanout {
        queue: queue.clone(),
        queues: queues.clone(),
        destinations: vec![remote.clone()],
        poll: Duration::from_millis(200),
    };
    let dispatcher = Dispatcher {
        queue: queue.clone(),
        deliver: DeliverRelayUseCase {
            events: events.clone(),
            files: files.clone(),
            sessions: SessionRegistry::new(),
            destination: remote.clone(),
            username: "relay".to_owned(),
            password: "secret".to_owned(),
            timeout: Duration::from_secs(5),
        },
        queues: queues.clone(),
        poll: Duration::from_millis(200),
    };

    let (trigger, signal) = shutdown::channel();
    let workers = [
        tokio::spawn(supervise(Arc::new(fanout), signal.clone(), Duration::from_millis(50))),
        tokio::spawn(supervise(Arc::new(dispatcher), signal, Duration::from_millis(50))),
    ];

    let note = TestNote {
        pk: 13,
        event_time: None,
    };
    let input = AddRelayInput::for_record(
        &note,
        r#"{"content": "hello"}"#.to_owned(),
        RELAY_PATH.to_owned(),
    )
    .with_files(vec![RelayUpload {
        file_key: "image".to_owned(),
        file_name: "a.jpg".to_owned(),
        bytes: Bytes::from_static(b"jpeg"),
    }]);
    let first = add_relay.execute(input).await.unwrap().unwrap();

    assert!(eventually(|| events.get(first.id).is_some_and(|e| e.is_delivered())).await);
    assert_eq!(handler.apply_count(), 1);
    {
        let applied = handler.applied.lock().unwrap();
        assert_eq!(applied[0].object_id.0, 13);
        assert_eq!(applied[0].fields["content"], "hello");
        assert_eq!(applied[0].files[0].file_name, "a.jpg");
    }
    let active = queues.active_for(&remote.nickname);
    assert!(eventually(|| queue.entries(&active).is_empty()).await);

    // A second relay of the same record is acknowledged without reapplying it.
    let again = add_relay
        .execute(AddRelayInput::for_record(
            &note,
            r#"{"content": "hello"}"#.to_owned(),
            RELAY_PATH.to_owned(),
        ))
        .await
        .unwrap()
        .unwrap();
    assert_ne!(again.id, first.id);
    assert!(eventually(|| events.get(again.id).is_some_and(|e| e.is_delivered())).await);
    assert_eq!(handler.apply_count(), 1);

    // A record minted by another site never leaves.
    let echoed = add_relay
        .execute(AddRelayInput::for_record(
            &TestNote {
                pk: 14,
                event_time: None,
            },
            "{}".to_owned(),
            RELAY_PATH.to_owned(),
        ))
        .await
        .unwrap();
    assert!(echoed.is_none());
    assert!(events.get(RelayEventId(3)).is_none());

    trigger.trigger();
    for worker in workers {
        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .unwrap()
            .unwrap();
    }
}
