use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::post;
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use http::StatusCode;
use serde_json::{Value, json};

use xgds_core::serde::to_iso8601;
use xgds_core::shutdown;
use xgds_domain::queue::QueueNames;
use xgds_relay::domain::types::{
    CallDescriptor, CallMethod, REBROADCAST_PATH, RebroadcastDescriptor,
};
use xgds_relay::error::RelayServiceError;
use xgds_relay::handlers::rebroadcast::rebroadcast_sse;
use xgds_relay::usecase::rebroadcast::Broadcaster;
use xgds_relay::worker::rebroadcast::RebroadcastScheduler;
use xgds_relay::worker::supervisor::supervise;

use crate::helpers::{MemoryQueue, MockPublisher, eventually};

type TestBroadcaster = Broadcaster<MemoryQueue, MockPublisher>;

fn broadcaster(sites: &[&str]) -> TestBroadcaster {
    Broadcaster {
        queue: MemoryQueue::new(),
        publisher: MockPublisher::new(),
        queues: QueueNames::default(),
        rebroadcast_sites: sites.iter().map(|s| (*s).to_owned()).collect(),
        remote_username: Some("relay".to_owned()),
        remote_token: Some("token".to_owned()),
        rebroadcast_delay: Duration::from_secs(5),
    }
}

fn scheduler(b: &TestBroadcaster) -> RebroadcastScheduler<MemoryQueue, MockPublisher> {
    RebroadcastScheduler {
        queue: b.queue.clone(),
        publisher: b.publisher.clone(),
        queue_name: b.queues.rebroadcast.clone(),
        poll: Duration::from_millis(200),
    }
}

// ── producers ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_publish_sse_message_locally() {
    let b = broadcaster(&[]);

    b.publish_sse("sse", "position", r#"{"lat": 1}"#).await.unwrap();

    let messages = b.publisher.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "sse");
    let message: Value = serde_json::from_str(&messages[0].1).unwrap();
    assert_eq!(message, json!({"type": "position", "data": r#"{"lat": 1}"#}));
}

#[tokio::test]
async fn should_queue_one_rebroadcast_call_per_site() {
    let b = broadcaster(&["https://boat.xgds.org/", "https://shore.xgds.org"]);
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    b.call_remote_rebroadcast("sse", "position", "{}", Some(at))
        .await
        .unwrap();

    let calls: Vec<CallDescriptor> = b
        .queue
        .entries(&b.queues.session_manager)
        .iter()
        .map(|raw| serde_json::from_str(raw).unwrap())
        .collect();
    let mut urls: Vec<_> = calls.iter().map(|c| c.url.as_str()).collect();
    urls.sort_unstable();
    assert_eq!(
        urls,
        [
            "https://boat.xgds.org/xgds_core/rest/rebroadcast/sse/",
            "https://shore.xgds.org/xgds_core/rest/rebroadcast/sse/",
        ]
    );
    let call = &calls[0];
    assert_eq!(call.method, CallMethod::Post);
    assert_eq!(call.username.as_deref(), Some("relay"));
    assert_eq!(call.password.as_deref(), Some("token"));
    assert_eq!(call.data["channel"], "sse");
    assert_eq!(call.data["sseType"], "position");
    assert_eq!(call.data["jsonString"], "{}");
    assert_eq!(call.data["eventTime"], to_iso8601(&at));
}

#[tokio::test]
async fn should_skip_remote_rebroadcast_without_sites() {
    let b = broadcaster(&[]);

    b.broadcast("sse", "position", "{}").await.unwrap();

    assert_eq!(b.publisher.messages().len(), 1);
    assert!(b.queue.entries(&b.queues.session_manager).is_empty());
}

#[tokio::test]
async fn should_schedule_inbound_rebroadcast_after_delay() {
    let b = broadcaster(&[]);

    let publish_time = b
        .accept_remote("sse", "position", "{}", "2024-05-01T12:00:00.000000")
        .await
        .unwrap();

    assert_eq!(publish_time, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 5).unwrap());
    let queued = b.queue.entries(&b.queues.rebroadcast);
    assert_eq!(queued.len(), 1);
    let descriptor: RebroadcastDescriptor = serde_json::from_str(&queued[0]).unwrap();
    assert_eq!(descriptor.channel, "sse");
    assert_eq!(descriptor.publish_time, "2024-05-01T12:00:05.000000Z");
    assert_eq!(descriptor.message.sse_type, "position");
    assert!(b.publisher.messages().is_empty());
}

#[tokio::test]
async fn should_reject_unparseable_event_time() {
    let b = broadcaster(&[]);

    let result = b.accept_remote("sse", "position", "{}", "yesterday").await;

    assert!(matches!(result, Err(RelayServiceError::InvalidRebroadcast(_))));
    assert!(b.queue.entries(&b.queues.rebroadcast).is_empty());
}

#[tokio::test]
async fn should_accept_rebroadcast_request_over_http() {
    let b = broadcaster(&[]);
    let app = Router::new()
        .route(
            REBROADCAST_PATH,
            post(rebroadcast_sse::<MemoryQueue, MockPublisher>),
        )
        .with_state(b.clone());
    let server = TestServer::new(app).unwrap();

    let response = server
        .post(REBROADCAST_PATH)
        .form(&[
            ("channel", "sse"),
            ("sseType", "position"),
            ("jsonString", "{}"),
            ("eventTime", "2024-05-01T12:00:00Z"),
        ])
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["channel"], "sse");
    assert_eq!(body["publishTime"], "2024-05-01T12:00:05.000000Z");
    assert_eq!(b.queue.entries(&b.queues.rebroadcast).len(), 1);
    assert!(b.publisher.messages().is_empty());

    let bad = server
        .post(REBROADCAST_PATH)
        .form(&[
            ("channel", "sse"),
            ("sseType", "position"),
            ("jsonString", "{}"),
            ("eventTime", "soon"),
        ])
        .await;
    bad.assert_status(StatusCode::BAD_REQUEST);
}

// ── scheduler ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn should_hold_message_until_publish_time() {
    let b = broadcaster(&[]);
    let s = scheduler(&b);
    let publish_time = Utc::now() + chrono::Duration::seconds(3);
    b.publish_sse_at_time("sse", "position", "{}", publish_time)
        .await
        .unwrap();
    let raw = b.queue.entries(&b.queues.rebroadcast).remove(0);

    let started = tokio::time::Instant::now();
    s.handle(&raw).await;

    let published = b.publisher.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert!(published[0].2 - started >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn should_publish_past_due_message_immediately() {
    let b = broadcaster(&[]);
    let s = scheduler(&b);
    b.publish_sse_at_time("sse", "position", "{}", Utc::now() - chrono::Duration::seconds(10))
        .await
        .unwrap();
    let raw = b.queue.entries(&b.queues.rebroadcast).remove(0);

    let started = tokio::time::Instant::now();
    s.handle(&raw).await;

    let published = b.publisher.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].2, started);
}

#[tokio::test(start_paused = true)]
async fn should_publish_queued_messages_in_order() {
    let b = broadcaster(&[]);
    let s = Arc::new(scheduler(&b));
    let now = Utc::now();
    b.publish_sse_at_time("sse", "first", "{}", now + chrono::Duration::seconds(1))
        .await
        .unwrap();
    b.publish_sse_at_time("sse", "second", "{}", now + chrono::Duration::seconds(2))
        .await
        .unwrap();

    let (trigger, signal) = shutdown::channel();
    let handle = tokio::spawn(supervise(Arc::clone(&s), signal, Duration::from_millis(50)));

    assert!(eventually(|| b.publisher.messages().len() == 2).await);
    let types: Vec<String> = b
        .publisher
        .messages()
        .iter()
        .map(|(_, m)| serde_json::from_str::<Value>(m).unwrap()["type"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(types, ["first", "second"]);

    trigger.trigger();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn should_requeue_held_message_on_shutdown() {
    let b = broadcaster(&[]);
    let s = Arc::new(scheduler(&b));
    b.publish_sse_at_time("sse", "position", "{}", Utc::now() + chrono::Duration::hours(1))
        .await
        .unwrap();
    let raw = b.queue.entries(&b.queues.rebroadcast)[0].clone();

    let (trigger, signal) = shutdown::channel();
    let handle = tokio::spawn(supervise(Arc::clone(&s), signal, Duration::from_millis(50)));

    assert!(eventually(|| b.queue.entries(&b.queues.rebroadcast).is_empty()).await);
    trigger.trigger();
    handle.await.unwrap();

    assert_eq!(b.queue.entries(&b.queues.rebroadcast), vec![raw]);
    assert!(b.publisher.messages().is_empty());
}
