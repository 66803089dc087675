use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Form, Router};
use http::StatusCode;

use xgds_core::shutdown;
use xgds_relay::domain::repository::{UrlCaller, WorkQueue};
use xgds_relay::domain::types::{CallDescriptor, CallMethod, REBROADCAST_PATH};
use xgds_relay::infra::session::SessionRegistry;
use xgds_relay::worker::session_manager::{CallOutcome, SessionManagerWorker};
use xgds_relay::worker::supervisor::supervise;

use crate::helpers::{MemoryQueue, MockUrlCaller, eventually, serve};

const QUEUE: &str = "sessionManager";

fn worker(script: Vec<Option<u16>>) -> SessionManagerWorker<MemoryQueue, MockUrlCaller> {
    SessionManagerWorker::new(
        MemoryQueue::new(),
        MockUrlCaller::scripted(script),
        QUEUE.to_owned(),
        Duration::from_millis(200),
    )
}

fn descriptor() -> String {
    r#"{"url": "https://boat.xgds.org/xgds_core/rest/rebroadcast/sse/", "method": "POST",
        "data": {"channel": "sse"}}"#
        .to_owned()
}

// ── retry policy ─────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn should_give_up_after_three_failed_attempts() {
    let w = worker(vec![None, None, None, Some(200)]);

    let outcome = w.handle(&descriptor()).await;

    assert_eq!(outcome, CallOutcome::GaveUp { attempts: 3 });
    let calls = w.caller.calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].1 - calls[0].1, Duration::from_secs(5));
    assert_eq!(calls[2].1 - calls[1].1, Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn should_stop_retrying_once_remote_answers() {
    let w = worker(vec![None, Some(200)]);

    let outcome = w.handle(&descriptor()).await;

    assert_eq!(
        outcome,
        CallOutcome::Completed {
            attempts: 2,
            status: 200
        }
    );
    assert_eq!(w.caller.call_count(), 2);
}

#[tokio::test]
async fn should_not_retry_error_status() {
    let w = worker(vec![Some(500), Some(200)]);

    let outcome = w.handle(&descriptor()).await;

    assert_eq!(
        outcome,
        CallOutcome::Completed {
            attempts: 1,
            status: 500
        }
    );
    assert_eq!(w.caller.call_count(), 1);
}

#[tokio::test]
async fn should_drop_malformed_descriptor() {
    let w = worker(vec![Some(200)]);

    assert_eq!(w.handle("{not json").await, CallOutcome::Dropped);
    assert_eq!(w.caller.call_count(), 0);
}

#[tokio::test]
async fn should_execute_queued_calls() {
    let w = Arc::new(worker(vec![Some(200)]));
    let (trigger, signal) = shutdown::channel();
    let handle = tokio::spawn(supervise(Arc::clone(&w), signal, Duration::from_millis(50)));

    w.queue.push(QUEUE, &descriptor()).await.unwrap();

    assert!(eventually(|| w.caller.call_count() == 1).await);
    let call = w.caller.calls.lock().unwrap()[0].0.clone();
    assert_eq!(call.method, CallMethod::Post);
    assert_eq!(call.data["channel"], "sse");
    assert!(w.queue.entries(QUEUE).is_empty());

    trigger.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

// ── session registry as caller ───────────────────────────────────────────────

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn record_form(
    State(seen): State<Seen>,
    Form(body): Form<HashMap<String, String>>,
) -> StatusCode {
    seen.lock().unwrap().push(body);
    StatusCode::CREATED
}

#[tokio::test]
async fn should_post_form_through_one_session_per_origin() {
    let seen: Seen = Arc::default();
    let base_url = serve(
        Router::new()
            .route(REBROADCAST_PATH, post(record_form))
            .with_state(Arc::clone(&seen)),
    )
    .await;
    let registry = SessionRegistry::new();
    let call = CallDescriptor {
        url: format!("{base_url}{REBROADCAST_PATH}"),
        username: Some("relay".to_owned()),
        password: Some("token".to_owned()),
        method: CallMethod::Post,
        data: BTreeMap::from([("channel".to_owned(), "sse".to_owned())]),
    };

    assert_eq!(registry.call_url(&call).await.unwrap(), 201);
    assert_eq!(registry.call_url(&call).await.unwrap(), 201);

    assert_eq!(registry.len(), 1);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0]["channel"], "sse");
}
