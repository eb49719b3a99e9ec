// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

const TICK: Duration = Duration::from_millis(10);

fn event(n: i64) -> Event {
    Event::try_from(json!({ "n": n })).unwrap()
}

#[tokio::test]
async fn events_arrive_in_order() {
    let running = AtomicBool::new(true);
    let (tx, mut rx) = EventQueue::bounded(4, TICK);

    assert_eq!(tx.send(event(1), &running).await, Handoff::Sent);
    assert_eq!(tx.send(event(2), &running).await, Handoff::Sent);

    for expected in [1, 2] {
        match rx.recv_timeout(TICK).await {
            Received::Event(e) => assert_eq!(e.get("n"), Some(&json!(expected))),
            other => panic!("expected event, got {:?}", other),
        }
    }
    assert!(matches!(rx.recv_timeout(TICK).await, Received::Idle));
}

#[tokio::test]
async fn full_queue_is_abandoned_once_stopped() {
    let running = AtomicBool::new(true);
    let (tx, _rx) = EventQueue::bounded(1, TICK);
    assert_eq!(tx.send(event(1), &running).await, Handoff::Sent);

    running.store(false, Ordering::Release);
    assert_eq!(tx.send(event(2), &running).await, Handoff::Abandoned);
}

#[tokio::test]
async fn dropped_receiver_closes_queue() {
    let running = AtomicBool::new(true);
    let (tx, rx) = EventQueue::bounded(1, TICK);
    drop(rx);

    assert_eq!(tx.send(event(1), &running).await, Handoff::Closed);
}

#[tokio::test]
async fn discard_drops_buffered_events() {
    let running = AtomicBool::new(true);
    let (tx, mut rx) = EventQueue::bounded(8, TICK);
    for n in 0..3 {
        tx.send(event(n), &running).await;
    }

    assert_eq!(rx.discard(), 3);
    assert_eq!(tx.send(event(9), &running).await, Handoff::Closed);
}

#[tokio::test]
async fn backlog_counts_until_dispatch_completes() {
    let running = AtomicBool::new(true);
    let (tx, mut rx) = EventQueue::bounded(4, TICK);
    let backlog = tx.backlog();
    assert!(backlog.is_empty());

    tx.send(event(1), &running).await;
    tx.send(event(2), &running).await;
    assert_eq!(backlog.len(), 2);

    assert!(matches!(rx.recv_timeout(TICK).await, Received::Event(_)));
    assert_eq!(backlog.len(), 2, "received but not yet dispatched");
    rx.complete();
    assert_eq!(backlog.len(), 1);

    assert_eq!(rx.discard(), 1);
    assert!(backlog.is_empty());
}

#[tokio::test]
async fn abandoned_send_leaves_backlog_unchanged() {
    let running = AtomicBool::new(true);
    let (tx, _rx) = EventQueue::bounded(1, TICK);
    tx.send(event(1), &running).await;

    running.store(false, Ordering::Release);
    assert_eq!(tx.send(event(2), &running).await, Handoff::Abandoned);
    assert_eq!(tx.backlog().len(), 1);
}
