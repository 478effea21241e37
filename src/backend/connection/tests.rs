// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;

use super::{CloseSignal, ConnectionManager, Connector};
use crate::backend::BackendError;

#[derive(Default)]
struct FakeConnector {
    connects: AtomicUsize,
    sessions: AtomicUsize,
    shutdowns: AtomicUsize,
    fail_connects: AtomicUsize,
    /// Number of upcoming connects whose transport closes before `connect` returns.
    die_during_connect: AtomicUsize,
    signals: Mutex<Vec<CloseSignal>>,
}

struct FakeConnection {
    generation: usize,
}

#[async_trait]
impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self, on_close: CloseSignal) -> Result<FakeConnection, BackendError> {
        let generation = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(10)).await;
        if self.fail_connects.load(Ordering::SeqCst) > 0 {
            self.fail_connects.fetch_sub(1, Ordering::SeqCst);
            return Err(BackendError::Spawn("no such command".to_owned()));
        }
        if self.die_during_connect.load(Ordering::SeqCst) > 0 {
            self.die_during_connect.fetch_sub(1, Ordering::SeqCst);
            on_close.notify();
        }
        self.signals.lock().push(on_close);
        Ok(FakeConnection { generation })
    }

    async fn start_session(&self, _connection: &FakeConnection) -> Result<(), BackendError> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(())
    }

    async fn shutdown(&self, _connection: &FakeConnection) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

fn close_latest(manager: &ConnectionManager<FakeConnector>) {
    let signal = manager
        .connector()
        .signals
        .lock()
        .last()
        .cloned()
        .expect("signal");
    signal.notify();
}

fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

#[tokio::test]
async fn concurrent_acquires_share_one_connection_attempt() {
    let manager = ConnectionManager::new(FakeConnector::default());

    let results = join_all((0..8).map(|_| manager.acquire())).await;

    assert_eq!(count(&manager.connector().connects), 1);
    let connections = results
        .into_iter()
        .map(|r| r.expect("connection"))
        .collect::<Vec<_>>();
    assert!(connections.iter().all(|c| Arc::ptr_eq(c, &connections[0])));
    assert!(manager.is_connected());
}

#[tokio::test]
async fn established_connection_is_reused() {
    let manager = ConnectionManager::new(FakeConnector::default());

    let first = manager.acquire().await.expect("first");
    let second = manager.acquire().await.expect("second");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(count(&manager.connector().connects), 1);
}

#[tokio::test]
async fn concurrent_session_starts_share_one_attempt() {
    let manager = ConnectionManager::new(FakeConnector::default());

    let results = join_all((0..5).map(|_| manager.ensure_session())).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(count(&manager.connector().connects), 1);
    assert_eq!(count(&manager.connector().sessions), 1);
    assert!(manager.is_session_started());

    manager.ensure_session().await.expect("already started");
    assert_eq!(count(&manager.connector().sessions), 1);
}

#[tokio::test]
async fn failed_attempt_is_shared_then_retried() {
    let connector = FakeConnector::default();
    connector.fail_connects.store(1, Ordering::SeqCst);
    let manager = ConnectionManager::new(connector);

    let results = join_all((0..3).map(|_| manager.acquire())).await;
    let expected = BackendError::Spawn("no such command".to_owned());
    for result in &results {
        assert_eq!(result.as_ref().err(), Some(&expected));
    }
    assert_eq!(count(&manager.connector().connects), 1);
    assert!(!manager.is_connected());

    let connection = manager.acquire().await.expect("retry");
    assert_eq!(connection.generation, 2);
}

#[tokio::test]
async fn close_notification_resets_connection_and_session() {
    let manager = ConnectionManager::new(FakeConnector::default());
    manager.ensure_session().await.expect("session");

    close_latest(&manager);
    assert!(!manager.is_connected());
    assert!(!manager.is_session_started());

    manager.ensure_session().await.expect("session again");
    assert_eq!(count(&manager.connector().connects), 2);
    assert_eq!(count(&manager.connector().sessions), 2);
}

#[tokio::test]
async fn close_while_connecting_discards_the_connection() {
    let connector = FakeConnector::default();
    connector.die_during_connect.store(1, Ordering::SeqCst);
    let manager = ConnectionManager::new(connector);

    let err = manager.acquire().await.err();
    assert_eq!(err, Some(BackendError::Disconnected));
    assert!(!manager.is_connected());
    assert_eq!(count(&manager.connector().shutdowns), 1);

    let connection = manager.acquire().await.expect("reconnect");
    assert_eq!(connection.generation, 2);
    assert_eq!(count(&manager.connector().connects), 2);
    assert!(manager.is_connected());
}

#[tokio::test]
async fn stale_close_notification_is_ignored() {
    let manager = ConnectionManager::new(FakeConnector::default());
    manager.acquire().await.expect("first");
    let stale = manager.connector().signals.lock()[0].clone();

    manager.disconnect().await;
    let current = manager.acquire().await.expect("second");
    stale.notify();

    assert!(manager.is_connected());
    assert_eq!(current.generation, 2);
    assert_eq!(count(&manager.connector().shutdowns), 1);
}

#[tokio::test]
async fn disconnect_tears_down_then_next_call_reconnects() {
    let manager = ConnectionManager::new(FakeConnector::default());
    manager.ensure_session().await.expect("session");

    manager.disconnect().await;
    assert!(!manager.is_connected());
    assert!(!manager.is_session_started());
    assert_eq!(count(&manager.connector().shutdowns), 1);

    manager.disconnect().await;
    assert_eq!(count(&manager.connector().shutdowns), 1);

    manager.ensure_session().await.expect("session again");
    assert_eq!(count(&manager.connector().connects), 2);
    assert_eq!(count(&manager.connector().sessions), 2);
    assert!(manager.is_session_started());
}

#[tokio::test]
async fn disconnect_abandons_an_attempt_in_flight() {
    let manager = ConnectionManager::new(FakeConnector::default());
    let pending = tokio::spawn({
        let manager = manager.clone();
        async move { manager.acquire().await.map(|connection| connection.generation) }
    });
    tokio::time::sleep(Duration::from_millis(2)).await;

    manager.disconnect().await;
    let late = pending.await.expect("join");

    assert_eq!(late, Err(BackendError::Disconnected));
    assert!(!manager.is_connected());
    assert_eq!(count(&manager.connector().shutdowns), 1);

    let connection = manager.acquire().await.expect("reconnect");
    assert_eq!(connection.generation, 2);
}
