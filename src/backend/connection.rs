// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Lifecycle of the single long-lived backend connection.
//!
//! At most one connection attempt and at most one session start are in flight at any time.
//! Concurrent callers share the pending attempt through a cloned [`Shared`] future. The
//! attempt settles itself: it either installs its connection or, when its transport closed
//! or the manager was disconnected meanwhile, shuts the connection down again. A
//! [`CloseSignal`] handed to the connector resets both the connection and the session so the
//! next caller re-establishes them.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::BackendError;

type PendingConnect<T> = Shared<BoxFuture<'static, Result<(u64, Arc<T>), BackendError>>>;
type PendingSession = Shared<BoxFuture<'static, Result<u64, BackendError>>>;

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: Send + Sync + 'static;

    /// Establishes a new connection. `on_close` must be notified when the transport goes away.
    async fn connect(&self, on_close: CloseSignal) -> Result<Self::Connection, BackendError>;

    async fn start_session(&self, connection: &Self::Connection) -> Result<(), BackendError>;

    async fn shutdown(&self, _connection: &Self::Connection) {}
}

trait CloseTarget: Send + Sync {
    fn connection_closed(&self, generation: u64);
}

/// Out-of-band notification that the transport of one specific connection closed.
#[derive(Clone)]
pub struct CloseSignal {
    generation: u64,
    target: Weak<dyn CloseTarget>,
}

impl CloseSignal {
    pub fn notify(&self) {
        if let Some(target) = self.target.upgrade() {
            target.connection_closed(self.generation);
        }
    }
}

impl std::fmt::Debug for CloseSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseSignal")
            .field("generation", &self.generation)
            .finish()
    }
}

struct Attempt<T> {
    generation: u64,
    pending: PendingConnect<T>,
    /// The transport closed before the attempt resolved.
    closed: bool,
}

struct State<T> {
    /// Bumped for every connection attempt.
    generation: u64,
    connection: Option<(u64, Arc<T>)>,
    connecting: Option<Attempt<T>>,
    /// Generation of the connection the session was started on.
    session: Option<u64>,
    session_attempts: u64,
    starting: Option<(u64, PendingSession)>,
}

impl<T> Default for State<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            connection: None,
            connecting: None,
            session: None,
            session_attempts: 0,
            starting: None,
        }
    }
}

struct Inner<C: Connector> {
    connector: Arc<C>,
    state: Mutex<State<C::Connection>>,
}

impl<C: Connector> Inner<C> {
    /// Installs the connection of attempt `generation`; `false` when the attempt was closed
    /// or abandoned while it was connecting.
    fn settle(&self, generation: u64, connection: &Arc<C::Connection>) -> bool {
        let mut state = self.state.lock();
        let current = state
            .connecting
            .as_ref()
            .is_some_and(|attempt| attempt.generation == generation);
        if !current {
            return false;
        }
        let closed = state
            .connecting
            .take()
            .is_some_and(|attempt| attempt.closed);
        if closed {
            return false;
        }
        state.connection = Some((generation, connection.clone()));
        state.session = None;
        true
    }

    fn forget_attempt(&self, generation: u64) {
        let mut state = self.state.lock();
        if state
            .connecting
            .as_ref()
            .is_some_and(|attempt| attempt.generation == generation)
        {
            state.connecting = None;
        }
    }
}

impl<C: Connector> CloseTarget for Inner<C> {
    fn connection_closed(&self, generation: u64) {
        let mut state = self.state.lock();
        if state
            .connection
            .as_ref()
            .is_some_and(|(g, _)| *g == generation)
        {
            info!(generation, "backend transport closed");
            state.connection = None;
            state.session = None;
        } else if let Some(attempt) = state
            .connecting
            .as_mut()
            .filter(|attempt| attempt.generation == generation)
        {
            info!(generation, "backend transport closed while connecting");
            attempt.closed = true;
        }
    }
}

/// Owns the backend connection; [`acquire`](Self::acquire) is the only way to reach it.
pub struct ConnectionManager<C: Connector> {
    inner: Arc<Inner<C>>,
}

impl<C: Connector> Clone for ConnectionManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector: Arc::new(connector),
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn connector(&self) -> &C {
        &self.inner.connector
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.lock().connection.is_some()
    }

    pub fn is_session_started(&self) -> bool {
        let state = self.inner.state.lock();
        matches!((&state.connection, state.session), (Some((g, _)), Some(s)) if *g == s)
    }

    pub async fn acquire(&self) -> Result<Arc<C::Connection>, BackendError> {
        self.acquire_with_generation()
            .await
            .map(|(_, connection)| connection)
    }

    async fn acquire_with_generation(&self) -> Result<(u64, Arc<C::Connection>), BackendError> {
        let pending = {
            let mut state = self.inner.state.lock();
            if let Some((generation, connection)) = &state.connection {
                return Ok((*generation, connection.clone()));
            }
            match &state.connecting {
                Some(attempt) => attempt.pending.clone(),
                None => {
                    state.generation += 1;
                    let generation = state.generation;
                    let pending = self.spawn_connect(generation);
                    state.connecting = Some(Attempt {
                        generation,
                        pending: pending.clone(),
                        closed: false,
                    });
                    pending
                }
            }
        };
        pending.await
    }

    fn spawn_connect(&self, generation: u64) -> PendingConnect<C::Connection> {
        let connector = self.inner.connector.clone();
        let inner: Weak<Inner<C>> = Arc::downgrade(&self.inner);
        let target: Weak<dyn CloseTarget> = inner.clone();
        let on_close = CloseSignal { generation, target };
        async move {
            debug!(generation, "connecting to editing backend");
            let result = connector.connect(on_close).await;
            let Some(inner) = inner.upgrade() else {
                return Err(BackendError::Disconnected);
            };
            let connection = match result {
                Ok(connection) => Arc::new(connection),
                Err(err) => {
                    inner.forget_attempt(generation);
                    return Err(err);
                }
            };
            if inner.settle(generation, &connection) {
                info!(generation, "editing backend connected");
                return Ok((generation, connection));
            }
            info!(generation, "discarding connection that closed before it was ready");
            connector.shutdown(&connection).await;
            Err(BackendError::Disconnected)
        }
        .boxed()
        .shared()
    }

    /// Starts the backend session once per connection.
    pub async fn ensure_session(&self) -> Result<(), BackendError> {
        let (attempt, pending) = {
            let mut state = self.inner.state.lock();
            let started = matches!(
                (&state.connection, state.session),
                (Some((g, _)), Some(s)) if *g == s
            );
            if started {
                return Ok(());
            }
            match &state.starting {
                Some((attempt, pending)) => (*attempt, pending.clone()),
                None => {
                    state.session_attempts += 1;
                    let attempt = state.session_attempts;
                    let manager = self.clone();
                    let pending = async move {
                        let (generation, connection) = manager.acquire_with_generation().await?;
                        info!(generation, "starting backend session");
                        manager.inner.connector.start_session(&connection).await?;
                        Ok::<_, BackendError>(generation)
                    }
                    .boxed()
                    .shared();
                    state.starting = Some((attempt, pending.clone()));
                    (attempt, pending)
                }
            }
        };

        let result = pending.await;

        let mut state = self.inner.state.lock();
        if state
            .starting
            .as_ref()
            .is_some_and(|(a, _)| *a == attempt)
        {
            state.starting = None;
            if let Ok(generation) = &result {
                state.session = Some(*generation);
            }
        }
        result.map(|_| ())
    }

    /// Tears the connection down and abandons any attempt still in flight; the next
    /// [`acquire`](Self::acquire) reconnects.
    pub async fn disconnect(&self) {
        let connection = {
            let mut state = self.inner.state.lock();
            state.session = None;
            state.starting = None;
            state.connecting = None;
            state.connection.take()
        };
        if let Some((generation, connection)) = connection {
            info!(generation, "disconnecting editing backend");
            self.inner.connector.shutdown(&connection).await;
        }
    }
}

#[cfg(test)]
mod tests;
