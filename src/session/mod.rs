// src/session/mod.rs
//! Session-level request correlation.
//!
//! This module contains the [`Session`] type, which ties the message id
//! generator and the listener registry together the way a chat-platform RPC
//! session uses them:
//!
//! - every outbound request takes an id from [`Session::next_message_id`]
//! - a caller expecting a follow-up event registers a waiter with
//!   [`Session::listen`] and awaits the returned [`PendingUpdate`]
//! - the transport's receive loop feeds inbound events to
//!   [`Session::dispatch`], which resolves and removes matching waiters
//!
//! # Concurrency
//!
//! Both the generator and the registry are guarded by plain mutexes held for
//! a handful of instructions; nothing here awaits while holding a lock.
//! A waiter can be removed concurrently by the dispatcher and by its own
//! timeout or cancellation. Whichever comes second is a no-op.

mod pending;
mod update;
mod waiter;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::clock::{Clock, SystemClock};
use crate::listener::ListenerRegistry;
use crate::message_id::{MessageId, MessageIdGenerator};
use crate::session_config::{ResolveMode, SessionConfig};
use crate::{log_debug, Result};

pub use pending::PendingUpdate;
pub use update::{Category, Update};
pub use waiter::{UpdateFilter, WaiterTicket};

use waiter::Waiter;

/// Correlation state for one RPC session.
///
/// Cheap to clone (internally `Arc`-backed).
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    // ---
    ids: MessageIdGenerator,
    pub(crate) waiters: ListenerRegistry<Waiter>,
    next_key: AtomicU64,
    config: SessionConfig,
}

impl Session {
    // ---
    /// Create a session reading the system clock.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::InvalidConfig` if `config` fails validation.
    pub fn new(config: SessionConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a session with an explicit time source.
    ///
    /// This is the constructor you want for tests and simulations.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::InvalidConfig` if `config` fails validation.
    pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        // ---
        config.validate()?;

        let inner = Inner {
            ids: MessageIdGenerator::with_clock(clock, config.clock_skew),
            waiters: ListenerRegistry::new(),
            next_key: AtomicU64::new(1),
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Identifier for the next outbound request.
    pub fn next_message_id(&self) -> MessageId {
        self.inner.ids.next()
    }

    /// Register interest in the next update of `category`.
    pub fn listen(&self, category: impl Into<Category>) -> PendingUpdate {
        self.register(category.into(), None)
    }

    /// Register interest in the next update of `category` accepted by `filter`.
    ///
    /// The filter runs inside [`dispatch`](Self::dispatch) while the registry
    /// is locked. It must be quick and must not call back into the session.
    pub fn listen_filtered<F>(&self, category: impl Into<Category>, filter: F) -> PendingUpdate
    where
        F: Fn(&Update) -> bool + Send + Sync + 'static,
    {
        self.register(category.into(), Some(Arc::new(filter)))
    }

    fn register(&self, category: Category, filter: Option<UpdateFilter>) -> PendingUpdate {
        // ---
        let key = self.inner.next_key.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        let ticket = WaiterTicket {
            key,
            category: category.clone(),
        };
        let waiter = Waiter {
            key,
            category: category.clone(),
            filter,
            tx,
        };

        self.inner.waiters.register(category, waiter);

        PendingUpdate::new(
            ticket,
            rx,
            self.inner.config.listener_timeout,
            Arc::downgrade(&self.inner),
        )
    }

    /// Remove the waiter identified by `ticket`.
    ///
    /// Returns `false` if it was already resolved or removed.
    pub fn cancel(&self, ticket: &WaiterTicket) -> bool {
        self.inner.waiters.remove(ticket)
    }

    /// Deliver an inbound update to the waiters expecting it.
    ///
    /// Matching waiters are removed from the registry in registration order.
    /// With [`ResolveMode::First`] only the oldest match is resolved.
    ///
    /// Returns the number of waiters that received the update.
    pub fn dispatch(&self, update: Update) -> usize {
        // ---
        let category = update.category.clone();

        let resolved: Vec<Waiter> = match self.inner.config.resolve_mode {
            ResolveMode::First => self
                .inner
                .waiters
                .resolve_first(&category, |w| w.accepts(&update))
                .into_iter()
                .collect(),
            ResolveMode::All => self
                .inner
                .waiters
                .resolve_all(&category, |w| w.accepts(&update)),
        };

        if resolved.is_empty() {
            log_debug!("no waiter for update in category '{category}'");
            return 0;
        }

        let mut delivered = 0;
        for waiter in resolved {
            let _key = waiter.key;
            if waiter.tx.send(update.clone()).is_ok() {
                delivered += 1;
            } else {
                log_debug!("update arrived after waiter {_key} was abandoned ('{category}')");
            }
        }
        delivered
    }

    /// Number of waiters still registered.
    pub fn pending_count(&self) -> usize {
        self.inner.waiters.len()
    }

    /// Number of waiters registered under `category`.
    pub fn pending_in(&self, category: &Category) -> usize {
        self.inner.waiters.len_of(category)
    }

    /// Drop every registered waiter. Their pending futures fail with
    /// `RpcError::Cancelled`.
    ///
    /// Returns how many waiters were dropped.
    pub fn shutdown(&self) -> usize {
        // ---
        let drained = self.inner.waiters.drain();
        let count = drained.len();
        if count > 0 {
            log_debug!("session shutdown dropped {count} waiter(s)");
        }
        count
    }

    /// Configuration the session was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }
}
