use std::sync::Weak;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time;

use crate::{log_debug, Result, RpcError};

use super::update::Update;
use super::waiter::WaiterTicket;
use super::Inner;

/// A registered interest in one inbound update.
///
/// Resolve it with [`wait`](Self::wait) or give it up with
/// [`cancel`](Self::cancel). Dropping it unresolved removes the waiter from
/// the session, so an abandoned wait never leaks a registry entry.
#[must_use = "an unawaited PendingUpdate is removed as soon as it is dropped"]
pub struct PendingUpdate {
    // ---
    ticket: WaiterTicket,
    rx: oneshot::Receiver<Update>,
    default_timeout: Duration,
    session: Weak<Inner>,
}

impl PendingUpdate {
    // ---
    pub(super) fn new(
        ticket: WaiterTicket,
        rx: oneshot::Receiver<Update>,
        default_timeout: Duration,
        session: Weak<Inner>,
    ) -> Self {
        Self {
            ticket,
            rx,
            default_timeout,
            session,
        }
    }

    /// Handle that cancels this waiter through [`Session::cancel`](crate::Session::cancel).
    pub fn ticket(&self) -> &WaiterTicket {
        &self.ticket
    }

    /// Wait for the update using the session's configured listener timeout.
    ///
    /// # Errors
    ///
    /// - `RpcError::Timeout` if nothing matching arrived in time
    /// - `RpcError::Cancelled` if the session dropped the waiter (shutdown)
    pub async fn wait(self) -> Result<Update> {
        let timeout = self.default_timeout;
        self.wait_timeout(timeout).await
    }

    /// Wait for the update for at most `timeout`.
    ///
    /// # Errors
    ///
    /// Same as [`wait`](Self::wait).
    pub async fn wait_timeout(mut self, timeout: Duration) -> Result<Update> {
        // ---
        match time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(update)) => Ok(update),
            Ok(Err(_)) => Err(RpcError::Cancelled),
            Err(_) => {
                if self.remove() {
                    log_debug!(
                        "waiter {} for '{}' timed out after {timeout:?}",
                        self.ticket.key,
                        self.ticket.category
                    );
                    return Err(RpcError::Timeout);
                }

                // The dispatcher took the waiter between the deadline and our
                // removal. It sends right after releasing the registry lock,
                // so this resolves immediately.
                match (&mut self.rx).await {
                    Ok(update) => Ok(update),
                    Err(_) => Err(RpcError::Timeout),
                }
            }
        }
    }

    /// Stop waiting.
    ///
    /// Returns `false` if the waiter was no longer registered, either because
    /// the update already arrived or the session shut down.
    pub fn cancel(self) -> bool {
        self.remove()
    }

    fn remove(&self) -> bool {
        // ---
        match self.session.upgrade() {
            Some(inner) => inner.waiters.remove(&self.ticket),
            None => false,
        }
    }
}

impl Drop for PendingUpdate {
    fn drop(&mut self) {
        // Idempotent: a no-op once resolved, cancelled or timed out.
        self.remove();
    }
}
