//! Request correlation core for a chat-platform RPC session.
//!
//! This library provides the two pieces of shared state every outbound
//! request passes through:
//!
//! - [`MessageIdGenerator`]: mints unique, time-ordered 64-bit message ids,
//!   safe to call from any number of concurrent tasks
//! - [`ListenerRegistry`]: category-keyed FIFO queues of listeners awaiting
//!   inbound events, with removal that tolerates racing the dispatcher
//!
//! [`Session`] combines them with a oneshot-backed waiter type and a
//! dispatcher for inbound [`Update`]s.
//!
//! Wire transport, payload encryption, and the typed request catalog live
//! outside this crate.
//!

// Import all sub modules once...
mod macros;

mod clock;
mod listener;
mod message_id;
mod session;

mod session_config;

mod error;

pub(crate) use macros::{log_debug, log_error, log_warn};

// Re-export main types
pub use session::{
    //
    Category,
    PendingUpdate,
    Session,
    Update,
    UpdateFilter,
    WaiterTicket,
};

pub use session_config::{ResolveMode, SessionConfig};

pub use clock::{Clock, ManualClock, SystemClock};
pub use listener::{Listener, ListenerRegistry};
pub use message_id::{ClockSkewPolicy, MessageId, MessageIdGenerator, FLAG_MASK, OFFSET_STEP};

pub use error::{Result, RpcError};

use std::sync::{Mutex, MutexGuard};

/// Acquire a mutex guard, intentionally ignoring poisoning.
///
/// Both guarded structures stay consistent across a panic: the generator
/// state is two integers written together, and caller-supplied predicates
/// in the registry run before any queue is modified. Recovering keeps
/// `next()` and `remove()` infallible.
pub(crate) fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // ---
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
