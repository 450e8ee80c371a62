//! Time-ordered 64-bit message identifiers.
//!
//! An identifier packs the wall-clock second into the high 32 bits and an
//! intra-second offset into the low 32 bits:
//!
//! ```text
//! id = (seconds << 32) + offset
//! ```
//!
//! The offset steps by 4 within one second, leaving the two low bits free for
//! protocol flags the caller may OR in later (see [`MessageId::with_flags`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::clock::{Clock, SystemClock};
use crate::lock_ignore_poison;

/// Offset increment between two ids issued in the same second.
pub const OFFSET_STEP: u64 = 4;

/// Bits reserved for caller-side tagging.
pub const FLAG_MASK: u64 = 0b11;

/// Identifier of one outbound request.
///
/// Unique and non-decreasing within the lifetime of the
/// [`MessageIdGenerator`] that issued it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    // ---

    /// Wall-clock second the id was issued in.
    pub fn seconds(self) -> u64 {
        self.0 >> 32
    }

    /// Intra-second offset, including any flag bits.
    pub fn offset(self) -> u64 {
        self.0 & u64::from(u32::MAX)
    }

    /// Return a copy with the two reserved low bits set from `flags`.
    pub fn with_flags(self, flags: u8) -> Self {
        Self(self.0 | (u64::from(flags) & FLAG_MASK))
    }

    /// Raw 64-bit value as sent on the wire.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for MessageId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<MessageId> for u64 {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to do when the clock reads earlier than the last issued bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockSkewPolicy {
    /// Restart the offset at 0 in the earlier second. Ids issued afterwards
    /// may be lower than ids already handed out.
    #[default]
    Accept,

    /// Keep issuing from the last bucket until the clock catches up, so ids
    /// never decrease.
    Clamp,
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_bucket: u64,
    offset: u64,
}

/// Mints [`MessageId`]s for one session.
///
/// `next()` is serialized by a mutex so concurrent callers in the same
/// second always observe distinct offsets.
pub struct MessageIdGenerator {
    // ---
    clock: Arc<dyn Clock>,
    skew_policy: ClockSkewPolicy,
    state: Mutex<GeneratorState>,
}

impl MessageIdGenerator {
    // ---

    /// Generator reading the system clock, accepting clock skew.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), ClockSkewPolicy::default())
    }

    /// Generator reading `clock`, reacting to a backwards clock per `skew_policy`.
    pub fn with_clock(clock: Arc<dyn Clock>, skew_policy: ClockSkewPolicy) -> Self {
        // ---
        Self {
            clock,
            skew_policy,
            state: Mutex::new(GeneratorState::default()),
        }
    }

    /// Issue the next identifier. Never fails.
    pub fn next(&self) -> MessageId {
        // ---
        let mut state = lock_ignore_poison(&self.state);
        let mut now = self.clock.now_secs();

        if now < state.last_bucket {
            match self.skew_policy {
                ClockSkewPolicy::Accept => {
                    crate::log_warn!(
                        "clock moved backwards ({} -> {now}), message ids may repeat",
                        state.last_bucket
                    );
                }
                ClockSkewPolicy::Clamp => {
                    crate::log_debug!(
                        "clock moved backwards ({} -> {now}), clamping to last bucket",
                        state.last_bucket
                    );
                    now = state.last_bucket;
                }
            }
        }

        if now == state.last_bucket {
            state.offset = state.offset.wrapping_add(OFFSET_STEP);
        } else {
            state.offset = 0;
        }
        state.last_bucket = now;

        // Offsets past u32::MAX spill into the seconds field.
        MessageId((now << 32).wrapping_add(state.offset))
    }

    /// Policy applied when the clock reads earlier than the last bucket.
    pub fn skew_policy(&self) -> ClockSkewPolicy {
        self.skew_policy
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        let state = lock_ignore_poison(&self.state);
        f.debug_struct("MessageIdGenerator")
            .field("skew_policy", &self.skew_policy)
            .field("last_bucket", &state.last_bucket)
            .field("offset", &state.offset)
            .finish()
    }
}
