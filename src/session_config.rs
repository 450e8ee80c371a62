//! Session configuration.
//!
//! Holds the knobs for the session layer that sits on top of the id
//! generator and listener registry. Transport settings live elsewhere.

use std::time::Duration;

use crate::{ClockSkewPolicy, Result, RpcError};

/// How `Session::dispatch` treats multiple waiters matching one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Only the oldest matching waiter receives the update.
    First,

    /// Every matching waiter receives a copy of the update.
    #[default]
    All,
}

/// Session-wide configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    // ---
    /// Default time a waiter stays registered before giving up.
    ///
    /// Default: 30 seconds
    pub listener_timeout: Duration,

    /// Fan-out policy for inbound updates.
    pub resolve_mode: ResolveMode,

    /// Behavior of the id generator when the wall clock steps backwards.
    pub clock_skew: ClockSkewPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            listener_timeout: Duration::from_secs(30),
            resolve_mode: ResolveMode::default(),
            clock_skew: ClockSkewPolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Set the default waiter timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use chat_rpc_core::SessionConfig;
    /// use std::time::Duration;
    ///
    /// let config = SessionConfig::default()
    ///     .with_listener_timeout(Duration::from_secs(10));
    /// ```
    pub fn with_listener_timeout(mut self, timeout: Duration) -> Self {
        self.listener_timeout = timeout;
        self
    }

    pub fn with_resolve_mode(mut self, mode: ResolveMode) -> Self {
        self.resolve_mode = mode;
        self
    }

    /// Choose how the id generator reacts to a backwards clock.
    pub fn with_clock_skew(mut self, policy: ClockSkewPolicy) -> Self {
        self.clock_skew = policy;
        self
    }

    /// Check the configuration for values the session cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidConfig`] if `listener_timeout` is zero.
    pub fn validate(&self) -> Result<()> {
        // ---
        if self.listener_timeout.is_zero() {
            return Err(RpcError::InvalidConfig(
                "listener_timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_defaults() {
        // ---
        let config = SessionConfig::default();
        assert_eq!(config.listener_timeout, Duration::from_secs(30));
        assert_eq!(config.resolve_mode, ResolveMode::All);
        assert_eq!(config.clock_skew, ClockSkewPolicy::Accept);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        // ---
        let config = SessionConfig::default().with_listener_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(RpcError::InvalidConfig(_))));
    }
}
