//! Pool configuration.
//!
//! [`PoolConfig`] keeps the values as configured; the `effective_*` helpers
//! apply the default size cap and the expiry floor the pool actually uses.

use std::time::Duration;

use serde::Deserialize;

/// Size cap applied when none is configured: 5 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 5 << 20;

/// Shortest expiry a pool will honour.
pub const MIN_MESSAGE_EXPIRY: Duration = Duration::from_millis(100);

/// Expiry used by [`PoolConfig::default`].
pub const DEFAULT_MESSAGE_EXPIRY: Duration = Duration::from_secs(2);

/// Limits applied to every message in a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum payload bytes per message. `0` selects
    /// [`DEFAULT_MAX_MESSAGE_SIZE`].
    pub max_message_size: usize,
    /// How long a message may wait for its final packet, measured from
    /// registration. Values below [`MIN_MESSAGE_EXPIRY`] are raised to it.
    pub message_expiry: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_message_size: 0,
            message_expiry: DEFAULT_MESSAGE_EXPIRY,
        }
    }
}

impl PoolConfig {
    /// Size cap after applying the default.
    #[must_use]
    pub fn effective_max_message_size(&self) -> usize {
        match self.max_message_size {
            0 => DEFAULT_MAX_MESSAGE_SIZE,
            size => size,
        }
    }

    /// Expiry after applying the floor.
    #[must_use]
    pub fn effective_message_expiry(&self) -> Duration { self.message_expiry.max(MIN_MESSAGE_EXPIRY) }

    /// Copy of this configuration with defaults and floors applied.
    #[must_use]
    pub fn effective(&self) -> Self {
        Self {
            max_message_size: self.effective_max_message_size(),
            message_expiry: self.effective_message_expiry(),
        }
    }
}
