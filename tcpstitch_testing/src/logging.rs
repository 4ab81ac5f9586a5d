//! Exclusive access to the process-wide `logtest` capture.

use std::sync::{Mutex, MutexGuard, OnceLock};

use logtest::Logger;
use rstest::fixture;

/// Guard over the global [`Logger`].
///
/// Pool diagnostics are mirrored to `log`, so tests asserting on them hold
/// this handle to keep other tests from draining the same records.
pub struct LoggerHandle {
    guard: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    /// Lock the global logger, starting it on first use.
    ///
    /// A poisoned lock is recovered: a failed assertion in one test should
    /// not fail every later one.
    #[must_use]
    pub fn new() -> Self {
        static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

        let logger = LOGGER.get_or_init(|| Mutex::new(Logger::start()));
        let guard = logger
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        Self { guard }
    }

    /// Discard everything captured so far.
    pub fn clear(&mut self) { while self.guard.pop().is_some() {} }

    /// Drain captured records into `(level, message)` pairs.
    pub fn drain(&mut self) -> Vec<(log::Level, String)> {
        std::iter::from_fn(|| self.guard.pop())
            .map(|record| (record.level(), record.args().to_owned()))
            .collect()
    }
}

impl Default for LoggerHandle {
    fn default() -> Self { Self::new() }
}

impl std::ops::Deref for LoggerHandle {
    type Target = Logger;

    fn deref(&self) -> &Self::Target { &self.guard }
}

impl std::ops::DerefMut for LoggerHandle {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.guard }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn logger() -> LoggerHandle { LoggerHandle::new() }
