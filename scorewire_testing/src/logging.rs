//! Shared log capture.
//!
//! `logtest` installs a process-wide logger, so every test capturing logs
//! goes through one mutex-guarded instance.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use log::Level;
use logtest::{Logger, Record};

/// Exclusive access to the process-wide [`Logger`].
pub struct LoggerHandle {
    guard: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    /// Acquire the logger and discard records left by earlier tests.
    #[must_use]
    pub fn new() -> Self {
        let mut handle = Self::resume();
        handle.clear();
        handle
    }

    /// Acquire the logger, keeping records captured so far.
    ///
    /// The guard is not `Send`, so async tests clear the logger with
    /// [`LoggerHandle::new`], drop it, and resume once their last `.await`
    /// has completed.
    #[must_use]
    pub fn resume() -> Self {
        static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

        let logger = LOGGER.get_or_init(|| Mutex::new(Logger::start()));
        // A test that panicked while holding the lock leaves stale records
        // behind; `new` clears them.
        let guard = logger.lock().unwrap_or_else(PoisonError::into_inner);
        Self { guard }
    }

    /// Drop every captured record.
    pub fn clear(&mut self) { while self.guard.pop().is_some() {} }

    /// Drain captured records at `level` whose text contains `needle`.
    pub fn take_matching(&mut self, level: Level, needle: &str) -> Vec<String> {
        let mut found = Vec::new();
        while let Some(record) = self.guard.pop() {
            if matches(&record, level, needle) {
                found.push(record.args().to_owned());
            }
        }
        found
    }
}

impl Default for LoggerHandle {
    fn default() -> Self { Self::new() }
}

fn matches(record: &Record, level: Level, needle: &str) -> bool {
    record.level() == level && record.args().contains(needle)
}

impl std::ops::Deref for LoggerHandle {
    type Target = Logger;

    fn deref(&self) -> &Self::Target { &self.guard }
}

impl std::ops::DerefMut for LoggerHandle {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.guard }
}
