//! Scoped environment overrides for tests.
//!
//! The process environment is shared by every test thread, so tests that
//! touch it hold [`lock_env`] for as long as their [`EnvGuard`]s live.

use std::{
    env,
    sync::{Mutex, MutexGuard, PoisonError},
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes environment access across tests.
///
/// A test that panicked while holding the lock does not poison it for the
/// others; its guards have already restored the environment.
pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Restores an environment variable to its previous state on drop.
///
/// # Examples
/// ```
/// use topodist_test_support::env::{EnvGuard, lock_env};
///
/// let _lock = lock_env();
/// {
///     let _guard = EnvGuard::set("TOPODIST_DOCTEST_VAR", "1");
///     assert_eq!(std::env::var("TOPODIST_DOCTEST_VAR").as_deref(), Ok("1"));
/// }
/// assert!(std::env::var("TOPODIST_DOCTEST_VAR").is_err());
/// ```
#[derive(Debug)]
pub struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    /// Sets `key` to `value` until the guard drops.
    #[must_use]
    pub fn set(key: &'static str, value: &str) -> Self {
        let original = env::var(key).ok();
        // SAFETY: callers serialize access with `lock_env`.
        unsafe { env::set_var(key, value) };
        Self { key, original }
    }

    /// Removes `key` until the guard drops.
    #[must_use]
    pub fn unset(key: &'static str) -> Self {
        let original = env::var(key).ok();
        // SAFETY: callers serialize access with `lock_env`.
        unsafe { env::remove_var(key) };
        Self { key, original }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.original {
            // SAFETY: callers serialize access with `lock_env`.
            Some(value) => unsafe { env::set_var(self.key, value) },
            // SAFETY: callers serialize access with `lock_env`.
            None => unsafe { env::remove_var(self.key) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const KEY: &str = "TOPODIST_TEST_SUPPORT_ENV_GUARD";

    #[rstest]
    fn guards_restore_previous_value() {
        let _lock = lock_env();
        let _outer = EnvGuard::set(KEY, "outer");
        {
            let _inner = EnvGuard::unset(KEY);
            assert!(env::var(KEY).is_err());
        }
        assert_eq!(env::var(KEY).as_deref(), Ok("outer"));
    }
}
