//! Test-only utilities for safely mutating process-global state in tests.

/// RAII guard for temporarily setting an environment variable.
///
/// Restores the previous value (or removes the variable) on drop. Pair with
/// `#[serial(env)]` since the process environment is shared.
pub struct EnvGuard {
    key: &'static str,
    prev: Option<String>,
}

impl EnvGuard {
    /// Sets `key` to `val` until the guard is dropped.
    #[must_use]
    pub fn set(key: &'static str, val: &str) -> Self {
        let prev = std::env::var(key).ok();
        // SAFETY: callers serialize env mutation with #[serial(env)]
        unsafe { std::env::set_var(key, val) };
        Self { key, prev }
    }

    /// Removes `key` until the guard is dropped.
    #[must_use]
    pub fn remove(key: &'static str) -> Self {
        let prev = std::env::var(key).ok();
        // SAFETY: callers serialize env mutation with #[serial(env)]
        unsafe { std::env::remove_var(key) };
        Self { key, prev }
    }

    /// Removes every variable the client reads, for tests that build config
    /// from a clean environment.
    #[must_use]
    pub fn clear_all() -> [Self; 3] {
        [
            Self::remove(crate::config::ENV_API_BASE),
            Self::remove(crate::config::ENV_API_KEY),
            Self::remove(crate::config::ENV_SESSION_SECRET),
        ]
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            // SAFETY: see `set`
            Some(v) => unsafe { std::env::set_var(self.key, v) },
            // SAFETY: see `remove`
            None => unsafe { std::env::remove_var(self.key) },
        }
    }
}
