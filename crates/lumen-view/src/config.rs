#![forbid(unsafe_code)]

//! View-tree configuration.
//!
//! A [`ViewConfig`] is fixed when the [`CoreRegistry`](crate::CoreRegistry)
//! is built and shared by every view created from it.
//!
//! # Environment
//!
//! | Variable              | Values                     | Field                 |
//! |-----------------------|----------------------------|-----------------------|
//! | `LUMEN_THREAD_CHECK`  | `debug`, `always`, `off`   | `thread_check`        |
//! | `LUMEN_CASCADE_CORES` | `1`/`true`/`yes`/`on`, else off | `cascade_child_cores` |
//!
//! Unset or unparsable variables keep the default.

use lumen_core::ThreadCheck;

const THREAD_CHECK_VAR: &str = "LUMEN_THREAD_CHECK";
const CASCADE_VAR: &str = "LUMEN_CASCADE_CORES";

/// Configuration shared by a view tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    /// How strictly UI-thread affinity is enforced.
    pub thread_check: ThreadCheck,
    /// Create and release child cores together with their parent's core.
    pub cascade_child_cores: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            thread_check: ThreadCheck::Debug,
            cascade_child_cores: true,
        }
    }
}

impl ViewConfig {
    /// Defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `get_env` returns.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(check) = get_env(THREAD_CHECK_VAR).as_deref().and_then(ThreadCheck::parse) {
            config.thread_check = check;
        }
        if let Some(value) = get_env(CASCADE_VAR) {
            config.cascade_child_cores = env_flag(&value);
        }
        config
    }

    /// Set the thread-affinity policy.
    #[must_use]
    pub fn with_thread_check(mut self, check: ThreadCheck) -> Self {
        self.thread_check = check;
        self
    }

    /// Enable or disable child core cascading.
    #[must_use]
    pub fn with_cascade_child_cores(mut self, cascade: bool) -> Self {
        self.cascade_child_cores = cascade;
        self
    }
}

#[inline]
fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
