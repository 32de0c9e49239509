#![forbid(unsafe_code)]

//! UI-thread affinity checks.
//!
//! Platform cores wrap UI objects that must only be touched from the thread
//! that owns the UI object model. Lumen's view types are `Rc`-based and
//! therefore `!Send`, so most cross-thread use is already a compile error;
//! [`ThreadAffinity`] is the runtime precondition for everything that slips
//! past the type system (for example a core that hands out a handle to a
//! platform callback running on another thread).
//!
//! # Failure Modes
//!
//! | Policy                 | Off-thread call              |
//! |------------------------|------------------------------|
//! | [`ThreadCheck::Debug`]  | panics in debug builds only  |
//! | [`ThreadCheck::Always`] | panics in every build        |
//! | [`ThreadCheck::Off`]    | not checked                  |

use std::thread::{self, ThreadId};

/// How strictly thread affinity is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadCheck {
    /// `debug_assert!` semantics.
    #[default]
    Debug,
    /// `assert!` semantics.
    Always,
    /// No checking.
    Off,
}

impl ThreadCheck {
    /// Parse a policy name as found in an environment variable.
    ///
    /// Accepts `debug`, `always`, and `off` (case-insensitive, surrounding
    /// whitespace ignored).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "always" => Some(Self::Always),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

/// Records the thread that owns a UI object model and checks callers
/// against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    owner: ThreadId,
    check: ThreadCheck,
}

impl ThreadAffinity {
    /// Bind affinity to the calling thread.
    #[must_use]
    pub fn current(check: ThreadCheck) -> Self {
        Self {
            owner: thread::current().id(),
            check,
        }
    }

    #[must_use]
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    #[must_use]
    pub fn policy(&self) -> ThreadCheck {
        self.check
    }

    /// Whether the calling thread is the owning thread.
    #[must_use]
    pub fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Enforce the policy for `operation`.
    ///
    /// # Panics
    ///
    /// Panics when called off the owning thread under
    /// [`ThreadCheck::Always`], or under [`ThreadCheck::Debug`] in builds
    /// with debug assertions.
    #[track_caller]
    pub fn check(&self, operation: &str) {
        match self.check {
            ThreadCheck::Off => {}
            ThreadCheck::Debug => debug_assert!(
                self.is_owner_thread(),
                "{operation} called off the UI thread (owner {:?}, caller {:?})",
                self.owner,
                thread::current().id()
            ),
            ThreadCheck::Always => assert!(
                self.is_owner_thread(),
                "{operation} called off the UI thread (owner {:?}, caller {:?})",
                self.owner,
                thread::current().id()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_policy_names() {
        assert_eq!(ThreadCheck::parse("debug"), Some(ThreadCheck::Debug));
        assert_eq!(ThreadCheck::parse(" ALWAYS "), Some(ThreadCheck::Always));
        assert_eq!(ThreadCheck::parse("off"), Some(ThreadCheck::Off));
        assert_eq!(ThreadCheck::parse("sometimes"), None);
    }

    #[test]
    fn owner_thread_passes() {
        let affinity = ThreadAffinity::current(ThreadCheck::Always);
        assert!(affinity.is_owner_thread());
        affinity.check("owner_thread_passes");
    }

    #[test]
    fn other_thread_is_rejected_when_always() {
        let affinity = ThreadAffinity::current(ThreadCheck::Always);
        let result = thread::spawn(move || affinity.check("set")).join();
        assert!(result.is_err());
    }

    #[test]
    fn other_thread_is_ignored_when_off() {
        let affinity = ThreadAffinity::current(ThreadCheck::Off);
        let result = thread::spawn(move || {
            affinity.check("set");
            affinity.is_owner_thread()
        })
        .join();
        assert_eq!(result.ok(), Some(false));
    }
}
