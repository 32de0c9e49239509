#![forbid(unsafe_code)]

//! Reactive data bindings for Lumen.
//!
//! This module provides change-tracking primitives for view properties:
//!
//! - [`Property`]: A shared, version-tracked value with change notification
//!   and an optional binding slot.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`Connection`]: RAII link that keeps one property synchronized with
//!   another, unidirectionally or bidirectionally.
//! - [`BindingScope`]: Owns a group of connections and subscriptions and
//!   releases them together.
//!
//! # Architecture
//!
//! `Property<T>` uses `Rc<..>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification. A binding is nothing more than a subscriber on the
//! source that writes into the target, so bound dependants are updated in
//! the order they were bound, after the subscribers registered before them.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. A propagating write never lands on a property that is already
//!    notifying, and never re-enters the link that issued it.

pub mod binding;
pub mod property;

pub use binding::{BindError, BindMode, BindingScope, Connection, connect};
pub use property::{Property, Subscription, WeakProperty};
