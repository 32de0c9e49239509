#![forbid(unsafe_code)]

//! Observable view property with change notification and a binding slot.
//!
//! # Design
//!
//! [`Property<T>`] keeps a value of type `T` in shared, reference-counted
//! storage. When the value changes (determined by `PartialEq`), all live
//! subscribers are notified in registration order. Each property also has
//! one binding slot: [`Property::bind`] makes it follow another property
//! until it is rebound, unbound, or either end is dropped.
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `get()`       | O(1) + clone               |
//! | `set()`       | O(S) where S = subscribers |
//! | `on_change()` | O(1) amortized             |
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: Calling `set()` from within a subscriber is allowed.
//!   Callbacks already scheduled for the running notification receive the
//!   value that started it; the nested `set()` runs its own notification.
//! - **Subscriber leak**: If `Subscription` guards are stored indefinitely
//!   without being dropped, callbacks accumulate. Dead weak references are
//!   cleaned lazily during notification.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::binding::{BindError, BindMode, Connection, connect};

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct State<T> {
    value: T,
    version: u64,
    /// Subscribers stored as weak references. Dead entries are pruned on notify.
    subscribers: Vec<CallbackWeak<T>>,
}

/// Shared interior for [`Property<T>`].
pub(crate) struct Shared<T> {
    state: RefCell<State<T>>,
    /// Nesting depth of notifications currently running for this property.
    notifying: Cell<u32>,
    /// Link installed by [`Property::bind`]. Kept outside `state` so that
    /// dropping it never overlaps a borrow of the value.
    binding: RefCell<Option<Connection>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning a `Property` creates a new handle to the **same** state: both
/// handles see the same value, share subscribers, and share the binding
/// slot.
pub struct Property<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("Property")
            .field("value", &state.value)
            .field("version", &state.version)
            .field("subscriber_count", &state.subscribers.len())
            .field("bound", &self.shared.binding.borrow().is_some())
            .finish()
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    /// Create a new property with the given initial value.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(State {
                    value,
                    version: 0,
                    subscribers: Vec::new(),
                }),
                notifying: Cell::new(0),
                binding: RefCell::new(None),
            }),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.shared.state.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.shared.state.borrow().value)
    }

    /// Set a new value. If it differs from the current value the version is
    /// incremented and all live subscribers are notified, bound dependants
    /// included.
    pub fn set(&self, value: T) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.value == value {
                return;
            }
            state.value = value;
            state.version += 1;
        }
        self.notify();
    }

    /// Modify the value in place. Notifies only if the result differs from
    /// the value before the call.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut state = self.shared.state.borrow_mut();
            let old = state.value.clone();
            f(&mut state.value);
            if state.value != old {
                state.version += 1;
                true
            } else {
                false
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Subscribe to value changes. The callback receives the new value each
    /// time it changes.
    ///
    /// A subscriber added while a notification is running is not called for
    /// that notification. Dropping the returned guard unsubscribes.
    pub fn on_change(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        self.shared.state.borrow_mut().subscribers.push(weak);
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Make this property follow `source`.
    ///
    /// Copies `source`'s current value into `self` immediately and replaces
    /// any binding `self` already had. With [`BindMode::Bidirectional`] writes
    /// to `self` flow back to `source` as well.
    ///
    /// # Errors
    ///
    /// [`BindError::SelfBinding`] if `source` shares state with `self`. The
    /// existing binding is left untouched in that case.
    pub fn bind(&self, source: &Property<T>, mode: BindMode) -> Result<(), BindError> {
        if self.ptr_eq(source) {
            return Err(BindError::SelfBinding);
        }
        // Break the old link before the initial copy so it cannot echo.
        self.unbind();
        let connection = connect(source, self, mode)?;
        let previous = self.shared.binding.borrow_mut().replace(connection);
        drop(previous);
        Ok(())
    }

    /// Drop the binding installed by [`bind`](Self::bind), if any. The
    /// current value is kept.
    pub fn unbind(&self) {
        let previous = self.shared.binding.borrow_mut().take();
        drop(previous);
    }

    /// Whether a binding is installed and both of its endpoints are alive.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.shared
            .binding
            .borrow()
            .as_ref()
            .is_some_and(Connection::is_live)
    }

    /// Current version number. Increments by 1 on each value-changing
    /// mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.state.borrow().version
    }

    /// Number of registered subscribers (including dead ones not yet pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.state.borrow().subscribers.len()
    }

    /// Whether a change notification for this property is running.
    #[must_use]
    pub fn is_notifying(&self) -> bool {
        self.shared.notifying.get() > 0
    }

    /// Whether both handles refer to the same property.
    #[must_use]
    pub fn ptr_eq(&self, other: &Property<T>) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// A handle that does not keep the property alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakProperty<T> {
        WeakProperty {
            shared: Rc::downgrade(&self.shared),
        }
    }

    pub(crate) fn shared_any(&self) -> Weak<dyn std::any::Any> {
        let weak: Weak<Shared<T>> = Rc::downgrade(&self.shared);
        weak
    }

    /// Notify live subscribers and prune dead ones.
    fn notify(&self) {
        // Snapshot first so callbacks run without a borrow held and late
        // subscribers are not called.
        let (callbacks, value): (Vec<CallbackRc<T>>, T) = {
            let mut state = self.shared.state.borrow_mut();
            state.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks = state.subscribers.iter().filter_map(|w| w.upgrade()).collect();
            (callbacks, state.value.clone())
        };

        let _notifying = NotifyGuard::enter(&self.shared.notifying);
        for cb in &callbacks {
            cb(&value);
        }
    }
}

/// Decrements the notification depth when a notification ends, including
/// by unwinding out of a subscriber.
struct NotifyGuard<'a>(&'a Cell<u32>);

impl<'a> NotifyGuard<'a> {
    fn enter(depth: &'a Cell<u32>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

/// Non-owning handle to a [`Property`].
pub struct WeakProperty<T> {
    shared: Weak<Shared<T>>,
}

impl<T> Clone for WeakProperty<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for WeakProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakProperty")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl<T> WeakProperty<T> {
    /// Recover a strong handle if the property is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Property<T>> {
        self.shared.upgrade().map(|shared| Property { shared })
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription` drops the strong `Rc` behind the callback,
/// so the `Weak` in the property's subscriber list fails to upgrade on the
/// next notification.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    /// Type-erased strong reference keeping the callback `Rc` alive.
    _guard: Box<dyn std::any::Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_basic() {
        let prop = Property::new(42);
        assert_eq!(prop.get(), 42);
        assert_eq!(prop.version(), 0);

        prop.set(99);
        assert_eq!(prop.get(), 99);
        assert_eq!(prop.version(), 1);
    }

    #[test]
    fn equal_value_is_silent() {
        let prop = Property::new(42);
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        let _sub = prop.on_change(move |_| c.set(c.get() + 1));

        prop.set(42);
        assert_eq!(prop.version(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn update_mutates_in_place() {
        let prop = Property::new(vec![1, 2, 3]);
        prop.update(|v| v.push(4));
        assert_eq!(prop.get(), vec![1, 2, 3, 4]);
        assert_eq!(prop.version(), 1);

        prop.update(|v| v.sort());
        assert_eq!(prop.version(), 1);
    }

    #[test]
    fn subscriber_receives_new_value() {
        let prop = Property::new(String::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = prop.on_change(move |v: &String| s.borrow_mut().push(v.clone()));

        prop.set("a".into());
        prop.set("b".into());
        assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn subscription_drop_unsubscribes() {
        let prop = Property::new(0);
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        let sub = prop.on_change(move |_| c.set(c.get() + 1));

        prop.set(1);
        drop(sub);
        prop.set(2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn notification_order_is_registration_order() {
        let prop = Property::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = Rc::clone(&log);
        let _s1 = prop.on_change(move |_| l1.borrow_mut().push('A'));
        let l2 = Rc::clone(&log);
        let _s2 = prop.on_change(move |_| l2.borrow_mut().push('B'));
        let l3 = Rc::clone(&log);
        let _s3 = prop.on_change(move |_| l3.borrow_mut().push('C'));

        prop.set(1);
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
    }

    #[test]
    fn subscriber_added_during_notify_misses_current_change() {
        let prop = Property::new(0);
        let late_calls = Rc::new(Cell::new(0u32));
        let held: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let handle = prop.clone();
        let late = Rc::clone(&late_calls);
        let store = Rc::clone(&held);
        let _adder = prop.on_change(move |_| {
            let late = Rc::clone(&late);
            let sub = handle.on_change(move |_| late.set(late.get() + 1));
            store.borrow_mut().push(sub);
        });

        prop.set(1);
        assert_eq!(late_calls.get(), 0);

        prop.set(2);
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn reentrant_set_from_subscriber() {
        let prop = Property::new(0);
        let handle = prop.clone();
        let _clamp = prop.on_change(move |v| {
            if *v > 10 {
                handle.set(10);
            }
        });

        prop.set(50);
        assert_eq!(prop.get(), 10);
        assert!(!prop.is_notifying());
    }

    #[test]
    fn clone_shares_state() {
        let a = Property::new(0);
        let b = a.clone();
        a.set(42);
        assert_eq!(b.get(), 42);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Property::new(42)));
    }

    #[test]
    fn weak_handle_does_not_keep_alive() {
        let prop = Property::new(1);
        let weak = prop.downgrade();
        assert_eq!(weak.upgrade().map(|p| p.get()), Some(1));
        drop(prop);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn subscriber_count_prunes_lazily() {
        let prop = Property::new(0);
        let _s1 = prop.on_change(|_| {});
        let s2 = prop.on_change(|_| {});
        assert_eq!(prop.subscriber_count(), 2);

        drop(s2);
        assert_eq!(prop.subscriber_count(), 2);

        prop.set(1);
        assert_eq!(prop.subscriber_count(), 1);
    }

    #[test]
    fn debug_format() {
        let prop = Property::new(42);
        let dbg = format!("{prop:?}");
        assert!(dbg.contains("Property"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("bound"));
    }
}
