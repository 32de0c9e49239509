#![forbid(unsafe_code)]

//! Links that keep one [`Property`] synchronized with another.
//!
//! A [`Connection`] is the RAII form of a binding: while it is alive the
//! target follows the source, and with [`BindMode::Bidirectional`] the
//! source follows the target too. [`Property::bind`] stores a connection in
//! the target's own binding slot; views keep the connections to their
//! platform core in a [`BindingScope`] instead, so core rebinding never
//! disturbs a binding the application installed.
//!
//! # Usage
//!
//! ```
//! use lumen_runtime::reactive::{BindMode, Property, connect};
//!
//! let source = Property::new(42);
//! let target = Property::new(0);
//! let link = connect(&source, &target, BindMode::Bidirectional).unwrap();
//! assert_eq!(target.get(), 42);
//!
//! target.set(7);
//! assert_eq!(source.get(), 7);
//!
//! drop(link);
//! source.set(1);
//! assert_eq!(target.get(), 7);
//! ```
//!
//! # Invariants
//!
//! 1. Connecting copies the source value into the target before returning.
//! 2. Each link carries its own in-flight flag: a write the link issues can
//!    never re-enter the same link, whatever `PartialEq` says about `T`.
//! 3. A link never writes into a property that is already notifying, except
//!    to hand a bidirectional peer's adjustment back to the property that
//!    started the write.
//! 4. A link forwards the source's current value, not the value the
//!    notification started with, so a subscriber that rewrites the source
//!    mid-notification cannot be overwritten by a stale value.
//! 5. Links hold only weak references to their endpoints; dropping either
//!    endpoint silently disables the link.
//! 6. Dropping a `Connection` unsubscribes both directions.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::property::{Property, Subscription, WeakProperty};

/// Direction of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindMode {
    /// Source changes flow into the target only.
    #[default]
    Unidirectional,
    /// Changes on either end flow to the other.
    Bidirectional,
}

/// Errors from binding operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A property was bound to itself.
    SelfBinding,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfBinding => write!(f, "a property cannot be bound to itself"),
        }
    }
}

impl std::error::Error for BindError {}

/// Live synchronization link between two properties.
#[must_use = "dropping a Connection disconnects it immediately"]
pub struct Connection {
    _forward: Subscription,
    _backward: Option<Subscription>,
    source: Weak<dyn Any>,
    target: Weak<dyn Any>,
    mode: BindMode,
}

impl Connection {
    #[must_use]
    pub fn mode(&self) -> BindMode {
        self.mode
    }

    /// Whether both endpoints are still alive.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.source.strong_count() > 0 && self.target.strong_count() > 0
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("mode", &self.mode)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Keep `target` synchronized with `source`.
///
/// `target` takes `source`'s current value immediately.
///
/// # Errors
///
/// [`BindError::SelfBinding`] if both handles refer to the same property.
pub fn connect<T: Clone + PartialEq + 'static>(
    source: &Property<T>,
    target: &Property<T>,
    mode: BindMode,
) -> Result<Connection, BindError> {
    if source.ptr_eq(target) {
        return Err(BindError::SelfBinding);
    }

    let in_flight = Rc::new(Cell::new(false));
    target.set(source.get());

    let forward = source.on_change(propagate(
        source.downgrade(),
        target.downgrade(),
        Rc::clone(&in_flight),
        mode,
    ));
    let backward = match mode {
        BindMode::Unidirectional => None,
        BindMode::Bidirectional => Some(target.on_change(propagate(
            target.downgrade(),
            source.downgrade(),
            in_flight,
            mode,
        ))),
    };

    Ok(Connection {
        _forward: forward,
        _backward: backward,
        source: source.shared_any(),
        target: target.shared_any(),
        mode,
    })
}

/// Subscriber that forwards every change of `from` into `dest`.
///
/// With [`BindMode::Bidirectional`], an adjustment a subscriber of `dest`
/// makes while receiving the value is written back to `from` once.
fn propagate<T: Clone + PartialEq + 'static>(
    from: WeakProperty<T>,
    dest: WeakProperty<T>,
    in_flight: Rc<Cell<bool>>,
    mode: BindMode,
) -> impl Fn(&T) + 'static {
    move |_: &T| {
        if in_flight.get() {
            trace!("binding echo suppressed");
            return;
        }
        let (Some(from), Some(dest)) = (from.upgrade(), dest.upgrade()) else {
            return;
        };
        if dest.is_notifying() {
            trace!("write into notifying property suppressed");
            return;
        }
        let _flight = InFlight::enter(&in_flight);
        let before = dest.version();
        dest.set(from.get());
        // More than one version step means a subscriber rewrote `dest`.
        if mode == BindMode::Bidirectional && dest.version() > before + 1 {
            trace!("bound peer adjusted the value; writing it back");
            from.set(dest.get());
        }
    }
}

struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// ---------------------------------------------------------------------------
// BindingScope
// ---------------------------------------------------------------------------

/// Collects connections and subscriptions for a logical owner (a view and
/// its core, for instance).
///
/// When the scope is dropped or cleared, everything it holds is released,
/// disconnecting all reactive links associated with that owner.
///
/// # Invariants
///
/// 1. After `clear()` or drop, no callback registered through this scope
///    fires again.
/// 2. `len()` counts held connections and subscriptions.
#[derive(Default)]
pub struct BindingScope {
    connections: Vec<Connection>,
    subscriptions: Vec<Subscription>,
}

impl BindingScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect two properties and hold the link in this scope.
    ///
    /// # Errors
    ///
    /// [`BindError::SelfBinding`] if both handles refer to the same property.
    pub fn connect<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Property<T>,
        target: &Property<T>,
        mode: BindMode,
    ) -> Result<&mut Self, BindError> {
        self.connections.push(connect(source, target, mode)?);
        Ok(self)
    }

    /// Subscribe to a property and hold the subscription in this scope.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Property<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        self.subscriptions.push(source.on_change(callback));
        self
    }

    /// Hold an existing subscription.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Number of held connections and subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len() + self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty() && self.subscriptions.is_empty()
    }

    /// Release everything immediately. The scope stays usable.
    pub fn clear(&mut self) {
        self.connections.clear();
        self.subscriptions.clear();
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingScope")
            .field("connections", &self.connections.len())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
