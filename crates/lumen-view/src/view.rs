#![forbid(unsafe_code)]

//! Platform-independent views.
//!
//! # Design
//!
//! Every concrete view embeds a [`ViewBase`] and implements [`View`]. The
//! base holds what all views share: the `visible` and `geometry`
//! properties, a weak link to the parent, and the core slot with its
//! lifecycle state. Concrete views add their own properties and decide how
//! those link to their core in [`View::bind_view_core`].
//!
//! The core is owned exclusively by the view. Other code only ever borrows
//! it through [`ViewBase::with_core`], for the duration of one closure.
//!
//! # Invariants
//!
//! 1. A view has at most one core. A new core is only created from
//!    [`CoreState::NoCore`].
//! 2. Detaching drops every core link before the core itself, and leaves
//!    view property values untouched.
//! 3. Binding is idempotent: [`View::bind_view_core`] drops the previous
//!    core links before creating new ones.
//! 4. A failed core creation leaves the view in `NoCore` with no core
//!    reachable.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Core creation fails inside a property write | Logged, parked; see [`ViewBase::take_core_error`] |
//! | Core creation fails in `ensure_core` | Returned to the caller |
//! | Operation off the UI thread | Panics per [`ThreadCheck`](lumen_core::ThreadCheck) |

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use lumen_core::Rect;
use lumen_runtime::{BindMode, BindingScope, Property, Subscription};
use tracing::{debug, warn};

use crate::error::ViewError;
use crate::registry::{CoreRegistry, ViewTypeId};
use crate::view_core::{CoreKind, CoreState, ViewCore};

/// Process-unique view identifier, for logs and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in the view tree.
pub trait View: Any {
    fn base(&self) -> &ViewBase;

    fn as_any(&self) -> &dyn Any;

    /// Direct children, in order.
    fn child_views(&self) -> Vec<ViewRef>;

    /// Detach every child. Each child releases its own core.
    fn remove_all_child_views(&self);

    /// `child` now belongs to another parent: forget it without touching it.
    /// Unknown children are ignored.
    fn child_view_stolen(&self, child: &ViewRef);

    /// Create and bind a core if the view has none.
    ///
    /// # Errors
    ///
    /// Core creation or binding failures. The view is left without a core.
    fn ensure_core(&self) -> Result<(), ViewError>;

    /// Link this view's properties to its current core. Drops any links from
    /// a previous call first. Does nothing without a core.
    ///
    /// # Errors
    ///
    /// [`ViewError::Binding`] if a core property aliases a view property.
    fn bind_view_core(&self) -> Result<(), ViewError>;

    /// Whether a change to a core-creating property should create a core
    /// now. Top-level views override this.
    fn can_host_core(&self) -> bool {
        self.base()
            .parent()
            .is_some_and(|parent| parent.base().has_core())
    }

    /// Release the core of this view (and of its children when cascading
    /// is configured).
    fn release_core(&self) {
        let base = self.base();
        if !base.has_core() {
            return;
        }
        if base.config_cascades() {
            for child in self.child_views() {
                child.release_core();
            }
        }
        base.detach_core();
    }
}

/// Shared handle to a view with identity equality.
#[derive(Clone)]
pub struct ViewRef(Rc<dyn View>);

impl ViewRef {
    /// Borrow the view as its concrete type.
    #[must_use]
    pub fn downcast_ref<V: View>(&self) -> Option<&V> {
        self.0.as_any().downcast_ref::<V>()
    }

    #[must_use]
    pub fn as_rc(&self) -> &Rc<dyn View> {
        &self.0
    }

    #[must_use]
    pub fn downgrade(&self) -> Weak<dyn View> {
        Rc::downgrade(&self.0)
    }
}

impl<V: View> From<Rc<V>> for ViewRef {
    fn from(view: Rc<V>) -> Self {
        Self(view)
    }
}

impl From<Rc<dyn View>> for ViewRef {
    fn from(view: Rc<dyn View>) -> Self {
        Self(view)
    }
}

impl Deref for ViewRef {
    type Target = dyn View;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for ViewRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl Eq for ViewRef {}

impl fmt::Debug for ViewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.0.base();
        f.debug_struct("ViewRef")
            .field("type", &base.view_type())
            .field("id", &base.id())
            .finish()
    }
}

/// State shared by every view.
pub struct ViewBase {
    id: ViewId,
    view_type: ViewTypeId,
    registry: Rc<CoreRegistry>,
    this: Weak<dyn View>,
    parent: RefCell<Option<Weak<dyn View>>>,

    pub visible: Property<bool>,
    pub geometry: Property<Rect>,

    state: Cell<CoreState>,
    /// A `Box<C>` for the `C` the concrete view's core trait is.
    core: RefCell<Option<Box<dyn Any>>>,
    core_links: RefCell<BindingScope>,
    /// Subscriptions the view holds on its own properties.
    own: RefCell<BindingScope>,
    core_error: RefCell<Option<ViewError>>,
}

impl ViewBase {
    /// `this` is the weak self-reference handed out by `Rc::new_cyclic`.
    pub fn new(view_type: ViewTypeId, registry: &Rc<CoreRegistry>, this: Weak<dyn View>) -> Self {
        Self {
            id: ViewId::next(),
            view_type,
            registry: Rc::clone(registry),
            this,
            parent: RefCell::new(None),
            visible: Property::new(true),
            geometry: Property::new(Rect::default()),
            state: Cell::new(CoreState::NoCore),
            core: RefCell::new(None),
            core_links: RefCell::new(BindingScope::new()),
            own: RefCell::new(BindingScope::new()),
            core_error: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn id(&self) -> ViewId {
        self.id
    }

    #[must_use]
    pub fn view_type(&self) -> ViewTypeId {
        self.view_type
    }

    #[must_use]
    pub fn registry(&self) -> &Rc<CoreRegistry> {
        &self.registry
    }

    /// Strong handle to the view that owns this base, unless it is being
    /// dropped.
    #[must_use]
    pub fn this(&self) -> Option<ViewRef> {
        self.this.upgrade().map(ViewRef)
    }

    #[must_use]
    pub fn parent(&self) -> Option<ViewRef> {
        self.parent.borrow().as_ref()?.upgrade().map(ViewRef)
    }

    /// Whether `parent` is this view's parent. Works while `parent` is
    /// being dropped.
    #[must_use]
    pub fn is_child_of(&self, parent: &ViewBase) -> bool {
        self.parent
            .borrow()
            .as_ref()
            .is_some_and(|p| Weak::ptr_eq(p, &parent.this))
    }

    pub(crate) fn set_parent(&self, parent: Option<&ViewBase>) {
        *self.parent.borrow_mut() = parent.map(|p| Weak::clone(&p.this));
    }

    #[must_use]
    pub fn core_state(&self) -> CoreState {
        self.state.get()
    }

    #[must_use]
    pub fn has_core(&self) -> bool {
        self.state.get() == CoreState::CoreBound
    }

    /// Borrow the core as `C` for the duration of `f`.
    ///
    /// Returns `None` without a core, or when `C` is not the core type the
    /// view was registered with.
    pub fn with_core<C, R>(&self, f: impl FnOnce(&C) -> R) -> Option<R>
    where
        C: ?Sized + 'static,
    {
        let core = self.core.borrow();
        let boxed = core.as_ref()?.downcast_ref::<Box<C>>()?;
        Some(f(&**boxed))
    }

    /// Number of live links between this view and its core.
    #[must_use]
    pub fn core_link_count(&self) -> usize {
        self.core_links.borrow().len()
    }

    /// Assert the UI-thread precondition for `operation`.
    #[track_caller]
    pub fn check_thread(&self, operation: &str) {
        self.registry.affinity().check(operation);
    }

    pub(crate) fn config_cascades(&self) -> bool {
        self.registry.config().cascade_child_cores
    }

    /// Keep `sub` alive for the lifetime of the view.
    pub fn hold(&self, sub: Subscription) {
        self.own.borrow_mut().hold(sub);
    }

    /// Create a core when `property` takes a value for which `needs_core`
    /// holds, while the view has none and [`View::can_host_core`] allows it.
    pub fn watch_core_creating<T, V>(
        &self,
        property: &Property<T>,
        view: Weak<V>,
        needs_core: impl Fn(&T) -> bool + 'static,
    ) where
        T: Clone + PartialEq + 'static,
        V: View,
    {
        let sub = property.on_change(move |value| {
            if !needs_core(value) {
                return;
            }
            if let Some(view) = view.upgrade() {
                core_creating_property_changed(&*view);
            }
        });
        self.hold(sub);
    }

    /// Error from the last core creation that had no caller to return to.
    pub fn take_core_error(&self) -> Option<ViewError> {
        self.core_error.borrow_mut().take()
    }

    pub(crate) fn park_core_error(&self, err: ViewError) {
        *self.core_error.borrow_mut() = Some(err);
    }

    /// Drop all core links, then start a fresh link set with the base
    /// properties (`visible` view → core, `geometry` both ways).
    ///
    /// # Errors
    ///
    /// [`ViewError::Binding`] if the core hands back a view property.
    pub fn begin_core_links(
        &self,
        visible: &Property<bool>,
        geometry: &Property<Rect>,
    ) -> Result<BindingScope, ViewError> {
        self.clear_core_links();
        let mut links = BindingScope::new();
        links.connect(&self.visible, visible, BindMode::Unidirectional)?;
        links.connect(&self.geometry, geometry, BindMode::Bidirectional)?;
        Ok(links)
    }

    /// Install the links built by [`begin_core_links`](Self::begin_core_links).
    pub fn install_core_links(&self, links: BindingScope) {
        let previous = std::mem::replace(&mut *self.core_links.borrow_mut(), links);
        drop(previous);
    }

    fn clear_core_links(&self) {
        let previous = std::mem::take(&mut *self.core_links.borrow_mut());
        drop(previous);
    }

    /// Create a core for `view` through the registry and bind it.
    ///
    /// # Errors
    ///
    /// Whatever the registry or [`View::bind_view_core`] reports. On error
    /// no core is left behind.
    pub fn create_core<V: CoreKind>(&self, view: &V) -> Result<(), ViewError> {
        self.check_thread("ensure_core");
        if self.state.get() != CoreState::NoCore {
            return Ok(());
        }

        self.state.set(CoreState::CoreCreationPending);
        let core = match self.registry.create(view) {
            Ok(core) => core,
            Err(err) => {
                self.state.set(CoreState::NoCore);
                warn!(view_type = self.view_type, view_id = self.id.get(), error = %err, "core creation failed");
                return Err(err);
            }
        };
        *self.core.borrow_mut() = Some(Box::new(core));
        self.state.set(CoreState::CoreBound);
        debug!(view_type = self.view_type, view_id = self.id.get(), "core created");

        if let Err(err) = view.bind_view_core() {
            self.detach_core();
            return Err(err);
        }

        if self.config_cascades() {
            let mut first_error = None;
            for child in view.child_views() {
                if let Err(err) = child.ensure_core() {
                    first_error.get_or_insert(err);
                }
            }
            if let Some(err) = first_error {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Drop every core link, then the core. Property values are kept.
    pub fn detach_core(&self) {
        if self.state.get() != CoreState::CoreBound {
            return;
        }
        self.check_thread("release_core");
        self.state.set(CoreState::CoreDetaching);
        self.clear_core_links();
        let core = self.core.borrow_mut().take();
        drop(core);
        self.state.set(CoreState::NoCore);
        debug!(view_type = self.view_type, view_id = self.id.get(), "core released");
    }
}

impl Drop for ViewBase {
    fn drop(&mut self) {
        self.detach_core();
    }
}

impl fmt::Debug for ViewBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBase")
            .field("id", &self.id)
            .field("type", &self.view_type)
            .field("state", &self.state.get())
            .field("visible", &self.visible.get())
            .field("geometry", &self.geometry.get())
            .field("core_links", &self.core_links.borrow().len())
            .finish()
    }
}

/// Reaction to a core-creating property change.
fn core_creating_property_changed(view: &dyn View) {
    let base = view.base();
    if base.core_state() != CoreState::NoCore || !view.can_host_core() {
        return;
    }
    if let Err(err) = view.ensure_core() {
        warn!(
            view_type = base.view_type(),
            view_id = base.id().get(),
            error = %err,
            "core creation from property change failed"
        );
        base.park_core_error(err);
    }
}

/// Borrow the base properties of a core trait object.
pub(crate) fn base_core_properties<C>(core: &C) -> (Property<bool>, Property<Rect>)
where
    C: ViewCore + ?Sized,
{
    (core.visible().clone(), core.geometry().clone())
}
